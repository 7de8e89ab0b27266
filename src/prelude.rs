//! The prelude re-exports the extension traits, import it with `use switchyard::prelude::*`.

pub use crate::ext::RequestExt;
