pub use self::request_service::{RequestService, RequestServiceBuilder};
pub use self::router_service::RouterService;

mod request_service;
mod router_service;
