pub use self::request_info::RequestInfo;
pub(crate) use self::request_meta::RequestMeta;
pub use self::route_params::RouteParams;

mod request_info;
mod request_meta;
mod route_params;
