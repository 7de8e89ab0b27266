//! Extension traits for the request type.

use crate::context::AppContext;
use crate::types::{RequestMeta, RouteParams};
use hyper::Request;
use lazy_static::lazy_static;
use std::net::SocketAddr;

lazy_static! {
    static ref EMPTY_PARAMS: RouteParams = RouteParams::new();
}

/// A extension trait which extends the [`hyper::Request`](https://docs.rs/hyper/1/hyper/struct.Request.html) type with
/// some helpful methods.
pub trait RequestExt {
    /// It returns the route parameters bound for this request. Empty when no parametrized route
    /// matched.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response};
    /// use switchyard::prelude::*;
    /// use switchyard::Router;
    /// use std::convert::Infallible;
    ///
    /// let router = Router::builder()
    ///     .get("/users/{userName}/books/{bookName}", |req| async move {
    ///         let params = req.params();
    ///         let user_name = params.get("userName").unwrap();
    ///         let book_name = params.get("bookName").unwrap();
    ///
    ///         Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(format!(
    ///             "Username: {}, Book Name: {}",
    ///             user_name, book_name
    ///         )))))
    ///     })
    ///     .build()
    ///     .unwrap();
    /// ```
    fn params(&self) -> &RouteParams;

    /// It returns the route parameter value by the name of the parameter specified in the path.
    fn param<P: AsRef<str>>(&self, param_name: P) -> Option<&String>;

    /// It returns the remote address of the incoming request, when it came through a connection.
    fn remote_addr(&self) -> Option<SocketAddr>;

    /// It returns the application context of the router serving the request.
    fn app_context(&self) -> Option<&AppContext>;
}

impl<T> RequestExt for Request<T> {
    fn params(&self) -> &RouteParams {
        self.extensions()
            .get::<RequestMeta>()
            .and_then(|meta| meta.route_params())
            .unwrap_or(&EMPTY_PARAMS)
    }

    fn param<P: AsRef<str>>(&self, param_name: P) -> Option<&String> {
        self.params().get(param_name)
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.extensions()
            .get::<RequestMeta>()
            .and_then(|meta| meta.remote_addr().copied())
    }

    fn app_context(&self) -> Option<&AppContext> {
        self.extensions().get::<AppContext>()
    }
}
