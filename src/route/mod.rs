use crate::error_handler::{boxed_route_err_handler, RouteErrHandler};
use crate::handler::Next;
use crate::middleware::{self, Middleware};
use crate::pattern::PathPattern;
use crate::types::{RequestInfo, RouteParams};
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;

/// Represents a single route.
///
/// A route consists of a method, a compiled path pattern, a handler and the full, ordered list of
/// middleware wrapping it (inherited group middleware first, route-specific middleware last). It is
/// built once when the router is built and never changes afterwards. Routes are created through
/// the [RouterBuilder](./struct.RouterBuilder.html) shortcuts or, when they need their own
/// middleware or error handler, through [`Route::get`] and friends.
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request, Response, StatusCode};
/// use switchyard::{Middleware, Route, Router};
/// use std::convert::Infallible;
///
/// async fn submit(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     Ok(Response::new(Full::new(Bytes::from("submitted"))))
/// }
///
/// let router = Router::builder()
///     .route(
///         Route::post("/submit", submit)
///             .middleware(Middleware::required_fields(["email"]))
///             .err_handler(|err, _| async move {
///                 let mut res = Response::new(Full::new(Bytes::from(format!("submit failed: {}", err))));
///                 *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
///                 res
///             }),
///     )
///     .build()
///     .unwrap();
/// ```
pub struct Route {
    pub(crate) method: Method,
    pub(crate) pattern: PathPattern,
    pub(crate) middleware: Vec<Middleware>,
    // The handler wrapped in `middleware`, composed once at build time.
    pub(crate) chain: Next,
    pub(crate) err_handler: Option<RouteErrHandler>,
}

impl Route {
    /// Starts a route for any method. Use the returned builder to attach middleware and an error
    /// handler, then register it with [`RouterBuilder::route`](crate::RouterBuilder::route).
    pub fn new<P, H, R, E>(method: Method, path: P, handler: H) -> RouteBuilder
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        RouteBuilder {
            method,
            path: path.into(),
            handler: Next::from_handler(handler),
            middleware: Vec::new(),
            err_handler: None,
        }
    }

    pub fn get<P, H, R, E>(path: P, handler: H) -> RouteBuilder
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Route::new(Method::GET, path, handler)
    }

    pub fn post<P, H, R, E>(path: P, handler: H) -> RouteBuilder
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Route::new(Method::POST, path, handler)
    }

    pub fn put<P, H, R, E>(path: P, handler: H) -> RouteBuilder
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Route::new(Method::PUT, path, handler)
    }

    pub fn delete<P, H, R, E>(path: P, handler: H) -> RouteBuilder
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Route::new(Method::DELETE, path, handler)
    }

    pub fn patch<P, H, R, E>(path: P, handler: H) -> RouteBuilder
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Route::new(Method::PATCH, path, handler)
    }

    /// Returns the method this route answers to.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the full path template, group prefixes included.
    pub fn path(&self) -> &str {
        self.pattern.template()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the effective middleware list, outermost first.
    pub fn middleware(&self) -> &[Middleware] {
        &self.middleware
    }

    pub(crate) fn is_match(&self, method: &Method, path: &str) -> Option<RouteParams> {
        if self.method != *method {
            return None;
        }
        self.pattern.matches(path)
    }
}

impl Debug for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ method: {:?}, path: {:?}, middleware: {:?}, has_err_handler: {:?} }}",
            self.method,
            self.pattern.template(),
            self.middleware,
            self.err_handler.is_some()
        )
    }
}

/// A route which has not been registered yet. See [`Route::new`].
pub struct RouteBuilder {
    method: Method,
    path: String,
    handler: Next,
    middleware: Vec<Middleware>,
    err_handler: Option<RouteErrHandler>,
}

impl RouteBuilder {
    /// Appends a route-specific middleware. It runs inside every inherited group middleware.
    pub fn middleware(mut self, m: Middleware) -> Self {
        self.middleware.push(m);
        self
    }

    /// Sets an error handler for failures of this route.
    ///
    /// It receives the handler's error, or [`Error::HandlerPanic`](crate::Error::HandlerPanic) for
    /// a panic, and takes precedence over the router-wide `500` rendering.
    pub fn err_handler<H, R>(mut self, handler: H) -> Self
    where
        H: Fn(RouteError, RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        self.err_handler = Some(boxed_route_err_handler(handler));
        self
    }

    // Produces a new, independent route: the prefix and inherited middleware are applied here
    // exactly once, so the same builder state can never be prefixed twice.
    pub(crate) fn expand(self, prefix: &str, inherited: &[Middleware]) -> crate::Result<Route> {
        let pattern = PathPattern::compile(format!("{}{}", prefix, self.path))?;

        let mut middleware = Vec::with_capacity(inherited.len() + self.middleware.len());
        middleware.extend_from_slice(inherited);
        middleware.extend(self.middleware);

        let chain = middleware::compose(&middleware, self.handler);

        Ok(Route {
            method: self.method,
            pattern,
            middleware,
            chain,
            err_handler: self.err_handler,
        })
    }
}

impl Debug for RouteBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ method: {:?}, path: {:?} }}", self.method, self.path)
    }
}
