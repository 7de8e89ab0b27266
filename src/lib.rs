//! `switchyard` is the request dispatch core of a small web framework built on the Rust HTTP library [hyper](https://hyper.rs/).
//!
//! Its core features:
//!
//! - Route matching on regex-backed path patterns with named and constrained parameters
//!
//! - Route groups with accumulated path prefixes and inherited middleware
//!
//! - Composable middleware around handlers, plus CORS, form validation and request logging out of the box
//!
//! - Status-based error pages: verbose in development, templated in production
//!
//! - A named service container with lazily constructed singletons and transient services
//!
//! - Panics and errors in handlers are contained to the request which caused them
//!
//! ## Basic Example
//!
//! A simple example using `switchyard` with `hyper` would look like the following:
//!
//! ```no_run
//! use http_body_util::Full;
//! use hyper::service::Service;
//! use hyper::{body::Bytes, Request, Response};
//! use hyper_util::rt::{TokioExecutor, TokioIo};
//! use hyper_util::server::conn::auto::Builder;
//! // Import the prelude traits.
//! use switchyard::prelude::*;
//! use switchyard::{AppContext, Environment, Logger, Middleware, Router, RouterService, TracingLogger, LOGGER_SERVICE};
//! use std::sync::Arc;
//! use std::{convert::Infallible, net::SocketAddr};
//! use tokio::net::TcpListener;
//!
//! // A handler for "/" page.
//! async fn home_handler(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     Ok(Response::new(Full::new(Bytes::from("Home page"))))
//! }
//!
//! // A handler for "/users/{userId}" page.
//! async fn user_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let user_id = req.param("userId").unwrap();
//!     Ok(Response::new(Full::new(Bytes::from(format!("Hello {}", user_id)))))
//! }
//!
//! fn router(ctx: &AppContext) -> Router {
//!     Router::builder()
//!         .context(ctx.clone())
//!         .middleware(Middleware::request_logger(ctx))
//!         .get("/", home_handler)
//!         .get("/users/{userId}", user_handler)
//!         .build()
//!         .unwrap()
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let ctx = AppContext::new(Environment::from_env());
//!     ctx.services().register::<dyn Logger, _>(LOGGER_SERVICE, |_| Arc::new(TracingLogger), true);
//!
//!     let service = Arc::new(RouterService::new(router(&ctx)));
//!
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
//!     let listener = TcpListener::bind(addr).await.unwrap();
//!     println!("App is running on: {}", addr);
//!
//!     loop {
//!         let (stream, _) = listener.accept().await.unwrap();
//!         let router_service = service.clone();
//!
//!         tokio::spawn(async move {
//!             let request_service = match router_service.call(&stream).await {
//!                 Ok(svc) => svc,
//!                 Err(never) => match never {},
//!             };
//!             let io = TokioIo::new(stream);
//!             let builder = Builder::new(TokioExecutor::new());
//!             if let Err(err) = builder.serve_connection(io, request_service).await {
//!                 eprintln!("Error serving connection: {:?}", err);
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! ## Routing
//!
//! ### Route Paths
//!
//! A route path is a `/`-separated template. A segment may contain literal text and parameter
//! placeholders:
//!
//! ```txt
//! {name}              matches one segment: [^/]+
//! {name:constraint}   matches the regex constraint, e.g. {id:\d+} or {code:[A-Z]{3}}
//! *                   as the last segment only, matches the rest of the path, bound as "*"
//! ```
//!
//! Apart from the trailing `*`, a path must have as many segments as the template to match.
//! Routes are tried in registration order and the first route whose method and path match wins.
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Response};
//! use switchyard::prelude::*;
//! use switchyard::Router;
//! use std::convert::Infallible;
//!
//! let router = Router::builder()
//!     .get("/users/me", |_| async move { Ok::<_, Infallible>(Response::new(Full::new(Bytes::from("me")))) })
//!     .get("/users/{id:\\d+}", |req| async move {
//!         let id = req.param("id").cloned().unwrap_or_default();
//!         Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(id))))
//!     })
//!     .get("/files/*", |req| async move {
//!         let rest = req.param("*").cloned().unwrap_or_default();
//!         Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(rest))))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let found = router.lookup(&hyper::Method::GET, "/files/css/site.css").unwrap();
//! assert_eq!(found.params().get("*").unwrap(), "css/site.css");
//! ```
//!
//! ### Route Groups
//!
//! A [`Group`] shares a path prefix and middleware between routes. Groups nest; a nested group
//! inherits the prefix and the middleware of its parent.
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Response};
//! use switchyard::{Middleware, Router};
//! use std::convert::Infallible;
//!
//! let router = Router::builder()
//!     .group("/api", |api| {
//!         api.middleware(Middleware::required_fields(["token"]))
//!             .group("/v1", |v1| {
//!                 v1.get("/status", |_| async move {
//!                     Ok::<_, Infallible>(Response::new(Full::new(Bytes::from("up"))))
//!                 })
//!             })
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(router.routes()[0].path(), "/api/v1/status");
//! ```
//!
//! ## Middleware
//!
//! A [`Middleware`] wraps the next handler of the chain. For the middleware `[m1, m2]` of a route,
//! `m1` runs first on the way in and last on the way out. Global middleware registered with
//! [`RouterBuilder::middleware`] runs outside every group and route middleware, also for requests
//! matching no route.
//!
//! ## Error Handling
//!
//! [`Router::handle`] always produces a response. Requests matching no route get a `404`; a
//! handler returning an error or panicking gets a `500`, and the panic never reaches the server.
//! The response is rendered by, in order of precedence: the route's own error handler (for `500`s
//! raised inside it), a handler registered with [`RouterBuilder::status_handler`], a verbose plain
//! text page in development, or an [`ErrorPages`] template falling back to the status text in
//! production.
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Response, StatusCode};
//! use switchyard::Router;
//!
//! let router = Router::builder()
//!     .status_handler(StatusCode::NOT_FOUND, |info| async move {
//!         let mut res = Response::new(Full::new(Bytes::from(format!("Nothing at {}", info.uri().path()))));
//!         *res.status_mut() = StatusCode::NOT_FOUND;
//!         res
//!     })
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Services
//!
//! The [`ServiceContainer`] of the router's [`AppContext`] resolves named services. Singletons are
//! built by the first resolution, exactly once even under concurrent first use.

pub use self::constants::{DEFAULT_ERROR_VIEWS, LOGGER_SERVICE};
pub use self::container::ServiceContainer;
pub use self::context::{AppContext, Environment};
pub use self::error::{Error, RouteError};
pub use self::error_handler::{ErrorHandler, ErrorPages, FileErrorPages};
pub use self::handler::{HandlerFuture, Next};
pub use self::logger::{init_tracing, Logger, TracingLogger};
pub use self::middleware::{CorsOptions, Middleware};
pub use self::pattern::PathPattern;
pub use self::route::{Route, RouteBuilder};
pub use self::router::{Group, RouteMatch, Router, RouterBuilder};
#[doc(hidden)]
pub use self::service::RequestService;
pub use self::service::RequestServiceBuilder;
pub use self::service::RouterService;
pub use self::types::{RequestInfo, RouteParams};

mod constants;
mod container;
mod context;
mod error;
mod error_handler;
pub mod ext;
mod handler;
mod helpers;
mod logger;
mod middleware;
mod pattern;
pub mod prelude;
mod route;
mod router;
mod service;
mod types;

/// A Result type often returned from methods that can have switchyard errors.
pub type Result<T> = std::result::Result<T, Error>;
