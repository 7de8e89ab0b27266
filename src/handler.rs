use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The future returned by a type-erased handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response<Full<Bytes>>, RouteError>> + Send + 'static>>;

type BoxedHandler = Arc<dyn Fn(Request<Full<Bytes>>) -> HandlerFuture + Send + Sync + 'static>;

/// A type-erased request handler.
///
/// A middleware receives the `Next` handler it wraps and returns a new one; a route's terminal
/// handler is converted into a `Next` at registration. Cloning is cheap.
#[derive(Clone)]
pub struct Next {
    inner: BoxedHandler,
}

impl Next {
    /// Creates a handler from a function or closure.
    pub fn new<H, R>(handler: H) -> Next
    where
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, RouteError>> + Send + 'static,
    {
        Next {
            inner: Arc::new(move |req| Box::pin(handler(req))),
        }
    }

    /// Runs the handler with the request.
    pub fn run(&self, req: Request<Full<Bytes>>) -> HandlerFuture {
        (self.inner)(req)
    }

    pub(crate) fn from_handler<H, R, E>(handler: H) -> Next
    where
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Next::new(move |req| {
            let fut = handler(req);
            async move { fut.await.map_err(Into::<RouteError>::into) }
        })
    }
}

impl Debug for Next {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}
