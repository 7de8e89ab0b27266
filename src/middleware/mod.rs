use crate::handler::Next;
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

pub use self::cors::CorsOptions;

mod cors;
mod logging;
mod post;
mod pre;
mod validation;

type Wrap = Arc<dyn Fn(Next) -> Next + Send + Sync + 'static>;

/// A middleware wraps the next handler in the chain and returns the wrapped handler. Please refer
/// to the [Middleware](./index.html#middleware) section for more info.
///
/// A middleware may change the request before calling `next`, change the response after it,
/// measure or log around it, or short-circuit by answering without calling `next` at all.
///
/// For the middleware list `[m1, m2, m3]` of a route the effective handler is
/// `m1(m2(m3(handler)))`: `m1` runs first on the way in and last on the way out.
#[derive(Clone)]
pub struct Middleware {
    name: Cow<'static, str>,
    wrap: Wrap,
}

impl Middleware {
    /// Creates a middleware from a function which maps the next handler to a wrapping handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use switchyard::{Middleware, Next};
    ///
    /// let passthrough = Middleware::new(|next: Next| next);
    /// ```
    pub fn new<W>(wrap: W) -> Middleware
    where
        W: Fn(Next) -> Next + Send + Sync + 'static,
    {
        Middleware {
            name: Cow::Borrowed("middleware"),
            wrap: Arc::new(wrap),
        }
    }

    /// Creates a middleware from an async function which receives the request and the next
    /// handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Request, Response, StatusCode};
    /// use switchyard::{Middleware, Next, RouteError};
    ///
    /// async fn require_token(req: Request<Full<Bytes>>, next: Next) -> Result<Response<Full<Bytes>>, RouteError> {
    ///     if req.headers().contains_key("x-token") {
    ///         next.run(req).await
    ///     } else {
    ///         let mut res = Response::new(Full::new(Bytes::from("Unauthorized")));
    ///         *res.status_mut() = StatusCode::UNAUTHORIZED;
    ///         Ok(res)
    ///     }
    /// }
    ///
    /// let auth = Middleware::from_fn(require_token);
    /// ```
    pub fn from_fn<H, R, E>(handler: H) -> Middleware
    where
        H: Fn(Request<Full<Bytes>>, Next) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler = Arc::new(handler);
        Middleware::new(move |next: Next| {
            let handler = handler.clone();
            Next::new(move |req| {
                let fut = handler(req, next.clone());
                async move { fut.await.map_err(Into::<RouteError>::into) }
            })
        })
        .with_name("from_fn")
    }

    /// Sets the name shown by the `Debug` output of routes.
    pub fn with_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Middleware {
        self.name = name.into();
        self
    }

    /// Returns the middleware name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn wrap(&self, next: Next) -> Next {
        (self.wrap)(next)
    }
}

impl Debug for Middleware {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ name: {:?} }}", self.name)
    }
}

/// Composes `middleware` around `terminal` so that the first middleware is the outermost one.
pub(crate) fn compose(middleware: &[Middleware], terminal: Next) -> Next {
    middleware.iter().rev().fold(terminal, |next, m| m.wrap(next))
}
