use crate::handler::Next;
use crate::middleware::Middleware;
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Request;
use std::future::Future;
use std::sync::Arc;

impl Middleware {
    /// Creates a pre middleware: it receives the request, may transform it, and hands it to the
    /// next handler. Returning an error skips the rest of the chain and renders a `500`.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, header::HeaderValue, Request};
    /// use std::convert::Infallible;
    /// use switchyard::{Middleware, Router};
    ///
    /// async fn tag_request(mut req: Request<Full<Bytes>>) -> Result<Request<Full<Bytes>>, Infallible> {
    ///     req.headers_mut().insert("x-tagged", HeaderValue::from_static("1"));
    ///     Ok(req)
    /// }
    ///
    /// let router = Router::builder().middleware(Middleware::pre(tag_request)).build().unwrap();
    /// ```
    pub fn pre<H, R, E>(handler: H) -> Middleware
    where
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Request<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler = Arc::new(handler);
        Middleware::new(move |next: Next| {
            let handler = handler.clone();
            Next::new(move |req| {
                let transformed = handler(req);
                let next = next.clone();
                async move {
                    let req = transformed.await.map_err(Into::<RouteError>::into)?;
                    next.run(req).await
                }
            })
        })
        .with_name("pre")
    }
}
