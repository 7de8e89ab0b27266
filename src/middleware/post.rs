use crate::handler::Next;
use crate::middleware::Middleware;
use crate::types::RequestInfo;
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::future::Future;
use std::sync::Arc;

impl Middleware {
    /// Creates a post middleware: it receives the response produced by the rest of the chain and
    /// may transform it.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, header::HeaderValue, Response};
    /// use std::convert::Infallible;
    /// use switchyard::{Middleware, Router};
    ///
    /// async fn add_header(mut res: Response<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    ///     res.headers_mut().insert("x-powered-by", HeaderValue::from_static("switchyard"));
    ///     Ok(res)
    /// }
    ///
    /// let router = Router::builder().middleware(Middleware::post(add_header)).build().unwrap();
    /// ```
    pub fn post<H, R, E>(handler: H) -> Middleware
    where
        H: Fn(Response<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler = Arc::new(handler);
        Middleware::new(move |next: Next| {
            let handler = handler.clone();
            Next::new(move |req| {
                let produced = next.run(req);
                let handler = handler.clone();
                async move {
                    let res = produced.await?;
                    handler(res).await.map_err(Into::<RouteError>::into)
                }
            })
        })
        .with_name("post")
    }

    /// Creates a post middleware which can also access the [request info](./struct.RequestInfo.html)
    /// e.g. headers, method, uri etc. It should be used when the response transformation depends on
    /// the request.
    pub fn post_with_info<H, R, E>(handler: H) -> Middleware
    where
        H: Fn(Response<Full<Bytes>>, RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler = Arc::new(handler);
        Middleware::new(move |next: Next| {
            let handler = handler.clone();
            Next::new(move |req| {
                let req_info = RequestInfo::new_from_req(&req);
                let produced = next.run(req);
                let handler = handler.clone();
                async move {
                    let res = produced.await?;
                    handler(res, req_info).await.map_err(Into::<RouteError>::into)
                }
            })
        })
        .with_name("post_with_info")
    }
}
