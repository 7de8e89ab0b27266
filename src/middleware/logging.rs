use crate::context::AppContext;
use crate::ext::RequestExt;
use crate::handler::{HandlerFuture, Next};
use crate::middleware::Middleware;
use hyper::body::Body as _;
use hyper::header::HeaderMap;
use std::net::SocketAddr;
use std::time::Instant;

impl Middleware {
    /// Creates a request logging middleware.
    ///
    /// On every request the `logger` service is resolved from the context's container. When it
    /// can't be resolved the failure is reported through `tracing` and the request passes through
    /// unlogged; otherwise one line with the client IP, method, path, request size, status and
    /// duration is written through [`Logger::info`](crate::Logger::info) once the chain returns.
    pub fn request_logger(ctx: &AppContext) -> Middleware {
        let services = ctx.services().clone();

        Middleware::new(move |next: Next| {
            let services = services.clone();
            Next::new(move |req| -> HandlerFuture {
                let next = next.clone();
                let logger = match services.logger() {
                    Ok(logger) => logger,
                    Err(err) => {
                        tracing::warn!("Error resolving logger service: {}", err);
                        return next.run(req);
                    }
                };

                let start = Instant::now();
                let client_ip = client_ip(req.headers(), req.remote_addr());
                let method = req.method().clone();
                let path = req.uri().path().to_owned();
                let request_size = req.body().size_hint().exact().unwrap_or(0);

                Box::pin(async move {
                    let result = next.run(req).await;
                    let status = match result {
                        Ok(ref res) => res.status().as_u16().to_string(),
                        Err(_) => "error".to_owned(),
                    };

                    logger.info(&format!(
                        "Client IP: {} | Method: {} | Path: {} | Request Size: {} bytes | Status: {} | Duration: {:?}",
                        client_ip,
                        method,
                        path,
                        request_size,
                        status,
                        start.elapsed()
                    ));

                    result
                })
            })
        })
        .with_name("request_logger")
    }
}

fn client_ip(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .or_else(|| remote_addr.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "-".to_owned())
}
