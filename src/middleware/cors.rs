use crate::handler::Next;
use crate::middleware::Middleware;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Response, StatusCode};
use std::sync::Arc;

/// Configuration for [`Middleware::cors`].
#[derive(Debug, Clone, Default)]
pub struct CorsOptions {
    /// Origins allowed to make cross-origin requests. `*` allows any origin; other entries are
    /// compared case-insensitively.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsOptions {
    fn allows(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(origin))
    }
}

struct Policy {
    options: CorsOptions,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl Policy {
    fn new(options: CorsOptions) -> Policy {
        let mut headers = Vec::with_capacity(3);

        let entries = [
            (header::ACCESS_CONTROL_ALLOW_METHODS, options.allowed_methods.join(", ")),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, options.allowed_headers.join(", ")),
        ];
        for (name, value) in entries {
            match HeaderValue::from_str(&value) {
                Ok(value) => headers.push((name, value)),
                Err(err) => tracing::warn!(header = %name, "skipping invalid CORS header value: {}", err),
            }
        }

        if options.allow_credentials {
            headers.push((
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            ));
        }

        Policy { options, headers }
    }

    fn apply(&self, origin: HeaderValue, target: &mut HeaderMap) {
        target.entry(header::ACCESS_CONTROL_ALLOW_ORIGIN).or_insert(origin);
        for (name, value) in &self.headers {
            target.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }
}

impl Middleware {
    /// Creates a middleware handling Cross-Origin Resource Sharing.
    ///
    /// When the request `Origin` is allowed, the `Access-Control-Allow-*` headers are added to the
    /// response unless the handler already set them, and an `OPTIONS` preflight request is
    /// answered with an empty `200` without reaching the handler. Requests without an allowed
    /// origin pass through untouched.
    ///
    /// Register it before middleware which may short-circuit, so that their responses carry the
    /// CORS headers too.
    pub fn cors(options: CorsOptions) -> Middleware {
        let policy = Arc::new(Policy::new(options));

        Middleware::new(move |next: Next| {
            let policy = policy.clone();
            Next::new(move |req| {
                let origin = req
                    .headers()
                    .get(header::ORIGIN)
                    .filter(|origin| origin.to_str().map(|o| policy.options.allows(o)).unwrap_or(false))
                    .cloned();
                let is_preflight = req.method() == Method::OPTIONS;
                let next = next.clone();
                let policy = policy.clone();

                async move {
                    let origin = match origin {
                        Some(origin) => origin,
                        None => return next.run(req).await,
                    };

                    if is_preflight {
                        let mut res = Response::new(Full::new(Bytes::new()));
                        *res.status_mut() = StatusCode::OK;
                        policy.apply(origin, res.headers_mut());
                        return Ok(res);
                    }

                    let mut res = next.run(req).await?;
                    policy.apply(origin, res.headers_mut());
                    Ok(res)
                }
            })
        })
        .with_name("cors")
    }
}
