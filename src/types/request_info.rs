use crate::types::{RequestMeta, RouteParams};
use hyper::{HeaderMap, Method, Request, Uri, Version};
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;

/// Represents some information for the incoming request.
///
/// It's used to access request information e.g. headers, method, uri etc for the
/// [Post Middleware](./index.html#post-middleware) and for the error handlers, which run after the
/// request itself has been consumed by the handler chain.
#[derive(Clone)]
pub struct RequestInfo {
    inner: Arc<Inner>,
    route_params: RouteParams,
}

struct Inner {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
}

impl RequestInfo {
    pub(crate) fn new_from_req<T>(req: &Request<T>) -> Self {
        let meta = req.extensions().get::<RequestMeta>();
        RequestInfo {
            inner: Arc::new(Inner {
                method: req.method().clone(),
                uri: req.uri().clone(),
                version: req.version(),
                headers: req.headers().clone(),
                remote_addr: meta.and_then(|m| m.remote_addr().copied()),
            }),
            route_params: meta.and_then(|m| m.route_params().cloned()).unwrap_or_default(),
        }
    }

    pub(crate) fn with_route_params(&self, route_params: RouteParams) -> Self {
        RequestInfo {
            inner: self.inner.clone(),
            route_params,
        }
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Returns the request method type.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Returns the request uri.
    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version
    }

    /// Returns the remote address of the connection, if the request came through a hyper connection.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.inner.remote_addr
    }

    /// Returns the parameters bound by the matched route. Empty when no route matched.
    pub fn params(&self) -> &RouteParams {
        &self.route_params
    }
}

impl Debug for RequestInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInfo")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .field("remote_addr", &self.inner.remote_addr)
            .field("route_params", &self.route_params)
            .finish()
    }
}
