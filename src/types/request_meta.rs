use crate::types::RouteParams;
use std::net::SocketAddr;

/// Per-request metadata kept in the request extensions: where the request came from and the
/// parameters bound by the matched route.
#[derive(Debug, Clone, Default)]
pub(crate) struct RequestMeta {
    remote_addr: Option<SocketAddr>,
    route_params: Option<RouteParams>,
}

impl RequestMeta {
    pub fn with_remote_addr(remote_addr: SocketAddr) -> RequestMeta {
        RequestMeta {
            remote_addr: Some(remote_addr),
            route_params: None,
        }
    }

    pub fn with_route_params(route_params: RouteParams) -> RequestMeta {
        RequestMeta {
            remote_addr: None,
            route_params: Some(route_params),
        }
    }

    pub fn remote_addr(&self) -> Option<&SocketAddr> {
        self.remote_addr.as_ref()
    }

    pub fn route_params(&self) -> Option<&RouteParams> {
        self.route_params.as_ref()
    }

    pub fn extend(&mut self, other: RequestMeta) {
        if let Some(remote_addr) = other.remote_addr {
            self.remote_addr = Some(remote_addr);
        }

        if let Some(route_params) = other.route_params {
            match self.route_params {
                Some(ref mut existing) => existing.extend(route_params),
                None => self.route_params = Some(route_params),
            }
        }
    }
}
