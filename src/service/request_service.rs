use crate::helpers;
use crate::router::Router;
use crate::types::RequestMeta;
use crate::{Error, RouteError};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{service::Service, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

/// A [`Service`] serving the requests of a single connection with a [`Router`].
///
/// The request body is collected before dispatch, so handlers always receive a
/// `Request<Full<Bytes>>` regardless of the transport's body type.
#[derive(Debug, Clone)]
pub struct RequestService {
    pub(crate) router: Router,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl<T> Service<Request<T>> for RequestService
where
    T: Body + Send + 'static,
    T::Data: Send,
    T::Error: Into<RouteError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = RouteError;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<T>) -> Self::Future {
        let router = self.router.clone();
        let remote_addr = self.remote_addr;

        let fut = async move {
            let (mut parts, body) = req.into_parts();

            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    let err: RouteError = err.into();
                    let cause: RouteError = Error::new(format!("Couldn't read the request body: {}", err)).into();
                    return Err(cause);
                }
            };

            if let Some(remote_addr) = remote_addr {
                helpers::update_req_meta_in_extensions(&mut parts.extensions, RequestMeta::with_remote_addr(remote_addr));
            }

            let req = Request::from_parts(parts, Full::new(body));
            Ok(router.handle(req).await)
        };

        Box::pin(fut)
    }
}

/// Creates a [`RequestService`] per connection from one shared [`Router`].
#[derive(Debug, Clone)]
pub struct RequestServiceBuilder {
    router: Router,
}

impl RequestServiceBuilder {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    pub fn build(&self, remote_addr: Option<SocketAddr>) -> RequestService {
        RequestService {
            router: self.router.clone(),
            remote_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::{RequestServiceBuilder, Router};
    use http::Method;
    use http_body_util::{BodyExt, Empty, Full};
    use hyper::service::Service;
    use hyper::{body::Bytes, Request, Response};
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::str::FromStr;

    #[tokio::test]
    async fn should_route_request() {
        const RESPONSE_TEXT: &str = "Hello world!";
        let remote_addr = SocketAddr::from_str("10.0.0.7:8080").unwrap();
        let router = Router::builder()
            .get("/", |req: Request<Full<Bytes>>| async move {
                let addr = req.remote_addr().map(|a| a.to_string()).unwrap_or_default();
                Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(format!("{} {}", RESPONSE_TEXT, addr)))))
            })
            .build()
            .unwrap();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Empty::<Bytes>::new())
            .unwrap();

        let builder = RequestServiceBuilder::new(router);
        let service = builder.build(Some(remote_addr));

        let resp: Response<Full<Bytes>> = service.call(req).await.unwrap();
        let body_bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, "Hello world! 10.0.0.7:8080");
    }
}
