use crate::router::Router;
use crate::service::request_service::{RequestService, RequestServiceBuilder};
use hyper::service::Service;
use std::convert::Infallible;
use std::future::{ready, Ready};
use tokio::net::TcpStream;

/// A [`Service`](https://docs.rs/hyper/1/hyper/service/trait.Service.html) which hands out a
/// [`RequestService`] for every accepted connection, tagged with the peer address.
///
/// # Examples
///
/// ```no_run
/// use http_body_util::Full;
/// use hyper::body::Bytes;
/// use hyper::service::Service;
/// use hyper::{Request, Response};
/// use hyper_util::rt::{TokioExecutor, TokioIo};
/// use hyper_util::server::conn::auto::Builder;
/// use switchyard::{Router, RouterService};
/// use std::convert::Infallible;
/// use std::net::SocketAddr;
/// use std::sync::Arc;
/// use tokio::net::TcpListener;
///
/// async fn home(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     Ok(Response::new(Full::new(Bytes::from("Home page"))))
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let router = Router::builder().get("/", home).build()?;
///     let service = Arc::new(RouterService::new(router));
///
///     let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
///     let listener = TcpListener::bind(addr).await?;
///
///     loop {
///         let (stream, _) = listener.accept().await?;
///         let router_service = service.clone();
///
///         tokio::spawn(async move {
///             let request_service = match router_service.call(&stream).await {
///                 Ok(svc) => svc,
///                 Err(never) => match never {},
///             };
///             let io = TokioIo::new(stream);
///             let builder = Builder::new(TokioExecutor::new());
///             if let Err(err) = builder.serve_connection(io, request_service).await {
///                 eprintln!("Error serving connection: {:?}", err);
///             }
///         });
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RouterService {
    builder: RequestServiceBuilder,
}

impl RouterService {
    /// Creates a new service with the provided router, ready to be called with accepted
    /// connections.
    pub fn new(router: Router) -> RouterService {
        RouterService {
            builder: RequestServiceBuilder::new(router),
        }
    }
}

impl Service<&TcpStream> for RouterService {
    type Response = RequestService;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn call(&self, conn: &TcpStream) -> Self::Future {
        let remote_addr = match conn.peer_addr() {
            Ok(addr) => Some(addr),
            Err(err) => {
                tracing::debug!("couldn't read the peer address: {}", err);
                None
            }
        };

        ready(Ok(self.builder.build(remote_addr)))
    }
}
