#![allow(dead_code)]

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use std::net::SocketAddr;
use std::sync::Arc;
use switchyard::{Router, RouterService};
use tokio::net::TcpListener;
use tokio::sync::oneshot::{self, Sender};

pub struct Serve {
    addr: SocketAddr,
    tx: Sender<()>,
}

impl Serve {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn new_request(&self, method: &str, route: &str) -> http::request::Builder {
        http::request::Request::builder()
            .method(method.to_ascii_uppercase().as_str())
            .uri(format!("http://{}{}", self.addr(), route))
    }

    pub fn client(&self) -> Client<HttpConnector, Full<Bytes>> {
        Client::builder(TokioExecutor::new()).build_http()
    }

    pub fn shutdown(self) {
        let _ = self.tx.send(());
    }
}

pub async fn serve(router: Router) -> Serve {
    // Bind a TCP listener to an available port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router_service = Arc::new(RouterService::new(router));
    let (tx, mut rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        loop {
            let stream = tokio::select! {
                _ = &mut rx => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => stream,
                    Err(_) => continue,
                },
            };

            let router_service = router_service.clone();
            tokio::spawn(async move {
                let request_service = match router_service.call(&stream).await {
                    Ok(svc) => svc,
                    Err(never) => match never {},
                };
                let io = TokioIo::new(stream);
                let builder = Builder::new(TokioExecutor::new());
                let _ = builder.serve_connection(io, request_service).await;
            });
        }
    });

    Serve { addr, tx }
}

pub fn request(method: Method, uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub fn text(body: &'static str) -> Response<Full<Bytes>> {
    Response::new(Full::new(Bytes::from(body)))
}

/// Dispatches through `Router::handle` and returns the status with the body text.
pub async fn call(router: &Router, req: Request<Full<Bytes>>) -> (StatusCode, String) {
    let res = router.handle(req).await;
    let status = res.status();
    (status, into_text(res.into_body()).await)
}

pub async fn into_text<B>(body: B) -> String
where
    B: hyper::body::Body<Data = Bytes> + Send,
    B::Error: std::fmt::Debug,
{
    String::from_utf8_lossy(&body.collect().await.unwrap().to_bytes()).to_string()
}
