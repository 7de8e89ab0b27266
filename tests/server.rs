use self::support::{into_text, serve};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use switchyard::prelude::*;
use switchyard::{AppContext, Environment, Middleware, Router};

mod support;

#[tokio::test]
async fn can_serve_requests_over_tcp() {
    let router = Router::builder()
        .context(AppContext::new(Environment::Production))
        .get("/whoami", |req: Request<Full<Bytes>>| async move {
            let ip = req.remote_addr().map(|addr| addr.ip().to_string()).unwrap_or_default();
            Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(ip))))
        })
        .post("/echo/{tag}", |req: Request<Full<Bytes>>| async move {
            let tag = req.param("tag").cloned().unwrap_or_default();
            let body = into_text(req.into_body()).await;
            Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(format!("{}:{}", tag, body)))))
        })
        .build()
        .unwrap();

    let serve = serve(router).await;
    let client = serve.client();

    let res = client
        .request(serve.new_request("GET", "/whoami").body(Full::new(Bytes::new())).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(into_text(res.into_body()).await, "127.0.0.1");

    let res = client
        .request(
            serve
                .new_request("post", "/echo/note")
                .body(Full::new(Bytes::from("hello over the wire")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(into_text(res.into_body()).await, "note:hello over the wire");

    let res = client
        .request(serve.new_request("GET", "/nope").body(Full::new(Bytes::new())).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    serve.shutdown();
}

#[tokio::test]
async fn can_keep_serving_after_a_panic() {
    let router = Router::builder()
        .context(AppContext::new(Environment::Production))
        .middleware(Middleware::post(|mut res: Response<Full<Bytes>>| async move {
            res.headers_mut().insert("x-served-by", "switchyard".parse().unwrap());
            Ok::<_, Infallible>(res)
        }))
        .get("/panic", |_| async move {
            if true {
                panic!("handler blew up");
            }
            Ok::<_, Infallible>(Response::new(Full::new(Bytes::new())))
        })
        .get("/fine", |_| async move { Ok::<_, Infallible>(Response::new(Full::new(Bytes::from("fine")))) })
        .build()
        .unwrap();

    let serve = serve(router).await;
    let client = serve.client();

    let res = client
        .request(serve.new_request("GET", "/panic").body(Full::new(Bytes::new())).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()["x-served-by"], "switchyard");

    let res = client
        .request(serve.new_request("GET", "/fine").body(Full::new(Bytes::new())).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(into_text(res.into_body()).await, "fine");

    serve.shutdown();
}
