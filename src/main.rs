use http_body_util::Full;
use hyper::body::Body as _;
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
// Import the prelude traits.
use switchyard::prelude::*;
use switchyard::{
    init_tracing, AppContext, CorsOptions, Logger, Middleware, RequestInfo, Route, Router, RouterService,
    TracingLogger, LOGGER_SERVICE,
};
use std::sync::Arc;
use std::{convert::Infallible, net::SocketAddr};
use tokio::net::TcpListener;

// Shared application state, registered as a singleton service.
struct Greeting(String);

async fn home_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, switchyard::RouteError> {
    let ctx = req.app_context().ok_or("missing application context")?;
    let greeting = ctx.services().resolve::<Greeting>("greeting")?;

    Ok(Response::new(Full::new(Bytes::from(greeting.0.clone()))))
}

async fn user_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let user_id = req.param("userId").cloned().unwrap_or_default();
    Ok(Response::new(Full::new(Bytes::from(format!("Hello {}", user_id)))))
}

async fn create_user(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let size = req.body().size_hint().exact().unwrap_or(0);
    let mut res = Response::new(Full::new(Bytes::from(format!("Created from {} bytes of form data", size))));
    *res.status_mut() = StatusCode::CREATED;
    Ok(res)
}

async fn not_found(info: RequestInfo) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(Bytes::from(format!("Nothing lives at {}", info.uri().path()))));
    *res.status_mut() = StatusCode::NOT_FOUND;
    res
}

fn router(ctx: &AppContext) -> switchyard::Result<Router> {
    Router::builder()
        .context(ctx.clone())
        .middleware(Middleware::cors(CorsOptions {
            allowed_origins: vec!["*".to_owned()],
            allowed_methods: vec!["GET".to_owned(), "POST".to_owned()],
            allowed_headers: vec!["Content-Type".to_owned()],
            allow_credentials: false,
        }))
        .middleware(Middleware::request_logger(ctx))
        .get("/", home_handler)
        .group("/api", |api| {
            api.group("/v1", |v1| {
                v1.get("/users/{userId:\\d+}", user_handler)
                    .route(Route::post("/users", create_user).middleware(Middleware::required_fields(["name", "email"])))
            })
        })
        .status_handler(StatusCode::NOT_FOUND, not_found)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ctx = AppContext::from_env();
    init_tracing(ctx.environment());

    ctx.services()
        .register::<dyn Logger, _>(LOGGER_SERVICE, |_| Arc::new(TracingLogger), true);
    ctx.services()
        .register("greeting", |_| Arc::new(Greeting("Home page".to_owned())), true);

    // Create a Service from the router above to handle incoming requests.
    let service = Arc::new(RouterService::new(router(&ctx)?));

    // The address on which the server will be listening.
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = TcpListener::bind(addr).await?;
    ctx.logger().info(&format!("App is running on: {}", addr));

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                ctx.logger().error(&format!("Error accepting connection: {}", err));
                continue;
            }
        };
        let service = Arc::clone(&service);
        let logger = ctx.logger();

        tokio::task::spawn(async move {
            let request_service = match service.call(&stream).await {
                Ok(svc) => svc,
                Err(never) => match never {},
            };
            let io = TokioIo::new(stream);
            let builder = Builder::new(TokioExecutor::new());
            if let Err(err) = builder.serve_connection(io, request_service).await {
                logger.error(&format!("Error serving connection: {:?}", err));
            }
        });
    }
}
