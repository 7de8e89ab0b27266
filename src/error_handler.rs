use crate::constants::DEFAULT_ERROR_VIEWS;
use crate::context::AppContext;
use crate::helpers;
use crate::types::RequestInfo;
use crate::{Error, RouteError};
use futures::future::BoxFuture;
use futures::FutureExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) type StatusHandler = Arc<dyn Fn(RequestInfo) -> BoxFuture<'static, Response<Full<Bytes>>> + Send + Sync + 'static>;

pub(crate) type RouteErrHandler =
    Arc<dyn Fn(RouteError, RequestInfo) -> BoxFuture<'static, Response<Full<Bytes>>> + Send + Sync + 'static>;

pub(crate) fn boxed_status_handler<H, R>(handler: H) -> StatusHandler
where
    H: Fn(RequestInfo) -> R + Send + Sync + 'static,
    R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    Arc::new(move |req_info| handler(req_info).boxed())
}

pub(crate) fn boxed_route_err_handler<H, R>(handler: H) -> RouteErrHandler
where
    H: Fn(RouteError, RequestInfo) -> R + Send + Sync + 'static,
    R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    Arc::new(move |err, req_info| handler(err, req_info).boxed())
}

/// Source of the custom error pages rendered in production.
pub trait ErrorPages: Send + Sync {
    /// Renders the HTML page for `status`. Any error makes the error handler fall back to the
    /// plain status text.
    fn render(&self, status: StatusCode) -> BoxFuture<'_, crate::Result<String>>;
}

/// [`ErrorPages`] read from `{dir}/{status}.html`, e.g. `resources/views/errors/404.html`.
#[derive(Debug, Clone)]
pub struct FileErrorPages {
    dir: PathBuf,
}

impl FileErrorPages {
    pub fn new<P: Into<PathBuf>>(dir: P) -> FileErrorPages {
        FileErrorPages { dir: dir.into() }
    }
}

impl Default for FileErrorPages {
    fn default() -> Self {
        FileErrorPages::new(DEFAULT_ERROR_VIEWS)
    }
}

impl ErrorPages for FileErrorPages {
    fn render(&self, status: StatusCode) -> BoxFuture<'_, crate::Result<String>> {
        let path = self.dir.join(format!("{}.html", status.as_u16()));
        async move {
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::TemplateRender {
                    status,
                    reason: format!("{}: {}", path.display(), e),
                })
        }
        .boxed()
    }
}

/// Renders error responses for a router.
///
/// For a given status the first applicable source wins:
///
/// 1. the handler registered for that status with
///    [`RouterBuilder::status_handler`](crate::RouterBuilder::status_handler);
/// 2. in development, a plain text body with the status, the cause and a backtrace;
/// 3. in production, the page from [`ErrorPages`], falling back to the canonical status text.
///
/// Rendering never fails: a panicking status handler or a missing page degrades to the next
/// source instead.
pub struct ErrorHandler {
    context: AppContext,
    pages: Arc<dyn ErrorPages>,
    status_handlers: HashMap<StatusCode, StatusHandler>,
}

impl ErrorHandler {
    pub(crate) fn new(context: AppContext) -> ErrorHandler {
        ErrorHandler {
            context,
            pages: Arc::new(FileErrorPages::default()),
            status_handlers: HashMap::new(),
        }
    }

    pub(crate) fn set_pages(&mut self, pages: Arc<dyn ErrorPages>) {
        self.pages = pages;
    }

    pub(crate) fn set_status_handler(&mut self, status: StatusCode, handler: StatusHandler) {
        self.status_handlers.insert(status, handler);
    }

    /// Renders the response for `status`. `cause` is shown in development mode.
    pub async fn handle(&self, req_info: &RequestInfo, status: StatusCode, cause: Option<&RouteError>) -> Response<Full<Bytes>> {
        let logger = self.context.logger();

        if let Some(handler) = self.status_handlers.get(&status) {
            logger.info(&format!(
                "Handling error {} for path {}",
                status.as_u16(),
                req_info.uri().path()
            ));

            let outcome = AssertUnwindSafe(async { handler(req_info.clone()).await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(res) => return res,
                Err(payload) => logger.error(&format!(
                    "Error handler for status {} panicked: {}",
                    status.as_u16(),
                    helpers::panic_message(payload.as_ref())
                )),
            }
        } else if status.is_server_error() {
            logger.error(&format!(
                "Unhandled error {} for path {}",
                status.as_u16(),
                req_info.uri().path()
            ));
        } else {
            logger.debug(&format!(
                "Unhandled error {} for path {}",
                status.as_u16(),
                req_info.uri().path()
            ));
        }

        if self.context.is_development() {
            return self.render_verbose(status, cause);
        }

        self.render_page(status).await
    }

    /// Renders a `500` for a failure inside a route, preferring the route's own error handler.
    pub(crate) async fn handle_route_failure(
        &self,
        req_info: &RequestInfo,
        cause: RouteError,
        route_handler: Option<&RouteErrHandler>,
    ) -> Response<Full<Bytes>> {
        let handler = match route_handler {
            Some(handler) => handler,
            None => return self.handle(req_info, StatusCode::INTERNAL_SERVER_ERROR, Some(&cause)).await,
        };

        let message = cause.to_string();
        let outcome = AssertUnwindSafe(async { handler(cause, req_info.clone()).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(res) => res,
            Err(payload) => {
                self.context.logger().error(&format!(
                    "Route error handler for {} panicked: {}",
                    req_info.uri().path(),
                    helpers::panic_message(payload.as_ref())
                ));
                let cause: RouteError = Error::new(message).into();
                self.handle(req_info, StatusCode::INTERNAL_SERVER_ERROR, Some(&cause)).await
            }
        }
    }

    fn render_verbose(&self, status: StatusCode, cause: Option<&RouteError>) -> Response<Full<Bytes>> {
        let panic_site = cause
            .and_then(|cause| cause.downcast_ref::<Error>())
            .and_then(|err| match err {
                Error::HandlerPanic { backtrace, .. } => backtrace.clone(),
                _ => None,
            });
        let backtrace = panic_site.unwrap_or_else(|| Backtrace::force_capture().to_string());

        let cause = match cause {
            Some(cause) => cause.to_string(),
            None => helpers::status_text(status).to_owned(),
        };

        helpers::text_response(status, format!("Error {}: {}\n\n{}", status.as_u16(), cause, backtrace))
    }

    async fn render_page(&self, status: StatusCode) -> Response<Full<Bytes>> {
        match self.pages.render(status).await {
            Ok(page) => {
                let mut res = Response::new(Full::new(Bytes::from(page)));
                *res.status_mut() = status;
                res.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/html; charset=utf-8"),
                );
                res
            }
            Err(err) => {
                tracing::debug!("falling back to the status text: {}", err);
                helpers::text_response(status, helpers::status_text(status))
            }
        }
    }
}

impl Debug for ErrorHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut statuses: Vec<u16> = self.status_handlers.keys().map(|s| s.as_u16()).collect();
        statuses.sort_unstable();
        f.debug_struct("ErrorHandler")
            .field("environment", &self.context.environment())
            .field("status_handlers", &statuses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Environment;
    use http_body_util::BodyExt;
    use hyper::Request;

    struct StaticPages;

    impl ErrorPages for StaticPages {
        fn render(&self, status: StatusCode) -> BoxFuture<'_, crate::Result<String>> {
            async move {
                if status == StatusCode::NOT_FOUND {
                    Ok("<h1>Lost?</h1>".to_owned())
                } else {
                    Err(Error::TemplateRender {
                        status,
                        reason: "no page".to_owned(),
                    })
                }
            }
            .boxed()
        }
    }

    fn req_info() -> RequestInfo {
        let req = Request::builder().uri("/missing").body(()).unwrap();
        RequestInfo::new_from_req(&req)
    }

    async fn text(res: Response<Full<Bytes>>) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn should_render_verbose_in_development() {
        let handler = ErrorHandler::new(AppContext::new(Environment::Development));
        let cause: RouteError = "database is down".into();

        let res = handler
            .handle(&req_info(), StatusCode::INTERNAL_SERVER_ERROR, Some(&cause))
            .await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text(res).await.starts_with("Error 500: database is down\n\n"));
    }

    #[tokio::test]
    async fn should_render_pages_in_production() {
        let mut handler = ErrorHandler::new(AppContext::new(Environment::Production));
        handler.set_pages(Arc::new(StaticPages));

        let res = handler.handle(&req_info(), StatusCode::NOT_FOUND, None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(text(res).await, "<h1>Lost?</h1>");

        let res = handler.handle(&req_info(), StatusCode::FORBIDDEN, None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(text(res).await, "Forbidden");
    }

    #[tokio::test]
    async fn should_fall_back_when_page_file_is_missing() {
        let mut handler = ErrorHandler::new(AppContext::new(Environment::Production));
        handler.set_pages(Arc::new(FileErrorPages::new("definitely/not/a/dir")));

        let res = handler.handle(&req_info(), StatusCode::NOT_FOUND, None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(text(res).await, "Not Found");
    }

    #[tokio::test]
    async fn should_prefer_status_handler_and_survive_its_panic() {
        let mut handler = ErrorHandler::new(AppContext::new(Environment::Production));
        handler.set_pages(Arc::new(StaticPages));
        handler.set_status_handler(
            StatusCode::NOT_FOUND,
            boxed_status_handler(|info: RequestInfo| async move {
                helpers::text_response(StatusCode::NOT_FOUND, format!("custom 404 for {}", info.uri().path()))
            }),
        );
        handler.set_status_handler(
            StatusCode::SERVICE_UNAVAILABLE,
            boxed_status_handler(|_info: RequestInfo| async move {
                if true {
                    panic!("broken error page");
                }
                helpers::text_response(StatusCode::SERVICE_UNAVAILABLE, "unreachable")
            }),
        );

        let res = handler.handle(&req_info(), StatusCode::NOT_FOUND, None).await;
        assert_eq!(text(res).await, "custom 404 for /missing");

        let res = handler.handle(&req_info(), StatusCode::SERVICE_UNAVAILABLE, None).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(text(res).await, "Service Unavailable");
    }
}
