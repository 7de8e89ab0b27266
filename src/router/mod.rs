use crate::context::AppContext;
use crate::error_handler::ErrorHandler;
use crate::handler::Next;
use crate::helpers;
use crate::route::Route;
use crate::types::{RequestInfo, RequestMeta, RouteParams};
use crate::{Error, RouteError};
use futures::FutureExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

// Registration shortcuts shared by `RouterBuilder` and `Group`. Both types provide
// `add(method, path, handler)`.
macro_rules! route_shortcuts {
    ($($(#[$doc:meta])* $name:ident => $method:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<P, H, R, E>(self, path: P, handler: H) -> Self
            where
                P: Into<String>,
                H: Fn(hyper::Request<http_body_util::Full<hyper::body::Bytes>>) -> R + Send + Sync + 'static,
                R: std::future::Future<Output = Result<hyper::Response<http_body_util::Full<hyper::body::Bytes>>, E>>
                    + Send
                    + 'static,
                E: Into<crate::RouteError> + 'static,
            {
                self.add($method, path, handler)
            }
        )*
    };
}

pub use self::builder::RouterBuilder;
pub use self::group::Group;

mod builder;
mod group;

/// Represents a modular, lightweight and mountable router type.
///
/// A router owns a flat, ordered table of [`Route`]s. Groups are expanded into that table while
/// the router is built, so matching is a linear scan in registration order where the first route
/// whose method and path both match wins.
///
/// A router is immutable once built and is cheap to clone; every clone dispatches through the same
/// route table. It serves requests through [`Router::handle`] or, over hyper connections, through
/// [`RouterService`](crate::RouterService).
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request, Response};
/// use switchyard::prelude::*;
/// use switchyard::{Middleware, Router};
/// use std::convert::Infallible;
///
/// async fn list_users(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     Ok(Response::new(Full::new(Bytes::from("users"))))
/// }
///
/// async fn show_user(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     let id = req.param("id").cloned().unwrap_or_default();
///     Ok(Response::new(Full::new(Bytes::from(format!("user {}", id)))))
/// }
///
/// let router = Router::builder()
///     .group("/api", |api| {
///         api.middleware(Middleware::pre(|req| async move { Ok::<_, Infallible>(req) }))
///             .group("/v1", |v1| v1.get("/users", list_users).get("/users/{id:\\d+}", show_user))
///     })
///     .build()
///     .unwrap();
///
/// assert!(router.lookup(&hyper::Method::GET, "/api/v1/users/7").is_ok());
/// assert!(router.lookup(&hyper::Method::GET, "/api/v1/users/bob").is_err());
/// ```
#[derive(Clone)]
pub struct Router {
    shared: Arc<Shared>,
    // Global middleware composed around the dispatch of `shared`.
    entry: Next,
}

struct Shared {
    routes: Vec<Route>,
    errors: ErrorHandler,
    context: AppContext,
}

/// A route selected by [`Router::lookup`] together with the parameters bound from the path.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    route: &'a Route,
    params: RouteParams,
}

impl<'a> RouteMatch<'a> {
    pub fn route(&self) -> &'a Route {
        self.route
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub fn into_params(self) -> RouteParams {
        self.params
    }
}

impl Router {
    pub(crate) fn new(
        routes: Vec<Route>,
        global: &[crate::Middleware],
        errors: ErrorHandler,
        context: AppContext,
    ) -> Router {
        if context.is_development() {
            helpers::install_backtrace_hook();
        }
        let shared = Arc::new(Shared { routes, errors, context });

        let dispatcher = shared.clone();
        let terminal = Next::new(move |req| {
            let shared = dispatcher.clone();
            async move { Ok::<_, RouteError>(shared.dispatch(req).await) }
        });

        Router {
            entry: crate::middleware::compose(global, terminal),
            shared,
        }
    }

    /// Return a [RouterBuilder](./struct.RouterBuilder.html) instance to build a `Router`.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Returns the flattened route table in matching order.
    pub fn routes(&self) -> &[Route] {
        &self.shared.routes
    }

    pub fn context(&self) -> &AppContext {
        &self.shared.context
    }

    /// Finds the first route registered for `method` whose pattern matches the decoded `path`.
    ///
    /// The returned parameters are bound for this call only; the route itself is never modified,
    /// so concurrent lookups of the same route cannot observe each other's values.
    pub fn lookup(&self, method: &Method, path: &str) -> crate::Result<RouteMatch<'_>> {
        self.shared.lookup(method, path)
    }

    /// Dispatches a request and always produces a response.
    ///
    /// The global middleware runs first, then the matched route's chain. A path which cannot be
    /// percent-decoded is answered with `400`, an unmatched request with `404`, and a failing or
    /// panicking handler with `500`, all rendered by the router's [`ErrorHandler`].
    pub async fn handle(&self, mut req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        req.extensions_mut().insert(self.shared.context.clone());
        let req_info = RequestInfo::new_from_req(&req);

        let entry = &self.entry;
        let cause = match self.shared.recover(&req_info, async move { entry.run(req).await }).await {
            Ok(res) => return res,
            Err(cause) => cause,
        };

        self.shared
            .errors
            .handle(&req_info, StatusCode::INTERNAL_SERVER_ERROR, Some(&cause))
            .await
    }
}

impl Shared {
    fn lookup(&self, method: &Method, path: &str) -> crate::Result<RouteMatch<'_>> {
        self.routes
            .iter()
            .find_map(|route| route.is_match(method, path).map(|params| RouteMatch { route, params }))
            .ok_or_else(|| Error::NoRouteMatch {
                method: method.clone(),
                path: path.to_owned(),
            })
    }

    async fn dispatch(&self, mut req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        let req_info = RequestInfo::new_from_req(&req);

        let path = match helpers::percent_decode_request_path(req.uri().path()) {
            Ok(path) => path,
            Err(err) => {
                let cause: RouteError = err.into();
                return self.errors.handle(&req_info, StatusCode::BAD_REQUEST, Some(&cause)).await;
            }
        };

        let RouteMatch { route, params } = match self.lookup(req.method(), &path) {
            Ok(found) => found,
            Err(err) => {
                let status = err.status();
                let cause: RouteError = err.into();
                return self.errors.handle(&req_info, status, Some(&cause)).await;
            }
        };

        let req_info = req_info.with_route_params(params.clone());
        helpers::update_req_meta_in_extensions(req.extensions_mut(), RequestMeta::with_route_params(params));

        match self.recover(&req_info, async move { route.chain.run(req).await }).await {
            Ok(res) => res,
            Err(cause) => {
                self.errors
                    .handle_route_failure(&req_info, cause, route.err_handler.as_ref())
                    .await
            }
        }
    }

    // Polls a handler future, converting both an `Err` and a panic into a logged `RouteError`.
    // Callers pass an `async` block so that panics raised while building the future are caught too.
    async fn recover<F>(&self, req_info: &RequestInfo, fut: F) -> Result<Response<Full<Bytes>>, RouteError>
    where
        F: Future<Output = Result<Response<Full<Bytes>>, RouteError>>,
    {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(res)) => Ok(res),
            Ok(Err(err)) => {
                self.context.logger().error(&format!(
                    "Handler for {} {} failed: {}",
                    req_info.method(),
                    req_info.uri().path(),
                    err
                ));
                Err(err)
            }
            Err(payload) => Err(self.panic_cause(req_info, payload)),
        }
    }

    fn panic_cause(&self, req_info: &RequestInfo, payload: Box<dyn Any + Send>) -> RouteError {
        let message = helpers::panic_message(payload.as_ref());

        let mut log = format!(
            "Handler for {} {} panicked: {}",
            req_info.method(),
            req_info.uri().path(),
            message
        );
        let backtrace = helpers::take_panic_backtrace()
            .filter(|_| self.context.is_development())
            .map(|bt| bt.to_string());
        if let Some(ref backtrace) = backtrace {
            log.push_str(&format!("\n{}", backtrace));
        }
        self.context.logger().error(&log);

        Error::HandlerPanic { message, backtrace }.into()
    }
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ Routes: {:?}, Errors: {:?} }}", self.shared.routes, self.shared.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Middleware;
    use http_body_util::BodyExt;
    use std::convert::Infallible;

    async fn ok(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
        Ok(Response::new(Full::new(Bytes::from("ok"))))
    }

    fn request(method: Method, uri: &str) -> Request<Full<Bytes>> {
        Request::builder().method(method).uri(uri).body(Full::new(Bytes::new())).unwrap()
    }

    async fn text(res: Response<Full<Bytes>>) -> String {
        String::from_utf8(res.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap()
    }

    #[test]
    fn should_keep_registration_order() {
        let router = Router::builder()
            .get("/users/me", ok)
            .get("/users/{id}", ok)
            .post("/users", ok)
            .build()
            .unwrap();

        let paths: Vec<&str> = router.routes().iter().map(Route::path).collect();
        assert_eq!(paths, vec!["/users/me", "/users/{id}", "/users"]);

        let found = router.lookup(&Method::GET, "/users/me").unwrap();
        assert_eq!(found.route().path(), "/users/me");
        assert!(found.params().is_empty());
    }

    #[test]
    fn should_report_no_route_match() {
        let router = Router::builder().get("/users", ok).build().unwrap();
        match router.lookup(&Method::DELETE, "/users") {
            Err(Error::NoRouteMatch { method, path }) => {
                assert_eq!(method, Method::DELETE);
                assert_eq!(path, "/users");
            }
            other => panic!("unexpected lookup result: {:?}", other.map(|m| m.into_params())),
        }
    }

    #[tokio::test]
    async fn should_reject_undecodable_paths() {
        let router = Router::builder().get("/{name}", ok).build().unwrap();
        let res = router.handle(request(Method::GET, "/%FF")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_run_global_middleware_around_not_found() {
        let stamp = Middleware::post(|mut res: Response<Full<Bytes>>| async move {
            res.headers_mut().insert("x-global", "1".parse().unwrap());
            Ok::<_, Infallible>(res)
        });
        let router = Router::builder().middleware(stamp).get("/", ok).build().unwrap();

        let res = router.handle(request(Method::GET, "/nowhere")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()["x-global"], "1");
    }

    #[tokio::test]
    async fn should_render_global_middleware_failure_as_500() {
        let failing = Middleware::pre(|_req: Request<Full<Bytes>>| async move {
            Err::<Request<Full<Bytes>>, _>(Error::new("rejected upstream"))
        });
        let router = Router::builder().middleware(failing).get("/", ok).build().unwrap();

        let res = router.handle(request(Method::GET, "/")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(res).await, "Internal Server Error");
    }
}
