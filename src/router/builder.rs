use crate::context::AppContext;
use crate::error_handler::{boxed_status_handler, ErrorHandler, ErrorPages, StatusHandler};
use crate::middleware::Middleware;
use crate::route::{Route, RouteBuilder};
use crate::router::{Group, Router};
use crate::types::RequestInfo;
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

/// Builder for the [Router](./struct.Router.html) type.
///
/// Every method takes and returns the builder by value. A malformed route path does not panic
/// while registering; the first error is kept and returned by [`build`](RouterBuilder::build).
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request, Response, StatusCode};
/// use switchyard::{AppContext, Environment, Router, RouterBuilder};
/// use std::convert::Infallible;
///
/// async fn home(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     Ok(Response::new(Full::new(Bytes::from("home"))))
/// }
///
/// let builder: RouterBuilder = Router::builder()
///     .context(AppContext::new(Environment::Production))
///     .get("/", home)
///     .status_handler(StatusCode::NOT_FOUND, |info| async move {
///         let mut res = Response::new(Full::new(Bytes::from(format!("{} is not here", info.uri().path()))));
///         *res.status_mut() = StatusCode::NOT_FOUND;
///         res
///     });
///
/// let router = builder.build().unwrap();
/// ```
pub struct RouterBuilder {
    inner: crate::Result<BuilderInner>,
}

struct BuilderInner {
    routes: Vec<Route>,
    middleware: Vec<Middleware>,
    status_handlers: Vec<(StatusCode, StatusHandler)>,
    pages: Option<Arc<dyn ErrorPages>>,
    context: Option<AppContext>,
}

impl RouterBuilder {
    /// Creates a new `RouterBuilder` instance with default options.
    pub fn new() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Creates a new [Router](./struct.Router.html) instance from the added configuration.
    ///
    /// Without an explicit [`context`](RouterBuilder::context) the router reads its environment
    /// from `APP_ENV` / `ENVIRONMENT` and starts with an empty service container.
    pub fn build(self) -> crate::Result<Router> {
        self.inner.map(|inner| {
            let context = inner.context.unwrap_or_else(AppContext::from_env);

            let mut errors = ErrorHandler::new(context.clone());
            if let Some(pages) = inner.pages {
                errors.set_pages(pages);
            }
            for (status, handler) in inner.status_handlers {
                errors.set_status_handler(status, handler);
            }

            tracing::debug!(
                routes = inner.routes.len(),
                middleware = inner.middleware.len(),
                environment = ?context.environment(),
                "router built"
            );

            Router::new(inner.routes, &inner.middleware, errors, context)
        })
    }

    fn and_then<F: FnOnce(BuilderInner) -> crate::Result<BuilderInner>>(self, func: F) -> Self {
        RouterBuilder {
            inner: self.inner.and_then(func),
        }
    }
}

impl RouterBuilder {
    route_shortcuts! {
        /// Adds a new route with `GET` method and the handler at the specified path.
        ///
        /// # Examples
        ///
        /// ```
        /// use http_body_util::Full;
        /// use hyper::{body::Bytes, Request, Response};
        /// use switchyard::Router;
        /// use std::convert::Infallible;
        ///
        /// async fn home_handler(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
        ///     Ok(Response::new(Full::new(Bytes::from("home"))))
        /// }
        ///
        /// let router = Router::builder().get("/", home_handler).build().unwrap();
        /// ```
        get => Method::GET;
        /// Adds a new route with `POST` method and the handler at the specified path.
        post => Method::POST;
        /// Adds a new route with `PUT` method and the handler at the specified path.
        put => Method::PUT;
        /// Adds a new route with `DELETE` method and the handler at the specified path.
        delete => Method::DELETE;
        /// Adds a new route with `PATCH` method and the handler at the specified path.
        patch => Method::PATCH;
        /// Adds a new route with `HEAD` method and the handler at the specified path.
        head => Method::HEAD;
        /// Adds a new route with `OPTIONS` method and the handler at the specified path.
        options => Method::OPTIONS;
    }

    /// Adds a new route with the specified method and the handler at the specified path.
    pub fn add<P, H, R, E>(self, method: Method, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        self.route(Route::new(method, path, handler))
    }

    /// Adds a route carrying its own middleware or error handler.
    pub fn route(self, route: RouteBuilder) -> Self {
        self.and_then(move |mut inner| {
            inner.routes.push(route.expand("", &[])?);
            Ok(inner)
        })
    }

    /// Registers routes under a common path prefix.
    ///
    /// The closure receives a [`Group`]; everything registered on it, including nested groups, is
    /// flattened into this router's route table in registration order. See [`Group`].
    pub fn group<P, F>(self, prefix: P, f: F) -> Self
    where
        P: Into<String>,
        F: FnOnce(Group) -> Group,
    {
        self.and_then(move |mut inner| {
            let group = f(Group::new(prefix.into()));
            inner.routes.extend(group.into_routes(&[])?);
            Ok(inner)
        })
    }

    /// Adds a global middleware. Global middleware runs outside every group and route middleware
    /// and also wraps requests which match no route.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Request, Response};
    /// use switchyard::{CorsOptions, Middleware, Router};
    /// use std::convert::Infallible;
    ///
    /// async fn home_handler(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    ///     Ok(Response::new(Full::new(Bytes::from("home"))))
    /// }
    ///
    /// let router = Router::builder()
    ///     .middleware(Middleware::cors(CorsOptions::default()))
    ///     .get("/", home_handler)
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn middleware(self, m: Middleware) -> Self {
        self.and_then(move |mut inner| {
            inner.middleware.push(m);
            Ok(inner)
        })
    }

    /// Registers a handler rendering the response for `status`, e.g. a custom `404` page.
    ///
    /// It takes precedence over the development and production renderings. A panicking status
    /// handler falls back to them.
    pub fn status_handler<H, R>(self, status: StatusCode, handler: H) -> Self
    where
        H: Fn(RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        let handler = boxed_status_handler(handler);
        self.and_then(move |mut inner| {
            inner.status_handlers.push((status, handler));
            Ok(inner)
        })
    }

    /// Replaces the source of the production error pages. Defaults to
    /// [`FileErrorPages`](crate::FileErrorPages) reading `resources/views/errors`.
    pub fn error_pages<T: ErrorPages + 'static>(self, pages: T) -> Self {
        self.and_then(move |mut inner| {
            inner.pages = Some(Arc::new(pages));
            Ok(inner)
        })
    }

    /// Sets the application context: the environment and the service container used by the
    /// router's error handling.
    pub fn context(self, context: AppContext) -> Self {
        self.and_then(move |mut inner| {
            inner.context = Some(context);
            Ok(inner)
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> RouterBuilder {
        RouterBuilder {
            inner: Ok(BuilderInner {
                routes: Vec::new(),
                middleware: Vec::new(),
                status_handlers: Vec::new(),
                pages: None,
                context: None,
            }),
        }
    }
}

impl Debug for RouterBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.inner {
            Ok(ref inner) => write!(
                f,
                "{{ routes: {:?}, middleware: {:?}, status_handlers: {} }}",
                inner.routes,
                inner.middleware,
                inner.status_handlers.len()
            ),
            Err(ref err) => write!(f, "{{ error: {} }}", err),
        }
    }
}
