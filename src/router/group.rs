use crate::middleware::Middleware;
use crate::route::{Route, RouteBuilder};
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;

/// A sub-registrar which prefixes paths and prepends inherited middleware.
///
/// A group is created by [`RouterBuilder::group`](crate::RouterBuilder::group) or, nested, by
/// [`Group::group`]. For a route registered on a group:
///
/// * the effective path is the parent prefixes, then this group's prefix, then the route path,
///   concatenated as written;
/// * the effective middleware is the parent middleware, then this group's middleware, then the
///   route's own middleware, outermost first.
///
/// Routes are expanded when the group is closed, so every middleware added with
/// [`Group::middleware`] applies to all routes and nested groups of the group, wherever the call
/// appears.
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request, Response};
/// use switchyard::{Middleware, Router};
/// use std::convert::Infallible;
///
/// async fn books(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     Ok(Response::new(Full::new(Bytes::from("books"))))
/// }
///
/// let router = Router::builder()
///     .group("/api", |api| {
///         api.middleware(Middleware::post(|res| async move { Ok::<_, Infallible>(res) }))
///             .group("/v1", |v1| v1.get("/books", books))
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(router.routes()[0].path(), "/api/v1/books");
/// assert_eq!(router.routes()[0].middleware().len(), 1);
/// ```
pub struct Group {
    prefix: String,
    middleware: Vec<Middleware>,
    entries: Vec<Entry>,
}

// Registration order is kept across routes and nested groups for first-match dispatch.
enum Entry {
    Route(RouteBuilder),
    Group(Group),
}

impl Group {
    pub(crate) fn new(prefix: String) -> Group {
        Group {
            prefix,
            middleware: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Returns the accumulated prefix of this group.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Appends a middleware inherited by every route and nested group of this group.
    pub fn middleware(mut self, m: Middleware) -> Self {
        self.middleware.push(m);
        self
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

    /// Adds a route carrying its own middleware or error handler. Its middleware runs inside the
    /// group's.
    pub fn route(mut self, route: RouteBuilder) -> Self {
        self.entries.push(Entry::Route(route));
        self
    }

    /// Registers a nested group. It inherits this group's prefix and middleware.
    pub fn group<P, F>(mut self, prefix: P, f: F) -> Self
    where
        P: Into<String>,
        F: FnOnce(Group) -> Group,
    {
        let child = f(Group::new(format!("{}{}", self.prefix, prefix.into())));
        self.entries.push(Entry::Group(child));
        self
    }

    pub(crate) fn into_routes(self, inherited: &[Middleware]) -> crate::Result<Vec<Route>> {
        let mut middleware = inherited.to_vec();
        middleware.extend(self.middleware);

        let mut routes = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            match entry {
                Entry::Route(route) => routes.push(route.expand(&self.prefix, &middleware)?),
                Entry::Group(group) => routes.extend(group.into_routes(&middleware)?),
            }
        }
        Ok(routes)
    }
}

impl Group {
    route_shortcuts! {
        /// Adds a new route with `GET` method to this group.
        get => Method::GET;
        /// Adds a new route with `POST` method to this group.
        post => Method::POST;
        /// Adds a new route with `PUT` method to this group.
        put => Method::PUT;
        /// Adds a new route with `DELETE` method to this group.
        delete => Method::DELETE;
        /// Adds a new route with `PATCH` method to this group.
        patch => Method::PATCH;
        /// Adds a new route with `HEAD` method to this group.
        head => Method::HEAD;
        /// Adds a new route with `OPTIONS` method to this group.
        options => Method::OPTIONS;
    }
}

impl Debug for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ prefix: {:?}, middleware: {:?}, entries: {} }}",
            self.prefix,
            self.middleware,
            self.entries.len()
        )
    }
}
