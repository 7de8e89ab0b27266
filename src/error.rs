use hyper::{Method, StatusCode};

/// A boxed error type for route handlers, middleware and service factories.
///
/// Handlers may return any error type which converts into it; the router keeps it boxed until it
/// reaches an error handler, where the original error can be recovered by downcasting.
pub type RouteError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type used by the router, the error handler and the service container.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered route satisfies the request method and path. Rendered as `404`.
    #[error("no route matches {method} {path}")]
    NoRouteMatch { method: Method, path: String },

    /// A handler or middleware panicked while serving a request. Rendered as `500`.
    ///
    /// In development the backtrace taken at the panic site is kept for verbose error bodies.
    #[error("handler panicked: {message}")]
    HandlerPanic { message: String, backtrace: Option<String> },

    /// A service was requested by a name that was never registered.
    #[error("service `{0}` is not registered")]
    ServiceNotRegistered(String),

    /// A service is registered under the name but holds a different type.
    #[error("service `{name}` is not of type `{expected}`")]
    ServiceTypeMismatch { name: String, expected: &'static str },

    /// The factory of a service returned an error; the service stays unresolved.
    #[error("service `{name}` could not be constructed: {source}")]
    ServiceConstruction {
        name: String,
        #[source]
        source: RouteError,
    },

    /// A custom error page could not be loaded or rendered.
    #[error("could not render the error page for status {status}: {reason}")]
    TemplateRender { status: StatusCode, reason: String },

    /// A route path template is malformed. Raised while building a router.
    #[error("invalid route pattern `{template}`: {reason}")]
    InvalidPattern { template: String, reason: String },

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn new<M: Into<String>>(message: M) -> Error {
        Error::Message(message.into())
    }

    pub(crate) fn invalid_pattern<T: Into<String>, R: Into<String>>(template: T, reason: R) -> Error {
        Error::InvalidPattern {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// The response status this error maps to when it reaches the error handler.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_the_missing_service() {
        let err = Error::ServiceNotRegistered("mailer".to_owned());
        assert_eq!(err.to_string(), "service `mailer` is not registered");
    }

    #[test]
    fn should_map_no_match_to_not_found() {
        let err = Error::NoRouteMatch {
            method: Method::GET,
            path: "/nope".to_owned(),
        };
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::HandlerPanic {
                message: "boom".into(),
                backtrace: None,
            }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
