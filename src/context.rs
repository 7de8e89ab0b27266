use crate::constants::{APP_ENV_VAR, DEVELOPMENT, FALLBACK_ENV_VAR, LOGGER_SERVICE};
use crate::container::ServiceContainer;
use crate::logger::{Logger, TracingLogger};
use std::env;
use std::sync::Arc;

/// Selects verbose (development) or terse (production) error rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Reads `APP_ENV`, then `ENVIRONMENT`. Only the value `development` selects
    /// [`Environment::Development`]; anything else, including an unset variable, is production.
    pub fn from_env() -> Environment {
        let value = env::var(APP_ENV_VAR).or_else(|_| env::var(FALLBACK_ENV_VAR));
        match value {
            Ok(ref v) if v.trim().eq_ignore_ascii_case(DEVELOPMENT) => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// The application context shared by the router, the error handler and middleware constructors.
///
/// It is built once by the bootstrap code and passed explicitly to every component that needs the
/// environment flag or the service container. Cloning is cheap.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use switchyard::{AppContext, Environment, Logger, TracingLogger, LOGGER_SERVICE};
///
/// let ctx = AppContext::new(Environment::Production);
/// ctx.services()
///     .register::<dyn Logger, _>(LOGGER_SERVICE, |_| Arc::new(TracingLogger), true);
///
/// ctx.logger().info("ready");
/// ```
#[derive(Clone)]
pub struct AppContext {
    environment: Environment,
    services: Arc<ServiceContainer>,
}

impl AppContext {
    pub fn new(environment: Environment) -> AppContext {
        AppContext::with_services(environment, Arc::new(ServiceContainer::new()))
    }

    pub fn with_services(environment: Environment, services: Arc<ServiceContainer>) -> AppContext {
        AppContext { environment, services }
    }

    /// Builds a context from the process environment with an empty container.
    pub fn from_env() -> AppContext {
        AppContext::new(Environment::from_env())
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }

    pub fn services(&self) -> &Arc<ServiceContainer> {
        &self.services
    }

    /// Resolves the registered `logger` service, falling back to [`TracingLogger`] when none is
    /// registered or its factory fails.
    pub fn logger(&self) -> Arc<dyn Logger> {
        match self.services.logger() {
            Ok(logger) => logger,
            Err(err) => {
                tracing::trace!("using the default logger: {}", err);
                Arc::new(TracingLogger)
            }
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        AppContext::new(Environment::default())
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("environment", &self.environment)
            .field("has_logger", &self.services.contains(LOGGER_SERVICE))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLogger(AtomicUsize);

    impl Logger for CountingLogger {
        fn info(&self, _: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn error(&self, _: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn debug(&self, _: &str) {}
    }

    #[test]
    fn should_fall_back_to_tracing_logger() {
        let ctx = AppContext::new(Environment::Development);
        assert!(ctx.is_development());
        // Must not panic without a registered logger.
        ctx.logger().info("no logger registered");
    }

    #[test]
    fn should_use_registered_logger() {
        let ctx = AppContext::new(Environment::Production);
        let logger = Arc::new(CountingLogger(AtomicUsize::new(0)));
        let shared = logger.clone();
        ctx.services()
            .register::<dyn Logger, _>(LOGGER_SERVICE, move |_| shared.clone(), true);

        ctx.logger().info("one");
        ctx.logger().error("two");
        assert_eq!(logger.0.load(Ordering::SeqCst), 2);
    }
}
