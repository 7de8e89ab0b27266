use crate::context::Environment;
use tracing_subscriber::EnvFilter;

/// The logging capability the router and the middleware resolve from the
/// [`ServiceContainer`](crate::ServiceContainer).
///
/// The concrete sink is up to the implementor; [`TracingLogger`] forwards to `tracing`.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);

    fn error(&self, message: &str);

    fn debug(&self, message: &str);
}

/// A [`Logger`] which emits `tracing` events under the `switchyard` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "switchyard", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "switchyard", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "switchyard", "{}", message);
    }
}

/// Installs a global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise `debug` in development and `info` in
/// production. Development output is pretty-printed, production output is compact. Calling it
/// twice is harmless: the second subscriber is ignored.
pub fn init_tracing(environment: Environment) {
    let default_level = if environment.is_development() { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if environment.is_development() {
        builder.pretty().try_init()
    } else {
        builder.compact().try_init()
    };

    if let Err(err) = result {
        tracing::debug!("tracing subscriber already installed: {}", err);
    }
}
