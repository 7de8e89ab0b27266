pub(crate) const APP_ENV_VAR: &str = "APP_ENV";
pub(crate) const FALLBACK_ENV_VAR: &str = "ENVIRONMENT";
pub(crate) const DEVELOPMENT: &str = "development";

/// The name under which the request logger resolves the [`Logger`](crate::Logger) service.
pub const LOGGER_SERVICE: &str = "logger";

/// Directory searched for `{status}.html` error pages when none is configured.
pub const DEFAULT_ERROR_VIEWS: &str = "resources/views/errors";

pub(crate) const CATCH_ALL_SEGMENT: &str = "*";
pub(crate) const CATCH_ALL_GROUP: &str = "__catch_all";
pub(crate) const DEFAULT_SEGMENT_REGEX: &str = "[^/]+";
