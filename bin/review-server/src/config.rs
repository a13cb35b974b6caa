//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for review-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// against a local Ollama without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// sqlx SQLite URL (default: `"sqlite://review.db"`).  The file is
    /// created on first start.
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Base URL of the Ollama server used as the model gateway.
    pub ollama_url: String,

    /// Optional upper bound on a single model call.  `None` waits for as long
    /// as the model takes.
    pub ollama_timeout: Option<Duration>,

    /// Lifetime of a login session.
    pub session_ttl: Duration,

    /// Add the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,

    /// Usernames that receive the ADMIN role when they register.
    pub admin_usernames: Vec<String>,

    /// Comma-separated CORS origin allowlist.  `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,

    /// Directory holding the built frontend, served for non-API paths.
    pub client_dir: Option<PathBuf>,

    /// Serialize follow-up turns per review instead of letting concurrent
    /// turns interleave their messages.
    pub serialize_turns: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("REVIEW_BIND", "0.0.0.0:3000"),
            database_url: env_or("REVIEW_DATABASE_URL", "sqlite://review.db"),
            log_level: env_or("REVIEW_LOG", "info"),
            log_json: env_flag("REVIEW_LOG_JSON", false),
            ollama_url: env_or("REVIEW_OLLAMA_URL", "http://127.0.0.1:11434"),
            ollama_timeout: std::env::var("REVIEW_OLLAMA_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
            session_ttl: session_ttl_from_hours(parse_env("REVIEW_SESSION_TTL_HOURS", 24u64)),
            cookie_secure: env_flag("REVIEW_COOKIE_SECURE", false),
            admin_usernames: split_list(&env_or("REVIEW_ADMIN_USERS", "")),
            cors_allowed_origins: std::env::var("REVIEW_CORS_ORIGINS").ok(),
            enable_swagger: env_flag("REVIEW_ENABLE_SWAGGER", true),
            client_dir: std::env::var("REVIEW_CLIENT_DIR").ok().map(PathBuf::from),
            serialize_turns: env_flag("REVIEW_SERIALIZE_TURNS", true),
        }
    }

    pub fn is_admin_username(&self, username: &str) -> bool {
        self.admin_usernames.iter().any(|u| u == username)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".into(),
            database_url: "sqlite://review.db".into(),
            log_level: "info".into(),
            log_json: false,
            ollama_url: "http://127.0.0.1:11434".into(),
            ollama_timeout: None,
            session_ttl: Duration::from_secs(24 * 3600),
            cookie_secure: false,
            admin_usernames: Vec::new(),
            cors_allowed_origins: None,
            enable_swagger: true,
            client_dir: None,
            serialize_turns: true,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v))
        .unwrap_or(default)
}

/// Longest accepted session lifetime: ten years.
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

fn session_ttl_from_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.min(MAX_SESSION_TTL_HOURS) * 3600)
}

fn parse_flag(raw: &str) -> bool {
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn admin_list_ignores_blanks() {
        assert_eq!(split_list(" root, ,ops ,"), vec!["root", "ops"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn flags_accept_one_and_true() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("yes"));
    }

    #[test]
    fn session_ttl_is_clamped() {
        assert_eq!(session_ttl_from_hours(24), Duration::from_secs(24 * 3600));
        assert_eq!(
            session_ttl_from_hours(u64::MAX),
            Duration::from_secs(MAX_SESSION_TTL_HOURS * 3600)
        );
    }

    #[test]
    fn admin_lookup_is_exact() {
        let cfg = Config { admin_usernames: vec!["root".into()], ..Config::default() };
        assert!(cfg.is_admin_username("root"));
        assert!(!cfg.is_admin_username("Root"));
    }
}
