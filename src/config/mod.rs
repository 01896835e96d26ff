use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub gate: GateConfig,
    pub registry: RegistryConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Route serving the password challenge; always exempt from gating
    pub challenge_route: String,
    pub unlock_ttl_secs: i64,
    /// Path prefixes never evaluated by the gate
    pub exempt_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub idle_timeout_secs: i64,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_audit_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Gate overrides
        if let Ok(v) = env::var("GATE_CHALLENGE_ROUTE") {
            if v.starts_with('/') {
                self.gate.challenge_route = v;
            }
        }
        if let Ok(v) = env::var("GATE_UNLOCK_TTL_SECS") {
            self.gate.unlock_ttl_secs = v.parse().unwrap_or(self.gate.unlock_ttl_secs);
        }
        if let Ok(v) = env::var("GATE_EXEMPT_PATHS") {
            self.gate.exempt_paths = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Registry overrides
        if let Ok(v) = env::var("REGISTRY_MAX_LIMIT") {
            self.registry.max_limit = v.parse().unwrap_or(self.registry.max_limit);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("SESSION_IDLE_TIMEOUT_SECS") {
            self.session.idle_timeout_secs = v.parse().unwrap_or(self.session.idle_timeout_secs);
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIE") {
            self.session.secure_cookie = v.parse().unwrap_or(self.session.secure_cookie);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            gate: GateConfig {
                challenge_route: "/protected-page".to_string(),
                unlock_ttl_secs: 30 * 60,
                exempt_paths: vec!["/health".to_string(), "/api/protected-pages".to_string()],
            },
            registry: RegistryConfig { max_limit: 1000 },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            session: SessionConfig {
                cookie_name: "protected_pages_session".to_string(),
                idle_timeout_secs: 24 * 60 * 60,
                secure_cookie: false,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_audit_logging: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            gate: GateConfig {
                challenge_route: "/protected-page".to_string(),
                unlock_ttl_secs: 30 * 60,
                exempt_paths: vec!["/health".to_string(), "/api/protected-pages".to_string()],
            },
            registry: RegistryConfig { max_limit: 500 },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            session: SessionConfig {
                cookie_name: "protected_pages_session".to_string(),
                idle_timeout_secs: 12 * 60 * 60,
                secure_cookie: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_audit_logging: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            gate: GateConfig {
                challenge_route: "/protected-page".to_string(),
                unlock_ttl_secs: 30 * 60,
                exempt_paths: vec!["/health".to_string(), "/api/protected-pages".to_string()],
            },
            registry: RegistryConfig { max_limit: 100 },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            session: SessionConfig {
                cookie_name: "protected_pages_session".to_string(),
                idle_timeout_secs: 4 * 60 * 60,
                secure_cookie: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_audit_logging: true,
            },
        }
    }

    /// Whether the gate skips `path` entirely
    pub fn is_exempt(&self, path: &str) -> bool {
        path == self.gate.challenge_route
            || self
                .gate
                .exempt_paths
                .iter()
                .any(|prefix| path == prefix || path.starts_with(&format!("{}/", prefix.trim_end_matches('/'))))
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
