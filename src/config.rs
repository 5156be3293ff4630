//! Application-level configuration loaded once from the environment at startup.

use std::env;

use thiserror::Error;

/// Supabase project URL (`https://<ref>.supabase.co`).
const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
/// Long-lived service-role key used for REST calls and issuer derivation.
pub(crate) const SERVICE_ROLE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";
/// Legacy JWT secret used to sign realtime broadcast tokens.
pub(crate) const JWT_SECRET_ENV: &str = "SUPABASE_JWT_SECRET";
/// Listening port overrides, checked in order.
const PORT_ENVS: [&str; 2] = ["PORT", "SERVER_PORT"];
const DEFAULT_PORT: u16 = 8080;

/// Startup configuration failures. Any of these prevents the service from serving requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("missing required environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The service-role key could not be decoded as a JWT.
    #[error("service-role key is not a valid JWT")]
    InvalidServiceKey {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    /// The service-role key carries no project reference to derive the issuer from.
    #[error("service-role key has no `ref` claim")]
    MissingProjectRef,
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Project URL without trailing slash.
    pub supabase_url: String,
    /// Service-role key for REST calls.
    pub service_role_key: String,
    /// Secret signing realtime tokens.
    pub jwt_secret: String,
    /// HTTP listening port.
    pub port: u16,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingEnvVar { var })
        };

        let supabase_url = required(SUPABASE_URL_ENV)?
            .trim_end_matches('/')
            .to_string();
        let service_role_key = required(SERVICE_ROLE_KEY_ENV)?;
        let jwt_secret = required(JWT_SECRET_ENV)?;

        let port = PORT_ENVS
            .iter()
            .find_map(|var| lookup(*var))
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            supabase_url,
            service_role_key,
            jwt_secret,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_required_values_and_default_port() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("SUPABASE_JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url, "https://abc.supabase.co");
        assert_eq!(config.service_role_key, "service");
        assert_eq!(config.jwt_secret, "secret");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn port_override_is_honoured() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("SUPABASE_JWT_SECRET", "secret"),
            ("SERVER_PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("SUPABASE_JWT_SECRET", "   "),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::MissingEnvVar {
                var: "SUPABASE_JWT_SECRET"
            }
        ));
    }
}
