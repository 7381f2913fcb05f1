use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;

/// Immutable service configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    pub google: GoogleOAuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
}

/// Secret for the signed cookie used during the identity-provider handshake.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// The one origin the federated sign-in page posts its token to.
    pub client_url: String,
    pub allowed_origins: Vec<String>,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, core_config::env_var)
    }

    /// Build from any key lookup; blank values must already map to `None`.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup: &lookup };

        let environment: Environment = env
            .optional("ENVIRONMENT", "dev")
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let client_url = env
            .first_of(&["CLIENT_URL", "FRONTEND_URL"])
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        let config = IdentityConfig {
            common,
            environment,
            service_name: env.optional("SERVICE_NAME", "identity-service"),
            log_level: env.optional("LOG_LEVEL", "info"),
            otlp_endpoint: env.get("OTLP_ENDPOINT"),
            mongodb: MongoConfig {
                uri: env
                    .first_of(&["MONGODB_URI", "PASSDB"])
                    .ok_or_else(|| missing("MONGODB_URI"))?,
                database: env.optional("MONGODB_DATABASE", "medspace"),
            },
            jwt: JwtConfig {
                secret: Secret::new(env.required("JWT_SECRET")?),
            },
            session: SessionConfig {
                secret: Secret::new(env.required("SESSION_SECRET")?),
            },
            google: GoogleOAuthConfig {
                client_id: env.required_in_prod("GOOGLE_CLIENT_ID", is_prod)?,
                client_secret: Secret::new(
                    env.required_in_prod("GOOGLE_CLIENT_SECRET", is_prod)?,
                ),
                redirect_uri: env.optional(
                    "GOOGLE_REDIRECT_URI",
                    "http://localhost:5000/auth/google/callback",
                ),
            },
            security: SecurityConfig {
                allowed_origins: env
                    .get("ALLOWED_ORIGINS")
                    .unwrap_or_else(|| client_url.clone())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                client_url,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.security.client_url.contains('*') {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CLIENT_URL must be a single concrete origin"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.get(k))
    }

    fn optional(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String, AppError> {
        self.get(key).ok_or_else(|| missing(key))
    }

    fn required_in_prod(&self, key: &str, is_prod: bool) -> Result<String, AppError> {
        match self.get(key) {
            Some(val) => Ok(val),
            None if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required in production but not set",
                key
            ))),
            None => {
                tracing::warn!("{} not set; federated sign-in will fail", key);
                Ok(String::new())
            }
        }
    }
}

fn missing(key: &str) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("{} is required but not set", key))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
