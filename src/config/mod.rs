use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Application configuration structure
///
/// Layered as defaults, then `config.yaml`, then `APP_*` environment
/// variables (`APP_DATABASE_URL` maps to `database.url`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin of the frontend
    pub origin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub token_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub image_limit: usize,
    pub pdf_limit: usize,
}

impl UploadConfig {
    /// Request body ceiling, leaving room for the multipart envelope and text fields
    pub fn body_limit(&self) -> usize {
        self.pdf_limit.max(self.image_limit) + 1024 * 1024
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "library-server".to_string(),
                version: "0.1.0".to_string(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                origin: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                backend: StoreBackend::Mongo,
                url: "mongodb://localhost:27017".to_string(),
                name: "library_management".to_string(),
            },
            auth: AuthConfig {
                secret: "library-server-dev-secret".to_string(),
                token_hours: 24,
                bcrypt_cost: 10,
            },
            uploads: UploadConfig {
                dir: "uploads".to_string(),
                image_limit: 5 * 1024 * 1024,
                pdf_limit: 50 * 1024 * 1024,
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        info!("Loading application configuration...");

        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file("config.yaml"))
            .merge(Env::prefixed("APP_").split("_"))
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "auth.secret".into()))
            .merge(Env::raw().only(&["MONGO_URI"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
            .extract()?;

        if config.auth.secret == Self::default().auth.secret {
            tracing::warn!("Using the built-in JWT secret; set JWT_SECRET in production");
        }

        info!("Configuration loaded successfully");
        info!("name: {:?}", config.app.name);
        info!("Database: {:?} ({})", config.database.backend, config.database.name);
        info!("Uploads: {}", config.uploads.dir);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_ceilings() {
        let config = AppConfig::default();
        assert_eq!(config.uploads.image_limit, 5 * 1024 * 1024);
        assert_eq!(config.uploads.pdf_limit, 50 * 1024 * 1024);
        assert!(config.uploads.body_limit() > config.uploads.pdf_limit);
        assert_eq!(config.auth.token_hours, 24);
    }

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("APP_DATABASE_BACKEND", "memory");
            jail.set_env("APP_SERVER_PORT", "8080");
            jail.set_env("JWT_SECRET", "from-env");

            let config: AppConfig = Figment::new()
                .merge(Serialized::defaults(AppConfig::default()))
                .merge(Env::prefixed("APP_").split("_"))
                .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "auth.secret".into()))
                .extract()?;

            assert_eq!(config.database.backend, StoreBackend::Memory);
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.auth.secret, "from-env");
            Ok(())
        });
    }
}
