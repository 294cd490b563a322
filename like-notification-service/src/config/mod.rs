use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_FCM_API_URL: &str = "https://fcm.googleapis.com/v1/projects";

#[derive(Debug, Clone, Deserialize)]
pub struct LikeNotificationConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub fcm: FcmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub posts_collection: String,
    pub users_collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    /// Overrides the `project_id` found in the service account key when non-empty.
    pub project_id: String,
    pub service_account_key_path: String,
    pub api_url: String,
    pub enabled: bool,
}

impl LikeNotificationConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(LikeNotificationConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("social_db"), is_prod)?,
                posts_collection: get_env("POSTS_COLLECTION", Some("posts"), false)?,
                users_collection: get_env("USERS_COLLECTION", Some("users"), false)?,
            },
            fcm: FcmConfig {
                project_id: get_env("FCM_PROJECT_ID", Some(""), false)?,
                service_account_key_path: get_env(
                    "FCM_SERVICE_ACCOUNT_KEY_PATH",
                    Some("serviceAccountKey.json"),
                    is_prod,
                )?,
                api_url: get_env("FCM_API_URL", Some(DEFAULT_FCM_API_URL), false)?,
                enabled: fcm_enabled(env::var("FCM_ENABLED").ok().as_deref(), is_prod)?,
            },
        })
    }
}

/// Production must not fall back to the mock provider.
fn fcm_enabled(value: Option<&str>, is_prod: bool) -> Result<bool, AppError> {
    let enabled = value.and_then(|v| v.parse().ok()).unwrap_or(false);
    if is_prod && !enabled {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "FCM_ENABLED must be true in production"
        )));
    }
    Ok(enabled)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
