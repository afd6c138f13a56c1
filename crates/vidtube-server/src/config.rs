//! Server configuration loaded from environment variables.
//!
//! Everything except the token secrets has a usable default; missing secrets
//! fall back to development placeholders and log a warning.

use std::path::PathBuf;

use vidtube_api::media::CloudinaryConfig;

const DEV_ACCESS_SECRET: &str = "dev-access-secret-change-me";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    /// Env: `VIDTUBE_HOST`. Default: `0.0.0.0`
    pub host: String,

    /// Env: `VIDTUBE_PORT`. Default: `8000`
    pub port: u16,

    /// Env: `VIDTUBE_DB_PATH`. Default: `vidtube.db`
    pub db_path: PathBuf,

    /// Env: `ACCESS_TOKEN_SECRET`
    pub access_token_secret: String,

    /// Env: `ACCESS_TOKEN_EXPIRY_MINUTES`. Default: `15`
    pub access_token_expiry_minutes: i64,

    /// Env: `REFRESH_TOKEN_SECRET`
    pub refresh_token_secret: String,

    /// Env: `REFRESH_TOKEN_EXPIRY_HOURS`. Default: `240`
    pub refresh_token_expiry_hours: i64,

    /// Allowed browser origin. Env: `CORS_ORIGIN`. Unset means any origin.
    pub cors_origin: Option<String>,

    /// Local media directory, used when Cloudinary is not configured.
    /// Env: `MEDIA_DIR`. Default: `./media`
    pub media_dir: PathBuf,

    /// Base for locally served media URLs.
    /// Env: `PUBLIC_BASE_URL`. Default: `http://localhost:{port}`
    pub public_base_url: String,

    /// Set only when all three `CLOUDINARY_*` variables are present.
    pub cloudinary: Option<CloudinaryConfig>,

    /// Request body cap for uploads. Env: `MAX_UPLOAD_MB`. Default: `512`
    pub max_upload_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            db_path: PathBuf::from("vidtube.db"),
            access_token_secret: DEV_ACCESS_SECRET.to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_secret: DEV_REFRESH_SECRET.to_string(),
            refresh_token_expiry_hours: 240,
            cors_origin: None,
            media_dir: PathBuf::from("./media"),
            public_base_url: "http://localhost:8000".to_string(),
            cloudinary: None,
            max_upload_mb: 512,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable numbers keep their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = get("VIDTUBE_HOST") {
            config.host = host;
        }
        parse_into(&get, "VIDTUBE_PORT", &mut config.port);
        if let Some(path) = get("VIDTUBE_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(secret) = get("ACCESS_TOKEN_SECRET") {
            config.access_token_secret = secret;
        }
        parse_into(&get, "ACCESS_TOKEN_EXPIRY_MINUTES", &mut config.access_token_expiry_minutes);
        if let Some(secret) = get("REFRESH_TOKEN_SECRET") {
            config.refresh_token_secret = secret;
        }
        parse_into(&get, "REFRESH_TOKEN_EXPIRY_HOURS", &mut config.refresh_token_expiry_hours);

        config.cors_origin = get("CORS_ORIGIN");
        if let Some(dir) = get("MEDIA_DIR") {
            config.media_dir = PathBuf::from(dir);
        }
        config.public_base_url = get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", config.port));

        config.cloudinary = match (
            get("CLOUDINARY_CLOUD_NAME"),
            get("CLOUDINARY_API_KEY"),
            get("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        parse_into(&get, "MAX_UPLOAD_MB", &mut config.max_upload_mb);

        config
    }

    /// True while either token secret is still the development placeholder.
    pub fn uses_dev_secrets(&self) -> bool {
        self.access_token_secret == DEV_ACCESS_SECRET
            || self.refresh_token_secret == DEV_REFRESH_SECRET
    }
}

fn parse_into<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    if let Some(raw) = get(key) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(_) => tracing::warn!(value = %raw, "Invalid {}, using default", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let config = from(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.public_base_url, "http://localhost:8000");
        assert_eq!(config.access_token_expiry_minutes, 15);
        assert!(config.cloudinary.is_none());
        assert!(config.uses_dev_secrets());
    }

    #[test]
    fn reads_overrides() {
        let config = from(&[
            ("VIDTUBE_PORT", "9000"),
            ("ACCESS_TOKEN_SECRET", "a"),
            ("REFRESH_TOKEN_SECRET", "r"),
            ("CORS_ORIGIN", "http://localhost:5173"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.public_base_url, "http://localhost:9000");
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:5173"));
        assert!(!config.uses_dev_secrets());
    }

    #[test]
    fn bad_numbers_keep_defaults() {
        let config = from(&[("VIDTUBE_PORT", "eighty"), ("MAX_UPLOAD_MB", "")]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_mb, 512);
    }

    #[test]
    fn cloudinary_needs_all_three_keys() {
        let partial = from(&[("CLOUDINARY_CLOUD_NAME", "demo"), ("CLOUDINARY_API_KEY", "k")]);
        assert!(partial.cloudinary.is_none());

        let full = from(&[
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "k"),
            ("CLOUDINARY_API_SECRET", "s"),
        ]);
        assert_eq!(full.cloudinary.unwrap().cloud_name, "demo");
    }
}
