//! Application state: configuration, settings database and the API client

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::i18n::Language;
use crate::poems::AuthResponse;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const ACCESS_TOKEN_EXPIRES_KEY: &str = "access_token_expires_at";
pub const LANGUAGE_KEY: &str = "language";

/// Lifetime of a stored access token.
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

pub struct AppState {
    pub config: ClientConfig,
    pub settings_db_path: PathBuf,
    client: ApiClient,
}

impl AppState {
    /// Initialize application state
    pub fn new(config: ClientConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data directory {}", config.data_dir.display())
        })?;

        let settings_db_path = config.settings_db_path();
        Self::init_settings_db(&settings_db_path)?;

        let client = ApiClient::new(&config).context("Failed to build HTTP client")?;
        tracing::debug!(
            api = %config.api_base_url,
            settings = %settings_db_path.display(),
            "state initialized"
        );

        Ok(Self {
            config,
            settings_db_path,
            client,
        })
    }

    /// Get a new settings database connection
    pub fn get_settings_db_connection(&self) -> Result<rusqlite::Connection> {
        rusqlite::Connection::open(&self.settings_db_path)
            .with_context(|| format!("Failed to open {}", self.settings_db_path.display()))
    }

    fn init_settings_db(path: &Path) -> Result<()> {
        let conn = rusqlite::Connection::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.get_settings_db_connection()?;
        let value = conn
            .query_row(
                "SELECT value FROM user_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.get_settings_db_connection()?;
        conn.execute(
            "INSERT INTO user_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_setting(&self, key: &str) -> Result<()> {
        let conn = self.get_settings_db_connection()?;
        conn.execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Stored token if it has not expired at `now`.
    pub fn access_token_at(&self, now: DateTime<Utc>) -> Result<Option<String>> {
        let token = match self.get_setting(ACCESS_TOKEN_KEY)? {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(None),
        };

        let expires_at = self
            .get_setting(ACCESS_TOKEN_EXPIRES_KEY)?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|t| t.with_timezone(&Utc));

        match expires_at {
            Some(expires_at) if expires_at > now => Ok(Some(token)),
            _ => {
                tracing::info!("stored access token expired");
                Ok(None)
            }
        }
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        self.access_token_at(Utc::now())
    }

    /// Persist `token`; returns its expiry.
    pub fn store_token(&self, token: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let expires_at = now + Duration::days(TOKEN_LIFETIME_DAYS);
        self.set_setting(ACCESS_TOKEN_KEY, token)?;
        self.set_setting(ACCESS_TOKEN_EXPIRES_KEY, &expires_at.to_rfc3339())?;
        Ok(expires_at)
    }

    /// API client carrying the stored token, if any.
    pub fn api(&self) -> ApiClient {
        let token = self.access_token().unwrap_or_else(|e| {
            tracing::warn!("could not read access token: {:#}", e);
            None
        });
        self.client.clone().with_token(token)
    }

    /// Exchange an identity token for a bearer token and store it.
    pub async fn login(&self, id_token: &str) -> Result<AuthResponse> {
        let auth = self
            .client
            .auth_google(id_token)
            .await
            .context("Login failed")?;
        let expires_at = self.store_token(&auth.access_token, Utc::now())?;
        tracing::info!(%expires_at, "logged in");
        Ok(auth)
    }

    pub fn logout(&self) -> Result<()> {
        self.remove_setting(ACCESS_TOKEN_KEY)?;
        self.remove_setting(ACCESS_TOKEN_EXPIRES_KEY)?;
        tracing::info!("logged out");
        Ok(())
    }

    pub fn language(&self) -> Language {
        match self.get_setting(LANGUAGE_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => Language::default(),
            Err(e) => {
                tracing::warn!("could not read language setting: {:#}", e);
                Language::default()
            }
        }
    }

    pub fn set_language(&self, language: Language) -> Result<()> {
        self.set_setting(LANGUAGE_KEY, language.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> AppState {
        let config = ClientConfig {
            data_dir: dir.path().join("godwa"),
            ..ClientConfig::default()
        };
        AppState::new(config).unwrap()
    }

    #[test]
    fn test_settings_roundtrip() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        assert!(state.settings_db_path.exists());
        assert_eq!(state.get_setting("missing").unwrap(), None);
        state.set_setting("k", "one").unwrap();
        state.set_setting("k", "two").unwrap();
        assert_eq!(state.get_setting("k").unwrap().as_deref(), Some("two"));
        state.remove_setting("k").unwrap();
        assert_eq!(state.get_setting("k").unwrap(), None);
    }

    #[test]
    fn test_token_expiry() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let now = Utc::now();

        assert_eq!(state.access_token_at(now).unwrap(), None);
        let expires_at = state.store_token("tok", now).unwrap();
        assert_eq!(expires_at, now + Duration::days(7));
        assert_eq!(state.access_token_at(now).unwrap().as_deref(), Some("tok"));
        assert_eq!(state.access_token_at(now + Duration::days(8)).unwrap(), None);

        state.logout().unwrap();
        assert_eq!(state.access_token_at(now).unwrap(), None);
        assert!(!state.api().is_authenticated());
    }

    #[test]
    fn test_token_without_expiry_is_ignored() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        state.set_setting(ACCESS_TOKEN_KEY, "tok").unwrap();
        assert_eq!(state.access_token().unwrap(), None);
    }

    #[test]
    fn test_language_preference() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        assert_eq!(state.language(), Language::Marathi);
        state.set_language(Language::Roman).unwrap();
        assert_eq!(state.language(), Language::Roman);
        state.set_setting(LANGUAGE_KEY, "klingon").unwrap();
        assert_eq!(state.language(), Language::Marathi);
    }
}
