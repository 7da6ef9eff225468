use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;
use crate::repository::SqliteRepository;

/// Well-known preference keys. The UI caches these as option lists for
/// its dropdowns and color pickers.
pub mod keys {
    pub const COURSE_OPTIONS: &str = "course_options";
    pub const TYPE_OPTIONS: &str = "type_options";
    pub const STATUS_OPTIONS: &str = "status_options";
    pub const COLOR_MAP: &str = "color_map";
}

/// Key-value configuration store with explicit load/save, injected as a
/// collaborator rather than read through globals.
#[async_trait]
pub trait PreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError>;
    async fn set(&self, key: &str, value: &Value) -> Result<(), CoreError>;
}

#[async_trait]
impl PreferenceStore for SqliteRepository {
    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM preferences WHERE key = $1")
                .bind(key)
                .fetch_optional(self.pool())
                .await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)?;
        sqlx::query(
            r#"INSERT INTO preferences (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value"#,
        )
        .bind(key)
        .bind(json)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}

impl SqliteRepository {
    /// Reads a string-list preference, defaulting to empty.
    pub async fn option_list(&self, key: &str) -> Result<Vec<String>, CoreError> {
        match PreferenceStore::get(self, key).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Appends an entry to a string-list preference if it is not already
    /// present.
    pub async fn remember_option(&self, key: &str, entry: &str) -> Result<(), CoreError> {
        let mut options = self.option_list(key).await?;
        if !options.iter().any(|existing| existing == entry) {
            options.push(entry.to_string());
            PreferenceStore::set(self, key, &serde_json::to_value(options)?).await?;
        }
        Ok(())
    }
}
