use rusqlite::{Connection, OptionalExtension, Result};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use tracing::{debug, info};

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// Raw per-guild settings row. Ids are stored as TEXT; callers parse.
#[derive(Debug, Clone, Default)]
pub struct GuildSettingsRecord {
    pub guild_id: String,
    pub digest_channel: Option<String>,
    pub announcement_channel: Option<String>,
    pub announcement_role: Option<String>,
    pub log_channel: Option<String>,
}

impl Database {
    pub fn new(config: &Config) -> Result<Self> {
        let conn = Connection::open(&config.database_url)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn execute_init(&self) -> anyhow::Result<()> {
        info!("Database: Initializing schema...");
        let sql = "
            CREATE TABLE IF NOT EXISTS guild_settings (
                guild_id TEXT PRIMARY KEY,
                digest_channel TEXT,
                announcement_channel TEXT,
                announcement_role TEXT,
                log_channel TEXT,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
        ";
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    /// Run a blocking database closure off the async runtime.
    pub async fn run_blocking<F, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    pub fn get_guild_settings(&self, guild_id: &str) -> anyhow::Result<Option<GuildSettingsRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT guild_id, digest_channel, announcement_channel, announcement_role, log_channel
             FROM guild_settings WHERE guild_id = ?1",
        )?;
        let record = stmt
            .query_row([guild_id], |row| {
                Ok(GuildSettingsRecord {
                    guild_id: row.get(0)?,
                    digest_channel: row.get(1)?,
                    announcement_channel: row.get(2)?,
                    announcement_role: row.get(3)?,
                    log_channel: row.get(4)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    pub fn set_digest_channel(&self, guild_id: &str, channel: Option<&str>) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO guild_settings (guild_id, digest_channel, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(guild_id) DO UPDATE SET digest_channel = ?2, updated_at = CURRENT_TIMESTAMP",
            (guild_id, channel),
        )?;
        Ok(())
    }

    pub fn set_announcement_channel(
        &self,
        guild_id: &str,
        channel: Option<&str>,
    ) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO guild_settings (guild_id, announcement_channel, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(guild_id) DO UPDATE SET announcement_channel = ?2, updated_at = CURRENT_TIMESTAMP",
            (guild_id, channel),
        )?;
        Ok(())
    }

    pub fn set_announcement_role(&self, guild_id: &str, role: Option<&str>) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO guild_settings (guild_id, announcement_role, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(guild_id) DO UPDATE SET announcement_role = ?2, updated_at = CURRENT_TIMESTAMP",
            (guild_id, role),
        )?;
        Ok(())
    }

    pub fn set_log_channel(&self, guild_id: &str, channel: Option<&str>) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO guild_settings (guild_id, log_channel, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(guild_id) DO UPDATE SET log_channel = ?2, updated_at = CURRENT_TIMESTAMP",
            (guild_id, channel),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_db() -> Database {
        let config = Config::for_tests(":memory:");
        let db = Database::new(&config).unwrap();
        db.execute_init().unwrap();
        db
    }

    #[test]
    fn missing_guild_has_no_settings() {
        let db = test_db();
        assert!(db.get_guild_settings("1").unwrap().is_none());
    }

    #[test]
    fn upserts_are_column_independent() {
        let db = test_db();

        db.set_digest_channel("1", Some("100")).unwrap();
        db.set_announcement_role("1", Some("200")).unwrap();

        let settings = db.get_guild_settings("1").unwrap().unwrap();
        assert_eq!(settings.digest_channel.as_deref(), Some("100"));
        assert_eq!(settings.announcement_role.as_deref(), Some("200"));
        assert!(settings.announcement_channel.is_none());
        assert!(settings.log_channel.is_none());

        // Updating one column leaves the other alone
        db.set_announcement_channel("1", Some("300")).unwrap();
        let settings = db.get_guild_settings("1").unwrap().unwrap();
        assert_eq!(settings.digest_channel.as_deref(), Some("100"));
        assert_eq!(settings.announcement_channel.as_deref(), Some("300"));
    }

    #[test]
    fn disabling_clears_the_column() {
        let db = test_db();

        db.set_digest_channel("1", Some("100")).unwrap();
        db.set_digest_channel("1", None).unwrap();

        let settings = db.get_guild_settings("1").unwrap().unwrap();
        assert!(settings.digest_channel.is_none());
    }

    #[test]
    fn guilds_do_not_bleed_into_each_other() {
        let db = test_db();

        db.set_log_channel("1", Some("100")).unwrap();
        db.set_log_channel("2", Some("200")).unwrap();

        assert_eq!(
            db.get_guild_settings("1").unwrap().unwrap().log_channel.as_deref(),
            Some("100")
        );
        assert_eq!(
            db.get_guild_settings("2").unwrap().unwrap().log_channel.as_deref(),
            Some("200")
        );
    }
}
