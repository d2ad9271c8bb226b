use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub discord_token: String,
    pub application_id: u64,
    pub database_url: String,
    pub status_message: String,
    /// IANA zone name the whole schedule is evaluated in.
    pub timezone: String,
    pub digest_cadence_mins: u32,
    pub digest_backoff_secs: u64,
    pub digest_fetch_limit: u8,
    pub dev_guild_id: Option<u64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            application_id: env::var("APPLICATION_ID")
                .map_err(|_| anyhow::anyhow!("APPLICATION_ID must be set"))?
                .parse()
                .map_err(|_| anyhow::anyhow!("APPLICATION_ID must be a valid u64"))?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/herald.db".to_string()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Watching the event schedule".to_string()),
            timezone: env::var("TIMEZONE").unwrap_or_else(|_| "America/New_York".to_string()),
            digest_cadence_mins: env::var("DIGEST_CADENCE_MINS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .ok()
                .filter(|mins| (1..=60).contains(mins))
                .unwrap_or(5),
            digest_backoff_secs: env::var("DIGEST_BACKOFF_SECS")
                .unwrap_or_else(|_| "180".to_string())
                .parse()
                .unwrap_or(180),
            digest_fetch_limit: env::var("DIGEST_FETCH_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            dev_guild_id: env::var("DEV_GUILD_ID").ok().and_then(|id| id.parse().ok()),
        })
    }

    /// Reference time zone all digest dates are evaluated in.
    pub fn reference_zone(&self) -> anyhow::Result<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("TIMEZONE '{}' is not a valid IANA zone", self.timezone))
    }

    #[cfg(test)]
    pub fn for_tests(database_url: &str) -> Self {
        Config {
            discord_token: "test".to_string(),
            application_id: 0,
            database_url: database_url.to_string(),
            status_message: "test".to_string(),
            timezone: "America/New_York".to_string(),
            digest_cadence_mins: 5,
            digest_backoff_secs: 180,
            digest_fetch_limit: 50,
            dev_guild_id: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("application_id", &self.application_id)
            .field("database_url", &self.database_url)
            .field("status_message", &self.status_message)
            .field("timezone", &self.timezone)
            .field("digest_cadence_mins", &self.digest_cadence_mins)
            .field("digest_backoff_secs", &self.digest_backoff_secs)
            .field("digest_fetch_limit", &self.digest_fetch_limit)
            .field("dev_guild_id", &self.dev_guild_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_logic() {
        // 1. Test missing vars
        env::remove_var("DISCORD_TOKEN");
        env::remove_var("APPLICATION_ID");
        let result = Config::build();
        assert!(result.is_err(), "Should fail when required vars are missing");

        // 2. Test defaults
        env::set_var("DISCORD_TOKEN", "test_token");
        env::set_var("APPLICATION_ID", "12345");
        let config = Config::build().unwrap();
        assert_eq!(config.discord_token, "test_token");
        assert_eq!(config.application_id, 12345);
        assert_eq!(config.timezone, "America/New_York");
        assert_eq!(config.digest_cadence_mins, 5);
        assert!(config.reference_zone().is_ok());

        // 3. Cadence outside 1..=60 falls back to the default
        env::set_var("DIGEST_CADENCE_MINS", "0");
        let config = Config::build().unwrap();
        assert_eq!(config.digest_cadence_mins, 5);
        env::remove_var("DIGEST_CADENCE_MINS");

        // 4. Bad zones are rejected at resolution time
        env::set_var("TIMEZONE", "Atlantis/Lost_City");
        let config = Config::build().unwrap();
        assert!(config.reference_zone().is_err());
        env::remove_var("TIMEZONE");

        // 5. Test debug redaction
        let config = Config::build().unwrap();
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("test_token"));
        assert!(debug_output.contains("[REDACTED]"));

        // Cleanup
        env::remove_var("DISCORD_TOKEN");
        env::remove_var("APPLICATION_ID");
    }
}
