//! Environment-derived runtime configuration.

use std::collections::HashSet;
use std::env;

#[derive(Debug, Clone, PartialEq)]
pub enum DbConfig {
    Postgres { url: String, ssl: bool },
    MySql { host: String, user: String, name: String, password: String },
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bot_token: Option<String>,
    pub db: DbConfig,
    pub admin_ids: HashSet<i64>,
    pub donation_contact: String,
    pub keepalive_url: Option<String>,
    pub keepalive_interval_ms: u64,
    pub port: u16,
}

const DEFAULT_DONATION_CONTACT: &str = "@imfromcrimecorebitches";
const DEFAULT_KEEPALIVE_INTERVAL_MS: u64 = 300_000;
const DEFAULT_PORT: u16 = 3001;

fn first_present(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| env::var(k).ok())
}

impl Config {
    /// Read configuration from the process environment. Never panics
    /// on missing optional values; falls back to in-memory storage when no
    /// database variable is present.
    pub fn from_env() -> Self {
        let bot_token = first_present(&["TELEGRAM_TOKEN", "TOKEN", "BOT_TOKEN"]);

        let db = if let Ok(url) = env::var("DATABASE_URL") {
            let ssl = env::var("DB_SSL").map(|v| v == "true").unwrap_or(false);
            DbConfig::Postgres { url, ssl }
        } else if let (Ok(host), Ok(user), Ok(name)) =
        (env::var("DB_HOST"), env::var("DB_USER"), env::var("DB_NAME"))
        {
            let password = env::var("DB_PASSWORD").unwrap_or_default();
            DbConfig::MySql { host, user, name, password }
        } else {
            DbConfig::Memory
        };

        let admin_ids = env::var("ADMIN_IDS")
        .map(|raw| {
            raw.split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .collect()
        })
        .unwrap_or_default();

        let donation_contact = env::var("DONATION_CONTACT").unwrap_or_else(|_| DEFAULT_DONATION_CONTACT.to_string());

        let keepalive_url = first_present(&["KEEPALIVE_URL", "RENDER_EXTERNAL_URL", "PING_URL"]);

        let keepalive_interval_ms = env::var("KEEPALIVE_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_KEEPALIVE_INTERVAL_MS);

        let port = env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT);

        Self {
            bot_token,
            db,
            admin_ids,
            donation_contact,
            keepalive_url,
            keepalive_interval_ms,
            port,
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_config_env() {
        for key in [
            "TELEGRAM_TOKEN", "TOKEN", "BOT_TOKEN", "DATABASE_URL", "DB_SSL", "DB_HOST",
            "DB_USER", "DB_NAME", "DB_PASSWORD", "ADMIN_IDS", "DONATION_CONTACT",
            "KEEPALIVE_URL", "RENDER_EXTERNAL_URL", "PING_URL", "KEEPALIVE_INTERVAL_MS", "PORT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn defaults_to_memory_store_and_default_port() {
        clear_config_env();
        let cfg = Config::from_env();
        assert_eq!(cfg.db, DbConfig::Memory);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.donation_contact, DEFAULT_DONATION_CONTACT);
        assert!(cfg.admin_ids.is_empty());
    }

    #[test]
    fn admin_ids_parses_comma_separated_list() {
        clear_config_env();
        env::set_var("ADMIN_IDS", "1, 2,3");
        let cfg = Config::from_env();
        assert!(cfg.is_admin(1) && cfg.is_admin(2) && cfg.is_admin(3));
        assert!(!cfg.is_admin(4));
        clear_config_env();
    }

    #[test]
    fn database_url_takes_precedence_over_mysql_vars() {
        clear_config_env();
        env::set_var("DATABASE_URL", "postgres://localhost/db");
        env::set_var("DB_HOST", "mysql-host");
        env::set_var("DB_USER", "u");
        env::set_var("DB_NAME", "n");
        let cfg = Config::from_env();
        assert!(matches!(cfg.db, DbConfig::Postgres { .. }));
        clear_config_env();
    }
}
