use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Feed URLs, comma separated in `CREDIT_FEEDS`.
    pub feeds: Vec<String>,
    pub model_dir: String,
    pub ingest_interval_seconds: u64,
    pub price_lookback_days: u32,
    pub price_interval: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://credit_iq.db".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            feeds: parse_feeds(&env::var("CREDIT_FEEDS").unwrap_or_default()),
            model_dir: env::var("CREDIT_MODEL_DIR").unwrap_or_else(|_| "./models".to_string()),
            ingest_interval_seconds: env::var("INGEST_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("INGEST_INTERVAL_SECONDS must be an integer")?,
            price_lookback_days: env::var("PRICE_LOOKBACK_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("PRICE_LOOKBACK_DAYS must be an integer")?,
            price_interval: env::var("PRICE_INTERVAL").unwrap_or_else(|_| "1d".to_string()),
        })
    }
}

fn parse_feeds(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_list_parses_and_skips_blanks() {
        let feeds = parse_feeds("https://a.example/rss, https://b.example/rss ,,");
        assert_eq!(
            feeds,
            vec![
                "https://a.example/rss".to_string(),
                "https://b.example/rss".to_string(),
            ]
        );
    }

    #[test]
    fn empty_feed_var_means_no_feeds() {
        assert!(parse_feeds("").is_empty());
    }
}
