use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub locale: String,
    /// Listings per page
    pub page_size: u64,
    /// Categories/facilities per page
    pub reference_page_size: u64,
    pub http_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            locale: "en".to_string(),
            page_size: 9,
            reference_page_size: 10,
            http_timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Reads `ESTATE_*` variables from the process environment
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            api_url: lookup("ESTATE_API_URL").unwrap_or(defaults.api_url),
            locale: lookup("ESTATE_LOCALE").unwrap_or(defaults.locale),
            page_size: positive(&lookup, "ESTATE_PAGE_SIZE", defaults.page_size)?,
            reference_page_size: positive(
                &lookup,
                "ESTATE_REFERENCE_PAGE_SIZE",
                defaults.reference_page_size,
            )?,
            http_timeout_secs: positive(
                &lookup,
                "ESTATE_HTTP_TIMEOUT_SECS",
                defaults.http_timeout_secs,
            )?,
            user_agent: lookup("ESTATE_USER_AGENT").unwrap_or(defaults.user_agent),
        })
    }
}

fn positive<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}
