use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Relational store (PostgREST-style BaaS)
    pub store_url: String,
    pub store_api_key: String,

    // HTTP server
    pub port: u16,

    // Geolocation
    pub geolocation_url: String,
    pub geolocation_timeout_secs: u64,

    // Paging
    pub media_page_size: usize,
    pub posts_page_size: usize,

    // Sections whose media listing only shows items in the visitor's language
    pub language_filtered_sections: Vec<String>,

    // Language
    pub fallback_language: String,

    // Admin
    pub admin_api_key: Option<String>,
    pub audit_times: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            store_url: std::env::var("STORE_URL")
                .context("STORE_URL not set")?
                .trim_end_matches('/')
                .to_string(),
            store_api_key: std::env::var("STORE_API_KEY").context("STORE_API_KEY not set")?,

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            geolocation_url: std::env::var("GEOLOCATION_URL")
                .unwrap_or_else(|_| "https://ipapi.co".to_string())
                .trim_end_matches('/')
                .to_string(),
            geolocation_timeout_secs: std::env::var("GEOLOCATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),

            media_page_size: std::env::var("MEDIA_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|size: &usize| *size > 0)
                .unwrap_or(6),
            posts_page_size: std::env::var("POSTS_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|size: &usize| *size > 0)
                .unwrap_or(6),

            language_filtered_sections: std::env::var("LANGUAGE_FILTERED_SECTIONS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| vec!["podcast".to_string()]),

            fallback_language: std::env::var("FALLBACK_LANGUAGE")
                .map(|code| code.trim().to_lowercase())
                .ok()
                .filter(|code| !code.is_empty())
                .unwrap_or_else(|| "sr".to_string()),

            // Empty key would make every admin request pass the comparison
            admin_api_key: std::env::var("ADMIN_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            audit_times: std::env::var("AUDIT_TIMES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        })
    }
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
