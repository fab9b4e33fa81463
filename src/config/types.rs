use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure for Cocktail-Mirror
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// configuration that mirrors the public API into `./data`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Upstream API location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the JSON API (without a trailing slash)
    #[serde(rename = "api-base-url")]
    pub api_base_url: String,

    /// Base URL under which ingredient images are published
    #[serde(rename = "ingredient-image-base-url")]
    pub ingredient_image_base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.thecocktaildb.com/api/json/v1/1".to_string(),
            ingredient_image_base_url: "https://www.thecocktaildb.com/images/ingredients"
                .to_string(),
        }
    }
}

impl SourceConfig {
    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), name)
    }

    /// Endpoint for prefix search (`?f=<symbol>`) and ingredient search (`?i=<name>`)
    pub fn search_url(&self) -> String {
        self.endpoint("search.php")
    }

    /// Endpoint for full-record lookup by cocktail ID (`?i=<id>`)
    pub fn lookup_url(&self) -> String {
        self.endpoint("lookup.php")
    }

    /// Endpoint for the ingredient listing (`?i=list`)
    pub fn list_url(&self) -> String {
        self.endpoint("list.php")
    }

    /// Builds the medium-size image URL for an ingredient name
    ///
    /// Slashes in the name are replaced with hyphens; spaces and other
    /// characters are percent-encoded by the URL parser.
    pub fn ingredient_image_url(&self, name: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}-Medium.png",
            self.ingredient_image_base_url.trim_end_matches('/'),
            name.replace('/', "-")
        ))
    }
}

/// Fixed inter-request delays and HTTP timeouts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Delay before every JSON API request (milliseconds)
    #[serde(rename = "request-delay-ms")]
    pub request_delay_ms: u64,

    /// Delay before every image download (milliseconds)
    #[serde(rename = "image-delay-ms")]
    pub image_delay_ms: u64,

    /// Total per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 2000,
            image_delay_ms: 1000,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "CocktailMirror".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
///
/// All produced artifacts live under `data-dir`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl OutputConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("cocktails.db")
    }

    pub fn progress_path(&self) -> PathBuf {
        self.data_dir.join("scraper_progress.json")
    }

    pub fn cocktail_images_dir(&self) -> PathBuf {
        self.data_dir.join("images").join("cocktails")
    }

    pub fn ingredient_images_dir(&self) -> PathBuf {
        self.data_dir.join("images").join("ingredients")
    }

    pub fn cocktails_export_path(&self) -> PathBuf {
        self.data_dir.join("cocktails.json")
    }

    pub fn ingredients_export_path(&self) -> PathBuf {
        self.data_dir.join("ingredients.json")
    }
}
