use crate::models::FieldMapping;
use crate::retry::RetryPolicy;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Full runtime configuration, built once at startup and passed down.
///
/// A YAML document given on the command line is merged over the defaults one
/// top-level section at a time: keys present in the document replace the
/// matching default, everything else keeps its default value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub zoominfo: ZoomInfoConfig,
    pub apollo: ApolloConfig,
    pub rate_limits: RateLimitConfig,
    pub mapping: FieldMapping,
    pub crm_backfill: CrmBackfillConfig,
    pub output: OutputConfig,
    pub retries: RetriesConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoomInfoConfig {
    pub base_url: String,
    pub company_by_id_path: String,
    pub company_lookup_path: String,
    pub search_by_name_path: String,
    pub api_key_env: String,
    /// Direct credential; wins over `api_key_env` when non-empty.
    pub api_key: Option<String>,
}

impl Default for ZoomInfoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.zoominfo.com".to_string(),
            company_by_id_path: "/company/detail".to_string(),
            company_lookup_path: "/lookup/company".to_string(),
            search_by_name_path: "/search/company".to_string(),
            api_key_env: "ZOOMINFO_API_KEY".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApolloConfig {
    pub base_url: String,
    pub company_enrich_by_domain_path: String,
    pub company_enrich_by_id_path: String,
    pub company_search_by_name_path: String,
    pub company_search_by_salesforce_id_path: String,
    pub api_key_env: String,
    /// Direct credential; wins over `api_key_env` when non-empty.
    pub api_key: Option<String>,
}

impl Default for ApolloConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.apollo.io/v1".to_string(),
            company_enrich_by_domain_path: "/companies/enrich".to_string(),
            company_enrich_by_id_path: "/companies/enrich".to_string(),
            company_search_by_name_path: "/mixed_companies/search".to_string(),
            company_search_by_salesforce_id_path: "/companies/search".to_string(),
            api_key_env: "APOLLO_API_KEY".to_string(),
            api_key: None,
        }
    }
}

/// Per-vendor calls-per-minute budgets. Zero disables pacing for a vendor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub zoominfo_per_min: u32,
    pub apollo_per_min: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            zoominfo_per_min: 50,
            apollo_per_min: 50,
        }
    }
}

/// Column names inside the optional CRM accounts CSV used for website
/// backfill.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrmBackfillConfig {
    pub id_column: Option<String>,
    pub domain_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub include_input_columns: bool,
    pub prefix_zoominfo: String,
    pub prefix_apollo: String,
    /// When set, each vendor also gets a `<prefix>_json` column holding the
    /// winning record as compact JSON.
    pub add_vendor_json_columns: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_input_columns: true,
            prefix_zoominfo: "zi".to_string(),
            prefix_apollo: "ap".to_string(),
            add_vendor_json_columns: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetriesConfig {
    pub max_attempts: u32,
    pub base_delay_seconds: f64,
}

impl Default for RetriesConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_seconds: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl Config {
    /// Loads configuration, merging a YAML document over the defaults when a
    /// path is given, then resolves vendor credentials from the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                let config = if raw.trim().is_empty() {
                    Config::default()
                } else {
                    serde_yaml::from_str(&raw).with_context(|| {
                        format!("failed to parse config file {}", path.display())
                    })?
                };
                tracing::info!("loaded configuration from {}", path.display());
                config
            }
            None => Config::default(),
        };

        config.validate()?;

        config.zoominfo.api_key = Some(resolve_api_key(
            config.zoominfo.api_key.as_deref(),
            &config.zoominfo.api_key_env,
        ));
        config.apollo.api_key = Some(resolve_api_key(
            config.apollo.api_key.as_deref(),
            &config.apollo.api_key_env,
        ));

        if config.zoominfo.api_key.as_deref().unwrap_or_default().is_empty() {
            tracing::warn!(
                "ZoomInfo API key is empty (set {} or zoominfo.api_key); lookups will be rejected",
                config.zoominfo.api_key_env
            );
        }
        if config.apollo.api_key.as_deref().unwrap_or_default().is_empty() {
            tracing::warn!(
                "Apollo API key is empty (set {} or apollo.api_key); lookups will be rejected",
                config.apollo.api_key_env
            );
        }
        tracing::debug!("ZoomInfo base URL: {}", config.zoominfo.base_url);
        tracing::debug!("Apollo base URL: {}", config.apollo.base_url);
        tracing::debug!(
            "Retries: {} attempts, base delay {}s",
            config.retries.max_attempts,
            config.retries.base_delay_seconds
        );

        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (vendor, base_url) in [
            ("zoominfo", &self.zoominfo.base_url),
            ("apollo", &self.apollo.base_url),
        ] {
            if base_url.trim().is_empty() {
                anyhow::bail!("{}.base_url cannot be empty", vendor);
            }
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                anyhow::bail!("{}.base_url must start with http:// or https://", vendor);
            }
        }
        if self.retries.max_attempts == 0 {
            anyhow::bail!("retries.max_attempts must be at least 1");
        }
        if !self.retries.base_delay_seconds.is_finite() || self.retries.base_delay_seconds < 0.0 {
            anyhow::bail!("retries.base_delay_seconds must be a non-negative number");
        }
        if self.http.timeout_seconds == 0 {
            anyhow::bail!("http.timeout_seconds must be at least 1");
        }
        Ok(())
    }

    /// Retry policy shared by both vendor clients.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retries.max_attempts,
            base_delay: Duration::from_secs_f64(self.retries.base_delay_seconds),
        }
    }
}

fn resolve_api_key(direct: Option<&str>, env_var: &str) -> String {
    match direct {
        Some(key) if !key.trim().is_empty() => key.to_string(),
        _ => std::env::var(env_var).unwrap_or_default(),
    }
}
