use crate::config::Config;
use crate::errors::{AppError, LookupFailure};
use crate::models::LookupOutcome;
use crate::retry::{is_transient_status, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Error bodies are truncated to this many characters before being reported.
const BODY_SNIPPET_LIMIT: usize = 300;

/// Keys scanned, in order, for the record list in Apollo search responses.
const APOLLO_CONTAINER_KEYS: &[&str] = &["companies", "organizations", "data", "results"];

/// Keys scanned for the record list in ZoomInfo search responses.
const ZOOMINFO_CONTAINER_KEYS: &[&str] = &["data"];

/// Company lookups every vendor supports.
#[async_trait]
pub trait CompanyLookup {
    async fn lookup_by_id(&self, id: &str) -> LookupOutcome;
    async fn lookup_by_domain(&self, domain: &str) -> LookupOutcome;
    async fn lookup_by_name(&self, name: &str) -> LookupOutcome;
}

/// Vendors that can also resolve a company through a CRM identifier.
#[async_trait]
pub trait CrmLookup: CompanyLookup {
    async fn lookup_by_external_id(&self, external_id: &str) -> LookupOutcome;
}

/// How a 200 response carries the record.
#[derive(Debug, Clone, Copy)]
enum ResponseShape {
    /// The body is the record itself; a 404 means the entity does not exist.
    Record,
    /// The body wraps a list of candidates under one of the given keys.
    Search(&'static [&'static str]),
}

/// ZoomInfo client: detail and lookup endpoints return the record directly,
/// name search returns a page of candidates.
pub struct ZoomInfoClient {
    client: Client,
    base_url: String,
    api_key: String,
    company_by_id_path: String,
    company_lookup_path: String,
    search_by_name_path: String,
    retry: RetryPolicy,
}

impl ZoomInfoClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.zoominfo.base_url.trim_end_matches('/').to_string(),
            api_key: config.zoominfo.api_key.clone().unwrap_or_default(),
            company_by_id_path: config.zoominfo.company_by_id_path.clone(),
            company_lookup_path: config.zoominfo.company_lookup_path.clone(),
            search_by_name_path: config.zoominfo.search_by_name_path.clone(),
            retry: config.retry_policy(),
        })
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .query(query)
    }

    fn post(&self, path: &str, payload: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .json(payload)
    }
}

#[async_trait]
impl CompanyLookup for ZoomInfoClient {
    async fn lookup_by_id(&self, id: &str) -> LookupOutcome {
        if id.trim().is_empty() {
            return Err(LookupFailure::MissingField("company_id"));
        }
        tracing::debug!("ZoomInfo lookup by company id {}", id);
        run_lookup(self.retry, ResponseShape::Record, || {
            self.get(&self.company_by_id_path, &[("companyId", id)])
        })
        .await
    }

    async fn lookup_by_domain(&self, domain: &str) -> LookupOutcome {
        if domain.trim().is_empty() {
            return Err(LookupFailure::MissingField("domain"));
        }
        tracing::debug!("ZoomInfo lookup by domain {}", domain);
        run_lookup(self.retry, ResponseShape::Record, || {
            self.get(&self.company_lookup_path, &[("domain", domain)])
        })
        .await
    }

    async fn lookup_by_name(&self, name: &str) -> LookupOutcome {
        if name.trim().is_empty() {
            return Err(LookupFailure::MissingField("name"));
        }
        tracing::debug!("ZoomInfo search by name {}", name);
        let payload = serde_json::json!({ "companyName": name });
        run_lookup(
            self.retry,
            ResponseShape::Search(ZOOMINFO_CONTAINER_KEYS),
            || self.post(&self.search_by_name_path, &payload),
        )
        .await
    }
}

/// Apollo client: enrich endpoints return the record directly, the search
/// endpoints return a page of candidates under a vendor-dependent key.
pub struct ApolloClient {
    client: Client,
    base_url: String,
    api_key: String,
    enrich_by_id_path: String,
    enrich_by_domain_path: String,
    search_by_name_path: String,
    search_by_salesforce_id_path: String,
    retry: RetryPolicy,
}

impl ApolloClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.apollo.base_url.trim_end_matches('/').to_string(),
            api_key: config.apollo.api_key.clone().unwrap_or_default(),
            enrich_by_id_path: config.apollo.company_enrich_by_id_path.clone(),
            enrich_by_domain_path: config.apollo.company_enrich_by_domain_path.clone(),
            search_by_name_path: config.apollo.company_search_by_name_path.clone(),
            search_by_salesforce_id_path: config
                .apollo
                .company_search_by_salesforce_id_path
                .clone(),
            retry: config.retry_policy(),
        })
    }

    fn post(&self, path: &str, payload: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .json(payload)
    }
}

#[async_trait]
impl CompanyLookup for ApolloClient {
    async fn lookup_by_id(&self, id: &str) -> LookupOutcome {
        if id.trim().is_empty() {
            return Err(LookupFailure::MissingField("apollo_id"));
        }
        tracing::debug!("Apollo enrich by id {}", id);
        let payload = serde_json::json!({ "id": id });
        run_lookup(self.retry, ResponseShape::Record, || {
            self.post(&self.enrich_by_id_path, &payload)
        })
        .await
    }

    async fn lookup_by_domain(&self, domain: &str) -> LookupOutcome {
        if domain.trim().is_empty() {
            return Err(LookupFailure::MissingField("domain"));
        }
        tracing::debug!("Apollo enrich by domain {}", domain);
        let payload = serde_json::json!({ "domain": domain });
        run_lookup(self.retry, ResponseShape::Record, || {
            self.post(&self.enrich_by_domain_path, &payload)
        })
        .await
    }

    async fn lookup_by_name(&self, name: &str) -> LookupOutcome {
        if name.trim().is_empty() {
            return Err(LookupFailure::MissingField("name"));
        }
        tracing::debug!("Apollo search by name {}", name);
        let payload = serde_json::json!({
            "q_organization_name": name,
            "page": 1,
            "per_page": 1,
        });
        run_lookup(
            self.retry,
            ResponseShape::Search(APOLLO_CONTAINER_KEYS),
            || self.post(&self.search_by_name_path, &payload),
        )
        .await
    }
}

#[async_trait]
impl CrmLookup for ApolloClient {
    async fn lookup_by_external_id(&self, external_id: &str) -> LookupOutcome {
        if external_id.trim().is_empty() {
            return Err(LookupFailure::MissingField("salesforce_id"));
        }
        tracing::debug!("Apollo search by salesforce id {}", external_id);
        let payload = serde_json::json!({
            "filters": { "salesforce_id": external_id },
            "page": 1,
            "per_page": 1,
        });
        run_lookup(
            self.retry,
            ResponseShape::Search(APOLLO_CONTAINER_KEYS),
            || self.post(&self.search_by_salesforce_id_path, &payload),
        )
        .await
    }
}

/// Sends the request until it resolves, retrying transient failures with
/// exponential backoff. Transport errors, 429/5xx statuses and unparseable
/// 200 bodies count as transient; everything else resolves immediately.
async fn run_lookup<F>(policy: RetryPolicy, shape: ResponseShape, build_request: F) -> LookupOutcome
where
    F: Fn() -> reqwest::RequestBuilder + Send,
{
    let mut attempt: u32 = 1;
    loop {
        let transient = match build_request().send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if status == 200 {
                    match response.json::<Value>().await {
                        Ok(body) => return extract_record(body, shape),
                        Err(e) => format!("unparseable response body: {}", e),
                    }
                } else if status == 404 && matches!(shape, ResponseShape::Record) {
                    return Err(LookupFailure::NotFound);
                } else if is_transient_status(status) {
                    format!("HTTP {}", status)
                } else {
                    let body = response.text().await.unwrap_or_default();
                    return Err(LookupFailure::Http {
                        status,
                        body: truncate_body(&body),
                    });
                }
            }
            Err(e) => format!("request error: {}", e),
        };

        if !policy.should_retry(attempt) {
            tracing::warn!(
                "giving up after {} attempts ({})",
                policy.max_attempts,
                transient
            );
            return Err(LookupFailure::Exhausted);
        }
        let delay = policy.backoff_delay(attempt);
        tracing::debug!(
            "transient failure on attempt {}/{} ({}), retrying in {:.1}s",
            attempt,
            policy.max_attempts,
            transient,
            delay.as_secs_f64()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Pulls the company record out of a parsed 200 body.
fn extract_record(body: Value, shape: ResponseShape) -> LookupOutcome {
    match shape {
        ResponseShape::Record => Ok(body),
        ResponseShape::Search(keys) => {
            for key in keys {
                if let Some(Value::Array(items)) = body.get(key) {
                    if let Some(first) = items.first() {
                        return Ok(first.clone());
                    }
                }
            }
            Err(LookupFailure::NotFound)
        }
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LIMIT).collect()
}
