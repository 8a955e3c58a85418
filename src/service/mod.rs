pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::workflow::BranchHandling;

pub use http::{ClientOptions, HttpService};

/// Body of the preview and commit requests. Inactive fields are `None`
/// and never reach the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRequest {
    pub region: String,
    pub category: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_region_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_handling: Option<BranchHandling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub customer_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedResult {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_branch_name: Option<String>,
}

/// One row of the customer table as returned by `query_customer_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "Region", default, deserialize_with = "lenient_string")]
    pub region: String,
    #[serde(rename = "Category", default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(rename = "CompanyName", default, deserialize_with = "lenient_string")]
    pub company_name: String,
    #[serde(rename = "ExtraRegionCode", default, deserialize_with = "lenient_string")]
    pub extra_region_code: String,
    #[serde(rename = "BranchName", default, deserialize_with = "lenient_string")]
    pub branch_name: String,
    #[serde(rename = "BranchHandling", default, deserialize_with = "lenient_string")]
    pub branch_handling: String,
    #[serde(rename = "CustomerID", default, deserialize_with = "lenient_string")]
    pub customer_id: String,
}

impl CustomerRecord {
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.region,
            &self.category,
            &self.company_name,
            &self.extra_region_code,
            &self.branch_name,
            &self.branch_handling,
            &self.customer_id,
        ]
    }
}

// The table is spreadsheet-backed, so cells arrive as strings, numbers or null.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Selection lists offered by the service, loaded once per session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormOptions {
    pub regions: Vec<String>,
    pub categories: Vec<String>,
    pub extra_region_codes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned {status}: {detail}")]
    Remote {
        path: String,
        status: u16,
        detail: String,
    },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

/// The two calls the preview/confirm workflow makes.
#[async_trait]
pub trait CustomerIdService: Send + Sync {
    /// Computes a tentative identifier without persisting anything.
    async fn preview(&self, request: &CustomerRequest) -> Result<PreviewResult, ServiceError>;

    /// Allocates and persists the identifier for `request`.
    async fn commit(&self, request: &CustomerRequest) -> Result<ConfirmedResult, ServiceError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SuggestKind {
    /// Company names within the selected region/category.
    Company,
    /// Branch names of the selected company.
    Branch,
    /// Company names across the whole table.
    AllCompanies,
    /// Customer identifiers.
    CustomerId,
}

/// Filters narrowing a suggestion lookup. Empty values are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuggestContext {
    pub region: Option<String>,
    pub category: Option<String>,
    pub company_name: Option<String>,
}

#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(
        &self,
        kind: SuggestKind,
        keyword: &str,
        context: &SuggestContext,
    ) -> Result<Vec<String>, ServiceError>;
}
