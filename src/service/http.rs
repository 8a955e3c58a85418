use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{
    ConfirmedResult, CustomerIdService, CustomerRecord, CustomerRequest, FormOptions,
    PreviewResult, ServiceError, SuggestContext, SuggestKind, SuggestionSource, UpdateRequest,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

// Returned with a 200 by `query_customer_id` when nothing matches.
const QUERY_NOT_FOUND_DETAIL: &str = "Customer ID not found";

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            proxy: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailBody {
    #[serde(default)]
    detail: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    detail: String,
    #[serde(default)]
    data: Vec<CustomerRecord>,
}

#[derive(Debug, Deserialize)]
struct CompanyNamesBody {
    #[serde(default)]
    company_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BranchNamesBody {
    #[serde(default)]
    branch_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerIdsBody {
    #[serde(default)]
    customer_ids: Vec<String>,
}

/// reqwest-backed client for every endpoint of the customer-ID service.
#[derive(Clone, Debug)]
pub struct HttpService {
    client: reqwest::Client,
    base_url: Url,
}

fn build_client(options: &ClientOptions) -> Result<reqwest::Client, ServiceError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!("custid/", env!("CARGO_PKG_VERSION"))),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(options.timeout_seconds.max(1)));
    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy_cfg = reqwest::Proxy::all(proxy).map_err(|e| ServiceError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy_cfg);
    }
    builder
        .build()
        .map_err(|e| ServiceError::HttpClientBuild { source: e })
}

fn parse_base_url(raw: &str) -> Result<Url, ServiceError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|e| ServiceError::InvalidBaseUrl {
        url: trimmed.to_string(),
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ServiceError::InvalidBaseUrl {
            url: trimmed.to_string(),
            message: "URL cannot carry a path".to_string(),
        });
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn detail_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        // validation failures carry a list of {loc, msg, ...}
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item.get("msg") {
                Some(serde_json::Value::String(msg)) => msg.clone(),
                _ => item.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

impl HttpService {
    pub fn new(options: &ClientOptions) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(options)?,
            base_url: parse_base_url(&options.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    /// A trailing empty segment produces a trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> (String, RequestBuilder) {
        let url = self.endpoint(segments);
        let path = url.path().to_string();
        debug!(method = method.as_str(), url = url.as_str(), "sending request");
        (path, self.client.request(method, url))
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> Result<Response, ServiceError> {
        builder.send().await.map_err(|e| ServiceError::Transport {
            path: path.to_string(),
            source: e,
        })
    }

    async fn remote_error(path: &str, response: Response) -> ServiceError {
        let status = response.status();
        let detail = match response.json::<DetailBody>().await {
            Ok(body) => detail_text(&body.detail),
            Err(_) => String::new(),
        };
        let detail = if detail.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        } else {
            detail
        };
        ServiceError::Remote {
            path: path.to_string(),
            status: status.as_u16(),
            detail,
        }
    }

    async fn expect_success(path: &str, response: Response) -> Result<Response, ServiceError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::remote_error(path, response).await)
        }
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ServiceError> {
        let response = Self::expect_success(path, response).await?;
        response.json::<T>().await.map_err(|e| ServiceError::Decode {
            path: path.to_string(),
            source: e,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ServiceError> {
        let (path, builder) = self.request(Method::GET, segments);
        let response = self.send(&path, builder.query(query)).await?;
        Self::decode(&path, response).await
    }

    async fn get_string_list(&self, segment: &str) -> Result<Vec<String>, ServiceError> {
        let values: Vec<Option<String>> = self.get_json(&[segment], &[]).await?;
        // the category list can contain a null when a label is left unconfigured server-side
        Ok(values.into_iter().flatten().collect())
    }

    pub async fn regions(&self) -> Result<Vec<String>, ServiceError> {
        self.get_string_list("regions").await
    }

    pub async fn categories(&self) -> Result<Vec<String>, ServiceError> {
        self.get_string_list("categories").await
    }

    pub async fn extra_region_codes(&self) -> Result<Vec<String>, ServiceError> {
        self.get_string_list("extra_region_codes").await
    }

    /// Fetches the three selection lists concurrently.
    pub async fn load_options(&self) -> Result<FormOptions, ServiceError> {
        let (regions, categories, extra_region_codes) = futures::try_join!(
            self.regions(),
            self.categories(),
            self.extra_region_codes()
        )?;
        Ok(FormOptions {
            regions,
            categories,
            extra_region_codes,
        })
    }

    pub async fn query_by_name(&self, company_name: &str) -> Result<Vec<CustomerRecord>, ServiceError> {
        let body: QueryBody = self
            .get_json(&["query_customer_id", company_name], &[])
            .await?;
        if body.detail == QUERY_NOT_FOUND_DETAIL || body.data.is_empty() {
            return Err(ServiceError::NotFound {
                what: format!("customer IDs for '{company_name}'"),
            });
        }
        Ok(body.data)
    }

    async fn detail_or_not_found(
        &self,
        path: String,
        builder: RequestBuilder,
        what: String,
    ) -> Result<String, ServiceError> {
        let response = self.send(&path, builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound { what });
        }
        let body: DetailBody = Self::decode(&path, response).await?;
        Ok(detail_text(&body.detail))
    }

    pub async fn delete_by_id(&self, customer_id: &str) -> Result<String, ServiceError> {
        let (path, builder) = self.request(Method::DELETE, &["delete_customer_id", customer_id]);
        self.detail_or_not_found(path, builder, format!("customer ID '{customer_id}'"))
            .await
    }

    pub async fn update_by_id(
        &self,
        customer_id: &str,
        update: &UpdateRequest,
    ) -> Result<String, ServiceError> {
        let (path, builder) = self.request(Method::PUT, &["update_customer_info", customer_id]);
        self.detail_or_not_found(
            path,
            builder.json(update),
            format!("customer ID '{customer_id}'"),
        )
        .await
    }

    /// Downloads the spreadsheet export as raw bytes.
    pub async fn export_excel(&self) -> Result<Vec<u8>, ServiceError> {
        let (path, builder) = self.request(Method::GET, &["export_excel"]);
        let response = self.send(&path, builder).await?;
        let response = Self::expect_success(&path, response).await?;
        let bytes = response.bytes().await.map_err(|e| ServiceError::Decode {
            path: path.clone(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    pub async fn import_excel(&self, file_name: &str, contents: Vec<u8>) -> Result<String, ServiceError> {
        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let (path, builder) = self.request(Method::POST, &["import_excel"]);
        let response = self.send(&path, builder.multipart(form)).await?;
        let body: DetailBody = Self::decode(&path, response).await?;
        Ok(detail_text(&body.detail))
    }
}

#[async_trait]
impl CustomerIdService for HttpService {
    async fn preview(&self, request: &CustomerRequest) -> Result<PreviewResult, ServiceError> {
        let (path, builder) = self.request(Method::POST, &["preview_customer_id"]);
        let response = self.send(&path, builder.json(request)).await?;
        Self::decode(&path, response).await
    }

    async fn commit(&self, request: &CustomerRequest) -> Result<ConfirmedResult, ServiceError> {
        let (path, builder) = self.request(Method::POST, &["generate_customer_id"]);
        let builder = builder.query(&[("confirm", "true")]).json(request);
        let response = self.send(&path, builder).await?;
        Self::decode(&path, response).await
    }
}

#[async_trait]
impl SuggestionSource for HttpService {
    async fn suggest(
        &self,
        kind: SuggestKind,
        keyword: &str,
        context: &SuggestContext,
    ) -> Result<Vec<String>, ServiceError> {
        let mut query: Vec<(&str, &str)> = vec![("keyword", keyword)];
        let filters = [
            ("region", context.region.as_deref()),
            ("category", context.category.as_deref()),
            ("company_name", context.company_name.as_deref()),
        ];
        let allowed: &[&str] = match kind {
            SuggestKind::Company => &["region", "category"],
            SuggestKind::Branch => &["region", "category", "company_name"],
            SuggestKind::AllCompanies | SuggestKind::CustomerId => &[],
        };
        for (key, value) in filters {
            if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
                if allowed.contains(&key) {
                    query.push((key, value));
                }
            }
        }

        match kind {
            SuggestKind::Company => {
                let body: CompanyNamesBody =
                    self.get_json(&["search_company_name", ""], &query).await?;
                Ok(body.company_names)
            }
            SuggestKind::Branch => {
                let body: BranchNamesBody =
                    self.get_json(&["search_branch_name", ""], &query).await?;
                Ok(body.branch_names)
            }
            SuggestKind::AllCompanies => {
                let body: CompanyNamesBody = self
                    .get_json(&["search_all_company_names", ""], &query)
                    .await?;
                Ok(body.company_names)
            }
            SuggestKind::CustomerId => {
                let body: CustomerIdsBody = self
                    .get_json(&["search_all_customer_ids", ""], &query)
                    .await?;
                Ok(body.customer_ids)
            }
        }
    }
}
