//! GCP Client
//!
//! Combines authentication, the HTTP client and per-service endpoint
//! resolution. Project, region and zone are not part of the client; they
//! arrive with each call's `DescribeContext`.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Default API hosts, keyed by the service names used in resource definitions
const DEFAULT_ENDPOINTS: &[(&str, &str)] = &[
    ("bigquery", "https://bigquery.googleapis.com"),
    ("cloudbilling", "https://cloudbilling.googleapis.com"),
    ("cloudresourcemanager", "https://cloudresourcemanager.googleapis.com"),
    ("compute", "https://compute.googleapis.com"),
    ("container", "https://container.googleapis.com"),
    ("pubsub", "https://pubsub.googleapis.com"),
    ("storage", "https://storage.googleapis.com"),
];

/// How requests are authorized
#[derive(Clone)]
pub enum Auth {
    /// Application Default Credentials
    Adc(GcpCredentials),
    /// A pre-issued OAuth access token
    Token(String),
}

impl Auth {
    async fn token(&self) -> Result<String> {
        match self {
            Auth::Adc(credentials) => credentials.get_token().await,
            Auth::Token(token) => Ok(token.clone()),
        }
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    auth: Auth,
    http: GcpHttpClient,
    endpoints: Arc<HashMap<String, String>>,
}

impl GcpClient {
    /// Client authorized through Application Default Credentials
    pub async fn new() -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;
        Self::with_auth(Auth::Adc(credentials))
    }

    /// Client authorized with a fixed access token
    pub fn with_token(token: impl Into<String>) -> Result<Self> {
        Self::with_auth(Auth::Token(token.into()))
    }

    pub fn with_auth(auth: Auth) -> Result<Self> {
        let endpoints = DEFAULT_ENDPOINTS
            .iter()
            .map(|(service, base)| (service.to_string(), base.to_string()))
            .collect();

        Ok(Self {
            auth,
            http: GcpHttpClient::new()?,
            endpoints: Arc::new(endpoints),
        })
    }

    /// Replace the base URL of some services (tests, private endpoints)
    pub fn with_endpoints<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let endpoints = Arc::make_mut(&mut self.endpoints);
        for (service, base) in overrides {
            let base: String = base.into();
            endpoints.insert(service.into(), base.trim_end_matches('/').to_string());
        }
        self
    }

    /// Base URL for a service
    pub fn endpoint(&self, service: &str) -> Result<&str> {
        self.endpoints
            .get(service)
            .map(String::as_str)
            .with_context(|| format!("No endpoint configured for service '{}'", service))
    }

    /// Absolute URL for `path` on `service`, with query parameters
    pub fn url(&self, service: &str, path: &str, query: &[(String, String)]) -> Result<Url> {
        let base = self.endpoint(service)?;
        let mut url = Url::parse(&format!("{}{}", base, path))
            .with_context(|| format!("Invalid URL for service '{}': {}", service, path))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// GET a JSON document
    pub async fn get(&self, url: &Url) -> Result<Value> {
        let token = self.auth.token().await?;
        self.http.get(url.as_str(), &token).await
    }
}
