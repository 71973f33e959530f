pub mod endpoints;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};

/// HTTP client wrapper for the dashboard REST API.
#[derive(Debug, Clone)]
pub struct DashboardHttpClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl DashboardHttpClient {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    /// Build a URL from path segments; each segment is percent-encoded, so
    /// user names with spaces or slashes stay one segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| DashboardError::InvalidKey(format!("base URL {} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        let resp = self.authorize(self.client.get(url)).send().await?;
        let resp = check_status(resp).await?;
        resp.json::<T>().await.map_err(DashboardError::Request)
    }

    /// POST a JSON body; the response body is ignored.
    pub async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<()> {
        let url = self.url(segments)?;
        let resp = self
            .authorize(self.client.post(url))
            .json(body)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// DELETE a resource; the response body is ignored.
    pub async fn delete(&self, segments: &[&str]) -> Result<()> {
        let url = self.url(segments)?;
        let resp = self.authorize(self.client.delete(url)).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(DashboardError::Http {
        status,
        message: body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_url: &str) -> DashboardHttpClient {
        DashboardHttpClient::new(&DashboardConfig {
            api_url: api_url.into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_joins_segments_under_base_path() {
        let c = client("http://localhost:8000/api/");
        assert_eq!(c.base_url(), "http://localhost:8000/api");
        let url = c.url(&["users", "alice", "settings"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/users/alice/settings");
    }

    #[test]
    fn test_url_encodes_user_names() {
        let c = client("http://localhost:8000");
        let url = c.url(&["users", "jo doe/2"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/users/jo%20doe%2F2");
    }
}
