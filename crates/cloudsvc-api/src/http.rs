//! reqwest-backed implementation of [`ServiceApi`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::traits::ServiceApi;
use crate::types::{CreateServiceRequest, RemoteService, UpdateServiceRequest};

const USER_AGENT: &str = concat!("cloudsvc/", env!("CARGO_PKG_VERSION"));

pub struct HttpServiceApi {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ServiceEnvelope {
    service: RemoteService,
}

/// Error body shape: `{"message": "...", "errors": [{"message": "..."}]}`.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Deserialize)]
struct ErrorItem {
    message: String,
}

impl HttpServiceApi {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the URL cannot be parsed or cannot
    /// carry a path.
    pub fn new(base_url: &str, token: Option<String>) -> ApiResult<Self> {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        token: Option<String>,
    ) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::transport(format!("invalid API URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::transport(format!(
                "API URL {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// `/v1/project/{project}/service[/{service_name}]`, each part percent-encoded.
    fn service_url(&self, project: &str, service_name: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "project", project, "service"]);
            if let Some(name) = service_name {
                segments.push(name);
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            req = req.header(reqwest::header::AUTHORIZATION, format!("aivenv1 {token}"));
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> ApiResult<Response> {
        req.send()
            .await
            .map_err(|e| ApiError::transport(format!("failed to reach API: {e}")))
    }
}

#[async_trait]
impl ServiceApi for HttpServiceApi {
    async fn create(
        &self,
        project: &str,
        request: &CreateServiceRequest,
    ) -> ApiResult<RemoteService> {
        let url = self.service_url(project, None);
        debug!(%url, service_type = %request.service_type, "Creating service");
        let resp = self.send(self.request(Method::POST, url).json(request)).await?;
        let envelope: ServiceEnvelope =
            handle_response(resp, project, &request.service_name).await?;
        Ok(envelope.service)
    }

    async fn get(&self, project: &str, service_name: &str) -> ApiResult<RemoteService> {
        let url = self.service_url(project, Some(service_name));
        debug!(%url, "Fetching service");
        let resp = self.send(self.request(Method::GET, url)).await?;
        let envelope: ServiceEnvelope = handle_response(resp, project, service_name).await?;
        Ok(envelope.service)
    }

    async fn update(
        &self,
        project: &str,
        service_name: &str,
        request: &UpdateServiceRequest,
    ) -> ApiResult<RemoteService> {
        let url = self.service_url(project, Some(service_name));
        debug!(%url, "Updating service");
        let resp = self.send(self.request(Method::PUT, url).json(request)).await?;
        let envelope: ServiceEnvelope = handle_response(resp, project, service_name).await?;
        Ok(envelope.service)
    }

    async fn delete(&self, project: &str, service_name: &str) -> ApiResult<()> {
        let url = self.service_url(project, Some(service_name));
        debug!(%url, "Deleting service");
        let resp = self.send(self.request(Method::DELETE, url)).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(status_error(status, &body, project, service_name))
    }
}

async fn handle_response<T: DeserializeOwned>(
    resp: Response,
    project: &str,
    service_name: &str,
) -> ApiResult<T> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ApiError::transport(format!("failed to read response body: {e}")))?;

    if !status.is_success() {
        return Err(status_error(status, &body, project, service_name));
    }

    serde_json::from_str(&body).map_err(|e| ApiError::decode(e.to_string()))
}

fn status_error(status: StatusCode, body: &str, project: &str, service_name: &str) -> ApiError {
    if status == StatusCode::NOT_FOUND {
        return ApiError::not_found(project, service_name);
    }

    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; "),
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => body.to_string(),
    };
    ApiError::http(status.as_u16(), message)
}
