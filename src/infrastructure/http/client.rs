//! reqwest-based implementation of the backend ports

use super::dto::{CallTargetDto, CredentialDto, ErrorBody, MeetingDto, StatusUpdateDto};
use crate::config::{BackendConfig, EndpointsConfig};
use crate::domain::call::{CallDirectory, CallTarget, CredentialIssuer, SessionCredential};
use crate::domain::meeting::{MeetingRecord, MeetingRepository, MeetingStatus};
use crate::domain::shared::{CallId, MeetingId, Result, ServiceError};
use crate::domain::user::Actor;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// REST backend client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
    endpoints: EndpointsConfig,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::Network(format!("cannot build HTTP client: {}", e)))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ServiceError::Malformed(format!("invalid base URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::Malformed(format!(
                "base URL {} cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
            endpoints: config.endpoints.clone(),
        })
    }

    /// Endpoint URL. Placeholders fill whole path segments and ids are
    /// percent-encoded, so `/`, `?` or `#` in an id stay inside its segment.
    fn url(&self, template: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ServiceError::Malformed(format!("base URL {} cannot carry a path", self.base_url))
            })?;
            segments.pop_if_empty();
            for part in template.split('/').filter(|part| !part.is_empty()) {
                let value = params
                    .iter()
                    .find(|(name, _)| part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) == Some(*name))
                    .map(|(_, value)| *value)
                    .unwrap_or(part);
                segments.push(value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let builder = self.client.request(method, url.clone());
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and map non-success responses, extracting `{"message"}` bodies
    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Network(format!("request to {} timed out", url))
            } else {
                ServiceError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = ErrorBody::extract(&body);
        warn!("{} responded {} ({:?})", url, status, message);

        if status == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(message.unwrap_or_else(|| url.path().to_string())));
        }
        Err(ServiceError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, url: &Url) -> Result<T> {
        self.send(request, url)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl MeetingRepository for HttpBackend {
    async fn get(&self, id: &MeetingId) -> Result<MeetingRecord> {
        let url = self.url(&self.endpoints.meeting, &[("meetingId", id.as_str())])?;
        let dto: MeetingDto = self.json(self.request(Method::GET, &url), &url).await?;
        MeetingRecord::try_from(dto)
    }

    async fn set_status(&self, id: &MeetingId, status: MeetingStatus) -> Result<()> {
        let url = self.url(&self.endpoints.meeting_status, &[("meetingId", id.as_str())])?;
        let request = self
            .request(Method::PATCH, &url)
            .json(&StatusUpdateDto {
                status: status.as_str(),
            });
        self.send(request, &url).await?;
        debug!("Meeting {} set to {}", id, status.as_str());
        Ok(())
    }
}

#[async_trait]
impl CallDirectory for HttpBackend {
    async fn default_call_target(&self, actor: &Actor) -> Result<CallTarget> {
        let url = self.url(&self.endpoints.default_call, &[])?;
        debug!("Fetching default call of actor {}", actor.id);
        let dto: CallTargetDto = self.json(self.request(Method::GET, &url), &url).await?;
        CallTarget::try_from(dto)
    }
}

#[async_trait]
impl CredentialIssuer for HttpBackend {
    async fn issue(&self, call_id: &CallId) -> Result<SessionCredential> {
        let url = self.url(&self.endpoints.call_token, &[("callId", call_id.as_str())])?;
        let dto: CredentialDto = self.json(self.request(Method::POST, &url), &url).await?;
        Ok(dto.into())
    }
}
