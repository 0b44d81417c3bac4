use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::Visit,
    error::ServiceErrorBody,
    protocol::{HistoryQuery, UnlockResponse, API_KEY_HEADER, HISTORY_PATH, RING_PATH, UNLOCK_PATH},
};
use tracing::{debug, warn};
use url::Url;

use crate::{config::ClientSettings, error::ClientError};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Direct HTTP access to the doorbell service.
///
/// Calls on one `DoorbellClient` are not serialized; [`crate::DoorbellService`] wraps it
/// in a single worker for that.
#[derive(Clone)]
pub struct DoorbellClient {
    http: Client,
    base_url: Url,
    origin: String,
    api_key: Option<String>,
}

impl DoorbellClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| ClientError::InvalidConfig(err.to_string()))?;
        Ok(Self::with_http(http, settings))
    }

    pub fn with_http(http: Client, settings: &ClientSettings) -> Self {
        Self {
            http,
            base_url: settings.base_url.clone(),
            origin: settings.origin().to_string(),
            api_key: settings.api_key.clone(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn ring_doorbell(&self) -> Result<Visit, ClientError> {
        let request = self.http.post(self.url(RING_PATH));
        let body = self.execute("POST", RING_PATH, empty_json(request)).await?;
        let visit: Visit = decode(&body)?;
        debug!(visit_id = visit.id.0, photo = ?visit.effective_photo_url(), "doorbell rang");
        Ok(visit)
    }

    pub async fn unlock_door(&self) -> Result<(), ClientError> {
        let api_key = self.api_key.as_deref().ok_or(ClientError::MissingApiKey)?;
        let request = self
            .http
            .post(self.url(UNLOCK_PATH))
            .header(API_KEY_HEADER, api_key);
        let body = self.execute("POST", UNLOCK_PATH, empty_json(request)).await?;
        if let Ok(UnlockResponse {
            message: Some(message),
        }) = serde_json::from_slice(&body)
        {
            debug!(%message, "door unlock acknowledged");
        }
        Ok(())
    }

    pub async fn visit_history(&self, limit: u32, offset: u32) -> Result<Vec<Visit>, ClientError> {
        let request = self
            .http
            .get(self.url(HISTORY_PATH))
            .query(&HistoryQuery { limit, offset });
        let body = self.execute("GET", HISTORY_PATH, request).await?;
        let visits: Vec<Visit> = decode(&body)?;
        debug!(limit, offset, received = visits.len(), "visit history page");
        Ok(visits)
    }

    pub async fn download_photo(&self, url: Url) -> Result<Vec<u8>, ClientError> {
        let path = url.path().to_string();
        let bytes = self.execute("GET", &path, self.http.get(url)).await?;
        Ok(bytes)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.origin)
    }

    async fn execute(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, ClientError> {
        debug!(method, path, "sending doorbell request");
        let response = request.send().await.map_err(|err| {
            let err = ClientError::from(err);
            warn!(method, path, error = %err, "doorbell request failed");
            err
        })?;
        read_success(method, path, response).await
    }
}

fn empty_json(request: RequestBuilder) -> RequestBuilder {
    request.header(CONTENT_TYPE, JSON_CONTENT_TYPE).body(Vec::new())
}

async fn read_success(
    method: &'static str,
    path: &str,
    response: Response,
) -> Result<Vec<u8>, ClientError> {
    let status = response.status();
    if !status.is_success() {
        // The body only refines the message; its absence never changes the error kind.
        let detail = response
            .bytes()
            .await
            .ok()
            .and_then(|body| serde_json::from_slice::<ServiceErrorBody>(&body).ok())
            .map(|body| body.message());
        warn!(method, path, status = status.as_u16(), ?detail, "doorbell service rejected request");
        return Err(ClientError::Server {
            status: status.as_u16(),
            detail,
        });
    }

    let body = response.bytes().await.map_err(ClientError::from)?;
    debug!(method, path, status = status.as_u16(), bytes = body.len(), "doorbell request completed");
    Ok(body.to_vec())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ClientError::MalformedResponse("empty response body".into()));
    }
    serde_json::from_slice(body).map_err(|err| ClientError::MalformedResponse(err.to_string()))
}
