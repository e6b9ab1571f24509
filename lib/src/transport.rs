use crate::body::BodyBuilder;
use crate::client::{HttpClient, HttpRequest, ReqwestClient};
use crate::compliance::{ApiVersion, Headers, RawResponse, SendResult};
use crate::config::{AttachmentPolicy, Settings};
use crate::email::Message;
use crate::Error;

pub const NAME: &str = "SendinBlue";
pub const API_KEY_HEADER: &str = "api-key";

/// Sends messages through the transactional email API.
///
/// Everything computed here at construction (endpoint, API generation,
/// default headers) is read-only afterwards, so one `Transport` can serve
/// concurrent sends.
pub struct Transport<C = ReqwestClient> {
    client: C,
    api_key: String,
    send_url: String,
    version: ApiVersion,
    base_headers: Headers,
    policy: AttachmentPolicy,
}

impl Transport<ReqwestClient> {
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let client = ReqwestClient::new(settings.request_timeout)?;
        Self::with_client(settings, client)
    }
}

impl<C: HttpClient> Transport<C> {
    pub fn with_client(settings: &Settings, client: C) -> Result<Self, Error> {
        let endpoint = settings.validate()?;
        let version = ApiVersion::detect(&endpoint);
        let send_url = format!("{}/email", settings.api_url.trim().trim_end_matches('/'));

        let mut base_headers = Headers::new();
        base_headers.insert("Content-Type".to_string(), "application/json".to_string());
        base_headers.insert("Accept".to_string(), "application/json".to_string());

        log::debug!("Using {} API at {}", version, send_url);

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            send_url,
            version,
            base_headers,
            policy: settings.on_attachment_error,
        })
    }

    pub fn name(&self) -> &'static str {
        NAME
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn api_version(&self) -> ApiVersion {
        self.version
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }

    fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![(API_KEY_HEADER.to_string(), self.api_key.clone())];
        headers.extend(
            self.base_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        headers
    }

    /// Send a single message. Nothing is retried: transport and remote
    /// errors are returned to the caller as-is.
    pub async fn send(&self, message: Message) -> Result<SendResult, Error> {
        let strategy = self.version.strategy();

        let body = BodyBuilder::new(strategy, &self.base_headers, self.policy)
            .build(message)
            .await
            .map_err(Error::build)?;
        let body = serde_json::to_vec(&body).map_err(|e| Error::build(e.into()))?;

        let request = HttpRequest {
            url: self.send_url.clone(),
            headers: self.request_headers(),
            body,
        };

        log::debug!("POST {} ({} bytes)", request.url, request.body.len());

        let response = self.client.post(request).await.map_err(|e| match e {
            Error::Transport(_) => e,
            other => Error::Transport(other.to_string()),
        })?;

        let response = RawResponse::parse(response.status, &response.body);

        if !strategy.is_success(&response) {
            let err = strategy.remote_error(&response);
            log::error!("Failed to send message: {}", err);
            return Err(err);
        }

        let result = strategy.extract_result(response);
        log::info!("Message sent: {}", result.message_id);

        Ok(result)
    }
}
