use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;

use crate::Error;

// Definition of future types for async use
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// A fully buffered POST request
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

/// The HTTP capability the transport relies on.
///
/// Implementations return `Error::Transport` when no response was received.
/// Any response, whatever its status, is returned as `Ok`.
pub trait HttpClient: Send + Sync {
    fn post(&self, request: HttpRequest) -> ClientFuture<'_, HttpResponse>;
}

pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: u64) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| Error::Config(format!("unable to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn post(&self, request: HttpRequest) -> ClientFuture<'_, HttpResponse> {
        Box::pin(async move {
            let mut req = self
                .client
                .post(reqwest::Url::parse(&request.url).map_err(|e| Error::Transport(e.to_string()))?);

            for (name, value) in &request.headers {
                req = req.header(name.as_str(), value.as_str());
            }

            let resp = req.body(request.body).send().await?;
            let status = resp.status().as_u16();

            // Buffer the whole body before anyone looks at it
            let body = resp.bytes().await?;

            Ok(HttpResponse { status, body })
        })
    }
}
