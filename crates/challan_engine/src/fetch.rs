use std::time::Duration;

use challan_core::ChallanPayload;

use crate::decode::decode_envelope;
use crate::types::{LookupError, LookupErrorKind};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://number.vahanfin.com".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// One lookup attempt for one registration number. No internal retry; the
/// scheduler owns resubmission. Implementations must be safe to call
/// concurrently for different registration numbers.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, reg_num: &str) -> Result<ChallanPayload, LookupError>;
}

/// Production fetcher against the vahanfin echallan endpoint.
#[derive(Debug, Clone)]
pub struct VahanFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl VahanFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| LookupError::new(LookupErrorKind::Transport, err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url,
        })
    }

    /// `{base_url}/echallan/{reg_num}`, with the registration number escaped
    /// as a path segment.
    fn lookup_url(&self, reg_num: &str) -> Result<url::Url, LookupError> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|err| LookupError::new(LookupErrorKind::Transport, err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                LookupError::new(LookupErrorKind::Transport, "base url cannot be a base")
            })?
            .push("echallan")
            .push(reg_num);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Fetcher for VahanFetcher {
    async fn fetch(&self, reg_num: &str) -> Result<ChallanPayload, LookupError> {
        let url = self.lookup_url(reg_num)?;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::http_status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|err| LookupError::new(LookupErrorKind::Malformed, err.to_string()))?;

        decode_envelope(&body)
            .map_err(|err| LookupError::new(LookupErrorKind::Malformed, err.to_string()))
    }
}

fn map_transport_error(err: reqwest::Error) -> LookupError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    LookupError::new(LookupErrorKind::Transport, message)
}
