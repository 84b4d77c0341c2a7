//! Quark netdisk adapter - three-step token-exchange protocol against the
//! provider's private share API.
//!
//! The flow mirrors what the web client does: exchange the share id and
//! passcode for a short-lived `stoken`, fetch one page of the share's file
//! list, then ask the provider to copy those files into the account. Every
//! call carries the fixed browser-identifying header set plus per-call
//! timestamp/nonce query parameters the API expects.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extractor::Platform;

use super::http::{READ_TIMEOUT_SECS, build_provider_http_client};
use super::{
    FileDescriptor, LISTING_PAGE_SIZE, ProviderAdapter, ProviderError, ShareLink, ShareListing,
    ShareSession, parse_pwd_id,
};

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://drive-pc.quark.cn";

/// Origin/referer presented on every call.
const QUARK_ORIGIN: &str = "https://pan.quark.cn";
const QUARK_REFERER: &str = "https://pan.quark.cn/";

/// The copy call may take much longer than resolve/list.
const SAVE_TIMEOUT_SECS: u64 = 60;

/// Success status in the provider's response envelope.
const ENVELOPE_OK: i64 = 200;

/// Listing sort order, matching the web client.
const LISTING_SORT: &str = "file_type:asc,updated_at:desc";

// ==================== Quark API wire types ====================

/// Response envelope shared by all three calls.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenData {
    stoken: String,
}

#[derive(Debug, Default, Deserialize)]
struct DetailData {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    list: Vec<QuarkShareFile>,
}

#[derive(Debug, Deserialize)]
struct QuarkShareFile {
    fid: String,
    share_fid_token: String,
    #[serde(default)]
    file_type: i64,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    pwd_id: &'a str,
    passcode: &'a str,
}

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    fid_list: Vec<&'a str>,
    fid_token_list: Vec<&'a str>,
    to_pdir_fid: &'a str,
    pwd_id: &'a str,
    stoken: &'a str,
    pdir_fid: &'a str,
    scene: &'a str,
}

// ==================== QuarkAdapter ====================

/// Token-protocol adapter for Quark netdisk shares.
pub struct QuarkAdapter {
    client: Client,
    base_url: String,
}

impl QuarkAdapter {
    /// Creates an adapter against the production API.
    ///
    /// `cookie_header` carries the account session; without it the copy
    /// step has no account to land in and the API rejects the calls.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ClientBuild`] if client construction fails.
    pub fn new(cookie_header: Option<&str>) -> Result<Self, ProviderError> {
        Self::build(cookie_header, DEFAULT_BASE_URL.to_string())
    }

    /// Creates an adapter with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ClientBuild`] if client construction fails.
    pub fn with_base_url(
        cookie_header: Option<&str>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Self::build(cookie_header, base_url.into())
    }

    fn build(cookie_header: Option<&str>, base_url: String) -> Result<Self, ProviderError> {
        let client = build_provider_http_client(QUARK_ORIGIN, QUARK_REFERER, cookie_header)?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl std::fmt::Debug for QuarkAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuarkAdapter")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Per-call timestamp/nonce parameters the API uses against replays.
fn anti_replay_params() -> Vec<(String, String)> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let nonce: u32 = rand::thread_rng().gen_range(100..10_000);

    vec![
        ("pr".to_string(), "ucpro".to_string()),
        ("fr".to_string(), "pc".to_string()),
        ("uc_param_str".to_string(), String::new()),
        ("__dt".to_string(), nonce.to_string()),
        ("__t".to_string(), millis.to_string()),
    ]
}

/// Checks the transport-level response status before envelope decoding.
fn check_http_status(status: reqwest::StatusCode) -> Result<(), ProviderError> {
    if status.as_u16() == 429 {
        return Err(ProviderError::Throttled);
    }
    if !status.is_success() {
        return Err(ProviderError::Protocol {
            status: i64::from(status.as_u16()),
            message: format!("unexpected HTTP status {status}"),
        });
    }
    Ok(())
}

#[async_trait]
impl ProviderAdapter for QuarkAdapter {
    fn name(&self) -> &'static str {
        "quark"
    }

    fn platform(&self) -> Platform {
        Platform::Quark
    }

    #[tracing::instrument(skip(self, share), fields(url = %share.url))]
    async fn resolve_share(&self, share: &ShareLink) -> Result<ShareSession, ProviderError> {
        let pwd_id = parse_pwd_id(&share.url)?;
        let passcode = share.password.clone().unwrap_or_default();

        let response = self
            .client
            .post(self.endpoint("/1/clouddrive/share/sharepage/token"))
            .query(&anti_replay_params())
            .json(&TokenRequest {
                pwd_id: &pwd_id,
                passcode: &passcode,
            })
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e, READ_TIMEOUT_SECS))?;

        check_http_status(response.status())?;
        let envelope: ApiEnvelope<TokenData> = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if envelope.status != ENVELOPE_OK {
            // The token call is where passcode problems surface
            return Err(ProviderError::Auth {
                message: envelope.message_or("share token refused"),
            });
        }

        let stoken = envelope
            .data
            .map(|d| d.stoken)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::Auth {
                message: "token response carried no stoken".to_string(),
            })?;

        debug!(pwd_id = %pwd_id, "share resolved");
        Ok(ShareSession {
            url: share.url.clone(),
            pwd_id,
            passcode,
            stoken,
        })
    }

    #[tracing::instrument(skip(self, session), fields(pwd_id = %session.pwd_id))]
    async fn list_contents(&self, session: &ShareSession) -> Result<ShareListing, ProviderError> {
        let mut params = anti_replay_params();
        params.extend([
            ("pwd_id".to_string(), session.pwd_id.clone()),
            ("stoken".to_string(), session.stoken.clone()),
            ("pdir_fid".to_string(), "0".to_string()),
            ("force".to_string(), "0".to_string()),
            ("_page".to_string(), "1".to_string()),
            ("_size".to_string(), LISTING_PAGE_SIZE.to_string()),
            ("_sort".to_string(), LISTING_SORT.to_string()),
        ]);

        let response = self
            .client
            .get(self.endpoint("/1/clouddrive/share/sharepage/detail"))
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e, READ_TIMEOUT_SECS))?;

        check_http_status(response.status())?;
        let envelope: ApiEnvelope<DetailData> = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if envelope.status != ENVELOPE_OK {
            let message = envelope.message_or("share detail refused");
            return Err(ProviderError::Protocol {
                status: envelope.status,
                message,
            });
        }

        let data = envelope.data.unwrap_or(DetailData {
            title: None,
            list: Vec::new(),
        });

        if data.list.is_empty() {
            return Err(ProviderError::EmptyShare);
        }

        let mut files: Vec<FileDescriptor> = data
            .list
            .into_iter()
            .map(|f| FileDescriptor {
                fid: f.fid,
                share_fid_token: f.share_fid_token,
                file_type: f.file_type,
            })
            .collect();
        // Single-page contract even if the API over-delivers
        files.truncate(LISTING_PAGE_SIZE);

        debug!(files = files.len(), "share listed");
        Ok(ShareListing {
            title: data.title.unwrap_or_default(),
            files,
        })
    }

    #[tracing::instrument(skip(self, session, files), fields(pwd_id = %session.pwd_id, files = files.len()))]
    async fn copy_to_account(
        &self,
        session: &ShareSession,
        files: &[FileDescriptor],
        destination: &str,
    ) -> Result<(), ProviderError> {
        if files.is_empty() {
            return Err(ProviderError::EmptyShare);
        }

        let body = SaveRequest {
            fid_list: files.iter().map(|f| f.fid.as_str()).collect(),
            fid_token_list: files.iter().map(|f| f.share_fid_token.as_str()).collect(),
            to_pdir_fid: destination,
            pwd_id: &session.pwd_id,
            stoken: &session.stoken,
            pdir_fid: "0",
            scene: "link",
        };

        let response = self
            .client
            .post(self.endpoint("/1/clouddrive/share/sharepage/save"))
            .query(&anti_replay_params())
            .timeout(Duration::from_secs(SAVE_TIMEOUT_SECS))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e, SAVE_TIMEOUT_SECS))?;

        check_http_status(response.status())?;
        let envelope: ApiEnvelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if envelope.status != ENVELOPE_OK {
            let message = envelope.message_or("save refused");
            warn!(status = envelope.status, %message, "copy rejected");
            return Err(ProviderError::Protocol {
                status: envelope.status,
                message,
            });
        }

        debug!("copy accepted");
        Ok(())
    }
}
