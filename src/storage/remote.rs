use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::platform::{AuthError, AuthSession};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Remote store error: status {0}")]
    HttpStatus(u16),

    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

// ============================================================================
// Remote Document Store
// ============================================================================

/// Client for the remote document store (Drive app-data space).
///
/// Documents live in the app-private `appDataFolder` and are addressed by a
/// server-assigned file id. The metadata API (`api_base`) serves lookups and
/// reads; content writes go through the upload API (`upload_base`). Both are
/// injectable for tests.
#[derive(Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    api_base: String,
    upload_base: String,
    auth: Arc<AuthSession>,
}

impl RemoteStore {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
        auth: Arc<AuthSession>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            upload_base: upload_base.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn check_status(status: StatusCode) -> Result<(), RemoteError> {
        if status == StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Auth(AuthError::Expired));
        }
        if !status.is_success() {
            return Err(RemoteError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }

    /// Look up a document handle by its well-known name.
    pub async fn find_document(&self, name: &str) -> Result<Option<String>, RemoteError> {
        let bearer = self.auth.bearer()?;
        let name_filter = format!("name='{name}'");
        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .query(&[
                ("spaces", "appDataFolder"),
                ("q", name_filter.as_str()),
                ("fields", "files(id)"),
            ])
            .header(AUTHORIZATION, bearer)
            .send()
            .await?;
        Self::check_status(response.status())?;

        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    /// Read a document's JSON content.
    pub async fn read_document(&self, handle: &str) -> Result<serde_json::Value, RemoteError> {
        let bearer = self.auth.bearer()?;
        let response = self
            .client
            .get(format!("{}/files/{handle}", self.api_base))
            .query(&[("alt", "media")])
            .header(AUTHORIZATION, bearer)
            .send()
            .await?;
        Self::check_status(response.status())?;

        Ok(response.json().await?)
    }

    /// Replace a document's content in place.
    pub async fn update_document(
        &self,
        handle: &str,
        content: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        let bearer = self.auth.bearer()?;
        let body = serde_json::to_string(content)?;
        let response = self
            .client
            .patch(format!("{}/files/{handle}", self.upload_base))
            .query(&[("uploadType", "media")])
            .header(AUTHORIZATION, bearer)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Self::check_status(response.status())
    }

    /// Create a document, returning the server-assigned handle.
    ///
    /// Metadata (name + app-private parent) and JSON content travel in one
    /// `multipart/related` request. The body is assembled by hand:
    /// `reqwest::multipart` produces `multipart/form-data`, which the upload
    /// endpoint does not accept.
    pub async fn create_document(
        &self,
        name: &str,
        content: &serde_json::Value,
    ) -> Result<String, RemoteError> {
        const BOUNDARY: &str = "subdeck_boundary";

        let bearer = self.auth.bearer()?;
        let metadata = serde_json::json!({
            "name": name,
            "parents": ["appDataFolder"],
        });
        let body = format!(
            "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{}\r\n--{BOUNDARY}\r\nContent-Type: application/json\r\n\r\n{}\r\n--{BOUNDARY}--",
            serde_json::to_string(&metadata)?,
            serde_json::to_string(content)?,
        );

        let response = self
            .client
            .post(format!("{}/files", self.upload_base))
            .query(&[("uploadType", "multipart")])
            .header(AUTHORIZATION, bearer)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;
        Self::check_status(response.status())?;

        let file: FileRef = response.json().await?;
        Ok(file.id)
    }
}

// ============================================================================
// Tests
// ============================================================================
