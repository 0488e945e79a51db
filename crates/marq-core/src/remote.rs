//! Remote store client
//!
//! The store owns authentication, persistence, and change delivery;
//! this module is the request/response half of that contract. The
//! `RemoteStore` trait carries the shape the rest of the library
//! consumes, and `ApiClient` implements it over HTTP with a bearer
//! session token.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Bookmark, Identity, NewBookmark};

/// Request/response operations the store exposes
///
/// All calls are scoped to the signed-in identity by the server; the
/// client only forwards the session token.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Look up the current identity, `None` when signed out
    async fn current_user(&self) -> Result<Option<Identity>>;

    /// Fetch the owner's bookmarks, newest first
    async fn list_bookmarks(&self, owner: Uuid) -> Result<Vec<Bookmark>>;

    /// Create a bookmark; the store assigns id and timestamp
    async fn insert_bookmark(&self, new: NewBookmark) -> Result<Bookmark>;

    /// Delete a bookmark by id
    async fn delete_bookmark(&self, id: Uuid) -> Result<()>;

    /// End the session
    async fn sign_out(&self) -> Result<()>;
}

/// HTTP implementation of `RemoteStore`
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client from configuration
    ///
    /// Every request carries the configured bounded timeout; expiry
    /// surfaces as a store error like any other transport failure.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::store(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Read the error body of a failed response, falling back to the status
    async fn rejection(resp: reqwest::Response) -> Error {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Error::auth("the store rejected the session token");
        }
        let body = resp.text().await.unwrap_or_default();
        if body.is_empty() {
            Error::store(format!("request failed with status {status}"))
        } else {
            Error::store(body)
        }
    }
}

fn transport(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::store(format!("request timed out: {err}"))
    } else {
        Error::store(format!("transport error: {err}"))
    }
}

#[async_trait]
impl RemoteStore for ApiClient {
    async fn current_user(&self) -> Result<Option<Identity>> {
        let resp = self
            .authorize(self.http.get(self.endpoint("auth/user")))
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            StatusCode::OK => {
                let identity = resp
                    .json::<Identity>()
                    .await
                    .map_err(|e| Error::store(format!("malformed identity response: {e}")))?;
                Ok(Some(identity))
            }
            // Signed out is a normal answer, not a failure
            StatusCode::UNAUTHORIZED | StatusCode::NO_CONTENT => Ok(None),
            _ => Err(Self::rejection(resp).await),
        }
    }

    async fn list_bookmarks(&self, owner: Uuid) -> Result<Vec<Bookmark>> {
        let resp = self
            .authorize(self.http.get(self.endpoint("bookmarks")))
            .query(&[("owner", owner.to_string())])
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        resp.json::<Vec<Bookmark>>()
            .await
            .map_err(|e| Error::store(format!("malformed bookmark list: {e}")))
    }

    async fn insert_bookmark(&self, new: NewBookmark) -> Result<Bookmark> {
        let resp = self
            .authorize(self.http.post(self.endpoint("bookmarks")))
            .json(&new)
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        resp.json::<Bookmark>()
            .await
            .map_err(|e| Error::store(format!("malformed created bookmark: {e}")))
    }

    async fn delete_bookmark(&self, id: Uuid) -> Result<()> {
        let resp = self
            .authorize(self.http.delete(self.endpoint(&format!("bookmarks/{id}"))))
            .send()
            .await
            .map_err(transport)?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        let resp = self
            .authorize(self.http.post(self.endpoint("auth/logout")))
            .send()
            .await
            .map_err(transport)?;

        // An already-dead session is as signed out as it gets
        if resp.status().is_success() || resp.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(Self::rejection(resp).await)
        }
    }
}
