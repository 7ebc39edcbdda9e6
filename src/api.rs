//! HTTP gateway to the CardForge backend.
//!
//! Every authenticated request carries the bearer token; a 401 from any
//! endpoint surfaces as [`ApiError::Unauthorized`], which the app treats as
//! a forced logout. Local validation happens before calls ever reach here,
//! so the only errors are connectivity, auth, and server rejections.

use std::env;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::collection::ViewTarget;
use crate::models::{
    Ack, AuthReply, CollectionData, FriendsData, PackData, RequestAction, UserSearchData,
    UserSummary,
};

pub const DEFAULT_SERVER: &str = "http://localhost:8080";

/// Errors carried through `iced` messages, hence `Clone` and detached from
/// the underlying `reqwest`/`serde_json` errors (those are logged at the
/// failure site instead).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Could not connect to the server.")]
    Network,
    #[error("Session expired.")]
    Unauthorized,
    #[error("{0}")]
    Rejected(String),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().into(),
            token: None,
        }
    }

    /// Reads `CARDFORGE_SERVER`, falling back to [`DEFAULT_SERVER`].
    pub fn from_env() -> Self {
        let base = env::var("CARDFORGE_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_owned());
        Self::new(base)
    }

    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            base: self.base.clone(),
            token: token.map(Into::into),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Sends a request and decodes the `{success, message, ...}` envelope.
    /// Non-2xx bodies and `success: false` both become
    /// [`ApiError::Rejected`] with the server message, or `fallback` when
    /// the body carries none.
    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let res = self.authed(req).send().await.map_err(|error| {
            warn!(%error, "request failed");
            ApiError::Network
        })?;
        if res.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        let status = res.status();
        let body = res.text().await.map_err(|error| {
            warn!(%error, "failed to read response body");
            ApiError::Network
        })?;

        let ack: Ack = serde_json::from_str(&body).unwrap_or_default();
        if !status.is_success() || !ack.success {
            return Err(ApiError::Rejected(
                ack.message.unwrap_or_else(|| fallback.to_owned()),
            ));
        }
        serde_json::from_str(&body).map_err(|error| {
            warn!(%error, %status, "malformed response payload");
            ApiError::Rejected(fallback.to_owned())
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let reply: AuthReply = self
            .send(
                self.http
                    .post(self.url("/api/login"))
                    .json(&json!({ "email": email, "password": password })),
                "Login failed.",
            )
            .await?;
        reply
            .token
            .ok_or_else(|| ApiError::Rejected("Login failed.".to_owned()))
    }

    pub async fn register(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        self.send::<Ack>(
            self.http.post(self.url("/api/register")).json(&json!({
                "displayName": display_name,
                "email": email,
                "password": password,
            })),
            "An error occurred.",
        )
        .await
        .map(|_| ())
    }

    pub async fn load_collection(&self, target: &ViewTarget) -> Result<CollectionData, ApiError> {
        let path = format!("/api/collection/{}", target.wire_id());
        self.send(self.http.get(self.url(&path)), "Failed to fetch collection.")
            .await
    }

    /// Persists a packed deck. The caller reloads the collection afterwards;
    /// the server stays the source of truth for the stored list.
    pub async fn save_deck(&self, deck_index: usize, cards: Vec<String>) -> Result<(), ApiError> {
        self.send::<Ack>(
            self.http
                .put(self.url("/api/decks"))
                .json(&json!({ "deckIndex": deck_index, "cards": cards })),
            "Failed to save deck.",
        )
        .await
        .map(|_| ())
    }

    pub async fn friends(&self) -> Result<FriendsData, ApiError> {
        self.send(
            self.http.get(self.url("/api/friends")),
            "Failed to load friends data.",
        )
        .await
    }

    pub async fn search_users(&self, name: &str) -> Result<Vec<UserSummary>, ApiError> {
        let data: UserSearchData = self
            .send(
                self.http
                    .get(self.url("/api/users/search"))
                    .query(&[("name", name)]),
                "Search failed.",
            )
            .await?;
        Ok(data.users)
    }

    pub async fn send_friend_request(&self, recipient_id: &str) -> Result<(), ApiError> {
        self.send::<Ack>(
            self.http
                .post(self.url("/api/friends/request"))
                .json(&json!({ "recipientId": recipient_id })),
            "Failed to send friend request.",
        )
        .await
        .map(|_| ())
    }

    pub async fn respond_to_request(
        &self,
        other_user_id: &str,
        action: RequestAction,
    ) -> Result<(), ApiError> {
        self.send::<Ack>(
            self.http
                .post(self.url("/api/friends/response"))
                .json(&json!({ "otherUserId": other_user_id, "action": action })),
            "Failed to respond to friend request.",
        )
        .await
        .map(|_| ())
    }

    pub async fn remove_friend(&self, friend_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/friends/{friend_id}");
        self.send::<Ack>(self.http.delete(self.url(&path)), "Failed to remove friend.")
            .await
            .map(|_| ())
    }

    pub async fn open_pack(&self) -> Result<PackData, ApiError> {
        self.send(
            self.http.post(self.url("/api/open_pack")),
            "Failed to open pack.",
        )
        .await
    }
}

/// Fetches a card image for the in-memory cache, keyed by its URL. Failures
/// just leave the placeholder in place.
pub async fn download_image(url: String) -> (String, Option<Bytes>) {
    let request = reqwest::get(&url).await.ok();
    let img = match request {
        Some(res) => res.bytes().await.ok(),
        None => None,
    };
    (url, img)
}
