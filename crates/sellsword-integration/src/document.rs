//! Hosted document-store adapter
//!
//! REST client for a document API laid out as
//! `{base_url}/v1/documents/{project}/{collection}/{id}`. Troops, the
//! current session and the player profile each live in their own
//! collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ETAG, IF_MATCH, IF_NONE_MATCH};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use sellsword_combat::{
    CombatSession, Inventory, Item, SessionProgress, Troop, TroopCombatDelta, TroopUpdate,
};
use sellsword_core::{SessionId, TroopId};

use crate::error::StoreError;
use crate::store::BattleStore;
use crate::types::{DocumentList, Profile, TroopPatch};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const TROOPS: &str = "troops";
const SESSIONS: &str = "sessions";
const PROFILES: &str = "profiles";
/// Each player has a single current session document
const CURRENT_SESSION: &str = "current";
/// Conditional profile writes attempted before giving up on a busy profile
const PROFILE_WRITE_ATTEMPTS: u32 = 3;

/// Connection settings for [`DocumentStore`]
#[derive(Debug, Clone)]
pub struct DocumentStoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub profile_id: String,
    /// Bearer token; requests go out unauthenticated without one
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: "sellsword".to_string(),
            profile_id: "default".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct DocumentStore {
    client: Client,
    config: DocumentStoreConfig,
}

impl DocumentStore {
    pub fn new(config: DocumentStoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Network(format!("Failed to create HTTP client: {}", e)))?;
        info!("Document store at {} (project {})", config.base_url, config.project_id);
        Ok(Self { client, config })
    }

    fn url(&self, collection: &str, id: Option<&str>) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match id {
            Some(id) => format!(
                "{}/v1/documents/{}/{}/{}",
                base, self.config.project_id, collection, id
            ),
            None => format!("{}/v1/documents/{}/{}", base, self.config.project_id, collection),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, StoreError> {
        let response = self.request(Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        handle_response(response).await.map(Some)
    }

    async fn load_profile(&self) -> Result<Profile, StoreError> {
        let url = self.url(PROFILES, Some(&self.config.profile_id));
        Ok(self.get_optional(&url).await?.unwrap_or_default())
    }

    /// The profile with the version tag the server sent for it. A missing
    /// profile comes back as the default with no tag.
    async fn load_profile_versioned(&self) -> Result<(Profile, Option<String>), StoreError> {
        let url = self.url(PROFILES, Some(&self.config.profile_id));
        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok((Profile::default(), None));
        }
        let response = check_status(response).await?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok((response.json().await?, etag))
    }

    async fn patch_troop(&self, id: &TroopId, patch: &TroopPatch) -> Result<(), StoreError> {
        let url = self.url(TROOPS, Some(id.as_str()));
        let response = self.request(Method::PATCH, &url).json(patch).send().await?;
        handle_empty(response).await
    }
}

#[async_trait]
impl BattleStore for DocumentStore {
    async fn load_troops(&self) -> Result<Vec<Troop>, StoreError> {
        let url = self.url(TROOPS, None);
        let response = self.request(Method::GET, &url).send().await?;
        let list: DocumentList<Troop> = handle_response(response).await?;
        debug!("Loaded {} troops", list.documents.len());
        Ok(list.documents)
    }

    async fn save_troop(&self, troop: &Troop) -> Result<(), StoreError> {
        let url = self.url(TROOPS, Some(troop.id.as_str()));
        let response = self.request(Method::PUT, &url).json(troop).send().await?;
        handle_empty(response).await
    }

    async fn load_session(&self) -> Result<Option<CombatSession>, StoreError> {
        let url = self.url(SESSIONS, Some(CURRENT_SESSION));
        self.get_optional(&url).await
    }

    async fn save_session(&self, session: &CombatSession) -> Result<(), StoreError> {
        let url = self.url(SESSIONS, Some(CURRENT_SESSION));
        let response = self.request(Method::PUT, &url).json(session).send().await?;
        handle_empty(response).await
    }

    async fn save_progress(&self, progress: &SessionProgress) -> Result<(), StoreError> {
        let url = self.url(SESSIONS, Some(CURRENT_SESSION));
        let current: Option<CombatSession> = self.get_optional(&url).await?;
        if current.map_or(true, |s| s.id != progress.session_id) {
            debug!("Skipped progress for replaced session {}", progress.session_id);
            return Ok(());
        }
        let body = serde_json::json!({
            "enemies": progress.enemies,
            "counters": progress.counters,
            "log": progress.log,
            "tick": progress.tick,
        });
        let response = self.request(Method::PATCH, &url).json(&body).send().await?;
        handle_empty(response).await
    }

    async fn apply_troop_delta(&self, delta: &TroopCombatDelta) -> Result<(), StoreError> {
        self.patch_troop(&delta.troop_id, &TroopPatch::from(delta)).await
    }

    async fn apply_troop_update(&self, update: &TroopUpdate) -> Result<(), StoreError> {
        self.patch_troop(&update.troop_id, &TroopPatch::from(update)).await
    }

    async fn delete_troop(&self, id: &TroopId) -> Result<(), StoreError> {
        let url = self.url(TROOPS, Some(id.as_str()));
        let response = self.request(Method::DELETE, &url).send().await?;
        match handle_empty(response).await {
            Err(StoreError::NotFound(_)) => Ok(()),
            other => other,
        }
    }

    /// Read-modify-write of the profile, guarded by the version tag from the
    /// read so a concurrent writer is never overwritten. A profile that did
    /// not exist is only created if it still does not exist.
    async fn credit_rewards(
        &self,
        session_id: &SessionId,
        gold: u64,
        items: &[Item],
    ) -> Result<bool, StoreError> {
        let url = self.url(PROFILES, Some(&self.config.profile_id));
        for attempt in 1..=PROFILE_WRITE_ATTEMPTS {
            let (mut profile, etag) = self.load_profile_versioned().await?;
            if !profile.credit(session_id, gold, items) {
                debug!("Session {} already credited", session_id);
                return Ok(false);
            }
            let request = self.request(Method::PUT, &url).json(&profile);
            let request = match &etag {
                Some(tag) => request.header(IF_MATCH, tag.as_str()),
                None => request.header(IF_NONE_MATCH, "*"),
            };
            let response = request.send().await?;
            if response.status() == StatusCode::PRECONDITION_FAILED {
                debug!(
                    "Profile changed during credit of session {} (attempt {})",
                    session_id, attempt
                );
                continue;
            }
            handle_empty(response).await?;
            return Ok(true);
        }
        Err(StoreError::ServerError {
            status: StatusCode::PRECONDITION_FAILED.as_u16(),
            message: format!(
                "profile kept changing during {} credit attempts",
                PROFILE_WRITE_ATTEMPTS
            ),
        })
    }

    async fn load_gold(&self) -> Result<u64, StoreError> {
        Ok(self.load_profile().await?.gold)
    }

    async fn load_inventory(&self) -> Result<Inventory, StoreError> {
        Ok(self.load_profile().await?.inventory)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let text = response.text().await.unwrap_or_default();
        return Err(StoreError::AuthFailed(text));
    }
    if status == StatusCode::NOT_FOUND {
        let url = response.url().path().to_string();
        return Err(StoreError::NotFound(url));
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(StoreError::ServerError {
            status: status.as_u16(),
            message: text,
        });
    }
    Ok(response)
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}

async fn handle_empty(response: reqwest::Response) -> Result<(), StoreError> {
    check_status(response).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one connection per canned response, in order, and hands back
    /// every request it saw (lowercased)
    async fn canned_server(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let head_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    assert!(n > 0, "client hung up mid-request");
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };
                let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                while buf.len() < head_end + body_len {
                    let n = socket.read(&mut chunk).await.unwrap();
                    assert!(n > 0, "client hung up mid-body");
                    buf.extend_from_slice(&chunk[..n]);
                }
                seen.push(String::from_utf8_lossy(&buf).to_ascii_lowercase());
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            seen
        });
        (base_url, handle)
    }

    fn reply(status: &str, headers: &[&str], body: &str) -> String {
        let mut text = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status);
        for header in headers {
            text.push_str(header);
            text.push_str("\r\n");
        }
        text.push_str(&format!("Content-Length: {}\r\n\r\n{}", body.len(), body));
        text
    }

    fn store_at(base_url: String) -> DocumentStore {
        DocumentStore::new(DocumentStoreConfig {
            base_url,
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_credit_rereads_after_conflict() {
        let json = "Content-Type: application/json";
        let (base_url, server) = canned_server(vec![
            reply("200 OK", &[json, "ETag: \"v1\""], r#"{"gold": 5}"#),
            reply("412 Precondition Failed", &[], ""),
            reply("200 OK", &[json, "ETag: \"v2\""], r#"{"gold": 7}"#),
            reply("204 No Content", &[], ""),
        ])
        .await;
        let store = store_at(base_url);

        let credited = store
            .credit_rewards(&SessionId::generate(), 10, &[])
            .await
            .unwrap();
        assert!(credited);

        let seen = server.await.unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[1].starts_with("put "));
        assert!(seen[1].contains("if-match: \"v1\""));
        assert!(seen[1].contains(r#""gold":15"#));
        // The retry builds on what the other writer stored
        assert!(seen[3].contains("if-match: \"v2\""));
        assert!(seen[3].contains(r#""gold":17"#));
    }

    #[tokio::test]
    async fn test_new_profile_is_created_only_once() {
        let (base_url, server) = canned_server(vec![
            reply("404 Not Found", &[], ""),
            reply("201 Created", &[], ""),
        ])
        .await;
        let store = store_at(base_url);
        assert!(store.credit_rewards(&SessionId::generate(), 15, &[]).await.unwrap());
        let seen = server.await.unwrap();
        assert!(seen[1].contains("if-none-match: *"));
        assert!(!seen[1].contains("if-match:"));
    }

    #[tokio::test]
    async fn test_busy_profile_gives_up() {
        let json = "Content-Type: application/json";
        let mut responses = Vec::new();
        for _ in 0..PROFILE_WRITE_ATTEMPTS {
            responses.push(reply("200 OK", &[json, "ETag: \"v\""], "{}"));
            responses.push(reply("412 Precondition Failed", &[], ""));
        }
        let (base_url, server) = canned_server(responses).await;
        let store = store_at(base_url);
        let err = store
            .credit_rewards(&SessionId::generate(), 15, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ServerError { status: 412, .. }), "unexpected {err:?}");
        assert!(!err.is_retryable());
        assert_eq!(server.await.unwrap().len(), 2 * PROFILE_WRITE_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_already_credited_skips_write() {
        let session = SessionId::generate();
        let body = format!(r#"{{"gold": 15, "creditedSessions": ["{}"]}}"#, session);
        let (base_url, server) = canned_server(vec![reply(
            "200 OK",
            &["Content-Type: application/json", "ETag: \"v1\""],
            &body,
        )])
        .await;
        let store = store_at(base_url);
        assert!(!store.credit_rewards(&session, 15, &[]).await.unwrap());
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[test]
    fn test_document_urls() {
        let store = DocumentStore::new(DocumentStoreConfig {
            base_url: "https://db.example.com/".into(),
            project_id: "p1".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            store.url(TROOPS, Some("t1")),
            "https://db.example.com/v1/documents/p1/troops/t1"
        );
        assert_eq!(store.url(TROOPS, None), "https://db.example.com/v1/documents/p1/troops");
        assert_eq!(
            store.url(SESSIONS, Some(CURRENT_SESSION)),
            "https://db.example.com/v1/documents/p1/sessions/current"
        );
    }

    #[test]
    fn test_default_config() {
        let config = DocumentStoreConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.token.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_store_is_offline() {
        let store = DocumentStore::new(DocumentStoreConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        let err = store.load_troops().await.unwrap_err();
        assert!(err.is_retryable(), "unexpected {err:?}");
    }
}
