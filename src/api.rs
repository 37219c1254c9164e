//! REST client for the Godwa backend

use crate::cache::WordLookup;
use crate::config::ClientConfig;
use crate::error::GodwaError;
use crate::poems::{
    AuthResponse, Poem, PoemId, PoemStatus, PoemSubmission, PoemUpdate, Poet, PoetId, WordIds,
    WordUpdate,
};
use crate::words::{WordEntry, WordId};
use futures_util::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Endpoints that answer with either a bare array or `{ "results": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListOrResults<T> {
    List(Vec<T>),
    Results { results: Vec<T> },
}

impl<T> ListOrResults<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListOrResults::List(items) | ListOrResults::Results { results: items } => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Message for a failed response: the body's `detail` when there is one.
fn error_detail(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|detail| match detail {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        });
    detail.unwrap_or_else(|| format!("HTTP error! status: {}", status))
}

/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, GodwaError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json");
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GodwaError> {
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!(url = %response.url(), status = status.as_u16(), "api response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GodwaError::from_status(
                status.as_u16(),
                error_detail(status.as_u16(), &body),
            ));
        }

        let bytes = response.bytes().await?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|e| GodwaError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GodwaError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GodwaError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GodwaError> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    // Reader

    pub async fn get_poem(&self, id: PoemId) -> Result<Poem, GodwaError> {
        self.get(&format!("/api/poems/{}", id)).await
    }

    /// All poems, or only those with `status`.
    pub async fn list_poems(&self, status: Option<PoemStatus>) -> Result<Vec<Poem>, GodwaError> {
        match status {
            Some(status) => {
                let builder = self
                    .request(Method::GET, "/api/poems")
                    .query(&[("status", status.as_str())]);
                self.send(builder).await
            }
            None => self.get("/api/poems/").await,
        }
    }

    pub async fn poems_by_poet(&self, poet: PoetId) -> Result<Vec<Poem>, GodwaError> {
        let builder = self
            .request(Method::GET, "/api/poems/")
            .query(&[("poet", poet)]);
        self.send(builder).await
    }

    fn meaning_request(&self, word: &str) -> RequestBuilder {
        self.request(Method::GET, "/api/words/meaning")
            .query(&[("word", word)])
    }

    /// Zero or more dictionary matches for `word`.
    pub async fn word_meaning(&self, word: &str) -> Result<Vec<WordEntry>, GodwaError> {
        let found: ListOrResults<WordEntry> = self.send(self.meaning_request(word)).await?;
        Ok(found.into_vec())
    }

    pub async fn list_poets(&self) -> Result<Vec<Poet>, GodwaError> {
        let poets: ListOrResults<Poet> = self.get("/api/poets/").await?;
        Ok(poets.into_vec())
    }

    pub async fn search_poets(&self, query: &str) -> Result<Vec<Poet>, GodwaError> {
        let builder = self
            .request(Method::GET, "/api/poets/search")
            .query(&[("q", query)]);
        let poets: ListOrResults<Poet> = self.send(builder).await?;
        Ok(poets.into_vec())
    }

    pub async fn chhanda_list(&self) -> Result<Vec<Value>, GodwaError> {
        self.get("/api/chhanda/list").await
    }

    pub async fn genres(&self) -> Result<Vec<Value>, GodwaError> {
        self.get("/api/genres/").await
    }

    // Authoring

    pub async fn submit_poem(&self, submission: &PoemSubmission) -> Result<Value, GodwaError> {
        self.post("/api/poems/submit", submission).await
    }

    pub async fn auth_google(&self, id_token: &str) -> Result<AuthResponse, GodwaError> {
        self.post("/auth/google", &serde_json::json!({ "id_token": id_token }))
            .await
    }

    // Moderation

    pub async fn submissions(&self) -> Result<Vec<Poem>, GodwaError> {
        self.get("/api/admin/poems/submissions").await
    }

    pub async fn approve_poem(&self, id: PoemId) -> Result<Value, GodwaError> {
        self.post(&format!("/api/admin/poems/submissions/{}/approve", id), &serde_json::json!({}))
            .await
    }

    pub async fn update_poem(&self, id: PoemId, update: &PoemUpdate) -> Result<Value, GodwaError> {
        self.patch(&format!("/api/admin/poems/{}", id), update).await
    }

    pub async fn tokenize_poem(&self, id: PoemId) -> Result<Value, GodwaError> {
        self.post(&format!("/api/admin/poems/{}/tokenize", id), &serde_json::json!({}))
            .await
    }

    pub async fn pending_words(&self) -> Result<Vec<WordEntry>, GodwaError> {
        self.get("/api/admin/words/pending").await
    }

    pub async fn enrich_word(&self, id: WordId) -> Result<Value, GodwaError> {
        self.post(&format!("/api/admin/words/{}/enrich-ai", id), &serde_json::json!({}))
            .await
    }

    pub async fn bulk_enrich(&self, word_ids: &[WordId]) -> Result<Value, GodwaError> {
        self.post("/api/admin/words/bulk_enrich", &WordIds { word_ids })
            .await
    }

    pub async fn bulk_approve(&self, word_ids: &[WordId]) -> Result<Value, GodwaError> {
        self.post("/api/admin/words/bulk_approve", &WordIds { word_ids })
            .await
    }

    pub async fn update_word(&self, id: WordId, update: &WordUpdate) -> Result<Value, GodwaError> {
        self.patch(&format!("/api/admin/words/{}", id), update).await
    }
}

impl WordLookup for ApiClient {
    fn lookup(&self, key: &str) -> BoxFuture<'static, Result<Vec<WordEntry>, GodwaError>> {
        let client = self.clone();
        let key = key.to_string();
        Box::pin(async move { client.word_meaning(&key).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> ApiClient {
        let config = ClientConfig::default().with_api_url("http://localhost:8000/");
        ApiClient::new(&config)
            .unwrap()
            .with_token(token.map(str::to_string))
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(400, r#"{"detail":"Poem already approved"}"#), "Poem already approved");
        assert_eq!(error_detail(502, "<html>bad gateway</html>"), "HTTP error! status: 502");
        assert_eq!(error_detail(500, r#"{"detail":null}"#), "HTTP error! status: 500");
        assert_eq!(
            error_detail(422, r#"{"detail":[{"msg":"field required"}]}"#),
            r#"[{"msg":"field required"}]"#
        );
    }

    #[test]
    fn test_list_or_results() {
        let bare: ListOrResults<i32> = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2]);
        let wrapped: ListOrResults<i32> = serde_json::from_str(r#"{"results":[3]}"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec![3]);
    }

    #[test]
    fn test_meaning_request_encodes_word() {
        let request = client(None).meaning_request("राम").build().unwrap();
        assert_eq!(request.url().path(), "/api/words/meaning");
        let word = request
            .url()
            .query_pairs()
            .find(|(k, _)| k == "word")
            .map(|(_, v)| v.into_owned());
        assert_eq!(word.as_deref(), Some("राम"));
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_bearer_token_header() {
        let api = client(Some("abc123"));
        assert!(api.is_authenticated());
        assert_eq!(api.base_url(), "http://localhost:8000");
        let request = api.request(Method::GET, "/api/poems/1").build().unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer abc123");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");

        assert!(!client(Some("")).is_authenticated());
    }
}
