//! HTTP implementation of the collaborator traits over [`reqwest`].
//!
//! Responses use the server's `{ "data": ... }` envelope; failures carry
//! `{ "error", "code" }` and, for rejected batches, `details`.

use atelier_core::assets::AssetRecord;
use atelier_core::groups::GroupKind;
use atelier_core::settings::{Setting, SettingUpdate};
use atelier_core::types::DbId;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::backend::{AssetStore, SettingsBackend, TaxonomyBackend, UploadFile};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    details: Vec<ItemError>,
}

#[derive(Debug, Deserialize)]
struct ItemError {
    id: DbId,
    error: String,
}

/// API client for one Atelier server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// * `api_url` - Base URL including the version prefix, e.g.
    ///   `http://localhost:3000/api/v1`.
    pub fn new(api_url: &str) -> EditorResult<Self> {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn from_config(config: &EditorConfig) -> EditorResult<Self> {
        Self::new(&config.api_url)
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, api_url: &str) -> EditorResult<Self> {
        let base_url = Url::parse(api_url)
            .map_err(|e| EditorError::Validation(format!("Invalid API URL '{api_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(EditorError::Validation(format!(
                "Invalid API URL '{api_url}'"
            )));
        }
        Ok(Self { client, base_url })
    }

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(segments))
    }

    // ---- private helpers ----

    async fn send(builder: reqwest::RequestBuilder) -> EditorResult<reqwest::Response> {
        let response = builder.send().await.map_err(classify_transport)?;
        Self::ensure_success(response).await
    }

    /// Turn a non-2xx answer into the matching [`EditorError`].
    async fn ensure_success(response: reqwest::Response) -> EditorResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let mut message = if parsed.error.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        } else {
            parsed.error
        };
        for item in &parsed.details {
            message.push_str(&format!("; setting {}: {}", item.id, item.error));
        }

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                EditorError::Validation(message)
            }
            _ => EditorError::ServerRejection {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn parse_data<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> EditorResult<T> {
        let response = Self::send(builder).await?;
        let status = response.status().as_u16();
        let envelope = response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| EditorError::ServerRejection {
                status,
                message: format!("Unreadable response: {e}"),
            })?;
        Ok(envelope.data)
    }

    async fn check_status(builder: reqwest::RequestBuilder) -> EditorResult<()> {
        Self::send(builder).await?;
        Ok(())
    }
}

/// Connection and timeout failures never reached a handler.
fn classify_transport(err: reqwest::Error) -> EditorError {
    EditorError::TransientNetwork(err.to_string())
}

impl SettingsBackend for HttpBackend {
    async fn list(&self, page_key: &str, section_key: &str) -> EditorResult<Vec<Setting>> {
        Self::parse_data(self.request(
            Method::GET,
            &["pages", page_key, "sections", section_key, "settings"],
        ))
        .await
    }

    async fn batch_update(&self, updates: &[SettingUpdate]) -> EditorResult<Vec<Setting>> {
        Self::parse_data(
            self.request(Method::PUT, &["settings", "batch"])
                .json(&json!({ "updates": updates })),
        )
        .await
    }

    async fn add_group_member(
        &self,
        page_key: &str,
        section_key: &str,
        kind: GroupKind,
    ) -> EditorResult<Vec<Setting>> {
        Self::parse_data(self.request(
            Method::POST,
            &["pages", page_key, "sections", section_key, "groups", kind.as_str()],
        ))
        .await
    }

    async fn remove_group_member(
        &self,
        page_key: &str,
        section_key: &str,
        kind: GroupKind,
        index: u32,
    ) -> EditorResult<()> {
        let index = index.to_string();
        Self::check_status(self.request(
            Method::DELETE,
            &[
                "pages",
                page_key,
                "sections",
                section_key,
                "groups",
                kind.as_str(),
                index.as_str(),
            ],
        ))
        .await
    }
}

impl AssetStore for HttpBackend {
    async fn list(&self, artwork_id: DbId) -> EditorResult<Vec<AssetRecord>> {
        let artwork = artwork_id.to_string();
        Self::parse_data(self.request(Method::GET, &["artworks", artwork.as_str(), "images"])).await
    }

    async fn upload(&self, artwork_id: DbId, file: &UploadFile) -> EditorResult<AssetRecord> {
        let artwork = artwork_id.to_string();
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(category) = &file.category {
            form = form.text("category", category.clone());
        }
        Self::parse_data(
            self.request(Method::POST, &["artworks", artwork.as_str(), "images"])
                .multipart(form),
        )
        .await
    }

    async fn delete(&self, artwork_id: DbId, id: DbId) -> EditorResult<()> {
        let (artwork, id) = (artwork_id.to_string(), id.to_string());
        Self::check_status(self.request(Method::DELETE, &["artworks", artwork.as_str(), "images", id.as_str()]))
            .await
    }

    async fn set_primary(&self, artwork_id: DbId, id: DbId) -> EditorResult<()> {
        let (artwork, id) = (artwork_id.to_string(), id.to_string());
        Self::check_status(self.request(
            Method::PUT,
            &["artworks", artwork.as_str(), "images", id.as_str(), "primary"],
        ))
        .await
    }

    async fn reorder(&self, artwork_id: DbId, ordered_ids: &[DbId]) -> EditorResult<()> {
        let artwork = artwork_id.to_string();
        Self::check_status(
            self.request(Method::PUT, &["artworks", artwork.as_str(), "images", "order"])
                .json(&json!({ "image_ids": ordered_ids })),
        )
        .await
    }

    async fn assign_category(
        &self,
        artwork_id: DbId,
        id: DbId,
        category: &str,
    ) -> EditorResult<AssetRecord> {
        let (artwork, id) = (artwork_id.to_string(), id.to_string());
        Self::parse_data(
            self.request(
                Method::PUT,
                &["artworks", artwork.as_str(), "images", id.as_str(), "category"],
            )
            .json(&json!({ "category": category })),
        )
        .await
    }
}

impl TaxonomyBackend for HttpBackend {
    async fn list(&self) -> EditorResult<Vec<String>> {
        Self::parse_data(self.request(Method::GET, &["categories"])).await
    }

    async fn create(&self, name: &str) -> EditorResult<Vec<String>> {
        Self::parse_data(
            self.request(Method::POST, &["categories"])
                .json(&json!({ "name": name })),
        )
        .await
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> EditorResult<Vec<String>> {
        Self::parse_data(
            self.request(Method::PUT, &["categories", old_name])
                .json(&json!({ "new_name": new_name })),
        )
        .await
    }

    async fn delete(&self, name: &str) -> EditorResult<Vec<String>> {
        Self::parse_data(self.request(Method::DELETE, &["categories", name])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_segments_are_appended_and_encoded() {
        let backend = HttpBackend::new("http://localhost:3000/api/v1/").unwrap();
        let url = backend.url(&["categories", "fine art"]);
        assert_eq!(url.as_str(), "http://localhost:3000/api/v1/categories/fine%20art");
    }

    #[test]
    fn default_config_builds_backend() {
        let backend = HttpBackend::from_config(&EditorConfig::default()).unwrap();
        assert_eq!(
            backend.url(&["settings", "batch"]).as_str(),
            "http://localhost:3000/api/v1/settings/batch"
        );
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(HttpBackend::new("not a url").is_err());
        assert!(HttpBackend::new("mailto:someone@example.com").is_err());
    }
}
