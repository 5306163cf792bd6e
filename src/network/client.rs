//! HTTP client wrapper - one method per backend endpoint

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    ErrorBody, GalleryImage, Id, ProgressSample, PromptRequest, QueueItem, RegisterResponse,
    Session, User,
};
use crate::messages::network::PromptDraft;

/// Thin typed wrapper over the backend's REST surface
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        ApiClient {
            client: builder.build().unwrap_or_else(|_| reqwest::Client::new()),
            base_url: config.base_url(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================
    // Session
    // ========================

    pub async fn login(&self, identifier: &str, password: &str) -> Result<Session, ApiError> {
        let body = json!({ "email": identifier, "password": password });
        send_json(self.client.post(self.url("/login")).json(&body)).await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        let body = json!({ "username": username, "email": email, "password": password });
        let resp = self.client.post(self.url("/register")).json(&body).send().await?;

        // Rejections carry their reason in the same body shape, so it is
        // decoded whatever the status
        let status = resp.status();
        let text = resp.text().await?;
        let reply: RegisterResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), ?reply, "signup rejected");
        }
        Ok(reply)
    }

    // ========================
    // Users and images
    // ========================

    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        send_json(self.client.get(self.url("/users"))).await
    }

    pub async fn user_info(&self, user_id: &Id) -> Result<User, ApiError> {
        send_json(self.client.get(self.url(&format!("/user-info/{}", user_id)))).await
    }

    pub async fn user_images(&self, user_id: &Id) -> Result<Vec<GalleryImage>, ApiError> {
        send_json(self.client.get(self.url(&format!("/user-images/{}", user_id)))).await
    }

    /// Profile and images fetched concurrently; either failure fails both
    pub async fn user_details(
        &self,
        user_id: &Id,
    ) -> Result<(User, Vec<GalleryImage>), ApiError> {
        tokio::try_join!(self.user_info(user_id), self.user_images(user_id))
    }

    pub async fn delete_user(&self, user_id: &Id) -> Result<(), ApiError> {
        send_unit(self.client.delete(self.url(&format!("/users/{}", user_id)))).await
    }

    pub async fn delete_image(&self, image_id: &Id) -> Result<(), ApiError> {
        send_unit(self.client.delete(self.url(&format!("/images/{}", image_id)))).await
    }

    // ========================
    // Queue
    // ========================

    pub async fn user_queue(&self, user_id: &Id) -> Result<Vec<QueueItem>, ApiError> {
        send_json(self.client.get(self.url(&format!("/user-queue/{}", user_id)))).await
    }

    pub async fn progress(&self, item_id: &Id) -> Result<ProgressSample, ApiError> {
        send_json(self.client.get(self.url(&format!("/progress/{}", item_id)))).await
    }

    /// Progress for several items at once. Items whose request fails are
    /// left out of the map.
    pub async fn progress_for(&self, item_ids: Vec<Id>) -> HashMap<Id, ProgressSample> {
        let results = join_all(item_ids.into_iter().map(|id| async move {
            let result = self.progress(&id).await;
            (id, result)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(sample) => Some((id, sample)),
                Err(e) => {
                    tracing::warn!(item = %id, "progress fetch failed: {}", e);
                    None
                }
            })
            .collect()
    }

    pub async fn submit_prompt(&self, draft: PromptDraft) -> Result<(), ApiError> {
        let input_image = match &draft.image_path {
            Some(path) => Some(encode_image(path).await?),
            None => None,
        };
        let request = PromptRequest {
            user_id: draft.user_id,
            prompt: draft.prompt,
            uncond_prompt: draft.negative_prompt,
            input_image,
        };
        send_unit(self.client.post(self.url("/queue")).json(&request)).await
    }

    pub async fn cancel_item(&self, item_id: &Id) -> Result<(), ApiError> {
        send_unit(self.client.post(self.url(&format!("/cancel/{}", item_id)))).await
    }

    pub async fn remove_item(&self, item_id: &Id) -> Result<(), ApiError> {
        send_unit(self.client.delete(self.url(&format!("/queue-item/{}", item_id)))).await
    }

    pub async fn clear_queue(&self, user_id: &Id) -> Result<(), ApiError> {
        send_unit(self.client.delete(self.url(&format!("/clear-queue/{}", user_id)))).await
    }
}

/// Send and decode a 2xx JSON body
async fn send_json<T: DeserializeOwned>(req: reqwest::RequestBuilder) -> Result<T, ApiError> {
    let resp = check_status(req.send().await?).await?;
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Send and ignore the body of a 2xx
async fn send_unit(req: reqwest::RequestBuilder) -> Result<(), ApiError> {
    check_status(req.send().await?).await.map(|_| ())
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let detail = resp
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
        .and_then(|body| body.detail_text());
    tracing::debug!(status = status.as_u16(), ?detail, "request rejected");
    Err(ApiError::Server {
        status: status.as_u16(),
        detail,
    })
}

/// Read an image file into a `data:` URI
async fn encode_image(path: &Path) -> Result<String, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ApiError::Validation(format!("Could not read image {}: {}", path.display(), e))
    })?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", image_mime(path), encoded))
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
