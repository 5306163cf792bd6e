use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backend identifier. The server may hand out numbers or strings; the
/// JSON shape it arrived in is kept when sent back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Num(i64),
    Text(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Num(n) => write!(f, "{}", n),
            Id::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Num(n)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::Text(s.to_string())
    }
}

/// Account role, decoded once at login
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Role {
    #[default]
    Regular,
    Admin,
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        if raw == "admin" {
            Role::Admin
        } else {
            Role::Regular
        }
    }
}

/// Authenticated session held in memory for the lifetime of the process
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Session {
    pub role: Role,
    #[serde(default)]
    pub user_id: Option<Id>,
}

/// Reply to `POST /register`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub detail: Option<String>,
    #[serde(default)]
    pub user_id: Option<Id>,
}

impl RegisterResponse {
    pub fn is_success(&self) -> bool {
        self.message
            .as_deref()
            .map(|m| m.to_lowercase().contains("success"))
            .unwrap_or(false)
    }
}

/// A user as listed by the admin endpoint or returned by `/user-info`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub total_images: Option<u64>,
}

impl User {
    /// Date part of `created_at`, or an empty string when unknown
    pub fn joined_date(&self) -> String {
        self.created_at.as_deref().map(date_part).unwrap_or_default()
    }
}

/// Lifecycle of a generation request on the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Queued,
    Processing,
    Done,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "QUEUED",
            QueueStatus::Processing => "PROCESSING",
            QueueStatus::Done => "DONE",
            QueueStatus::Cancelled => "CANCELLED",
            QueueStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn is_removable(&self) -> bool {
        matches!(self, QueueStatus::Queued | QueueStatus::Cancelled)
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, QueueStatus::Processing)
    }
}

/// One generation request tracked by the backend queue
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct QueueItem {
    pub id: Id,
    #[serde(default)]
    pub user_id: Option<Id>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt: String,
    pub status: QueueStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Transient progress readout for a processing item
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ProgressSample {
    #[serde(default, deserialize_with = "lenient_number")]
    percent: Option<f64>,
    /// Estimated seconds remaining
    #[serde(default, deserialize_with = "lenient_number")]
    pub eta: Option<f64>,
    /// Seconds elapsed so far
    #[serde(default, deserialize_with = "lenient_number")]
    pub time_taken: Option<f64>,
}

impl ProgressSample {
    pub fn new(percent: f64, eta: Option<f64>, time_taken: Option<f64>) -> Self {
        ProgressSample {
            percent: Some(percent),
            eta,
            time_taken,
        }
    }

    /// Percent complete clamped to 0..=100; a missing value reads as 0
    pub fn percent(&self) -> f64 {
        self.percent
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 100.0)
    }
}

/// A finished image in a user's gallery
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GalleryImage {
    pub id: Id,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Payload of `POST /queue`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PromptRequest {
    pub user_id: Id,
    pub prompt: String,
    pub uncond_prompt: String,
    pub input_image: Option<String>,
}

/// Error body returned by the backend on non-2xx responses
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Only plain string details are meaningful to show to a person
    pub fn detail_text(&self) -> Option<String> {
        self.detail
            .as_ref()
            .and_then(|d| d.as_str())
            .map(str::to_string)
            .filter(|d| !d.trim().is_empty())
    }
}

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keep non-empty strings; any other JSON value reads as absent
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

/// Render a duration in seconds as `m:ss`
pub fn format_seconds(total: Option<f64>) -> String {
    match total {
        Some(secs) if secs.is_finite() && secs >= 0.0 => {
            let minutes = (secs / 60.0).floor() as u64;
            let seconds = (secs % 60.0).floor() as u64;
            format!("{}:{:02}", minutes, seconds)
        }
        _ => String::from("..."),
    }
}

/// Turn a stored image reference into a fetchable URL
pub fn resolve_image_url(base_url: &str, reference: &str) -> String {
    if reference.starts_with("http") {
        reference.to_string()
    } else {
        format!(
            "{}/saved_images/{}",
            base_url.trim_end_matches('/'),
            reference.trim_start_matches('/')
        )
    }
}

fn date_part(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d").to_string();
    }
    raw.split('T').next().unwrap_or(raw).to_string()
}

/// Timestamp as `YYYY-MM-DD HH:MM`, falling back to the raw text
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}
