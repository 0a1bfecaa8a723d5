//! News feed entries

use serde::{Deserialize, Serialize};

/// A single news entry as served by the news API.
///
/// Field names are camelCase on the wire (`imageUrl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    /// Publication date as provided by the source (not parsed)
    pub date: String,
    pub content: String,
}
