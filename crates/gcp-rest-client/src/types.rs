//! Wire types for the Google REST APIs

use serde::{Deserialize, Deserializer, Serialize};

/// Cloud Storage object resource (subset)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// The JSON API encodes sizes as decimal strings
    #[serde(default, deserialize_with = "size_from_string")]
    pub size: u64,
}

fn size_from_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or(0))
}

/// One page of `objects.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectList {
    #[serde(default)]
    pub items: Vec<ObjectMetadata>,
    pub next_page_token: Option<String>,
}

/// Response of `spreadsheets.values.get`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    /// Flatten cells to strings; non-string cells use their JSON rendering
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect()
    }
}

/// Metadata server / OAuth token response
#[derive(Debug, Deserialize)]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}
