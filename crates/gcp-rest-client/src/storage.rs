//! Cloud Storage JSON API client for a single bucket

use crate::error::{GcpError, Result};
use crate::token::TokenSource;
use crate::types::{ObjectList, ObjectMetadata};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the objects of one Cloud Storage bucket
pub struct StorageClient {
    http: Client,
    tokens: Arc<TokenSource>,
    bucket: String,
    base_url: String,
}

impl StorageClient {
    /// Base URL of the Cloud Storage JSON API
    pub const BASE_URL: &'static str = "https://storage.googleapis.com";

    pub fn new(bucket: &str, tokens: Arc<TokenSource>) -> Self {
        Self::with_base_url(bucket, tokens, Self::BASE_URL)
    }

    /// Create a client against a custom endpoint (emulators)
    pub fn with_base_url(bucket: &str, tokens: Arc<TokenSource>, base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            tokens,
            bucket: bucket.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(name)
        )
    }

    fn list_url(&self, prefix: &str, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/storage/v1/b/{}/o?prefix={}&fields={}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(prefix),
            urlencoding::encode("items(name,contentType,size),nextPageToken")
        );
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }
        url
    }

    fn upload_url(&self, name: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(name)
        )
    }

    /// List every object whose name starts with `prefix`, following pagination
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectMetadata>> {
        let token = self.tokens.token().await?;
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = self.list_url(prefix, page_token.as_deref());
            let response = self.http.get(&url).bearer_auth(&token).send().await?;
            if !response.status().is_success() {
                return Err(GcpError::from_response(response).await);
            }

            let page: ObjectList = response.json().await?;
            objects.extend(page.items);
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!(bucket = %self.bucket, prefix, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    /// Download object content, `None` if the object does not exist
    pub async fn download(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let token = self.tokens.token().await?;
        let url = format!("{}?alt=media", self.object_url(name));
        let response = self.http.get(&url).bearer_auth(&token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let data = response.bytes().await?.to_vec();
                debug!(name, size = data.len(), "Downloaded object");
                Ok(Some(data))
            }
            _ => Err(GcpError::from_response(response).await),
        }
    }

    /// Upload (create or replace) an object
    pub async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let token = self.tokens.token().await?;
        let size = data.len();
        let response = self
            .http
            .post(self.upload_url(name))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(name, status = %response.status(), "Upload failed");
            return Err(GcpError::from_response(response).await);
        }

        debug!(name, size, content_type, "Uploaded object");
        Ok(())
    }

    /// Delete an object; deleting a missing object is not an error
    pub async fn delete(&self, name: &str) -> Result<()> {
        let token = self.tokens.token().await?;
        let response = self
            .http
            .delete(self.object_url(name))
            .bearer_auth(&token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            s if s.is_success() => {
                debug!(name, "Deleted object");
                Ok(())
            }
            _ => Err(GcpError::from_response(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StorageClient {
        StorageClient::with_base_url(
            "my-bucket",
            Arc::new(TokenSource::fixed("t")),
            "http://localhost:4443/",
        )
    }

    #[test]
    fn test_object_url_encodes_name() {
        assert_eq!(
            client().object_url("20250901/abc.jpg"),
            "http://localhost:4443/storage/v1/b/my-bucket/o/20250901%2Fabc.jpg"
        );
    }

    #[test]
    fn test_list_url() {
        let url = client().list_url("20250901/", None);
        assert!(url.starts_with("http://localhost:4443/storage/v1/b/my-bucket/o?prefix=20250901%2F"));
        assert!(!url.contains("pageToken"));

        let url = client().list_url("20250901/", Some("next+page"));
        assert!(url.ends_with("&pageToken=next%2Bpage"));
    }

    #[test]
    fn test_upload_url() {
        assert_eq!(
            client().upload_url("20250901_cached/abc.png"),
            "http://localhost:4443/upload/storage/v1/b/my-bucket/o?uploadType=media&name=20250901_cached%2Fabc.png"
        );
    }

    #[test]
    fn test_default_base_url() {
        let client = StorageClient::new("b", Arc::new(TokenSource::fixed("t")));
        assert_eq!(client.base_url, StorageClient::BASE_URL);
        assert_eq!(client.bucket(), "b");
    }
}
