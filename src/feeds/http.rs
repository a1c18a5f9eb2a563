use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FeedError, FeedResult};

/// Where response bodies come from. The HTTP implementation is the only one
/// outside tests.
#[async_trait]
pub trait BodySource: Send + Sync {
    async fn fetch(&self, url: &Url) -> FeedResult<String>;
}

/// reqwest-backed [`BodySource`] with a hard per-call timeout.
pub struct HttpSource {
    http: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("team-scoreboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpSource { http })
    }
}

#[async_trait]
impl BodySource for HttpSource {
    async fn fetch(&self, url: &Url) -> FeedResult<String> {
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FeedError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.text().await.map_err(|source| FeedError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

/// JSON fetcher that decodes straight into typed wire structs.
///
/// Fields the struct doesn't declare are dropped while decoding, which keeps
/// the retained document small.
#[derive(Clone)]
pub struct JsonClient {
    source: Arc<dyn BodySource>,
}

impl JsonClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(JsonClient {
            source: Arc::new(HttpSource::new(timeout)?),
        })
    }

    #[cfg(test)]
    pub fn with_source(source: Arc<dyn BodySource>) -> Self {
        JsonClient { source }
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &Url) -> FeedResult<T> {
        debug!("Query: {}", url);
        let body = self.source.fetch(url).await?;
        decode(url.as_str(), &body)
    }
}

/// Decode a response body, classifying any failure as malformed.
pub fn decode<T: DeserializeOwned>(url: &str, body: &str) -> FeedResult<T> {
    serde_json::from_str(body).map_err(|source| FeedError::Malformed {
        url: url.to_string(),
        source,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Entry<T> {
    Fits(T),
    Skipped(IgnoredAny),
}

/// `deserialize_with` helper for feed lists: entries that don't fit `T` are
/// dropped with a warning instead of failing the whole document.
pub fn skip_unreadable<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries = Vec::<Entry<T>>::deserialize(deserializer)?;
    let total = entries.len();
    let kept: Vec<T> = entries
        .into_iter()
        .filter_map(|e| match e {
            Entry::Fits(item) => Some(item),
            Entry::Skipped(IgnoredAny) => None,
        })
        .collect();
    if kept.len() < total {
        warn!("Skipped {} unreadable feed entries", total - kept.len());
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Item {
        id: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Listing {
        #[serde(default, deserialize_with = "skip_unreadable")]
        items: Vec<Item>,
    }

    #[test]
    fn test_decode_drops_unknown_fields() {
        let p: Item = decode("u", r#"{"id": 7, "huge": [1, 2, 3], "x": {"y": 1}}"#).unwrap();
        assert_eq!(p.id, 7);
    }

    #[test]
    fn test_decode_garbage_is_fatal() {
        let err = decode::<Item>("http://feed/x", "<html>oops</html>").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("http://feed/x"));
    }

    #[test]
    fn test_decode_wrong_shape_is_malformed() {
        let err = decode::<Item>("u", r#"{"name": "no id"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Malformed { .. }));
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let listing: Listing = decode(
            "u",
            r#"{"items": [{"id": 1}, {"name": "placeholder"}, 5, {"id": 3}]}"#,
        )
        .unwrap();
        let ids: Vec<u32> = listing.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let missing: Listing = decode("u", "{}").unwrap();
        assert!(missing.items.is_empty());
    }

    #[test]
    fn test_skipping_entries_still_rejects_invalid_json() {
        let err = decode::<Listing>("u", r#"{"items": [{"id": 1}, {"id": }]}"#).unwrap_err();
        assert!(err.is_fatal());
    }
}
