//! Network access used by the offline worker to reach the asset origin and CDNs.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, header::CONTENT_TYPE};
use thiserror::Error;

use super::cache::CachedResponse;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Kind of resource a request is for, as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    /// Top-level page navigation.
    Document,
    #[default]
    Other,
}

/// Asset request intercepted by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    /// Absolute URL, or a path relative to the asset origin.
    pub url: String,
    pub destination: Destination,
}

impl AssetRequest {
    pub fn new(url: impl Into<String>, destination: Destination) -> Self {
        Self {
            url: url.into(),
            destination,
        }
    }

    /// Markup and scripts are served network-first: `.html`, `.js`, or a path ending in `/`.
    pub fn is_markup_or_script(&self) -> bool {
        let path = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        if path.ends_with('/') {
            return true;
        }
        let last_segment = path.rsplit('/').next().unwrap_or_default();
        matches!(
            last_segment.rsplit_once('.'),
            Some((_, "html" | "js"))
        )
    }
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to reach `{url}`")]
    Send {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read body of `{url}`")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    #[error("`{url}` is unreachable")]
    Unreachable { url: String },
}

/// Fetches a URL and buffers the whole response.
pub trait Network: Send + Sync {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<CachedResponse, NetworkError>>;
}

/// [`Network`] backed by `reqwest`; relative paths are resolved against the asset origin.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Arc<str>,
}

impl HttpNetwork {
    pub fn new(origin: &str) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| NetworkError::Client { source })?;
        Ok(Self {
            client,
            origin: Arc::from(origin.trim_end_matches('/')),
        })
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_owned()
        } else {
            format!("{}/{}", self.origin, url.trim_start_matches('/'))
        }
    }
}

impl Network for HttpNetwork {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<CachedResponse, NetworkError>> {
        let client = self.client.clone();
        let url = self.resolve(url);
        Box::pin(async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|source| NetworkError::Send {
                    url: url.clone(),
                    source,
                })?;

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = response
                .bytes()
                .await
                .map_err(|source| NetworkError::Body { url, source })?;

            Ok(CachedResponse {
                status,
                content_type,
                body,
            })
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use axum::body::Bytes;
    use dashmap::DashMap;

    use super::*;

    /// Scripted network answering from a fixed table of URLs.
    #[derive(Clone, Default)]
    pub struct ScriptedNetwork {
        responses: Arc<DashMap<String, CachedResponse>>,
        offline: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn serve(&self, url: &str, status: u16, body: &'static str) {
            self.responses.insert(
                url.to_owned(),
                CachedResponse {
                    status,
                    content_type: Some("text/plain".into()),
                    body: Bytes::from_static(body.as_bytes()),
                },
            );
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Network for ScriptedNetwork {
        fn fetch(&self, url: &str) -> BoxFuture<'static, Result<CachedResponse, NetworkError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.offline.load(Ordering::SeqCst) {
                None
            } else {
                self.responses.get(url).map(|entry| entry.value().clone())
            };
            let url = url.to_owned();
            Box::pin(async move { result.ok_or(NetworkError::Unreachable { url }) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension_and_trailing_slash() {
        let markup = |url: &str| AssetRequest::new(url, Destination::Other).is_markup_or_script();
        assert!(markup("/"));
        assert!(markup("/index.html"));
        assert!(markup("/scripts.js?v=3"));
        assert!(markup("https://code.jquery.com/jquery-3.5.1.js"));
        assert!(!markup("/manifest.json"));
        assert!(!markup("/icon-192.png"));
        assert!(!markup("https://cdn.example.org/css/all.min.css"));
    }

    #[test]
    fn resolves_relative_paths_against_origin() {
        let network = HttpNetwork::new("http://localhost:5000/").unwrap();
        assert_eq!(network.resolve("/index.html"), "http://localhost:5000/index.html");
        assert_eq!(
            network.resolve("https://cdn.example.org/a.js"),
            "https://cdn.example.org/a.js"
        );
    }
}
