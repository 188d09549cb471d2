//! Profile service clients.
//!
//! Both the "before" and the "after" deployment expose the same endpoint: the trail
//! geometry is POSTed as GeoJSON and the service answers with the sampled profile.

use std::time::Duration;

use async_trait::async_trait;
use hikingtime::{Profile, ProfileError, Sample, TrailGeometry};
use reqwest::Client;
use reqwest::header::REFERER;
use thiserror::Error;
use tracing::debug;

use crate::config::{ProfileQuery, ReconcileConfig};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Profile service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed profile payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),
    #[error("Profile service not reachable at {0}")]
    NotReachable(String),
}

/// Something that turns a trail geometry into an elevation profile.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Label used in logs ("before", "after").
    fn name(&self) -> &str;

    async fn fetch_profile(&self, geometry: &TrailGeometry) -> Result<Profile, FetchError>;
}

/// [`ProfileSource`] backed by a profile service deployment.
pub struct HttpProfileSource {
    client: Client,
    name: String,
    base_url: String,
    referer: String,
    query: ProfileQuery,
}

impl HttpProfileSource {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        referer: impl Into<String>,
        query: ProfileQuery,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            referer: referer.into(),
            query,
        })
    }

    /// The "before" and "after" sources described by `config`.
    pub fn pair_from_config(config: &ReconcileConfig) -> Result<(Self, Self), FetchError> {
        let before = Self::new(
            "before",
            config.before_base_url.as_str(),
            config.referer.as_str(),
            config.query.clone(),
            config.request_timeout(),
        )?;
        let after = Self::new(
            "after",
            config.after_base_url.as_str(),
            config.referer.as_str(),
            config.query.clone(),
            config.request_timeout(),
        )?;
        Ok((before, after))
    }

    pub fn profile_url(&self) -> String {
        format!("{}/rest/services/profile.json", self.base_url)
    }

    pub fn checker_url(&self) -> String {
        format!("{}/rest/services/checker", self.base_url)
    }

    /// Checks that the deployment answers its health endpoint.
    pub async fn check_health(&self) -> Result<(), FetchError> {
        match self.client.get(self.checker_url()).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(FetchError::NotReachable(format!(
                "{} (checker returned status {})",
                self.base_url,
                resp.status()
            ))),
            Err(e) => Err(FetchError::NotReachable(format!("{}: {e}", self.base_url))),
        }
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_profile(&self, geometry: &TrailGeometry) -> Result<Profile, FetchError> {
        let resp = self
            .client
            .post(self.profile_url())
            .header(REFERER, &self.referer)
            .query(&self.query.as_params())
            .json(geometry)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let bytes = resp.bytes().await?;
        let profile = decode_profile(&bytes)?;
        debug!(
            "{} returned {} samples ({} bytes)",
            self.name,
            profile.len(),
            bytes.len()
        );
        Ok(profile)
    }
}

/// Decodes and validates a profile service response body.
pub fn decode_profile(body: &[u8]) -> Result<Profile, FetchError> {
    let samples: Vec<Sample> = serde_json::from_slice(body)?;
    Ok(Profile::new(samples)?)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Serves a single HTTP exchange and hands back the raw request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];

            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);

                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            String::from_utf8(request).unwrap()
        });

        (base_url, handle)
    }

    fn line_geometry() -> TrailGeometry {
        TrailGeometry::LineString {
            coordinates: vec![vec![2600000.0, 1200000.0], vec![2600010.0, 1200000.0]],
        }
    }

    fn source(base_url: &str) -> HttpProfileSource {
        HttpProfileSource::new(
            "before",
            base_url,
            "http://localhost/",
            ProfileQuery::default(),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_profile_url() {
        let source = source("http://localhost:5000/branch/");
        assert_eq!(
            source.profile_url(),
            "http://localhost:5000/branch/rest/services/profile.json"
        );
        assert_eq!(source.checker_url(), "http://localhost:5000/branch/rest/services/checker");
        assert_eq!(source.name(), "before");
    }

    #[test]
    fn test_decode_profile() {
        let body = br#"[{"dist": 0, "alts": {"COMB": 512.3}}, {"dist": 8.5, "alts": {"COMB": 513.0}}]"#;
        let profile = decode_profile(body).unwrap();
        assert_eq!(profile.len(), 2);
    }

    #[test]
    fn test_decode_empty_profile() {
        assert!(decode_profile(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_body() {
        let err = decode_profile(br#"{"error": "boom"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_missing_model() {
        let body = br#"[{"dist": 0, "alts": {"DTM25": 512.3}}]"#;
        let err = decode_profile(body).unwrap_err();
        assert!(matches!(err, FetchError::InvalidProfile(_)));
    }

    #[tokio::test]
    async fn test_fetch_profile_request() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"[{"dist": 0, "alts": {"COMB": 512.3}}, {"dist": 10, "alts": {"COMB": 513.0}}]"#,
        )
        .await;

        let profile = source(&base_url).fetch_profile(&line_geometry()).await.unwrap();
        assert_eq!(profile.len(), 2);

        let request = server.await.unwrap();
        assert!(request.starts_with(
            "POST /rest/services/profile.json?elevation_models=COMB&projection=2056&offset=0 HTTP/1.1\r\n"
        ));
        assert!(request.to_lowercase().contains("\r\nreferer: http://localhost/\r\n"));
        assert!(request.contains(r#""type":"LineString""#));
    }

    #[tokio::test]
    async fn test_fetch_profile_error_status() {
        let (base_url, server) = serve_once("502 Bad Gateway", "Bad Gateway").await;

        let err = source(&base_url).fetch_profile(&line_geometry()).await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.await.unwrap();
    }
}
