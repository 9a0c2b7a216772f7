//! Backend API client
//!
//! The analysis pipeline is a remote black box reached over HTTP plus one
//! SSE push stream. Request/response plumbing lives here; everything above
//! this module talks to the [`Backend`] trait so the session core and the
//! rehydrator can be exercised against an in-memory fake.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::assets::FileAsset;
use crate::channel::{decode_frame, ChannelMessage, SseFrameDecoder};
use crate::config::Config;
use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("choromap-client/", env!("CARGO_PKG_VERSION"));

/// Remote operations the session core depends on.
///
/// Implementations need not be `Send`: the core is single-owner and all
/// session mutation happens on one task.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Submit image payloads; returns the server-issued session identifier.
    async fn submit(&self, files: &[FileAsset]) -> Result<String>;

    /// Fetch the delimited result table text for a session.
    async fn fetch_result_table(&self, session_id: &str) -> Result<String>;

    /// Fetch the generated summary text for a session.
    async fn fetch_summary(&self, session_id: &str) -> Result<String>;

    /// Fetch one original image by name.
    async fn fetch_asset(&self, session_id: &str, file_name: &str) -> Result<FileAsset>;
}

/// Upload acknowledgment body.
#[derive(Debug, Deserialize)]
struct SubmitAck {
    session_id: String,
    #[allow(dead_code)]
    status: Option<String>,
    #[allow(dead_code)]
    message: Option<String>,
}

/// reqwest-backed [`Backend`] implementation.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn result_url(&self, session_id: &str, file: &str) -> String {
        format!("{}/static/results/{}/{}", self.base_url, session_id, file)
    }

    async fn fetch_text(&self, url: String) -> Result<String> {
        debug!(url = %url, "Fetching result text");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ExpiredSession(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::ExpiredSession(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| Error::ExpiredSession(e.to_string()))
    }

    /// Open the live progress channel for a session.
    ///
    /// Yields decoded [`ChannelMessage`]s; any transport fault (connect
    /// failure, non-success status, mid-stream error) surfaces as a single
    /// terminal [`ChannelMessage::TransportError`]. Dropping the stream
    /// closes the channel.
    pub fn progress_stream(
        &self,
        session_id: &str,
    ) -> impl Stream<Item = ChannelMessage> + 'static {
        let http = self.http.clone();
        let url = format!(
            "{}/predict-stream?session_id={}",
            self.base_url, session_id
        );

        async_stream::stream! {
            info!(url = %url, "Opening progress channel");
            let response = match http.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Progress channel connect failed");
                    yield ChannelMessage::TransportError;
                    return;
                }
            };
            if !response.status().is_success() {
                warn!(status = %response.status(), "Progress channel rejected");
                yield ChannelMessage::TransportError;
                return;
            }

            let mut decoder = SseFrameDecoder::new();
            let mut chunks = response.bytes_stream();
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(chunk) => {
                        for frame in decoder.push(&chunk) {
                            for message in decode_frame(&frame) {
                                yield message;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Progress channel transport fault");
                        yield ChannelMessage::TransportError;
                        return;
                    }
                }
            }
            debug!("Progress channel closed by server");
        }
    }
}

impl Backend for HttpBackend {
    async fn submit(&self, files: &[FileAsset]) -> Result<String> {
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.name.clone());
            form = form.part("files", part);
        }

        let url = format!("{}/predict", self.base_url);
        info!(url = %url, file_count = files.len(), "Submitting images");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!("server returned {}: {}", status, body)));
        }

        let ack: SubmitAck = response
            .json()
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        info!(session_id = %ack.session_id, "Upload acknowledged");
        Ok(ack.session_id)
    }

    async fn fetch_result_table(&self, session_id: &str) -> Result<String> {
        self.fetch_text(self.result_url(session_id, "data.csv")).await
    }

    async fn fetch_summary(&self, session_id: &str) -> Result<String> {
        self.fetch_text(self.result_url(session_id, "ai_generated_summary.txt"))
            .await
    }

    async fn fetch_asset(&self, session_id: &str, file_name: &str) -> Result<FileAsset> {
        let url = self.result_url(session_id, file_name);
        debug!(url = %url, "Fetching source image");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ExpiredSession(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::ExpiredSession(format!(
                "asset {} returned {}",
                file_name,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::ExpiredSession(e.to_string()))?;
        Ok(FileAsset::new(file_name, bytes.to_vec()))
    }
}

/// Shareable entry URL for a completed session.
pub fn share_link(share_base_url: &str, session_id: &str) -> String {
    format!(
        "{}/?session_id={}",
        share_base_url.trim_end_matches('/'),
        session_id
    )
}

/// Extract the session identifier from an entry URL, if present.
///
/// Its presence is the sole trigger for session rehydration.
pub fn session_id_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "session_id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_link_round_trips_through_url_extraction() {
        let link = share_link("http://localhost:5173/", "abc123");
        assert_eq!(link, "http://localhost:5173/?session_id=abc123");
        assert_eq!(session_id_from_url(&link), Some("abc123".to_string()));
    }

    #[test]
    fn urls_without_a_session_id_do_not_trigger_rehydration() {
        assert_eq!(session_id_from_url("http://localhost:5173/"), None);
        assert_eq!(
            session_id_from_url("http://localhost:5173/?session_id="),
            None
        );
        assert_eq!(session_id_from_url("not a url"), None);
    }

    #[test]
    fn backend_construction_normalizes_base_url() {
        let config = Config {
            api_base_url: "http://localhost:5000/".to_string(),
            ..Config::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(
            backend.result_url("abc", "data.csv"),
            "http://localhost:5000/static/results/abc/data.csv"
        );
    }
}
