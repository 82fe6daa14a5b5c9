//! Headless playback device.
//!
//! Stands in for a video element when running from the terminal: each load
//! probes the clip through a [`ClipSource`], "shows" it for a fixed
//! duration and reports back on the request's event channel.  Probing runs
//! on a spawned task guarded by a [`CancellationToken`] so a superseding
//! load or a halt stops the old clip immediately.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::config::{ProbeStrategy, SignConfig};

use super::{ClipError, DeviceEvent, LoadRequest, PlaybackDevice};

/// Where clip bytes live.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClipSource: Send + Sync {
    /// Cheap existence check (HEAD request, stat).
    async fn exists(&self, locator: &str) -> Result<bool>;

    /// Open the clip as a player would.  Missing and unreadable clips map
    /// to the matching [`ClipError`].
    async fn open(&self, locator: &str) -> std::result::Result<(), ClipError>;

    fn name(&self) -> &str;
}

// ── Filesystem ───────────────────────────────────────────────────

/// Clips on local disk; locators are paths.
#[derive(Debug, Clone, Default)]
pub struct FsClipSource;

#[async_trait]
impl ClipSource for FsClipSource {
    async fn exists(&self, locator: &str) -> Result<bool> {
        tokio::fs::try_exists(locator)
            .await
            .with_context(|| format!("failed to stat {locator}"))
    }

    async fn open(&self, locator: &str) -> std::result::Result<(), ClipError> {
        match tokio::fs::metadata(locator).await {
            Ok(meta) if meta.len() == 0 => Err(ClipError::Decode {
                locator: locator.to_string(),
                message: "empty file".to_string(),
            }),
            Ok(meta) if meta.is_dir() => Err(ClipError::Decode {
                locator: locator.to_string(),
                message: "is a directory".to_string(),
            }),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ClipError::ResourceMissing {
                locator: locator.to_string(),
            }),
            Err(e) => Err(ClipError::Probe {
                locator: locator.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "fs"
    }
}

// ── HTTP ─────────────────────────────────────────────────────────

/// Characters escaped in each locator path segment.  `?` and `#` would
/// otherwise end the path.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Clips served over HTTP, resolved against the embedding page's URL.
pub struct HttpClipSource {
    client: reqwest::Client,
    page: Url,
}

impl HttpClipSource {
    pub fn new(page_url: &str, timeout: Duration) -> Result<Self> {
        let page = Url::parse(page_url).with_context(|| format!("invalid page_url {page_url}"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, page })
    }

    /// Absolute locators are used as-is; everything else is joined onto
    /// the page URL the way a browser would.
    pub fn url_for(&self, locator: &str) -> Result<Url> {
        if locator.contains("://") {
            return Url::parse(locator).with_context(|| format!("invalid clip URL {locator}"));
        }
        let encoded = locator
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        self.page
            .join(&encoded)
            .with_context(|| format!("cannot resolve {locator} against {}", self.page))
    }

    fn probe_error(locator: &str, error: impl std::fmt::Display) -> ClipError {
        ClipError::Probe {
            locator: locator.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl ClipSource for HttpClipSource {
    async fn exists(&self, locator: &str) -> Result<bool> {
        let url = self.url_for(locator)?;
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .with_context(|| format!("HEAD {url} failed"))?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            Ok(false)
        } else {
            anyhow::bail!("HEAD {url} returned {status}")
        }
    }

    async fn open(&self, locator: &str) -> std::result::Result<(), ClipError> {
        let url = self
            .url_for(locator)
            .map_err(|e| Self::probe_error(locator, format!("{e:#}")))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::probe_error(locator, e))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(ClipError::ResourceMissing {
                locator: locator.to_string(),
            });
        }
        if !status.is_success() {
            return Err(Self::probe_error(locator, format!("status {status}")));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::probe_error(locator, e))?;
        if body.is_empty() {
            return Err(ClipError::Decode {
                locator: locator.to_string(),
                message: "empty response body".to_string(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ── Device ───────────────────────────────────────────────────────

pub struct HeadlessDevice {
    source: Arc<dyn ClipSource>,
    strategy: ProbeStrategy,
    clip_duration: Duration,
    allow_audible_autoplay: bool,
    current: CancellationToken,
}

impl HeadlessDevice {
    pub fn new(source: Arc<dyn ClipSource>, strategy: ProbeStrategy, clip_duration: Duration) -> Self {
        Self {
            source,
            strategy,
            clip_duration,
            allow_audible_autoplay: false,
            current: CancellationToken::new(),
        }
    }

    pub fn allow_audible_autoplay(mut self, allow: bool) -> Self {
        self.allow_audible_autoplay = allow;
        self
    }

    /// HTTP source when `page_url` is set or the base path is a URL,
    /// filesystem otherwise.
    pub fn from_config(config: &SignConfig) -> Result<Self> {
        let page = config.page_url.clone().or_else(|| {
            config
                .base_path
                .contains("://")
                .then(|| config.base_path.clone())
        });
        let source: Arc<dyn ClipSource> = match page {
            Some(page) => Arc::new(HttpClipSource::new(&page, config.probe_timeout)?),
            None => Arc::new(FsClipSource),
        };
        debug!(source = source.name(), probe = ?config.probe, "Headless device ready");
        Ok(Self::new(source, config.probe, config.clip_duration)
            .allow_audible_autoplay(config.allow_audible_autoplay))
    }
}

impl PlaybackDevice for HeadlessDevice {
    fn load(&mut self, request: LoadRequest) {
        self.current.cancel();
        let cancel = CancellationToken::new();
        self.current = cancel.clone();

        let clip = ClipRun {
            source: self.source.clone(),
            strategy: self.strategy,
            clip_duration: self.clip_duration,
            allow_audible_autoplay: self.allow_audible_autoplay,
        };
        tokio::spawn(async move {
            let ticket = request.ticket;
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(?ticket, "Clip cancelled");
                }
                _ = clip.run(request) => {}
            }
        });
    }

    fn halt(&mut self) {
        self.current.cancel();
    }

    fn hide(&mut self) {
        self.current.cancel();
        info!("Sign player hidden");
    }

    fn name(&self) -> &str {
        "headless"
    }
}

impl Drop for HeadlessDevice {
    fn drop(&mut self) {
        self.current.cancel();
    }
}

struct ClipRun {
    source: Arc<dyn ClipSource>,
    strategy: ProbeStrategy,
    clip_duration: Duration,
    allow_audible_autoplay: bool,
}

impl ClipRun {
    async fn run(self, request: LoadRequest) {
        let LoadRequest {
            ticket,
            locator,
            options,
            events,
        } = request;

        if !options.muted && !self.allow_audible_autoplay {
            let _ = events.send(DeviceEvent::failed(
                ticket,
                ClipError::PlaybackStartRejected {
                    reason: "audible autoplay not allowed".to_string(),
                },
            ));
            return;
        }

        if let Err(error) = self.probe(&locator).await {
            let _ = events.send(DeviceEvent::failed(ticket, error));
            return;
        }

        info!(index = ticket.index, locator = %locator, "Showing clip");
        if events.send(DeviceEvent::started(ticket)).is_err() {
            return;
        }
        tokio::time::sleep(self.clip_duration).await;
        let _ = events.send(DeviceEvent::ended(ticket));
    }

    async fn probe(&self, locator: &str) -> std::result::Result<(), ClipError> {
        match self.strategy {
            ProbeStrategy::Precheck => match self.source.exists(locator).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(ClipError::ResourceMissing {
                    locator: locator.to_string(),
                }),
                Err(e) => Err(ClipError::Probe {
                    locator: locator.to_string(),
                    message: format!("{e:#}"),
                }),
            },
            ProbeStrategy::AttemptLoad => self.source.open(locator).await,
        }
    }
}
