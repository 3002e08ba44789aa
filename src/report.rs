//! Render progress observer.
//!
//! Components receive a `&dyn Reporter` explicitly; nothing reports through global state.

use std::path::PathBuf;
use std::sync::Mutex;

/// One observable step of a render invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderEvent {
    RequestValidated {
        images: usize,
        total_seconds: f64,
    },
    AssetFetched {
        /// `"image 3"` or `"audio"`.
        label: String,
        source: String,
        bytes: u64,
    },
    SceneBuilt {
        index: usize,
        mode: &'static str,
        frames: u64,
    },
    /// A scene finished rendering ahead of assembly (parallel mode only).
    SceneRendered {
        index: usize,
        frames: u64,
    },
    /// Frames handed to the encoder so far; reported at scene boundaries.
    Progress {
        done: u64,
        total: u64,
    },
    AudioMixed {
        seconds: f64,
        source: Option<String>,
    },
    Encoded {
        path: PathBuf,
        frames: u64,
    },
    Published {
        url: String,
    },
    PublishFailed {
        message: String,
    },
}

pub trait Reporter: Send + Sync {
    fn report(&self, event: &RenderEvent);
}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &RenderEvent) {
        match event {
            RenderEvent::RequestValidated {
                images,
                total_seconds,
            } => tracing::info!(images, total_seconds, "request validated"),
            RenderEvent::AssetFetched {
                label,
                source,
                bytes,
            } => tracing::info!(%label, %source, bytes, "asset ready"),
            RenderEvent::SceneBuilt {
                index,
                mode,
                frames,
            } => tracing::debug!(index, mode, frames, "scene built"),
            RenderEvent::SceneRendered { index, frames } => {
                tracing::debug!(index, frames, "scene rendered")
            }
            RenderEvent::Progress { done, total } => {
                tracing::info!(done, total, "frames encoded")
            }
            RenderEvent::AudioMixed { seconds, source } => match source {
                Some(source) => tracing::info!(seconds, %source, "audio mixed"),
                None => tracing::info!(seconds, "no audio; silent track"),
            },
            RenderEvent::Encoded { path, frames } => {
                tracing::info!(path = %path.display(), frames, "video written")
            }
            RenderEvent::Published { url } => tracing::info!(%url, "video published"),
            RenderEvent::PublishFailed { message } => {
                tracing::warn!(%message, "publish failed; local file kept")
            }
        }
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &RenderEvent) {}
}

/// Stores events in order, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &RenderEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
#[path = "../tests/unit/report.rs"]
mod tests;
