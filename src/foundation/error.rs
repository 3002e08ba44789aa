/// Result alias used across the crate.
pub type ReelResult<T> = Result<T, ReelError>;

/// Pipeline stage a render failure was raised from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Resolving/downloading an image or audio source.
    Prefetch,
    /// Decoding image bytes into a raster.
    Decode,
    /// Building the reveal path or pan-zoom trajectory.
    Plan,
    /// Producing a frame from the compositor.
    Composite,
    /// Burning caption overlays into a frame.
    Captions,
    /// Pushing a frame into the encoder.
    Encode,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Prefetch => "prefetch",
            Self::Decode => "decode",
            Self::Plan => "plan",
            Self::Composite => "composite",
            Self::Captions => "captions",
            Self::Encode => "encode",
        };
        f.write_str(s)
    }
}

/// Error taxonomy for a single render invocation.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Bad request payload, missing field, unreachable source, malformed alignment.
    #[error("input error: {0}")]
    Input(String),

    /// Failure while turning a scene into frames.
    #[error("render error{}: {message}", render_ctx(.scene, .stage))]
    Render {
        /// Zero-based scene index, when known.
        scene: Option<usize>,
        /// Stage the failure was raised from, when known.
        stage: Option<Stage>,
        /// Human-readable message.
        message: String,
    },

    /// Audio mux or encoder failure.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// Upload failure. The local artifact is kept.
    #[error("publish error: {0}")]
    Publish(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn render_ctx(scene: &Option<usize>, stage: &Option<Stage>) -> String {
    match (*scene, *stage) {
        (Some(i), Some(s)) => format!(" (scene {i}, {s})"),
        (Some(i), None) => format!(" (scene {i})"),
        (None, Some(s)) => format!(" ({s})"),
        (None, None) => String::new(),
    }
}

impl ReelError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            scene: None,
            stage: None,
            message: msg.into(),
        }
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Attach scene index and stage to a render failure.
    ///
    /// Input errors keep their kind but gain a scene prefix; an `Other` error raised while
    /// rendering a scene is reclassified as a render error.
    pub fn in_scene(self, index: usize, stage: Stage) -> Self {
        match self {
            Self::Render {
                scene,
                stage: prev,
                message,
            } => Self::Render {
                scene: scene.or(Some(index)),
                stage: prev.or(Some(stage)),
                message,
            },
            Self::Input(msg) => Self::Input(format!("scene {index}: {msg}")),
            Self::Other(e) => Self::Render {
                scene: Some(index),
                stage: Some(stage),
                message: format!("{e:#}"),
            },
            other => other,
        }
    }

    /// Prefix the message with the non-scene asset it concerns, keeping the error kind.
    pub fn for_asset(self, label: &str) -> Self {
        match self {
            Self::Input(msg) => Self::Input(format!("{label}: {msg}")),
            Self::Render {
                scene,
                stage,
                message,
            } => Self::Render {
                scene,
                stage,
                message: format!("{label}: {message}"),
            },
            Self::Assembly(msg) => Self::Assembly(format!("{label}: {msg}")),
            Self::Publish(msg) => Self::Publish(format!("{label}: {msg}")),
            Self::Other(e) => Self::Other(e.context(label.to_string())),
        }
    }

    /// `true` for failures that happen before any rendering starts.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
