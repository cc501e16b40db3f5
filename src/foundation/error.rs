/// Convenience result type used across storyreel.
pub type StoryreelResult<T> = Result<T, StoryreelError>;

/// Machine-readable error classification.
///
/// Callers present fatal kinds as a single actionable message. Cancellation is not an error and
/// has no kind; it is reported as [`crate::ExportOutcome::Cancelled`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or malformed waveform.
    InvalidAudioInput,
    /// An export was requested with zero frames.
    EmptyTimeline,
    /// A single frame's visual failed to load. Absorbed by the pipeline.
    AssetLoadFailure,
    /// The encoder or container combination could not be started.
    EncoderSetupFailure,
    /// The encoder failed mid-stream.
    EncoderRuntimeFailure,
    /// Invalid pipeline or render configuration.
    InvalidConfig,
    /// Serialization or deserialization failure.
    Serde,
    /// Wrapped lower-level failure.
    Other,
}

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum StoryreelError {
    /// Empty or malformed waveform.
    #[error("invalid audio input: {0}")]
    InvalidAudioInput(String),

    /// No frames to place on the timeline.
    #[error("empty timeline: {0}")]
    EmptyTimeline(String),

    /// A frame visual failed to load or decode.
    #[error("asset load failure: {0}")]
    AssetLoadFailure(String),

    /// Encoder could not be started.
    #[error("encoder setup failure: {0}")]
    EncoderSetupFailure(String),

    /// Encoder failed while streaming or finalizing.
    #[error("encoder runtime failure: {0}")]
    EncoderRuntimeFailure(String),

    /// Invalid configuration values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoryreelError {
    /// Build a [`StoryreelError::InvalidAudioInput`] value.
    pub fn invalid_audio(msg: impl Into<String>) -> Self {
        Self::InvalidAudioInput(msg.into())
    }

    /// Build a [`StoryreelError::EmptyTimeline`] value.
    pub fn empty_timeline(msg: impl Into<String>) -> Self {
        Self::EmptyTimeline(msg.into())
    }

    /// Build a [`StoryreelError::AssetLoadFailure`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoadFailure(msg.into())
    }

    /// Build a [`StoryreelError::EncoderSetupFailure`] value.
    pub fn encoder_setup(msg: impl Into<String>) -> Self {
        Self::EncoderSetupFailure(msg.into())
    }

    /// Build a [`StoryreelError::EncoderRuntimeFailure`] value.
    pub fn encoder_runtime(msg: impl Into<String>) -> Self {
        Self::EncoderRuntimeFailure(msg.into())
    }

    /// Build a [`StoryreelError::InvalidConfig`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Build a [`StoryreelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAudioInput(_) => ErrorKind::InvalidAudioInput,
            Self::EmptyTimeline(_) => ErrorKind::EmptyTimeline,
            Self::AssetLoadFailure(_) => ErrorKind::AssetLoadFailure,
            Self::EncoderSetupFailure(_) => ErrorKind::EncoderSetupFailure,
            Self::EncoderRuntimeFailure(_) => ErrorKind::EncoderRuntimeFailure,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Serde(_) => ErrorKind::Serde,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Return `true` for errors that abort an export job.
    ///
    /// Asset load failures are degraded to placeholder rendering instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AssetLoadFailure(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
