/// Convenience result type used across scenecomp.
pub type SceneResult<T> = Result<T, SceneError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Scene decoding never produces an error; malformed fragments decode to absent fields instead.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Invalid engine configuration (code tables, layout constants, crop ratios).
    #[error("validation error: {0}")]
    Validation(String),

    /// Asset store transport failure or undecodable asset bytes.
    #[error("asset error: {0}")]
    Asset(String),

    /// Cache store read or write failure.
    #[error("cache error: {0}")]
    Cache(String),

    /// Unexpected fault inside the image pipeline.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing configuration or metadata.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    /// Build a [`SceneError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SceneError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`SceneError::Cache`] value.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Build a [`SceneError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`SceneError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
