use std::path::PathBuf;

/// Errors from loading the overlay configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("grid needs at least one division")]
    NoDivisions,
}

/// Errors from building icon images.
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Errors surfaced by the debug system during initialization.
#[derive(Debug, thiserror::Error)]
pub enum DebugError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Icon(#[from] IconError),
    #[error("backend error: {0}")]
    Backend(String),
}
