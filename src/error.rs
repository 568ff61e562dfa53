use thiserror::Error;

/// Library error type for carousel operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured slide list is empty; the engine refuses to start.
    #[error("slide set is empty; at least one image is required")]
    EmptySlideSet,

    /// An image could not be fetched or decoded. Recoverable: the engine
    /// stays on the current slide and keeps the autoplay cycle running.
    #[error("failed to load image {url}: {source}")]
    ImageLoad {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    pub fn image_load(url: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::ImageLoad {
            url: url.into(),
            source: source.into(),
        }
    }
}
