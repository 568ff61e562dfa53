use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;

/// Fetches one image and resolves only once the data is fully retrieved and
/// decodable. Generic "loaded" signals under-report completion; implementors
/// must block on a true decode.
pub trait Preloader: Send + Sync {
    fn load(&self, url: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Preloader for local image files: decodes the whole image on a blocking
/// thread and discards the pixels. The decode is the readiness probe; nothing
/// visible changes until the engine swaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreloader;

impl Preloader for ImagePreloader {
    async fn load(&self, url: &str) -> Result<(), Error> {
        let path = PathBuf::from(url);
        match tokio::task::spawn_blocking(move || decode_probe(&path)).await {
            Ok(Ok((width, height))) => {
                debug!(url, width, height, "image preloaded");
                Ok(())
            }
            Ok(Err(err)) => Err(Error::image_load(url, err)),
            Err(join) => Err(Error::image_load(url, anyhow::anyhow!(join))),
        }
    }
}

// Sniffs the format from content, then runs the full decode so a truncated
// or corrupt file fails here instead of on screen.
fn decode_probe(path: &Path) -> anyhow::Result<(u32, u32)> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok((img.width(), img.height()))
}
