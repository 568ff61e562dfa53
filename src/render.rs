use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

/// Visual collaborator the engine drives. Implementations own the layer
/// stack and pixel geometry; the engine only sequences the calls.
pub trait Renderer: Send {
    /// Stage `url` on the hidden background layer.
    fn show_image(&mut self, url: &str);

    /// Re-align the stacked layers over the host slot.
    fn position_layers(&mut self);

    /// Fade the visible layer out over `fade`. Resolves once the fade is
    /// done and the background layer has become the visible one.
    fn hide_current_layer(&mut self, fade: Duration) -> impl Future<Output = ()> + Send;

    /// Click-through target for the visible image, or none.
    fn set_link(&mut self, link: Option<&str>);

    /// Highlight the per-slide control at `index`.
    fn mark_selected(&mut self, index: usize);
}

/// Renderer that narrates the show through tracing and paces fades in real
/// time. Stands in for a compositing surface in the demo binary.
#[derive(Debug, Default)]
pub struct TraceRenderer {
    background: Option<String>,
}

impl Renderer for TraceRenderer {
    fn show_image(&mut self, url: &str) {
        debug!(url, "staging background layer");
        self.background = Some(url.to_owned());
    }

    fn position_layers(&mut self) {
        debug!("layers repositioned");
    }

    async fn hide_current_layer(&mut self, fade: Duration) {
        tokio::time::sleep(fade).await;
        if let Some(url) = self.background.take() {
            info!(url = %url, fade_ms = fade.as_millis() as u64, "fade complete");
        }
    }

    fn set_link(&mut self, link: Option<&str>) {
        match link {
            Some(link) => debug!(link, "click-through set"),
            None => debug!("click-through cleared"),
        }
    }

    fn mark_selected(&mut self, index: usize) {
        debug!(index, "selected marker moved");
    }
}
