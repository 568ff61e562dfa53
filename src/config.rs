use std::path::Path;
use std::time::Duration;

use anyhow::ensure;
use serde::Deserialize;

use crate::error::Error;

/// Startup configuration for one carousel instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// Ordered image sources. Must be non-empty.
    pub images: Vec<String>,

    /// Per-image click-through targets, same order as `images`. May be
    /// shorter; missing or null entries mean no click behavior.
    #[serde(default)]
    pub links: Vec<Option<String>>,

    /// Image the visual slot is already displaying, if any. Appended to the
    /// list when unknown; the show starts from it either way.
    #[serde(default)]
    pub initial: Option<String>,

    /// How long a slide stays visible before autoplay advances.
    #[serde(default = "Configuration::default_dwell", with = "humantime_serde")]
    pub dwell: Duration,

    /// Duration of the cross-fade: a named speed or an explicit duration.
    #[serde(default)]
    pub fade: FadeSpeed,

    /// Auto-advance to a random slide instead of the next one.
    #[serde(default)]
    pub random: bool,
}

impl Configuration {
    fn default_dwell() -> Duration {
        Duration::from_secs(5)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.images.is_empty(), "images must not be empty");
        ensure!(
            self.links.len() <= self.images.len(),
            "links ({}) outnumber images ({})",
            self.links.len(),
            self.images.len()
        );
        Ok(())
    }
}

/// Fade animation speed: one of the classic named speeds, or any duration
/// humantime understands ("250ms", "1s").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FadeSpeed {
    Named(NamedSpeed),
    Timed(#[serde(with = "humantime_serde")] Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamedSpeed {
    Slow,
    Normal,
    Fast,
}

impl Default for FadeSpeed {
    fn default() -> Self {
        Self::Named(NamedSpeed::Normal)
    }
}

impl FadeSpeed {
    pub fn duration(self) -> Duration {
        match self {
            Self::Named(NamedSpeed::Slow) => Duration::from_millis(600),
            Self::Named(NamedSpeed::Normal) => Duration::from_millis(400),
            Self::Named(NamedSpeed::Fast) => Duration::from_millis(200),
            Self::Timed(duration) => duration,
        }
    }
}

/// Load a [`Configuration`] from a YAML file.
pub fn from_yaml_file(path: &Path) -> Result<Configuration, Error> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}
