use crate::error::Error;

/// One entry in the show. Identity is the position in the [`SlideSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub url: String,
    pub link: Option<String>,
}

/// Ordered, non-empty list of slides. Built once at startup; the engine
/// never mutates it afterward.
#[derive(Debug, Clone)]
pub struct SlideSet {
    slides: Vec<Slide>,
}

impl SlideSet {
    /// Pair each image with its link. `links` may be shorter than `images`;
    /// missing entries mean "no click-through".
    pub fn new(images: Vec<String>, links: Vec<Option<String>>) -> Result<Self, Error> {
        if images.is_empty() {
            return Err(Error::EmptySlideSet);
        }
        let mut links = links.into_iter();
        let slides = images
            .into_iter()
            .map(|url| Slide {
                url,
                link: links.next().flatten(),
            })
            .collect();
        Ok(Self { slides })
    }

    /// Pick the index the show opens on. If the visual slot already displays
    /// `initial` and it is missing from the list, it is appended so the show
    /// starts from what the viewer currently sees. Called once, before the
    /// first transition.
    pub fn resolve_start(&mut self, initial: Option<&str>) -> usize {
        let Some(initial) = initial else {
            return 0;
        };
        match self.slides.iter().position(|s| s.url == initial) {
            Some(pos) => pos,
            None => {
                self.slides.push(Slide {
                    url: initial.to_owned(),
                    link: None,
                });
                self.slides.len() - 1
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> &Slide {
        &self.slides[index]
    }
}
