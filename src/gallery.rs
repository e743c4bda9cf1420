//! Wraparound navigation for the product image gallery and the featured
//! carousel on the home page.

use serde::Serialize;
use utoipa::ToSchema;

/// Position within an ordered image list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Gallery {
    len: usize,
    current: usize,
}

impl Gallery {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    /// Start at `index`, wrapping it into range
    pub fn starting_at(len: usize, index: usize) -> Self {
        let current = if len == 0 { 0 } else { index % len };
        Self { len, current }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn next(&mut self) -> usize {
        if self.len > 0 {
            self.current = (self.current + 1) % self.len;
        }
        self.current
    }

    pub fn prev(&mut self) -> usize {
        if self.len > 0 {
            self.current = (self.current + self.len - 1) % self.len;
        }
        self.current
    }

    /// Jump to a thumbnail. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.len {
            self.current = index;
            true
        } else {
            false
        }
    }
}

/// Auto-advancing slide deck that is never empty
#[derive(Debug, Clone, PartialEq)]
pub struct Carousel<T> {
    slides: Vec<T>,
    position: Gallery,
}

impl<T> Carousel<T> {
    /// Build a carousel, substituting `fallback` when there are no slides
    pub fn with_fallback(slides: Vec<T>, fallback: T) -> Self {
        let slides = if slides.is_empty() {
            vec![fallback]
        } else {
            slides
        };
        let position = Gallery::new(slides.len());
        Self { slides, position }
    }

    pub fn slides(&self) -> &[T] {
        &self.slides
    }

    pub fn into_slides(self) -> Vec<T> {
        self.slides
    }

    pub fn current_index(&self) -> usize {
        self.position.current()
    }

    pub fn current(&self) -> Option<&T> {
        self.slides.get(self.position.current())
    }

    pub fn prev(&mut self) -> usize {
        self.position.prev()
    }

    pub fn select(&mut self, index: usize) -> bool {
        self.position.select(index)
    }

    /// Timer tick; a single slide stays put
    pub fn tick(&mut self) -> usize {
        if self.slides.len() > 1 {
            self.position.next()
        } else {
            self.position.current()
        }
    }

    /// Whether the client should run an auto-advance timer
    pub fn auto_advances(&self) -> bool {
        self.slides.len() > 1
    }
}
