//! Popup image/video carousel.
//!
//! A [`Carousel`] is bound to one popup's rendered subtree when the popup
//! opens and dropped when it closes. Every navigation call synchronizes the
//! surface before returning, so exactly one slide and its dot are active.

mod surface;

pub use surface::{Node, PopupDom, PopupSurface, SlideNode, SlideStatus};

use thiserror::Error;
use tracing::{debug, warn};

use crate::viewport::{Layout, Placement, Viewport};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("popup has no slides")]
    NoSlides,
    #[error("popup has {slides} slides but {dots} dots")]
    DotCountMismatch { slides: usize, dots: usize },
}

#[derive(Debug)]
pub struct Carousel<S: PopupSurface> {
    surface: S,
    position: usize,
    count: usize,
}

impl<S: PopupSurface> Carousel<S> {
    /// Binds to a freshly opened popup and shows its first slide.
    pub fn bind(surface: S) -> Result<Self, BindError> {
        let slides = surface.slide_count();
        let dots = surface.dot_count();
        if slides == 0 {
            return Err(BindError::NoSlides);
        }
        if slides != dots {
            return Err(BindError::DotCountMismatch { slides, dots });
        }

        let mut carousel = Self {
            surface,
            position: 0,
            count: slides,
        };
        carousel.synchronize();
        Ok(carousel)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn slide_count(&self) -> usize {
        self.count
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn next(&mut self) {
        self.position = (self.position + 1) % self.count;
        self.synchronize();
    }

    pub fn previous(&mut self) {
        self.position = (self.position + self.count - 1) % self.count;
        self.synchronize();
    }

    /// Jumps to a dot position. Returns `false` and leaves the carousel untouched for an
    /// index outside the slide range.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.count {
            warn!("Ignoring carousel jump to {} of {} slides", index, self.count);
            return false;
        }
        self.position = index;
        self.synchronize();
        true
    }

    fn synchronize(&mut self) {
        for i in 0..self.count {
            let active = i == self.position;
            let status = if active {
                SlideStatus::Visible
            } else {
                SlideStatus::Hidden
            };
            self.surface.set_slide_status(i, status);
            self.surface.set_dot_active(i, active);
        }

        if self.surface.caption_count() == self.count {
            for i in 0..self.count {
                let status = if i == self.position {
                    SlideStatus::Visible
                } else {
                    SlideStatus::Hidden
                };
                self.surface.set_caption_status(i, status);
            }
        }
    }

    /// Styles the content container for the viewport, measures it and moves the popup.
    ///
    /// An unmeasured container counts as zero-sized so the popup still opens.
    pub fn place(&mut self, viewport: Viewport) -> Placement {
        let layout = Layout::from(viewport.classify());
        let rule = layout.rule();

        let style = rule.content_style(viewport);
        self.surface.apply_content_style(&style);

        let measured = self.surface.content_size().unwrap_or_default();
        let offset = rule.offset(measured);
        self.surface.set_offset(offset);

        debug!(
            "Placed popup for {:?}: content {}x{}, offset ({}, {})",
            layout, measured.width, measured.height, offset.dx, offset.dy
        );

        Placement {
            layout,
            style,
            offset,
        }
    }

    /// Detaches the controller and closes its popup, handing the surface back.
    pub fn remove(mut self) -> S {
        self.surface.close();
        self.surface
    }
}
