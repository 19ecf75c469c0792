//! The map layer's handle on whichever popup carousel is currently open.
//!
//! Event handlers receive the session explicitly; swipes anywhere in the
//! document are routed through it to the open carousel, if there is one.

use tracing::{debug, info};

use crate::carousel::{BindError, Carousel, PopupSurface};
use crate::gesture::{SwipeDirection, SwipeTracker};
use crate::settings::Settings;
use crate::viewport::{Placement, Viewport};

#[derive(Debug)]
pub struct ActiveSession<S: PopupSurface> {
    carousel: Option<Carousel<S>>,
    swipe: SwipeTracker,
    zoom_threshold: f64,
}

impl<S: PopupSurface> ActiveSession<S> {
    /// `zoom_threshold` is the zoom level below which marker popups are dismissed.
    pub fn new(zoom_threshold: f64) -> Self {
        Self {
            carousel: None,
            swipe: SwipeTracker::default(),
            zoom_threshold,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.region_zoom_threshold)
    }

    pub fn current(&self) -> Option<&Carousel<S>> {
        self.carousel.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Carousel<S>> {
        self.carousel.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.carousel.is_some()
    }

    /// Popup `open` event: binds a new carousel and places it for the viewport.
    ///
    /// Any previously open popup is closed first and a touch started before the
    /// open is dropped. On a bind error the session is left empty.
    pub fn popup_opened(&mut self, surface: S, viewport: Viewport) -> Result<Placement, BindError> {
        self.dismiss();
        self.swipe.cancel();
        let mut carousel = Carousel::bind(surface)?;
        let placement = carousel.place(viewport);
        debug!("Popup opened with {} slides", carousel.slide_count());
        self.carousel = Some(carousel);
        Ok(placement)
    }

    /// Popup `close` event. Returns the surface of the carousel that was open.
    pub fn popup_closed(&mut self) -> Option<S> {
        self.swipe.cancel();
        self.carousel.take().map(Carousel::remove)
    }

    pub fn map_dragged(&mut self) -> Option<S> {
        self.popup_closed()
    }

    /// Zooming out past the region threshold dismisses the open popup.
    pub fn map_zoomed(&mut self, zoom: f64) -> Option<S> {
        if zoom < self.zoom_threshold && self.is_active() {
            info!("Zoom {} below {}, dismissing popup", zoom, self.zoom_threshold);
            self.popup_closed()
        } else {
            None
        }
    }

    /// Window resize: re-place the open popup.
    pub fn viewport_changed(&mut self, viewport: Viewport) -> Option<Placement> {
        self.carousel.as_mut().map(|c| c.place(viewport))
    }

    pub fn touch_start(&mut self, x: f64) {
        self.swipe.touch_start(x);
    }

    /// Completes a touch and routes a swipe to the open carousel.
    ///
    /// Returns the swipe that was applied; with no open carousel nothing happens.
    pub fn touch_end(&mut self, x: f64) -> Option<SwipeDirection> {
        let direction = self.swipe.touch_end(x)?;
        let carousel = self.carousel.as_mut()?;
        match direction {
            SwipeDirection::Left => carousel.next(),
            SwipeDirection::Right => carousel.previous(),
        }
        Some(direction)
    }

    fn dismiss(&mut self) {
        if let Some(carousel) = self.carousel.take() {
            carousel.remove();
        }
    }
}
