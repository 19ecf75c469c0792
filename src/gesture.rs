/// Horizontal swipe direction. Left advances the carousel, right goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Classifies a completed touch by its start and end X. Any nonzero movement counts.
pub fn classify_swipe(start_x: f64, end_x: f64) -> Option<SwipeDirection> {
    if end_x < start_x {
        Some(SwipeDirection::Left)
    } else if end_x > start_x {
        Some(SwipeDirection::Right)
    } else {
        None
    }
}

/// Remembers where the current touch started.
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn touch_start(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Finishes the touch. A touch end without a matching start yields nothing.
    pub fn touch_end(&mut self, x: f64) -> Option<SwipeDirection> {
        let start = self.start_x.take()?;
        classify_swipe(start, x)
    }

    pub fn cancel(&mut self) {
        self.start_x = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_swipe() {
        assert_eq!(classify_swipe(300.0, 100.0), Some(SwipeDirection::Left));
        assert_eq!(classify_swipe(100.0, 300.0), Some(SwipeDirection::Right));
        assert_eq!(classify_swipe(200.0, 200.0), None);
        assert_eq!(classify_swipe(200.0, 199.5), Some(SwipeDirection::Left));
    }

    #[test]
    fn test_tracker_needs_a_start() {
        let mut tracker = SwipeTracker::default();
        assert_eq!(tracker.touch_end(10.0), None);

        tracker.touch_start(50.0);
        assert_eq!(tracker.touch_end(10.0), Some(SwipeDirection::Left));
        // the start is consumed by the first end
        assert_eq!(tracker.touch_end(0.0), None);
    }
}
