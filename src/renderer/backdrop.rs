//! Background image with a solid-color fallback

use super::surface::Color;

/// Load state of the background image
#[derive(Debug, Clone, PartialEq)]
pub enum BackdropState<I> {
    /// Plain color background, no image requested
    Solid,
    /// Image requested, not loaded yet
    Pending,
    Ready(I),
    /// Image failed to load; stay on the fallback color
    Failed,
}

/// Frame background: an optional image over a fallback color
#[derive(Debug, Clone)]
pub struct Backdrop<I> {
    state: BackdropState<I>,
    fallback: Color,
    warned: bool,
}

impl<I> Backdrop<I> {
    pub fn solid(fallback: Color) -> Self {
        Self {
            state: BackdropState::Solid,
            fallback,
            warned: false,
        }
    }

    /// Expect an image; draws the fallback until it is ready
    pub fn pending(fallback: Color) -> Self {
        Self {
            state: BackdropState::Pending,
            fallback,
            warned: false,
        }
    }

    pub fn fallback(&self) -> Color {
        self.fallback
    }

    pub fn state(&self) -> &BackdropState<I> {
        &self.state
    }

    /// Image to draw this frame, if any
    pub fn image(&self) -> Option<&I> {
        match &self.state {
            BackdropState::Ready(image) => Some(image),
            _ => None,
        }
    }

    pub fn set_ready(&mut self, image: I) {
        self.state = BackdropState::Ready(image);
    }

    /// Record a load failure. Logged the first time only; returns whether
    /// this call logged.
    pub fn mark_failed(&mut self, reason: &str) -> bool {
        self.state = BackdropState::Failed;
        if self.warned {
            return false;
        }
        log::warn!("Background image unavailable ({reason}), using solid color");
        self.warned = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_only_when_ready() {
        let mut backdrop: Backdrop<String> = Backdrop::pending(Color::rgb(0, 0, 0));
        assert!(backdrop.image().is_none());
        backdrop.set_ready("road.png".to_string());
        assert_eq!(backdrop.image().map(String::as_str), Some("road.png"));
    }

    #[test]
    fn test_failure_falls_back() {
        let mut backdrop: Backdrop<String> = Backdrop::pending(Color::rgb(9, 9, 9));
        assert!(!backdrop.warned);
        assert!(backdrop.mark_failed("404"));
        assert!(backdrop.warned);
        // Repeated failures stay quiet
        assert!(!backdrop.mark_failed("404 again"));
        assert!(!backdrop.mark_failed("timeout"));
        assert_eq!(backdrop.state(), &BackdropState::Failed);
        assert!(backdrop.image().is_none());
        assert_eq!(backdrop.fallback(), Color::rgb(9, 9, 9));
    }
}
