use crate::settings::Settings;

/// Vertical padding plus border of the overlay text field.
const FIELD_CHROME_PX: f64 = 22.0;

/// Height rule for the overlay text field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Autogrow {
    pub min_height_px: f64,
    pub max_height_vh: f64,
    pub line_height_px: f64,
}

impl Autogrow {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min_height_px: settings.min_height_px,
            max_height_vh: settings.max_height_vh,
            line_height_px: settings.font_size_px * settings.line_height,
        }
    }

    /// Content height clamped to `[min, max_vh% of viewport]`; the maximum
    /// wins when the two cross.
    pub fn height_for(&self, text: &str, viewport_height: f64) -> f64 {
        let lines = text.split('\n').count().max(1) as f64;
        let content = lines * self.line_height_px + FIELD_CHROME_PX;
        let max = (viewport_height * self.max_height_vh / 100.0).round();
        content.max(self.min_height_px).min(max).round()
    }
}

/// Text currently held by the overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayBuffer {
    text: String,
    height_px: f64,
    focused: bool,
}

impl OverlayBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn height_px(&self) -> f64 {
        self.height_px
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn regrow(&mut self, autogrow: &Autogrow, viewport_height: f64) {
        self.height_px = autogrow.height_for(&self.text, viewport_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_is_clamped() {
        let grow = Autogrow::from_settings(&Settings::default());
        assert_eq!(grow.height_for("", 900.0), 43.0);
        let tall = "line\n".repeat(100);
        assert_eq!(grow.height_for(&tall, 900.0), 315.0);
        let tiny = Autogrow {
            min_height_px: 30.0,
            max_height_vh: 1.0,
            line_height_px: 21.0,
        };
        assert_eq!(tiny.height_for("", 900.0), 9.0);
    }
}
