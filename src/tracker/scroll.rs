//! Scroll depth thresholds

/// Percentages that emit a `scroll_depth_<n>` event, once each per session
pub const SCROLL_THRESHOLDS: [u32; 4] = [25, 50, 75, 100];

/// Snapshot of the viewport against the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    /// Pixels scrolled from the top
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollPosition {
    /// Bottom edge of the viewport, in document pixels
    pub fn bottom(&self) -> f64 {
        self.scroll_y + self.viewport_height
    }

    /// How much of the document has been seen, floored to a whole percent.
    /// `None` for an empty or non-finite document height.
    pub fn percentage(&self) -> Option<u32> {
        if !self.document_height.is_finite() || self.document_height <= 0.0 {
            return None;
        }
        let percent = (self.bottom() / self.document_height * 100.0).floor();
        Some(percent.max(0.0) as u32)
    }
}

/// Thresholds at or below `percentage` that are not in `reached`, ascending
pub fn newly_reached(percentage: u32, reached: &[u32]) -> Vec<u32> {
    SCROLL_THRESHOLDS
        .iter()
        .copied()
        .filter(|t| percentage >= *t && !reached.contains(t))
        .collect()
}
