//! Pagination – vertical cursors and the footer-boundary overflow rule.
//!
//! Each page owns one [`PageCursor`] that starts just below the header band
//! and moves down as rows and lines are drawn. Nothing in the body may be
//! drawn below the cursor's floor (the footer boundary). When variable
//! length content does not fit, [`place`] decides whether it goes on a
//! continuation page or is dropped.

use serde::{Deserialize, Serialize};

/// What happens to body content that would cross the footer boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Stop emitting lines for the rest of the section.
    Truncate,
    /// Spill onto a continuation page, up to the page cap.
    #[default]
    Continue,
}

/// Vertical drawing position on one page, in PDF points.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page: usize,
    y: f32,
    floor: f32,
}

impl PageCursor {
    pub fn new(page: usize, top: f32, floor: f32) -> Self {
        Self {
            page,
            y: top,
            floor,
        }
    }

    /// Index of the page this cursor belongs to.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Whether `height` more points fit above the floor.
    pub fn fits(&self, height: f32) -> bool {
        self.y - height >= self.floor - f32::EPSILON
    }

    pub fn remaining(&self) -> f32 {
        (self.y - self.floor).max(0.0)
    }

    /// Move down by `height` and return the new y.
    pub fn advance(&mut self, height: f32) -> f32 {
        self.y -= height;
        self.y
    }

    /// Vertical gap; never moves below the floor.
    pub fn skip(&mut self, height: f32) {
        self.y = (self.y - height).max(self.floor);
    }
}

/// Where the next block of body content goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Fits on the current page.
    Here,
    /// Open a continuation page first.
    NewPage,
    /// Does not fit and may not spill; discard it.
    Drop,
}

/// Decide placement of a block `height` points tall.
pub fn place(
    cursor: &PageCursor,
    height: f32,
    policy: OverflowPolicy,
    pages_used: usize,
    max_pages: usize,
) -> Placement {
    if cursor.fits(height) {
        return Placement::Here;
    }
    match policy {
        OverflowPolicy::Continue if pages_used < max_pages => Placement::NewPage,
        _ => Placement::Drop,
    }
}

/// Outcome of flowing variable-length text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowReport {
    pub lines_emitted: usize,
    pub lines_dropped: usize,
    pub pages_added: usize,
}

impl FlowReport {
    pub fn truncated(&self) -> bool {
        self.lines_dropped > 0
    }

    pub fn merge(&mut self, other: &FlowReport) {
        self.lines_emitted += other.lines_emitted;
        self.lines_dropped += other.lines_dropped;
        self.pages_added += other.pages_added;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_moves_down() {
        let mut c = PageCursor::new(0, 700.0, 90.0);
        assert!(c.fits(610.0));
        assert!(!c.fits(611.0));
        assert_eq!(c.advance(20.0), 680.0);
        assert_eq!(c.remaining(), 590.0);
        c.skip(1000.0);
        assert_eq!(c.y(), 90.0);
    }

    #[test]
    fn placement_follows_policy() {
        let c = PageCursor::new(0, 100.0, 90.0);
        assert_eq!(place(&c, 5.0, OverflowPolicy::Truncate, 1, 3), Placement::Here);
        assert_eq!(place(&c, 14.0, OverflowPolicy::Truncate, 1, 3), Placement::Drop);
        assert_eq!(place(&c, 14.0, OverflowPolicy::Continue, 1, 3), Placement::NewPage);
        assert_eq!(place(&c, 14.0, OverflowPolicy::Continue, 3, 3), Placement::Drop);
    }
}
