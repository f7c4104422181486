//! Positioned fragments and their grouping into lines.
//!
//! Extraction emits fragments per page in reading order.
//! Only the vertical coordinate matters here: a new line starts whenever a
//! fragment's `y` differs from the *previous fragment's* `y` by more than the
//! tolerance. Comparing against the previous fragment rather than the line's
//! first fragment lets a slowly drifting baseline stay on one line.

use crate::error::Pdf2NotionError;
use serde::{Deserialize, Serialize};

/// One text run with a vertical position and rendered height.
///
/// `height` stands in for font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub y: f32,
    pub height: f32,
}

impl Fragment {
    pub fn new(text: impl Into<String>, y: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            y,
            height,
        }
    }

    /// Reject coordinates the heuristics cannot reason about.
    pub fn validate(&self) -> Result<(), Pdf2NotionError> {
        if !self.y.is_finite() {
            return Err(Pdf2NotionError::ParseFailure(format!(
                "fragment {:?} has non-finite y ({})",
                self.text, self.y
            )));
        }
        if !self.height.is_finite() || self.height < 0.0 {
            return Err(Pdf2NotionError::ParseFailure(format!(
                "fragment {:?} has invalid height ({})",
                self.text, self.height
            )));
        }
        Ok(())
    }
}

/// The fragments of one page, in reading order.
pub type PageFragments = Vec<Fragment>;

/// A run of consecutive fragments sharing (roughly) one baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    fragments: Vec<Fragment>,
}

impl Line {
    fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    /// Space-joined fragment text, trimmed.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Largest fragment height, or 0 for an empty line.
    pub fn max_height(&self) -> f32 {
        self.fragments
            .iter()
            .map(|f| f.height)
            .fold(0.0_f32, f32::max)
    }

    /// How many fragments are exactly as tall as the tallest one.
    pub fn count_at_max_height(&self) -> usize {
        let max = self.max_height();
        self.fragments.iter().filter(|f| f.height == max).count()
    }
}

/// Group one page's fragments into lines.
pub fn group_lines(fragments: &[Fragment], tolerance: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current: Vec<Fragment> = Vec::new();
    let mut last_y: Option<f32> = None;

    for fragment in fragments {
        if let Some(y) = last_y {
            if (fragment.y - y).abs() > tolerance && !current.is_empty() {
                lines.push(Line::new(std::mem::take(&mut current)));
            }
        }
        last_y = Some(fragment.y);
        current.push(fragment.clone());
    }

    if !current.is_empty() {
        lines.push(Line::new(current));
    }

    lines
}
