//! Repeated header/footer ("page furniture") detection.
//!
//! The first and last line of every page are candidate samples. A candidate
//! that recurs on at least `floor(page_count × ratio)` pages is furniture:
//! it is removed from the body and emitted once around the document instead.
//! Headers and footers are counted separately.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default fraction of pages a line must repeat on.
pub const DEFAULT_REPEAT_RATIO: f64 = 0.7;

/// First and last line text of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLineIndex {
    pub first: String,
    pub last: String,
}

/// Detected repeated headers and footers, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFurniture {
    pub headers: Vec<String>,
    pub footers: Vec<String>,
}

impl PageFurniture {
    /// Detect furniture across pages.
    ///
    /// `page_count` includes pages that produced no lines (and so no sample).
    pub fn detect(samples: &[PageLineIndex], page_count: usize, ratio: f64) -> Self {
        let threshold = repeat_threshold(page_count, ratio);
        Self {
            headers: repeated(samples.iter().map(|s| s.first.as_str()), threshold),
            footers: repeated(samples.iter().map(|s| s.last.as_str()), threshold),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.footers.is_empty()
    }

    /// Whether `text` matches any detected header or footer.
    pub fn contains(&self, text: &str) -> bool {
        self.headers.iter().any(|h| h == text) || self.footers.iter().any(|f| f == text)
    }

    pub fn first_header(&self) -> Option<&str> {
        self.headers.first().map(String::as_str)
    }

    pub fn first_footer(&self) -> Option<&str> {
        self.footers.first().map(String::as_str)
    }
}

/// Minimum occurrences for a candidate to count as repeated.
pub fn repeat_threshold(page_count: usize, ratio: f64) -> usize {
    (page_count as f64 * ratio).floor() as usize
}

/// Distinct non-empty candidates reaching `threshold`, in first-seen order.
fn repeated<'a>(candidates: impl Iterator<Item = &'a str>, threshold: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for candidate in candidates.map(str::trim).filter(|c| !c.is_empty()) {
        let count = counts.entry(candidate).or_insert(0);
        if *count == 0 {
            order.push(candidate);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|c| counts[c] >= threshold)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(first: &str, last: &str) -> PageLineIndex {
        PageLineIndex {
            first: first.into(),
            last: last.into(),
        }
    }

    #[test]
    fn threshold_rounds_down() {
        assert_eq!(repeat_threshold(10, 0.7), 7);
        assert_eq!(repeat_threshold(3, 0.7), 2);
        assert_eq!(repeat_threshold(1, 0.7), 0);
        assert_eq!(repeat_threshold(0, 0.7), 0);
    }

    #[test]
    fn seven_of_ten_qualifies_six_does_not() {
        let mut samples: Vec<PageLineIndex> =
            (0..7).map(|i| sample("ACME Report", &format!("{i}"))).collect();
        samples.extend((7..10).map(|i| sample(&format!("Chapter {i}"), "x")));
        let furniture = PageFurniture::detect(&samples, 10, DEFAULT_REPEAT_RATIO);
        assert_eq!(furniture.headers, vec!["ACME Report".to_string()]);

        let mut samples: Vec<PageLineIndex> =
            (0..6).map(|i| sample("ACME Report", &format!("{i}"))).collect();
        samples.extend((6..10).map(|i| sample(&format!("Chapter {i}"), "x")));
        let furniture = PageFurniture::detect(&samples, 10, DEFAULT_REPEAT_RATIO);
        assert!(furniture.headers.is_empty());
    }

    #[test]
    fn headers_and_footers_counted_separately() {
        // "Confidential" appears four times, but only twice on either side.
        let samples = vec![
            sample("Confidential", "p1"),
            sample("Intro", "Confidential"),
            sample("Body", "Confidential"),
            sample("Confidential", "p4"),
            sample("End", "p5"),
        ];
        // threshold = floor(5 × 0.7) = 3
        let furniture = PageFurniture::detect(&samples, 5, DEFAULT_REPEAT_RATIO);
        assert!(furniture.is_empty());
    }

    #[test]
    fn empty_candidates_ignored() {
        let samples = vec![sample("", ""), sample("", ""), sample("", "")];
        let furniture = PageFurniture::detect(&samples, 3, DEFAULT_REPEAT_RATIO);
        assert!(furniture.is_empty());
    }

    #[test]
    fn first_seen_order() {
        let samples = vec![
            sample("B", "f"),
            sample("A", "f"),
            sample("B", "f"),
            sample("A", "f"),
        ];
        // threshold = floor(4 × 0.5) = 2
        let furniture = PageFurniture::detect(&samples, 4, 0.5);
        assert_eq!(furniture.headers, vec!["B".to_string(), "A".to_string()]);
        assert_eq!(furniture.first_header(), Some("B"));
        assert_eq!(furniture.first_footer(), Some("f"));
        assert!(furniture.contains("A"));
        assert!(furniture.contains("f"));
        assert!(!furniture.contains("C"));
    }
}
