//! Geometric reflow over positioned fragments.
//!
//! ```text
//! pages ──▶ group_lines ──▶ first/last samples ──▶ PageFurniture
//!                │                                     │
//!                └──────────▶ heading test ◀───────────┘ (furniture skipped)
//!                                  │
//!                                  ▼
//!          [header] + body blocks in page/line order + [footer]
//! ```
//!
//! A body line is a heading when its tallest fragment height is shared by at
//! least `floor(fragments × heading_dominance_ratio)` of its fragments and
//! that height exceeds `heading_min_height`.

use crate::block::{Block, BlockKind, BlockSequence};
use crate::error::Pdf2NotionError;
use crate::reflow::furniture::{PageFurniture, PageLineIndex, DEFAULT_REPEAT_RATIO};
use crate::reflow::lines::{group_lines, Line, PageFragments};
use crate::reflow::{ReflowOutput, ReflowStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum `y` difference between consecutive fragments on one line.
pub const DEFAULT_LINE_TOLERANCE: f32 = 2.0;

/// Share of a line's fragments that must reach its maximum height.
pub const DEFAULT_HEADING_DOMINANCE_RATIO: f64 = 0.7;

/// Headings must be strictly taller than this.
pub const DEFAULT_HEADING_MIN_HEIGHT: f32 = 10.0;

/// Tunable constants of the geometric heuristics.
///
/// The defaults were chosen empirically; none of them is known to be optimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryThresholds {
    pub line_tolerance: f32,
    pub repeat_ratio: f64,
    pub heading_dominance_ratio: f64,
    pub heading_min_height: f32,
}

impl Default for GeometryThresholds {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            repeat_ratio: DEFAULT_REPEAT_RATIO,
            heading_dominance_ratio: DEFAULT_HEADING_DOMINANCE_RATIO,
            heading_min_height: DEFAULT_HEADING_MIN_HEIGHT,
        }
    }
}

impl GeometryThresholds {
    pub fn validate(&self) -> Result<(), Pdf2NotionError> {
        if !self.line_tolerance.is_finite() || self.line_tolerance < 0.0 {
            return Err(Pdf2NotionError::InvalidConfig(format!(
                "line tolerance must be a non-negative number, got {}",
                self.line_tolerance
            )));
        }
        for (name, ratio) in [
            ("repeat ratio", self.repeat_ratio),
            ("heading dominance ratio", self.heading_dominance_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Pdf2NotionError::InvalidConfig(format!(
                    "{name} must be within 0–1, got {ratio}"
                )));
            }
        }
        if !self.heading_min_height.is_finite() {
            return Err(Pdf2NotionError::InvalidConfig(
                "heading minimum height must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Geometry-driven reflow strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometricReflow {
    pub thresholds: GeometryThresholds,
}

impl GeometricReflow {
    pub fn new(thresholds: GeometryThresholds) -> Self {
        Self { thresholds }
    }

    /// Reflow every page. Fails on invalid thresholds or malformed fragment
    /// geometry.
    pub fn reflow_pages(&self, pages: &[PageFragments]) -> Result<ReflowOutput, Pdf2NotionError> {
        self.thresholds.validate()?;
        for fragment in pages.iter().flatten() {
            fragment.validate()?;
        }

        let page_lines: Vec<Vec<Line>> = pages
            .iter()
            .map(|fragments| group_lines(fragments, self.thresholds.line_tolerance))
            .collect();

        let samples: Vec<PageLineIndex> = page_lines
            .iter()
            .filter_map(|lines| {
                let first = lines.first()?;
                let last = lines.last()?;
                Some(PageLineIndex {
                    first: first.text(),
                    last: last.text(),
                })
            })
            .collect();

        let furniture = PageFurniture::detect(&samples, pages.len(), self.thresholds.repeat_ratio);
        debug!(
            "Geometric reflow: {} pages, {} lines, {} repeated headers, {} repeated footers",
            pages.len(),
            page_lines.iter().map(Vec::len).sum::<usize>(),
            furniture.headers.len(),
            furniture.footers.len()
        );

        let mut blocks = BlockSequence::new();

        if let Some(block) = furniture.first_header().and_then(Block::paragraph) {
            blocks.push(block);
        }

        for line in page_lines.iter().flatten() {
            let text = line.text();
            if text.is_empty() || furniture.contains(&text) {
                continue;
            }
            let kind = if self.is_heading(line) {
                BlockKind::Heading
            } else {
                BlockKind::Paragraph
            };
            if let Some(block) = Block::new(kind, text) {
                blocks.push(block);
            }
        }

        // A running line stamped at both ends of every page is emitted once.
        let footer = furniture
            .first_footer()
            .filter(|footer| furniture.first_header() != Some(*footer));
        if let Some(block) = footer.and_then(Block::paragraph) {
            blocks.push(block);
        }

        Ok(ReflowOutput {
            blocks,
            furniture,
            page_count: Some(pages.len()),
        })
    }

    /// Font-size dominance test for one line.
    pub fn is_heading(&self, line: &Line) -> bool {
        let max_height = line.max_height();
        let needed = (line.len() as f64 * self.thresholds.heading_dominance_ratio).floor() as usize;
        line.count_at_max_height() >= needed && max_height > self.thresholds.heading_min_height
    }
}

impl ReflowStrategy for GeometricReflow {
    type Input = [PageFragments];

    fn name(&self) -> &'static str {
        "geometric"
    }

    fn reflow(&self, input: &[PageFragments]) -> Result<ReflowOutput, Pdf2NotionError> {
        self.reflow_pages(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflow::lines::Fragment;

    fn line_at(y: f32, words: &[(&str, f32)]) -> Vec<Fragment> {
        words
            .iter()
            .map(|(t, h)| Fragment::new(*t, y, *h))
            .collect()
    }

    fn body_page(title: &str) -> PageFragments {
        let mut page = line_at(800.0, &[("Annual", 9.0), ("Report", 9.0)]);
        page.extend(line_at(700.0, &[(title, 18.0)]));
        page.extend(line_at(650.0, &[("Body", 10.0), ("text", 10.0), ("here.", 10.0)]));
        page.extend(line_at(40.0, &[("Page", 9.0), ("footer", 9.0)]));
        page
    }

    #[test]
    fn empty_document() {
        let out = GeometricReflow::default().reflow_pages(&[]).unwrap();
        assert!(out.blocks.is_empty());
        assert!(out.furniture.is_empty());
        assert_eq!(out.page_count, Some(0));
    }

    #[test]
    fn furniture_wraps_body() {
        let pages = vec![body_page("One"), body_page("Two"), body_page("Three")];
        let out = GeometricReflow::default().reflow_pages(&pages).unwrap();

        assert_eq!(out.furniture.headers, vec!["Annual Report".to_string()]);
        assert_eq!(out.furniture.footers, vec!["Page footer".to_string()]);

        let texts: Vec<&str> = out.blocks.iter().map(Block::text).collect();
        assert_eq!(
            texts,
            vec![
                "Annual Report",
                "One",
                "Body text here.",
                "Two",
                "Body text here.",
                "Three",
                "Body text here.",
                "Page footer",
            ]
        );
        assert_eq!(out.blocks.as_slice()[0].kind, BlockKind::Paragraph);
        assert_eq!(out.blocks.as_slice()[1].kind, BlockKind::Heading);
        assert_eq!(out.blocks.as_slice()[2].kind, BlockKind::Paragraph);
        assert_eq!(out.blocks.as_slice()[7].kind, BlockKind::Paragraph);
    }

    #[test]
    fn heading_needs_height_above_minimum() {
        let reflow = GeometricReflow::default();
        let lines = group_lines(&line_at(0.0, &[("Exactly", 10.0), ("ten", 10.0)]), 2.0);
        assert!(!reflow.is_heading(&lines[0]));
        let lines = group_lines(&line_at(0.0, &[("Taller", 10.5), ("line", 10.5)]), 2.0);
        assert!(reflow.is_heading(&lines[0]));
    }

    #[test]
    fn heading_dominance_rounds_down() {
        let reflow = GeometricReflow::default();
        // 10 fragments, 7 at the max height: floor(10 × 0.7) = 7 → heading.
        let mut words: Vec<(&str, f32)> = vec![("Big", 14.0); 7];
        words.extend(vec![("small", 12.0); 3]);
        let lines = group_lines(&line_at(0.0, &words), 2.0);
        assert!(reflow.is_heading(&lines[0]));

        // 6 at the max height is not enough.
        let mut words: Vec<(&str, f32)> = vec![("Big", 14.0); 6];
        words.extend(vec![("small", 12.0); 4]);
        let lines = group_lines(&line_at(0.0, &words), 2.0);
        assert!(!reflow.is_heading(&lines[0]));
    }

    #[test]
    fn single_fragment_line_only_checks_height() {
        let reflow = GeometricReflow::default();
        let lines = group_lines(&line_at(0.0, &[("Title", 24.0)]), 2.0);
        assert!(reflow.is_heading(&lines[0]));
    }

    #[test]
    fn pages_without_lines_still_count() {
        // Header on 2 of 4 pages: floor(4 × 0.7) = 2 → still qualifies.
        let pages = vec![
            body_page("A"),
            body_page("B"),
            Vec::new(),
            Vec::new(),
        ];
        let out = GeometricReflow::default().reflow_pages(&pages).unwrap();
        assert_eq!(out.page_count, Some(4));
        assert_eq!(out.furniture.first_header(), Some("Annual Report"));
    }

    #[test]
    fn malformed_geometry_is_parse_failure() {
        let pages = vec![vec![Fragment::new("x", f32::NAN, 10.0)]];
        let err = GeometricReflow::default().reflow_pages(&pages).unwrap_err();
        assert!(matches!(err, Pdf2NotionError::ParseFailure(_)));
    }

    #[test]
    fn invalid_thresholds_are_rejected_before_reflow() {
        let reflow = GeometricReflow::new(GeometryThresholds {
            heading_dominance_ratio: f64::NAN,
            ..Default::default()
        });
        let err = reflow.reflow_pages(&[body_page("One")]).unwrap_err();
        assert!(matches!(err, Pdf2NotionError::InvalidConfig(_)), "{err:?}");
    }

    #[test]
    fn thresholds_validate() {
        assert!(GeometryThresholds::default().validate().is_ok());
        let bad = GeometryThresholds {
            repeat_ratio: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = GeometryThresholds {
            line_tolerance: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
