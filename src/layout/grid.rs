//! Grid layout with fixed and star-sized tracks.
//!
//! # Algorithm
//!
//! 1. Fixed tracks take their size in order; once the space runs out the
//!    remaining fixed tracks are truncated (from the end).
//! 2. `remaining = available - fixed` is shared between proportional tracks:
//!    each gets `floor(remaining * weight / total_weight)`.
//! 3. The rounding remainder goes to the last proportional track. With no
//!    proportional track the leftover goes to the last track.
//!
//! Track sizes therefore always sum to exactly the available size.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Align, Rect};

use super::types::{align_span, LayoutItem};

/// One row or column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Fixed(u16),
    Proportional(u16),
}

impl Track {
    /// Parse a track token: `"N"`, `"N*"`, `"*"` or `"auto"`.
    ///
    /// ```
    /// use spark_panels::layout::Track;
    ///
    /// assert_eq!(Track::parse("15").unwrap(), Track::Fixed(15));
    /// assert_eq!(Track::parse("2*").unwrap(), Track::Proportional(2));
    /// assert_eq!(Track::parse("auto").unwrap(), Track::Proportional(1));
    /// assert!(Track::parse("wide").is_err());
    /// ```
    pub fn parse(token: &str) -> Result<Self> {
        let t = token.trim();
        let invalid = || Error::InvalidTrack {
            token: token.to_string(),
        };

        if t.eq_ignore_ascii_case("auto") || t == "*" {
            return Ok(Self::Proportional(1));
        }
        if let Some(weight) = t.strip_suffix('*') {
            let weight: u16 = weight.trim().parse().map_err(|_| invalid())?;
            if weight == 0 {
                return Err(invalid());
            }
            return Ok(Self::Proportional(weight));
        }
        t.parse().map(Self::Fixed).map_err(|_| invalid())
    }

    fn token(&self) -> String {
        match self {
            Self::Fixed(n) => n.to_string(),
            Self::Proportional(w) => format!("{w}*"),
        }
    }
}

/// Distribute `available` cells across `tracks`.
///
/// For a non-empty track list the result sums to exactly `available`.
pub fn distribute(tracks: &[Track], available: u16) -> Vec<u16> {
    let mut sizes = vec![0u16; tracks.len()];
    if tracks.is_empty() {
        return sizes;
    }

    let mut remaining = available;
    for (size, track) in sizes.iter_mut().zip(tracks) {
        if let Track::Fixed(n) = track {
            *size = (*n).min(remaining);
            remaining -= *size;
        }
    }

    let total_weight: u32 = tracks
        .iter()
        .map(|t| match t {
            Track::Proportional(w) => *w as u32,
            Track::Fixed(_) => 0,
        })
        .sum();

    let last_star = tracks
        .iter()
        .rposition(|t| matches!(t, Track::Proportional(_)));

    match last_star {
        Some(last) if total_weight > 0 => {
            let mut allocated = 0u16;
            for (size, track) in sizes.iter_mut().zip(tracks) {
                if let Track::Proportional(w) = track {
                    *size = (remaining as u32 * *w as u32 / total_weight) as u16;
                    allocated += *size;
                }
            }
            sizes[last] += remaining - allocated;
        }
        _ => {
            if let Some(last) = sizes.last_mut() {
                *last += remaining;
            }
        }
    }

    sizes
}

/// Prefix sums of `sizes`, starting at `origin`.
pub fn offsets(origin: u16, sizes: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(sizes.len());
    let mut acc = origin;
    for size in sizes {
        out.push(acc);
        acc = acc.saturating_add(*size);
    }
    out
}

/// Raw grid definition as written in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
}

/// Grid layout: row and column tracks.
///
/// An empty row or column list behaves as a single `*` track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridSpec", into = "GridSpec")]
pub struct GridLayout {
    rows: Vec<Track>,
    columns: Vec<Track>,
}

impl TryFrom<GridSpec> for GridLayout {
    type Error = Error;

    fn try_from(spec: GridSpec) -> Result<Self> {
        GridLayout::parse(&spec.rows, &spec.columns)
    }
}

impl From<GridLayout> for GridSpec {
    fn from(grid: GridLayout) -> Self {
        GridSpec {
            rows: grid.rows.iter().map(Track::token).collect(),
            columns: grid.columns.iter().map(Track::token).collect(),
        }
    }
}

impl GridLayout {
    /// Parse row and column tokens. Fails on the first malformed token.
    pub fn parse<S: AsRef<str>>(rows: &[S], columns: &[S]) -> Result<Self> {
        let rows = rows
            .iter()
            .map(|t| Track::parse(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let columns = columns
            .iter()
            .map(|t| Track::parse(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> &[Track] {
        &self.rows
    }

    pub fn columns(&self) -> &[Track] {
        &self.columns
    }

    fn tracks_or_single(tracks: &[Track]) -> &[Track] {
        if tracks.is_empty() {
            &[Track::Proportional(1)]
        } else {
            tracks
        }
    }

    /// Column widths for `width`.
    pub fn column_sizes(&self, width: u16) -> Vec<u16> {
        distribute(Self::tracks_or_single(&self.columns), width)
    }

    /// Row heights for `height`.
    pub fn row_sizes(&self, height: u16) -> Vec<u16> {
        distribute(Self::tracks_or_single(&self.rows), height)
    }

    /// Place each item in its (clamped) cell and align it there.
    pub fn arrange(&self, content: Rect, items: &[LayoutItem]) -> Vec<Rect> {
        let col_sizes = self.column_sizes(content.width);
        let row_sizes = self.row_sizes(content.height);
        let col_offsets = offsets(content.x, &col_sizes);
        let row_offsets = offsets(content.y, &row_sizes);

        items
            .iter()
            .map(|item| {
                let (x, width) = span(&col_offsets, &col_sizes, item.props.column, item.props.column_span);
                let (y, height) = span(&row_offsets, &row_sizes, item.props.row, item.props.row_span);
                let (w, h) = item.natural();
                let (x, width) = align_span(x, width, w, item.props.h_align.unwrap_or(Align::Stretch));
                let (y, height) = align_span(y, height, h, item.props.v_align.unwrap_or(Align::Stretch));
                Rect::new(x, y, width, height)
            })
            .collect()
    }
}

/// Start and extent of `count` tracks from `index`, both clamped.
fn span(offsets: &[u16], sizes: &[u16], index: u16, count: u16) -> (u16, u16) {
    let last = sizes.len().saturating_sub(1);
    let start = (index as usize).min(last);
    let count = (count as usize).clamp(1, sizes.len() - start);
    let extent = sizes[start..start + count].iter().sum();
    (offsets[start], extent)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::LayoutProps;
    use test_case::test_case;

    #[test_case("15", Track::Fixed(15) ; "fixed")]
    #[test_case("3*", Track::Proportional(3) ; "weighted star")]
    #[test_case("*", Track::Proportional(1) ; "bare star")]
    #[test_case("auto", Track::Proportional(1) ; "auto")]
    #[test_case(" AUTO ", Track::Proportional(1) ; "auto any case")]
    fn test_track_parse_ok(token: &str, expected: Track) {
        assert_eq!(Track::parse(token).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("-3" ; "negative")]
    #[test_case("0*" ; "zero weight")]
    #[test_case("x*" ; "bad weight")]
    #[test_case("fill" ; "word")]
    fn test_track_parse_err(token: &str) {
        assert!(matches!(Track::parse(token), Err(Error::InvalidTrack { .. })));
    }

    #[test]
    fn test_grid_parse_reports_bad_token() {
        let err = GridLayout::parse(&["1*"], &["10", "huge"]).unwrap_err();
        match err {
            Error::InvalidTrack { token } => assert_eq!(token, "huge"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_distribute_fixed_and_star() {
        let tracks = [Track::Fixed(15), Track::Proportional(1), Track::Proportional(1)];
        assert_eq!(distribute(&tracks, 75), vec![15, 30, 30]);
    }

    #[test]
    fn test_distribute_remainder_to_last_star() {
        let tracks = [Track::Proportional(1), Track::Proportional(1), Track::Proportional(1), Track::Fixed(2)];
        assert_eq!(distribute(&tracks, 12), vec![3, 3, 4, 2]);
    }

    #[test]
    fn test_distribute_weights() {
        let tracks = [Track::Proportional(1), Track::Proportional(3)];
        assert_eq!(distribute(&tracks, 40), vec![10, 30]);
    }

    #[test]
    fn test_distribute_fixed_overflow_truncates_from_end() {
        let tracks = [Track::Fixed(10), Track::Fixed(10), Track::Proportional(1)];
        assert_eq!(distribute(&tracks, 15), vec![10, 5, 0]);
    }

    #[test]
    fn test_distribute_no_star_leftover_to_last() {
        let tracks = [Track::Fixed(5), Track::Fixed(5)];
        assert_eq!(distribute(&tracks, 20), vec![5, 15]);
    }

    #[test]
    fn test_offsets_are_prefix_sums() {
        assert_eq!(offsets(2, &[15, 30, 30]), vec![2, 17, 47]);
    }

    #[test]
    fn test_arrange_places_and_spans() {
        let grid = GridLayout::parse(&["2", "*"], &["15", "1*", "1*"]).unwrap();
        let content = Rect::new(0, 0, 75, 10);
        let item = |props| LayoutItem {
            props,
            preferred: None,
            current: (0, 0),
        };
        let rects = grid.arrange(
            content,
            &[
                item(LayoutProps::cell(0, 0).span(1, 3)),
                item(LayoutProps::cell(1, 1)),
                item(LayoutProps::cell(9, 9).span(4, 4)),
            ],
        );
        assert_eq!(rects[0], Rect::new(0, 0, 75, 2));
        assert_eq!(rects[1], Rect::new(15, 2, 30, 8));
        // Clamped into the last cell.
        assert_eq!(rects[2], Rect::new(45, 2, 30, 8));
    }

    #[test]
    fn test_arrange_aligns_within_cell() {
        let grid = GridLayout::parse(&["*"], &["*"]).unwrap();
        let item = LayoutItem {
            props: LayoutProps::cell(0, 0).align(Align::Center, Align::End),
            preferred: Some((4, 2)),
            current: (0, 0),
        };
        let rects = grid.arrange(Rect::new(0, 0, 10, 10), &[item]);
        assert_eq!(rects[0], Rect::new(3, 8, 4, 2));
    }

    #[test]
    fn test_grid_deserializes_and_rejects_bad_tokens() {
        let grid: GridLayout = serde_json::from_str(r#"{"columns":["10","*"]}"#).unwrap();
        assert_eq!(grid.columns(), &[Track::Fixed(10), Track::Proportional(1)]);
        assert!(serde_json::from_str::<GridLayout>(r#"{"columns":["nope"]}"#).is_err());
    }
}
