// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use crate::Error;

/// Fill values that are treated as invisible by default.
pub const DEFAULT_SKIP_FILLS: &[&str] = &[
    "white",
    "rgb(255,255,255)",
    "rgb(100%,100%,100%)",
    "rgba(255,255,255,1)",
    "hsl(0,0%,100%)",
    "hsla(0,0%,100%,1)",
    "transparent",
    "#ffffff",
    "none",
];

/// Extracts the `fill` declaration from an inline CSS `style` value.
///
/// The returned value is normalized by [`normalize_fill`].
/// The last declaration wins, like in CSS.
///
/// # Examples
///
/// ```
/// use svg_removeoverlap::css_fill;
///
/// assert_eq!(css_fill("stroke:red; fill: RGB(255, 0, 0)"), Some("rgb(255,0,0)".to_string()));
/// assert_eq!(css_fill("stroke:red"), None);
/// ```
pub fn css_fill(style: &str) -> Option<String> {
    simplecss::DeclarationTokenizer::from(style)
        .filter(|d| d.name == "fill")
        .last()
        .map(|d| normalize_fill(d.value))
        .filter(|v| !v.is_empty())
}

/// Removes all whitespaces and lowercases a fill value.
pub fn normalize_fill(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Clone, Debug)]
enum SkipEntry {
    None,
    Color(svgtypes::Color),
}

/// Decides which shapes are invisible and should not take part in the union.
#[derive(Clone, Debug)]
pub struct FillFilter {
    declared: Vec<String>,
    entries: Vec<SkipEntry>,
    keep_all: bool,
}

impl FillFilter {
    /// Creates a new filter.
    ///
    /// Each value must be either `none` or a valid CSS color.
    /// When `keep_all` is set, nothing will be skipped.
    pub fn new<S: AsRef<str>>(skip_fills: &[S], keep_all: bool) -> Result<Self, Error> {
        let mut declared = Vec::with_capacity(skip_fills.len());
        let mut entries = Vec::with_capacity(skip_fills.len());
        for value in skip_fills {
            let value = normalize_fill(value.as_ref());
            let entry = if value == "none" {
                SkipEntry::None
            } else {
                svgtypes::Color::from_str(&value)
                    .map(SkipEntry::Color)
                    .map_err(|_| Error::InvalidFill(value.clone()))?
            };

            entries.push(entry);
            declared.push(value);
        }

        Ok(FillFilter {
            declared,
            entries,
            keep_all,
        })
    }

    /// Checks that a declared `fill` value is in the skip list.
    ///
    /// This is a plain string match of normalized values,
    /// so `#fff` will not match `#ffffff`.
    pub fn skips_declared(&self, fill: &str) -> bool {
        if self.keep_all {
            return false;
        }

        let fill = normalize_fill(fill);
        self.declared.iter().any(|v| *v == fill)
    }

    /// Checks that a resolved paint matches any value from the skip list.
    ///
    /// `paint` is a paint and its effective opacity.
    /// `None` means no paint at all.
    pub fn skips_paint(&self, paint: Option<(&usvg::Paint, f32)>) -> bool {
        if self.keep_all {
            return false;
        }

        let (paint, opacity) = match paint {
            Some(v) => v,
            None => return self.entries.iter().any(|e| matches!(e, SkipEntry::None)),
        };

        let color = match paint {
            usvg::Paint::Color(c) => *c,
            _ => return false,
        };

        self.entries.iter().any(|entry| match entry {
            SkipEntry::None => false,
            SkipEntry::Color(c) if c.alpha == 0 => opacity <= OPACITY_EPSILON,
            SkipEntry::Color(c) => {
                c.red == color.red
                    && c.green == color.green
                    && c.blue == color.blue
                    && (c.alpha as f32 / 255.0 - opacity).abs() <= OPACITY_EPSILON
            }
        })
    }
}

const OPACITY_EPSILON: f32 = 1.0 / 255.0;

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> FillFilter {
        FillFilter::new(DEFAULT_SKIP_FILLS, false).unwrap()
    }

    fn color(r: u8, g: u8, b: u8) -> usvg::Paint {
        usvg::Paint::Color(usvg::Color::new_rgb(r, g, b))
    }

    #[test]
    fn css_fill_last_declaration_wins() {
        assert_eq!(
            css_fill("fill:red;fill: #FFF"),
            Some("#fff".to_string())
        );
    }

    #[test]
    fn css_fill_ignores_other_properties() {
        assert_eq!(css_fill("fill-opacity:0.5;stroke:white"), None);
        assert_eq!(css_fill(""), None);
    }

    #[test]
    fn declared_match_is_normalized() {
        let filter = default_filter();
        assert!(filter.skips_declared("White"));
        assert!(filter.skips_declared("rgb(255, 255, 255)"));
        assert!(filter.skips_declared("none"));
        assert!(!filter.skips_declared("black"));
        // Only exact spellings are matched.
        assert!(!filter.skips_declared("#fff"));
    }

    #[test]
    fn keep_all_disables_filtering() {
        let filter = FillFilter::new(DEFAULT_SKIP_FILLS, true).unwrap();
        assert!(!filter.skips_declared("white"));
        assert!(!filter.skips_paint(None));
        assert!(!filter.skips_paint(Some((&color(255, 255, 255), 1.0))));
    }

    #[test]
    fn resolved_white() {
        let filter = default_filter();
        assert!(filter.skips_paint(Some((&color(255, 255, 255), 1.0))));
        // Semi-transparent white is still visible.
        assert!(!filter.skips_paint(Some((&color(255, 255, 255), 0.5))));
        assert!(!filter.skips_paint(Some((&color(0, 0, 0), 1.0))));
    }

    #[test]
    fn resolved_transparent() {
        let filter = default_filter();
        assert!(filter.skips_paint(Some((&color(10, 20, 30), 0.0))));
    }

    #[test]
    fn resolved_none() {
        assert!(default_filter().skips_paint(None));

        let filter = FillFilter::new(&["white"], false).unwrap();
        assert!(!filter.skips_paint(None));
    }

    #[test]
    fn custom_list() {
        let filter = FillFilter::new(&["#FF0000"], false).unwrap();
        assert!(filter.skips_paint(Some((&color(255, 0, 0), 1.0))));
        assert!(!filter.skips_paint(Some((&color(255, 255, 255), 1.0))));
        assert!(filter.skips_declared("#ff0000"));
    }

    #[test]
    fn invalid_entry() {
        let e = FillFilter::new(&["not-a-color"], false).unwrap_err();
        assert!(matches!(e, Error::InvalidFill(ref v) if v == "not-a-color"));
    }
}
