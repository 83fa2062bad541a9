// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use usvg::tiny_skia_path;

/// A fill rule.
///
/// `fill-rule` in SVG.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl Default for FillRule {
    fn default() -> Self {
        FillRule::NonZero
    }
}

impl From<usvg::FillRule> for FillRule {
    fn from(rule: usvg::FillRule) -> Self {
        match rule {
            usvg::FillRule::NonZero => FillRule::NonZero,
            usvg::FillRule::EvenOdd => FillRule::EvenOdd,
        }
    }
}

impl std::str::FromStr for FillRule {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nonzero" => Ok(FillRule::NonZero),
            "evenodd" => Ok(FillRule::EvenOdd),
            _ => Err("invalid fill rule"),
        }
    }
}

/// A visible shape outline.
///
/// Coordinates are in the output user space, all transforms are already applied.
#[derive(Clone, Debug)]
pub struct Shape {
    /// Element's ID. Can be empty.
    pub id: String,
    /// Outline.
    pub path: tiny_skia_path::Path,
    /// Fill rule of the outline.
    pub rule: FillRule,
}
