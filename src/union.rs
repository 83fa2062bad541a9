// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Outlines union.
//!
//! The union itself is done by `flo_curves`, which treats every edge as an exterior one.
//! That is close to the `evenodd` fill rule, so `nonzero` shapes are split
//! into separate operands when possible.

use flo_curves::bezier::path::{path_add, SimpleBezierPath};
use flo_curves::Coord2;
use indicatif::ProgressBar;
use usvg::tiny_skia_path::{self, PathSegment};

use crate::{FillRule, Shape, UnionStrategy};

/// A set of closed cubic subpaths.
pub(crate) type Outline = Vec<SimpleBezierPath>;

/// Subpaths with a smaller area are dropped.
const MIN_AREA: f64 = 1e-6;

/// Converts a path into closed cubic subpaths.
///
/// Lines and quadratic curves are elevated to cubics, open subpaths are closed
/// and subpaths without an area are dropped.
pub(crate) fn to_outline(path: &tiny_skia_path::Path) -> Outline {
    let mut outline = Vec::new();
    let mut subpath: Option<SimpleBezierPath> = None;
    let mut prev = Coord2(0.0, 0.0);

    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                finish_subpath(subpath.take(), &mut outline);
                prev = coord(p);
                subpath = Some((prev, Vec::new()));
            }
            PathSegment::LineTo(p) => {
                let p = coord(p);
                if let Some((_, ref mut curves)) = subpath {
                    curves.push(line_to_cubic(prev, p));
                }
                prev = p;
            }
            PathSegment::QuadTo(p1, p) => {
                let (p1, p) = (coord(p1), coord(p));
                if let Some((_, ref mut curves)) = subpath {
                    curves.push(quad_to_cubic(prev, p1, p));
                }
                prev = p;
            }
            PathSegment::CubicTo(p1, p2, p) => {
                let p = coord(p);
                if let Some((_, ref mut curves)) = subpath {
                    curves.push((coord(p1), coord(p2), p));
                }
                prev = p;
            }
            PathSegment::Close => {
                if let Some((start, _)) = subpath {
                    finish_subpath(subpath.take(), &mut outline);
                    // A segment after `Z` starts at the subpath start.
                    prev = start;
                    subpath = Some((start, Vec::new()));
                }
            }
        }
    }

    finish_subpath(subpath, &mut outline);
    outline
}

fn finish_subpath(subpath: Option<SimpleBezierPath>, outline: &mut Outline) {
    let (start, mut curves) = match subpath {
        Some(v) => v,
        None => return,
    };

    let end = match curves.last() {
        Some(&(_, _, end)) => end,
        None => return,
    };

    if end != start {
        curves.push(line_to_cubic(end, start));
    }

    let subpath = (start, curves);
    if signed_area(&subpath).abs() > MIN_AREA {
        outline.push(subpath);
    }
}

fn coord(p: tiny_skia_path::Point) -> Coord2 {
    Coord2(p.x as f64, p.y as f64)
}

fn lerp(a: Coord2, b: Coord2, t: f64) -> Coord2 {
    Coord2(a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

fn line_to_cubic(p0: Coord2, p: Coord2) -> (Coord2, Coord2, Coord2) {
    (lerp(p0, p, 1.0 / 3.0), lerp(p0, p, 2.0 / 3.0), p)
}

fn quad_to_cubic(p0: Coord2, p1: Coord2, p: Coord2) -> (Coord2, Coord2, Coord2) {
    (lerp(p0, p1, 2.0 / 3.0), lerp(p, p1, 2.0 / 3.0), p)
}

fn cubic_at(p0: Coord2, (p1, p2, p3): (Coord2, Coord2, Coord2), t: f64) -> Coord2 {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Coord2(
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

/// Returns an approximate signed area of a closed subpath.
///
/// Positive for a clockwise subpath in the SVG coordinate system.
pub(crate) fn signed_area(subpath: &SimpleBezierPath) -> f64 {
    const STEPS: usize = 16;

    let (start, ref curves) = *subpath;
    let mut area = 0.0;
    let mut prev = start;
    for curve in curves {
        let p0 = prev;
        for i in 1..=STEPS {
            let p = cubic_at(p0, *curve, i as f64 / STEPS as f64);
            area += prev.0 * p.1 - p.0 * prev.1;
            prev = p;
        }
    }

    area += prev.0 * start.1 - start.0 * prev.1;
    area / 2.0
}

/// Splits a shape into union operands.
///
/// A `nonzero` shape with all subpaths in the same direction cannot have holes,
/// so each subpath becomes a separate operand. Everything else is kept as is.
pub(crate) fn operands(shape: &Shape) -> Vec<Outline> {
    let outline = to_outline(&shape.path);
    if outline.is_empty() {
        return Vec::new();
    }

    let same_direction = {
        let mut areas = outline.iter().map(signed_area);
        let first = areas.next().unwrap_or_default().is_sign_positive();
        areas.all(|a| a.is_sign_positive() == first)
    };

    if shape.rule == FillRule::NonZero && same_direction && outline.len() > 1 {
        outline.into_iter().map(|subpath| vec![subpath]).collect()
    } else {
        if shape.rule == FillRule::NonZero && !same_direction {
            log::debug!(
                "Shape '{}' has subpaths in different directions. Treated as 'evenodd'.",
                shape.id
            );
        }

        vec![outline]
    }
}

/// Merges all operands into a single outline.
///
/// `progress` is advanced once per merge, so it needs `operands.len() - 1` steps.
pub(crate) fn union(
    operands: Vec<Outline>,
    strategy: UnionStrategy,
    accuracy: f64,
    progress: &ProgressBar,
) -> Outline {
    match strategy {
        UnionStrategy::Sequential => {
            let mut iter = operands.into_iter();
            let mut acc = match iter.next() {
                Some(v) => v,
                None => return Vec::new(),
            };

            for operand in iter {
                acc = path_add(&acc, &operand, accuracy);
                progress.inc(1);
            }

            acc
        }
        UnionStrategy::Batch => {
            let mut level = operands;
            while level.len() > 1 {
                let mut next = Vec::with_capacity(level.len() / 2 + 1);
                let mut iter = level.into_iter();
                while let Some(a) = iter.next() {
                    match iter.next() {
                        Some(b) => {
                            next.push(path_add(&a, &b, accuracy));
                            progress.inc(1);
                        }
                        None => next.push(a),
                    }
                }

                level = next;
            }

            level.pop().unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usvg::tiny_skia_path::{PathBuilder, Rect};

    fn rect(x: f32, y: f32, w: f32, h: f32) -> tiny_skia_path::Path {
        PathBuilder::from_rect(Rect::from_xywh(x, y, w, h).unwrap())
    }

    fn shape(path: tiny_skia_path::Path, rule: FillRule) -> Shape {
        Shape {
            id: String::new(),
            path,
            rule,
        }
    }

    fn bounds(outline: &Outline) -> (f64, f64, f64, f64) {
        let mut b = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (start, curves) in outline {
            for p in std::iter::once(start).chain(curves.iter().map(|c| &c.2)) {
                b.0 = b.0.min(p.0);
                b.1 = b.1.min(p.1);
                b.2 = b.2.max(p.0);
                b.3 = b.3.max(p.1);
            }
        }
        b
    }

    fn run(outlines: Vec<Outline>, strategy: UnionStrategy) -> Outline {
        union(outlines, strategy, 0.01, &ProgressBar::hidden())
    }

    #[test]
    fn lines_are_elevated_and_closed() {
        let mut builder = PathBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.line_to(10.0, 0.0);
        builder.line_to(10.0, 10.0);
        let outline = to_outline(&builder.finish().unwrap());

        assert_eq!(outline.len(), 1);
        let (start, ref curves) = outline[0];
        assert_eq!(start, Coord2(0.0, 0.0));
        assert_eq!(curves.len(), 3);
        assert_eq!(curves[2].2, start);
    }

    #[test]
    fn degenerate_subpaths_are_dropped() {
        let mut builder = PathBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.line_to(10.0, 0.0);
        builder.move_to(0.0, 0.0);
        builder.line_to(10.0, 0.0);
        builder.line_to(10.0, 10.0);
        builder.close();
        let outline = to_outline(&builder.finish().unwrap());
        assert_eq!(outline.len(), 1);
    }

    #[test]
    fn area_sign_follows_direction() {
        let outline = to_outline(&rect(0.0, 0.0, 10.0, 10.0));
        assert!((signed_area(&outline[0]) - 100.0).abs() < 1e-6);

        let mut builder = PathBuilder::new();
        builder.move_to(0.0, 0.0);
        builder.line_to(0.0, 10.0);
        builder.line_to(10.0, 10.0);
        builder.line_to(10.0, 0.0);
        builder.close();
        let outline = to_outline(&builder.finish().unwrap());
        assert!((signed_area(&outline[0]) + 100.0).abs() < 1e-6);
    }

    #[test]
    fn nonzero_shape_is_split() {
        let mut builder = PathBuilder::new();
        builder.push_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap());
        builder.push_rect(Rect::from_xywh(20.0, 0.0, 10.0, 10.0).unwrap());
        let path = builder.finish().unwrap();

        assert_eq!(operands(&shape(path.clone(), FillRule::NonZero)).len(), 2);
        assert_eq!(operands(&shape(path, FillRule::EvenOdd)).len(), 1);
    }

    #[test]
    fn overlapping_squares() {
        let a = to_outline(&rect(0.0, 0.0, 10.0, 10.0));
        let b = to_outline(&rect(5.0, 5.0, 10.0, 10.0));

        for strategy in [UnionStrategy::Batch, UnionStrategy::Sequential] {
            let merged = run(vec![a.clone(), b.clone()], strategy);
            assert_eq!(merged.len(), 1);

            let (x0, y0, x1, y1) = bounds(&merged);
            assert!(x0.abs() < 0.01 && y0.abs() < 0.01);
            assert!((x1 - 15.0).abs() < 0.01 && (y1 - 15.0).abs() < 0.01);
        }
    }

    #[test]
    fn disjoint_squares() {
        let outlines = vec![
            to_outline(&rect(0.0, 0.0, 10.0, 10.0)),
            to_outline(&rect(20.0, 0.0, 10.0, 10.0)),
            to_outline(&rect(40.0, 0.0, 10.0, 10.0)),
        ];

        assert_eq!(run(outlines, UnionStrategy::Batch).len(), 3);
    }

    #[test]
    fn trivial_inputs() {
        assert!(run(Vec::new(), UnionStrategy::Batch).is_empty());
        assert!(run(Vec::new(), UnionStrategy::Sequential).is_empty());

        let single = to_outline(&rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(run(vec![single.clone()], UnionStrategy::Batch), single);
    }
}
