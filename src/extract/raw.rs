// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;

use svgtypes::{Length, LengthUnit as Unit};
use usvg::tiny_skia_path::{self, LineCap, LineJoin, Path, PathBuilder, Rect, Transform};

use super::{is_svg_element, stroke_outline, Canvas};
use crate::geom::to_transform;
use crate::{FillFilter, FillRule, Shape};

const DPI: f32 = 96.0;
const FONT_SIZE: f32 = 16.0;

/// Elements that are never rendered directly.
static NON_RENDERING: &[&str] = &[
    "clipPath",
    "defs",
    "desc",
    "filter",
    "linearGradient",
    "marker",
    "mask",
    "metadata",
    "pattern",
    "radialGradient",
    "script",
    "style",
    "symbol",
    "title",
];

pub(crate) fn collect(
    root: roxmltree::Node,
    canvas: &Canvas,
    picofy: bool,
    filter: &FillFilter,
) -> (Vec<Shape>, usize) {
    let view_port = match canvas.parsed_view_box() {
        Some((vb, _)) => (vb.w as f32, vb.h as f32),
        None => (
            canvas_length(canvas.attribute("width")),
            canvas_length(canvas.attribute("height")),
        ),
    };

    let mut collector = Collector {
        filter,
        picofy,
        view_port,
        shapes: Vec::new(),
        total: 0,
        use_warned: false,
    };

    let state = collector.resolve_state(root, &State::default());
    collector.collect_children(root, &state);

    (collector.shapes, collector.total)
}

fn canvas_length(value: Option<&str>) -> f32 {
    value
        .and_then(|v| Length::from_str(v).ok())
        .filter(|l| l.unit != Unit::Percent && l.number > 0.0)
        .map(|l| l.number as f32)
        .unwrap_or(100.0)
}

/// Inherited presentation attributes.
#[derive(Clone, Debug)]
struct State<'a> {
    ts: Transform,
    fill: &'a str,
    fill_rule: FillRule,
    stroke: &'a str,
    stroke_width: f32,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f32,
}

impl Default for State<'_> {
    fn default() -> Self {
        State {
            ts: Transform::default(),
            fill: "black",
            fill_rule: FillRule::NonZero,
            stroke: "none",
            stroke_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Axis {
    X,
    Y,
    Diagonal,
}

struct Collector<'f> {
    filter: &'f FillFilter,
    picofy: bool,
    view_port: (f32, f32),
    shapes: Vec<Shape>,
    total: usize,
    use_warned: bool,
}

impl Collector<'_> {
    fn collect_children<'a>(&mut self, parent: roxmltree::Node<'a, '_>, state: &State<'a>) {
        for node in parent.children() {
            if !node.is_element() {
                continue;
            }

            let name = node.tag_name().name();
            if !is_svg_element(node, name) || NON_RENDERING.contains(&name) {
                continue;
            }

            if property(node, "display").map(str::trim) == Some("none") {
                continue;
            }

            let state = self.resolve_state(node, state);
            match name {
                "g" | "a" | "svg" => self.collect_children(node, &state),
                "path" | "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" => {
                    self.collect_shape(node, &state)
                }
                "use" => {
                    if !self.use_warned {
                        log::warn!("'use' elements are not resolved without normalization.");
                        self.use_warned = true;
                    }
                }
                _ => {}
            }
        }
    }

    fn resolve_state<'a>(&self, node: roxmltree::Node<'a, '_>, parent: &State<'a>) -> State<'a> {
        let mut state = parent.clone();

        if let Some(value) = node.attribute("transform") {
            match svgtypes::Transform::from_str(value) {
                Ok(ts) => state.ts = state.ts.pre_concat(to_transform(ts)),
                Err(_) => log::warn!("Failed to parse a transform: '{}'.", value),
            }
        }

        if let Some(value) = inherited(node, "fill") {
            state.fill = value;
        }

        if let Some(rule) = inherited(node, "fill-rule").and_then(|v| FillRule::from_str(v).ok()) {
            state.fill_rule = rule;
        }

        if let Some(value) = inherited(node, "stroke") {
            state.stroke = value;
        }

        if let Some(length) = inherited(node, "stroke-width").and_then(|v| Length::from_str(v).ok())
        {
            state.stroke_width = self.convert_length(length, Axis::Diagonal);
        }

        match inherited(node, "stroke-linecap") {
            Some("butt") => state.line_cap = LineCap::Butt,
            Some("round") => state.line_cap = LineCap::Round,
            Some("square") => state.line_cap = LineCap::Square,
            _ => {}
        }

        match inherited(node, "stroke-linejoin") {
            Some("miter") => state.line_join = LineJoin::Miter,
            Some("miter-clip") => state.line_join = LineJoin::MiterClip,
            Some("round") => state.line_join = LineJoin::Round,
            Some("bevel") => state.line_join = LineJoin::Bevel,
            _ => {}
        }

        if let Some(n) = inherited(node, "stroke-miterlimit").and_then(|v| v.parse::<f32>().ok()) {
            if n >= 1.0 {
                state.miter_limit = n;
            }
        }

        state
    }

    fn collect_shape(&mut self, node: roxmltree::Node, state: &State) {
        let path = match self.convert_shape(node) {
            Some(v) => v,
            None => return,
        };

        let id = node.attribute("id").unwrap_or_default();

        self.total += 1;
        if self.filter.skips_declared(state.fill) {
            log::debug!("Shape '{}' has an invisible fill '{}'. Skipped.", id, state.fill);
        } else if let Some(data) = path.clone().transform(state.ts) {
            self.shapes.push(Shape {
                id: id.to_string(),
                path: data,
                rule: state.fill_rule,
            });
        }

        if !self.picofy || state.stroke == "none" || !(state.stroke_width > 0.0) {
            return;
        }

        self.total += 1;
        if self.filter.skips_declared(state.stroke) {
            log::debug!("Shape '{}' has an invisible stroke '{}'. Skipped.", id, state.stroke);
            return;
        }

        let mut stroke = tiny_skia_path::Stroke::default();
        stroke.width = state.stroke_width;
        stroke.line_cap = state.line_cap;
        stroke.line_join = state.line_join;
        stroke.miter_limit = state.miter_limit;

        match stroke_outline(&path, stroke, state.ts) {
            Some(outline) => self.shapes.push(Shape {
                id: id.to_string(),
                path: outline,
                rule: FillRule::NonZero,
            }),
            None => log::warn!("Failed to outline a stroke of shape '{}'.", id),
        }
    }

    fn convert_shape(&self, node: roxmltree::Node) -> Option<Path> {
        match node.tag_name().name() {
            "path" => convert_path(node),
            "rect" => self.convert_rect(node),
            "circle" => self.convert_circle(node),
            "ellipse" => self.convert_ellipse(node),
            "line" => self.convert_line(node),
            "polyline" => points_to_path(node, "Polyline")?.finish(),
            "polygon" => {
                let mut builder = points_to_path(node, "Polygon")?;
                builder.close();
                builder.finish()
            }
            _ => None,
        }
    }

    fn convert_rect(&self, node: roxmltree::Node) -> Option<Path> {
        let width = self.length(node, "width", Axis::X);
        let height = self.length(node, "height", Axis::Y);
        if !(width > 0.0 && height > 0.0) {
            log::warn!("Rect '{}' has an invalid size. Skipped.", element_id(node));
            return None;
        }

        let x = self.length(node, "x", Axis::X);
        let y = self.length(node, "y", Axis::Y);

        let (mut rx, mut ry) = self.resolve_rx_ry(node);
        rx = rx.min(width / 2.0);
        ry = ry.min(height / 2.0);

        if rx == 0.0 || ry == 0.0 {
            return Some(PathBuilder::from_rect(Rect::from_xywh(x, y, width, height)?));
        }

        let mut builder = PathBuilder::new();
        builder.move_to(x + rx, y);

        builder.line_to(x + width - rx, y);
        builder.arc_to(rx, ry, x + width, y + ry);

        builder.line_to(x + width, y + height - ry);
        builder.arc_to(rx, ry, x + width - rx, y + height);

        builder.line_to(x + rx, y + height);
        builder.arc_to(rx, ry, x, y + height - ry);

        builder.line_to(x, y + ry);
        builder.arc_to(rx, ry, x + rx, y);

        builder.close();
        builder.finish()
    }

    fn resolve_rx_ry(&self, node: roxmltree::Node) -> (f32, f32) {
        let parse = |name: &str| {
            node.attribute(name)
                .and_then(|v| Length::from_str(v).ok())
                .filter(|l| !l.number.is_sign_negative())
        };

        match (parse("rx"), parse("ry")) {
            (None, None) => (0.0, 0.0),
            (Some(rx), None) => {
                let rx = self.convert_length(rx, Axis::X);
                (rx, rx)
            }
            (None, Some(ry)) => {
                let ry = self.convert_length(ry, Axis::Y);
                (ry, ry)
            }
            (Some(rx), Some(ry)) => (
                self.convert_length(rx, Axis::X),
                self.convert_length(ry, Axis::Y),
            ),
        }
    }

    fn convert_circle(&self, node: roxmltree::Node) -> Option<Path> {
        let cx = self.length(node, "cx", Axis::X);
        let cy = self.length(node, "cy", Axis::Y);
        let r = self.length(node, "r", Axis::Diagonal);
        if !(r > 0.0) {
            log::warn!("Circle '{}' has an invalid 'r' value. Skipped.", element_id(node));
            return None;
        }

        ellipse_to_path(cx, cy, r, r)
    }

    fn convert_ellipse(&self, node: roxmltree::Node) -> Option<Path> {
        let cx = self.length(node, "cx", Axis::X);
        let cy = self.length(node, "cy", Axis::Y);
        let (rx, ry) = self.resolve_rx_ry(node);
        if !(rx > 0.0 && ry > 0.0) {
            log::warn!("Ellipse '{}' has an invalid radius. Skipped.", element_id(node));
            return None;
        }

        ellipse_to_path(cx, cy, rx, ry)
    }

    fn convert_line(&self, node: roxmltree::Node) -> Option<Path> {
        let mut builder = PathBuilder::new();
        builder.move_to(self.length(node, "x1", Axis::X), self.length(node, "y1", Axis::Y));
        builder.line_to(self.length(node, "x2", Axis::X), self.length(node, "y2", Axis::Y));
        builder.finish()
    }

    fn length(&self, node: roxmltree::Node, name: &str, axis: Axis) -> f32 {
        let value = match node.attribute(name) {
            Some(v) => v,
            None => return 0.0,
        };

        match Length::from_str(value) {
            Ok(length) => self.convert_length(length, axis),
            Err(_) => {
                log::warn!("Failed to parse '{}' value: '{}'.", name, value);
                0.0
            }
        }
    }

    fn convert_length(&self, length: Length, axis: Axis) -> f32 {
        let n = length.number as f32;
        match length.unit {
            Unit::None | Unit::Px => n,
            Unit::Em => n * FONT_SIZE,
            Unit::Ex => n * FONT_SIZE / 2.0,
            Unit::In => n * DPI,
            Unit::Cm => n * DPI / 2.54,
            Unit::Mm => n * DPI / 25.4,
            Unit::Pt => n * DPI / 72.0,
            Unit::Pc => n * DPI / 6.0,
            Unit::Percent => {
                let (w, h) = self.view_port;
                let base = match axis {
                    Axis::X => w,
                    Axis::Y => h,
                    Axis::Diagonal => ((w * w + h * h) / 2.0).sqrt(),
                };

                base * n / 100.0
            }
        }
    }
}

/// Returns a property value, either from the `style` attribute or from an attribute.
///
/// `style` has a higher priority.
fn property<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    if let Some(style) = node.attribute("style") {
        let declaration = simplecss::DeclarationTokenizer::from(style)
            .filter(|d| d.name == name)
            .last();
        if let Some(d) = declaration {
            return Some(d.value);
        }
    }

    node.attribute(name)
}

fn inherited<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    property(node, name)
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "inherit")
}

fn element_id<'a>(node: roxmltree::Node<'a, '_>) -> &'a str {
    node.attribute("id").unwrap_or_default()
}

fn convert_path(node: roxmltree::Node) -> Option<Path> {
    let value = node.attribute("d")?;
    let mut builder = PathBuilder::new();
    for segment in svgtypes::SimplifyingPathParser::from(value) {
        let segment = match segment {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Path '{}' has an invalid data. Truncated.", element_id(node));
                break;
            }
        };

        match segment {
            svgtypes::SimplePathSegment::MoveTo { x, y } => {
                builder.move_to(x as f32, y as f32);
            }
            svgtypes::SimplePathSegment::LineTo { x, y } => {
                builder.line_to(x as f32, y as f32);
            }
            svgtypes::SimplePathSegment::Quadratic { x1, y1, x, y } => {
                builder.quad_to(x1 as f32, y1 as f32, x as f32, y as f32);
            }
            svgtypes::SimplePathSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                builder.cubic_to(
                    x1 as f32, y1 as f32, x2 as f32, y2 as f32, x as f32, y as f32,
                );
            }
            svgtypes::SimplePathSegment::ClosePath => {
                builder.close();
            }
        }
    }

    builder.finish()
}

fn points_to_path(node: roxmltree::Node, eid: &str) -> Option<PathBuilder> {
    let mut builder = PathBuilder::new();
    match node.attribute("points") {
        Some(text) => {
            for (x, y) in svgtypes::PointsParser::from(text) {
                if builder.is_empty() {
                    builder.move_to(x as f32, y as f32);
                } else {
                    builder.line_to(x as f32, y as f32);
                }
            }
        }
        None => {
            log::warn!("{} '{}' has no 'points' value. Skipped.", eid, element_id(node));
            return None;
        }
    }

    // 'polyline' and 'polygon' elements must contain at least 2 points.
    if builder.len() < 2 {
        log::warn!("{} '{}' has less than 2 points. Skipped.", eid, element_id(node));
        return None;
    }

    Some(builder)
}

fn ellipse_to_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    let mut builder = PathBuilder::new();
    builder.move_to(cx + rx, cy);
    builder.arc_to(rx, ry, cx, cy + ry);
    builder.arc_to(rx, ry, cx - rx, cy);
    builder.arc_to(rx, ry, cx, cy - ry);
    builder.arc_to(rx, ry, cx + rx, cy);
    builder.close();
    builder.finish()
}

trait PathBuilderExt {
    /// Appends a quarter of an axis-aligned ellipse. Sweep is always positive.
    fn arc_to(&mut self, rx: f32, ry: f32, x: f32, y: f32);
}

impl PathBuilderExt for PathBuilder {
    fn arc_to(&mut self, rx: f32, ry: f32, x: f32, y: f32) {
        let prev = match self.last_point() {
            Some(v) => v,
            None => return,
        };

        let svg_arc = kurbo::SvgArc {
            from: kurbo::Point::new(prev.x as f64, prev.y as f64),
            to: kurbo::Point::new(x as f64, y as f64),
            radii: kurbo::Vec2::new(rx as f64, ry as f64),
            x_rotation: 0.0,
            large_arc: false,
            sweep: true,
        };

        match kurbo::Arc::from_svg_arc(&svg_arc) {
            Some(arc) => {
                arc.to_cubic_beziers(0.1, |p1, p2, p| {
                    self.cubic_to(
                        p1.x as f32,
                        p1.y as f32,
                        p2.x as f32,
                        p2.y as f32,
                        p.x as f32,
                        p.y as f32,
                    );
                });
            }
            None => {
                self.line_to(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_SKIP_FILLS;

    fn collect_str(svg: &str, picofy: bool) -> (Vec<Shape>, usize) {
        let doc = roxmltree::Document::parse(svg).unwrap();
        let root = doc.root_element();
        let canvas = Canvas::from_root(root);
        let filter = FillFilter::new(DEFAULT_SKIP_FILLS, false).unwrap();
        collect(root, &canvas, picofy, &filter)
    }

    #[test]
    fn basic_shapes() {
        let (shapes, total) = collect_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <rect id='r' width='10' height='10'/>
                <rect width='10' height='10' rx='2'/>
                <circle cx='50' cy='50' r='5'/>
                <ellipse cx='50' cy='50' rx='5' ry='3'/>
                <polygon points='0 0 10 0 10 10'/>
                <path d='M 0 0 L 10 10 H 0 Z'/>
            </svg>",
            false,
        );
        assert_eq!(total, 6);
        assert_eq!(shapes.len(), 6);
        assert_eq!(shapes[0].id, "r");
    }

    #[test]
    fn white_and_none_are_skipped() {
        let (shapes, total) = collect_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <rect width='10' height='10' fill='white'/>
                <rect width='10' height='10' style='fill: #FFFFFF'/>
                <g fill='none'>
                    <rect width='10' height='10'/>
                </g>
                <rect id='kept' width='10' height='10' fill='white' style='fill:red'/>
            </svg>",
            false,
        );
        assert_eq!(total, 4);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].id, "kept");
    }

    #[test]
    fn non_rendering_elements_are_ignored() {
        let (shapes, total) = collect_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <clipPath id='clip'><rect width='10' height='10'/></clipPath>
                <defs><circle r='10'/></defs>
                <g display='none'><rect width='10' height='10'/></g>
                <rect width='10' height='10'/>
            </svg>",
            false,
        );
        assert_eq!(total, 1);
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn transforms_are_accumulated() {
        let (shapes, _) = collect_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <g transform='translate(10 20)'>
                    <rect width='10' height='10' transform='scale(2)'/>
                </g>
            </svg>",
            false,
        );
        let bbox = shapes[0].path.bounds();
        assert_eq!(bbox.left(), 10.0);
        assert_eq!(bbox.top(), 20.0);
        assert_eq!(bbox.right(), 30.0);
        assert_eq!(bbox.bottom(), 40.0);
    }

    #[test]
    fn fill_rule_is_inherited() {
        let (shapes, _) = collect_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <g fill-rule='evenodd'><rect width='10' height='10'/></g>
            </svg>",
            false,
        );
        assert_eq!(shapes[0].rule, FillRule::EvenOdd);
    }

    #[test]
    fn strokes_are_outlined_with_picofy() {
        let svg = "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'>
                <line x1='0' y1='50' x2='100' y2='50' stroke='black' stroke-width='4'/>
                <line x1='0' y1='50' x2='100' y2='50' stroke='white' stroke-width='4'/>
            </svg>";

        // Lines have no fill area, so only the fill shape is collected.
        let (shapes, _) = collect_str(svg, false);
        assert_eq!(shapes.len(), 2);

        let (shapes, total) = collect_str(svg, true);
        assert_eq!(total, 4);
        assert_eq!(shapes.len(), 3);
        let bbox = shapes[1].path.bounds();
        assert_eq!(bbox.top(), 48.0);
        assert_eq!(bbox.bottom(), 52.0);
    }

    #[test]
    fn percent_lengths() {
        let (shapes, _) = collect_str(
            "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 200 100'>
                <rect width='50%' height='50%'/>
            </svg>",
            false,
        );
        let bbox = shapes[0].path.bounds();
        assert_eq!(bbox.right(), 100.0);
        assert_eq!(bbox.bottom(), 50.0);
    }
}
