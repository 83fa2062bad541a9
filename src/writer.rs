// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use flo_curves::bezier::path::SimpleBezierPath;
use flo_curves::Coord2;
use xmlwriter::XmlWriter;

use crate::extract::{Canvas, SVG_NS};

/// Writes a merged outline as a single-path SVG.
pub(crate) fn write_svg(canvas: &Canvas, outline: &[SimpleBezierPath], precision: u8) -> String {
    let mut xml = XmlWriter::new(xmlwriter::Options {
        use_single_quote: false,
        indent: xmlwriter::Indent::Spaces(4),
        attributes_indent: xmlwriter::Indent::None,
    });

    xml.start_element("svg");
    for (name, value) in &canvas.attributes {
        xml.write_attribute(name, value);
    }
    xml.write_attribute("xmlns", SVG_NS);
    for (prefix, uri) in &canvas.namespaces {
        xml.write_attribute(&format!("xmlns:{}", prefix), uri);
    }

    if !outline.is_empty() {
        xml.start_element("path");
        xml.write_attribute_raw("d", |buf| write_path_data(outline, precision, buf));
        // The union treats every edge as a boundary, so nested contours
        // are holes regardless of their direction.
        xml.write_attribute("fill-rule", "evenodd");
        xml.end_element();
    }

    xml.end_document()
}

fn write_path_data(outline: &[SimpleBezierPath], precision: u8, buf: &mut Vec<u8>) {
    for (start, curves) in outline {
        buf.extend_from_slice(b"M ");
        write_coord(*start, precision, buf);

        let mut prev = *start;
        for (i, &(p1, p2, p)) in curves.iter().enumerate() {
            let is_line = is_line(prev, p1, p2, p);
            prev = p;

            // `Z` draws the closing line by itself.
            if is_line && i + 1 == curves.len() && p == *start {
                break;
            }

            if is_line {
                buf.extend_from_slice(b"L ");
            } else {
                buf.extend_from_slice(b"C ");
                write_coord(p1, precision, buf);
                write_coord(p2, precision, buf);
            }
            write_coord(p, precision, buf);
        }

        buf.extend_from_slice(b"Z ");
    }

    buf.pop();
}

/// Checks that a cubic has control points on its chord.
fn is_line(p0: Coord2, p1: Coord2, p2: Coord2, p3: Coord2) -> bool {
    const EPSILON: f64 = 1e-6;

    let dx = p3.0 - p0.0;
    let dy = p3.1 - p0.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= EPSILON {
        return p1 == p0 && p2 == p3;
    }

    let on_chord = |p: Coord2| {
        let dist = ((p.0 - p0.0) * dy - (p.1 - p0.1) * dx).abs() / len;
        let t = ((p.0 - p0.0) * dx + (p.1 - p0.1) * dy) / (len * len);
        dist <= EPSILON * len.max(1.0) && (0.0..=1.0).contains(&t)
    };

    on_chord(p1) && on_chord(p2)
}

fn write_coord(p: Coord2, precision: u8, buf: &mut Vec<u8>) {
    write_num(p.0, precision, buf);
    buf.push(b' ');
    write_num(p.1, precision, buf);
    buf.push(b' ');
}

static POW_VEC: &[f64] = &[
    1.0,
    10.0,
    100.0,
    1_000.0,
    10_000.0,
    100_000.0,
    1_000_000.0,
    10_000_000.0,
    100_000_000.0,
];

fn write_num(num: f64, precision: u8, buf: &mut Vec<u8>) {
    let pow = POW_VEC[(precision as usize).min(POW_VEC.len() - 1)];
    let v = (num * pow).round() / pow;

    // Writing into a `Vec` cannot fail.
    if v.fract() == 0.0 {
        // Also turns `-0` into `0`.
        let _ = write!(buf, "{}", v as i64);
    } else {
        let _ = write!(buf, "{}", v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64, precision: u8) -> String {
        let mut buf = Vec::new();
        write_num(n, precision, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    fn square() -> SimpleBezierPath {
        let line = |a: Coord2, b: Coord2| {
            (
                Coord2(a.0 + (b.0 - a.0) / 3.0, a.1 + (b.1 - a.1) / 3.0),
                Coord2(a.0 + (b.0 - a.0) * 2.0 / 3.0, a.1 + (b.1 - a.1) * 2.0 / 3.0),
                b,
            )
        };

        let (a, b, c, d) = (
            Coord2(0.0, 0.0),
            Coord2(10.0, 0.0),
            Coord2(10.0, 10.0),
            Coord2(0.0, 10.0),
        );
        (a, vec![line(a, b), line(b, c), line(c, d), line(d, a)])
    }

    #[test]
    fn numbers() {
        assert_eq!(num(10.0, 3), "10");
        assert_eq!(num(1.23456, 3), "1.235");
        assert_eq!(num(29.999999999999996, 3), "30");
        assert_eq!(num(-0.0001, 3), "0");
        assert_eq!(num(0.5, 2), "0.5");
    }

    #[test]
    fn lines_are_detected() {
        let svg = write_svg(&Canvas::default(), &[square()], 3);
        assert!(svg.starts_with(
            "<svg xmlns=\"http://www.w3.org/2000/svg\">\n    \
             <path d=\"M 0 0 L 10 0 L 10 10 L 0 10 Z\" fill-rule=\"evenodd\"/>\n\
             </svg>"
        ));
    }

    #[test]
    fn curves() {
        let outline = vec![(
            Coord2(0.0, 0.0),
            vec![
                (Coord2(0.0, 5.0), Coord2(5.0, 10.0), Coord2(10.0, 10.0)),
                (Coord2(5.0, 5.0), Coord2(5.0, 5.0), Coord2(0.0, 0.0)),
            ],
        )];

        let svg = write_svg(&Canvas::default(), &outline, 3);
        assert!(svg.contains("d=\"M 0 0 C 0 5 5 10 10 10 Z\""));
    }

    #[test]
    fn root_attributes() {
        let attr = |n: &str, v: &str| (n.to_string(), v.to_string());
        let canvas = Canvas {
            attributes: vec![
                attr("id", "icon"),
                attr("width", "24"),
                attr("height", "24"),
                attr("viewBox", "0 0 24 24"),
                attr("class", "logo"),
                attr("data-name", "Icon"),
                attr("inkscape:version", "1.0"),
            ],
            namespaces: vec![attr("inkscape", "http://www.inkscape.org/namespaces/inkscape")],
        };

        let svg = write_svg(&canvas, &[], 3);
        assert!(svg.starts_with(
            "<svg id=\"icon\" width=\"24\" height=\"24\" viewBox=\"0 0 24 24\" \
             class=\"logo\" data-name=\"Icon\" inkscape:version=\"1.0\" \
             xmlns=\"http://www.w3.org/2000/svg\" \
             xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\"/>"
        ));
    }
}
