// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shapes collection.
//!
//! There are two ways to get shapes out of an SVG:
//!
//! - `normalized` goes through `usvg`, so everything `usvg` supports is resolved
//!   and fills are matched by their resolved paint.
//! - `raw` reads basic shapes straight from the XML tree
//!   and matches fills by their declared value.

mod normalized;
mod raw;

use std::path::PathBuf;
use std::str::FromStr;

use svgtypes::AspectRatio;
use usvg::tiny_skia_path::{self, PathStroker, Transform};

use crate::{Error, FillFilter, Options, Shape};

pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub(crate) const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Attributes of the output root element.
///
/// Copied as is from the input root element, except `transform`,
/// which is already applied to the collected shapes.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Canvas {
    /// Attribute names and values in the document order.
    ///
    /// Names of namespaced attributes are prefixed, like `xml:space`.
    pub attributes: Vec<(String, String)>,
    /// Namespace prefixes and URIs used by `attributes`.
    ///
    /// Neither the SVG nor the XML namespace are listed.
    pub namespaces: Vec<(String, String)>,
}

impl Canvas {
    fn from_root(root: roxmltree::Node) -> Self {
        let mut canvas = Canvas::default();
        for attr in root.attributes() {
            let name = match attr.namespace() {
                None | Some(SVG_NS) => attr.name().to_string(),
                Some(XML_NS) => format!("xml:{}", attr.name()),
                Some(uri) => match root.lookup_prefix(uri) {
                    Some(prefix) => {
                        let ns = (prefix.to_string(), uri.to_string());
                        if !canvas.namespaces.contains(&ns) {
                            canvas.namespaces.push(ns);
                        }

                        format!("{}:{}", prefix, attr.name())
                    }
                    None => {
                        log::warn!(
                            "Root attribute '{}' has an unknown namespace. Skipped.",
                            attr.name()
                        );
                        continue;
                    }
                },
            };

            if name == "transform" {
                continue;
            }

            canvas.attributes.push((name, attr.value().to_string()));
        }

        canvas
    }

    /// Returns a root attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a parsed and valid `viewBox` with its aspect.
    pub(crate) fn parsed_view_box(&self) -> Option<(svgtypes::ViewBox, AspectRatio)> {
        let vb = svgtypes::ViewBox::from_str(self.attribute("viewBox")?).ok()?;
        if !(vb.w > 0.0 && vb.h > 0.0) {
            return None;
        }

        let aspect = self
            .attribute("preserveAspectRatio")
            .and_then(|v| AspectRatio::from_str(v).ok())
            .unwrap_or_default();

        Some((vb, aspect))
    }
}

/// Collected shapes.
#[derive(Debug)]
pub(crate) struct Collection {
    pub canvas: Canvas,
    /// Visible shapes in the document order.
    pub shapes: Vec<Shape>,
    /// The number of shapes before filtering.
    pub total: usize,
}

pub(crate) fn collect(
    xml: &roxmltree::Document,
    opt: &Options,
    resources_dir: Option<PathBuf>,
    filter: &FillFilter,
) -> Result<Collection, Error> {
    let root = xml.root_element();
    if !is_svg_element(root, "svg") {
        return Err(Error::NotAnSvg);
    }

    let canvas = Canvas::from_root(root);
    let (shapes, total) = if opt.normalize {
        log::info!("Normalizing SVG...");
        normalized::collect(xml, &canvas, opt, resources_dir, filter)?
    } else {
        raw::collect(root, &canvas, opt.picofy, filter)
    };

    Ok(Collection {
        canvas,
        shapes,
        total,
    })
}

/// Checks that a node is an SVG element with the specified name.
///
/// Elements without a namespace are accepted as well.
pub(crate) fn is_svg_element(node: roxmltree::Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

/// Converts a stroke into a filled outline and applies `ts` to it.
pub(crate) fn stroke_outline(
    path: &tiny_skia_path::Path,
    mut stroke: tiny_skia_path::Stroke,
    ts: Transform,
) -> Option<tiny_skia_path::Path> {
    let res_scale = PathStroker::compute_resolution_scale(&ts);
    let outline = match stroke.dash.take() {
        Some(ref dash) => path.dash(dash, res_scale)?.stroke(&stroke, res_scale)?,
        None => path.stroke(&stroke, res_scale)?,
    };

    outline.transform(ts)
}
