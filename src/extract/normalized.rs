// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use usvg::tiny_skia_path::Transform;

use super::{stroke_outline, Canvas};
use crate::geom::view_box_to_transform;
use crate::{Error, FillFilter, FillRule, Options, Shape};

pub(crate) fn collect(
    xml: &roxmltree::Document,
    canvas: &Canvas,
    opt: &Options,
    resources_dir: Option<PathBuf>,
    filter: &FillFilter,
) -> Result<(Vec<Shape>, usize), Error> {
    let has_text = xml
        .descendants()
        .any(|n| super::is_svg_element(n, "text"));
    let re_opt = opt.to_usvg(resources_dir, has_text);
    let tree = usvg::Tree::from_xmltree(xml, &re_opt)?;

    // `usvg` places everything on a canvas of `Tree::size`.
    // Map it back, so the output would keep the input `viewBox`.
    let size = tree.size();
    let canvas_ts = canvas
        .parsed_view_box()
        .and_then(|(vb, aspect)| {
            view_box_to_transform(vb, aspect, (size.width(), size.height())).invert()
        })
        .unwrap_or_default();

    let mut collector = Collector {
        filter,
        picofy: opt.picofy,
        canvas_ts,
        shapes: Vec::new(),
        total: 0,
    };
    collector.collect_group(tree.root(), 1.0);

    Ok((collector.shapes, collector.total))
}

struct Collector<'a> {
    filter: &'a FillFilter,
    picofy: bool,
    canvas_ts: Transform,
    shapes: Vec<Shape>,
    total: usize,
}

impl Collector<'_> {
    fn collect_group(&mut self, group: &usvg::Group, opacity: f32) {
        for node in group.children() {
            match node {
                usvg::Node::Group(ref g) => {
                    let opacity = opacity * g.opacity().get();
                    if opacity <= 0.0 {
                        log::debug!("Group '{}' is fully transparent. Skipped.", g.id());
                        continue;
                    }

                    self.collect_group(g, opacity);
                }
                usvg::Node::Path(ref path) => {
                    self.collect_path(path, opacity);
                }
                usvg::Node::Image(ref image) => {
                    log::warn!("Image '{}' cannot be merged. Skipped.", image.id());
                }
                usvg::Node::Text(ref text) => {
                    self.collect_group(text.flattened(), opacity);
                }
            }
        }
    }

    fn collect_path(&mut self, path: &usvg::Path, opacity: f32) {
        if !path.is_visible() {
            return;
        }

        let ts = self.canvas_ts.pre_concat(path.abs_transform());

        self.total += 1;
        let fill = path.fill();
        let paint = fill.map(|f| (f.paint(), f.opacity().get() * opacity));
        if self.filter.skips_paint(paint) {
            log::debug!("Path '{}' has an invisible fill. Skipped.", path.id());
        } else if let Some(data) = path.data().clone().transform(ts) {
            self.shapes.push(Shape {
                id: path.id().to_string(),
                path: data,
                rule: fill.map(|f| FillRule::from(f.rule())).unwrap_or_default(),
            });
        }

        if !self.picofy {
            return;
        }

        let stroke = match path.stroke() {
            Some(v) => v,
            None => return,
        };

        self.total += 1;
        let paint = (stroke.paint(), stroke.opacity().get() * opacity);
        if self.filter.skips_paint(Some(paint)) {
            log::debug!("Path '{}' has an invisible stroke. Skipped.", path.id());
            return;
        }

        match stroke_outline(path.data(), stroke.to_tiny_skia(), ts) {
            Some(outline) => self.shapes.push(Shape {
                id: path.id().to_string(),
                path: outline,
                rule: FillRule::NonZero,
            }),
            None => log::warn!("Failed to outline a stroke of path '{}'.", path.id()),
        }
    }
}
