// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`svg-removeoverlap` merges all visible shapes of an SVG into a single path.

Shapes are collected either from a `usvg` tree or straight from the XML,
invisible ones (white, transparent or unpainted) are dropped
and the remaining outlines are unioned by `flo_curves`.

```no_run
use std::path::Path;

let mut doc = svg_removeoverlap::Document::load(Path::new("icon.svg")).unwrap();
let stats = doc.remove(&svg_removeoverlap::Options::default()).unwrap();
println!("{} shapes merged into {} subpaths", stats.shapes_kept, stats.subpaths);
doc.save(Path::new("icon-merged.svg")).unwrap();
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod document;
mod error;
mod extract;
mod fill;
mod geom;
mod options;
mod shape;
mod union;
mod writer;

pub use crate::document::{remove_overlaps, Document, Stats};
pub use crate::error::Error;
pub use crate::extract::Canvas;
pub use crate::fill::{css_fill, normalize_fill, FillFilter, DEFAULT_SKIP_FILLS};
pub use crate::options::{Options, UnionStrategy};
pub use crate::shape::{FillRule, Shape};
