// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use crate::fill::DEFAULT_SKIP_FILLS;

/// How shapes are merged together.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnionStrategy {
    /// Merge all shapes at once, pairwise, as a balanced reduction.
    Batch,
    /// Merge shapes one by one into an accumulated outline, in document order.
    Sequential,
}

impl Default for UnionStrategy {
    fn default() -> Self {
        UnionStrategy::Batch
    }
}

impl std::str::FromStr for UnionStrategy {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch" => Ok(UnionStrategy::Batch),
            "sequential" => Ok(UnionStrategy::Sequential),
            _ => Err("invalid union strategy"),
        }
    }
}

/// Processing options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Fill values of shapes that should be treated as invisible and dropped.
    ///
    /// Either `none` or any CSS color. Replaces the default list entirely.
    ///
    /// Default: [`DEFAULT_SKIP_FILLS`]
    pub skip_fills: Vec<String>,

    /// Keep all shapes, ignoring `skip_fills`.
    ///
    /// Default: false
    pub keep_white: bool,

    /// Union strategy.
    ///
    /// Default: batch
    pub strategy: UnionStrategy,

    /// Run the input through the full `usvg` normalization first.
    ///
    /// When disabled, only basic shapes are read straight from the XML
    /// and shapes are filtered by their declared `fill` value.
    ///
    /// Default: true
    pub normalize: bool,

    /// Convert strokes into filled outlines, so they would be merged as well.
    ///
    /// Default: false
    pub picofy: bool,

    /// Curve fitting accuracy used by the union.
    ///
    /// Default: 0.01
    pub accuracy: f64,

    /// Set the output coordinates numeric precision.
    ///
    /// Smaller precision can lead to a malformed output in some cases.
    ///
    /// Default: 3
    pub coordinates_precision: u8,

    /// Load system fonts when the input has text elements.
    ///
    /// Default: true
    pub load_system_fonts: bool,

    /// Font files to load for text outlining.
    pub font_files: Vec<PathBuf>,

    /// Font directories to load for text outlining.
    pub font_dirs: Vec<PathBuf>,

    /// Draw progress bars on stderr.
    ///
    /// Default: false
    pub show_progress: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            skip_fills: DEFAULT_SKIP_FILLS.iter().map(|s| s.to_string()).collect(),
            keep_white: false,
            strategy: UnionStrategy::default(),
            normalize: true,
            picofy: false,
            accuracy: 0.01,
            coordinates_precision: 3,
            load_system_fonts: true,
            font_files: Vec::new(),
            font_dirs: Vec::new(),
            show_progress: false,
        }
    }
}

impl Options {
    pub(crate) fn to_usvg(
        &self,
        resources_dir: Option<PathBuf>,
        has_text: bool,
    ) -> usvg::Options<'static> {
        let mut opt = usvg::Options {
            resources_dir,
            ..usvg::Options::default()
        };

        // Fonts loading is slow, so do it only when there is something to outline.
        if has_text {
            self.load_fonts(&mut opt);
        }

        opt
    }

    #[cfg(feature = "system-fonts")]
    fn load_fonts(&self, opt: &mut usvg::Options) {
        let fontdb = opt.fontdb_mut();
        if self.load_system_fonts {
            fontdb.load_system_fonts();
        }

        for path in &self.font_files {
            if let Err(e) = fontdb.load_font_file(path) {
                log::warn!("Failed to load '{}' cause {}.", path.display(), e);
            }
        }

        for path in &self.font_dirs {
            fontdb.load_fonts_dir(path);
        }
    }

    #[cfg(not(feature = "system-fonts"))]
    fn load_fonts(&self, _: &mut usvg::Options) {
        log::warn!("Text elements will be skipped. Fonts loading is disabled.");
    }
}
