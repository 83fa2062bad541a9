// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{extract, union, writer, Error, FillFilter, Options};

/// Processing statistics.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Stats {
    /// The number of fills and strokes found in the input.
    pub shapes_total: usize,
    /// The number of shapes left after filtering.
    pub shapes_kept: usize,
    /// The number of union operands.
    pub operands: usize,
    /// The number of subpaths in the output path.
    pub subpaths: usize,
}

/// An SVG document.
///
/// Holds the input data until [`Document::remove`] replaces it with the result.
#[derive(Clone, Debug)]
pub struct Document {
    content: Vec<u8>,
    resources_dir: Option<PathBuf>,
}

impl Document {
    /// Reads a document from a file.
    ///
    /// Relative images will be resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if path.as_os_str().is_empty() {
            return Err(Error::EmptyInputPath);
        }

        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }

        if !path.is_file() {
            return Err(Error::InputNotAFile(path.to_path_buf()));
        }

        log::info!("Reading {}...", path.display());
        let content = std::fs::read(path)?;

        let resources_dir = std::fs::canonicalize(path)
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));

        Ok(Document {
            content,
            resources_dir,
        })
    }

    /// Creates a document from an SVG or SVGZ data.
    pub fn from_data(content: Vec<u8>) -> Self {
        Document {
            content,
            resources_dir: None,
        }
    }

    /// Returns the current content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Merges all visible shapes into a single path.
    ///
    /// On success, the content is replaced with the resulting SVG.
    /// On error, the content stays unchanged.
    pub fn remove(&mut self, opt: &Options) -> Result<Stats, Error> {
        if !(opt.accuracy > 0.0 && opt.accuracy.is_finite()) {
            return Err(Error::InvalidAccuracy(opt.accuracy));
        }

        let filter = FillFilter::new(opt.skip_fills.as_slice(), opt.keep_white)?;

        let data = if self.content.starts_with(&[0x1f, 0x8b]) {
            usvg::decompress_svgz(&self.content)?
        } else {
            self.content.clone()
        };
        let text = std::str::from_utf8(&data).map_err(|_| Error::NotAnUtf8Str)?;

        let xml_opt = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let xml = roxmltree::Document::parse_with_options(text, xml_opt)?;

        let collection = extract::collect(&xml, opt, self.resources_dir.clone(), &filter)?;
        let shapes_total = collection.total;
        let shapes_kept = collection.shapes.len();
        if shapes_kept < shapes_total {
            log::info!(
                "{} out of {} shapes are invisible and were skipped.",
                shapes_total - shapes_kept,
                shapes_total
            );
        }

        let progress = new_progress_bar(opt.show_progress, shapes_kept as u64, "Converting paths");
        let mut operands = Vec::new();
        for shape in &collection.shapes {
            operands.extend(union::operands(shape));
            progress.inc(1);
        }
        progress.finish_and_clear();

        let operands_count = operands.len();
        log::info!(
            "Merging {} shapes as {} operands...",
            shapes_kept,
            operands_count
        );

        let progress = new_progress_bar(
            opt.show_progress,
            operands_count.saturating_sub(1) as u64,
            "Removing overlaps",
        );
        let outline = union::union(operands, opt.strategy, opt.accuracy, &progress);
        progress.finish_and_clear();

        let precision = opt.coordinates_precision.clamp(2, 8);
        let svg = writer::write_svg(&collection.canvas, &outline, precision);
        self.content = svg.into_bytes();

        Ok(Stats {
            shapes_total,
            shapes_kept,
            operands: operands_count,
            subpaths: outline.len(),
        })
    }

    /// Writes the content to a file.
    ///
    /// Missing parent directories will be created.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        log::info!("Saving {}...", path.display());
        std::fs::write(path, &self.content)?;
        Ok(())
    }
}

/// Merges all visible shapes of an SVG into a single path and returns the resulting SVG.
///
/// # Examples
///
/// ```
/// let svg = "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 20 20'>
///     <rect width='10' height='10'/>
///     <rect x='5' y='5' width='10' height='10'/>
///     <rect width='20' height='20' fill='white'/>
/// </svg>";
///
/// let opt = svg_removeoverlap::Options::default();
/// let result = svg_removeoverlap::remove_overlaps(svg.as_bytes(), &opt).unwrap();
/// assert_eq!(result.matches("<path").count(), 1);
/// assert_eq!(result.matches('M').count(), 1);
/// ```
pub fn remove_overlaps(data: &[u8], opt: &Options) -> Result<String, Error> {
    let mut doc = Document::from_data(data.to_vec());
    doc.remove(opt)?;
    String::from_utf8(doc.content).map_err(|_| Error::NotAnUtf8Str)
}

fn new_progress_bar(show: bool, len: u64, message: &'static str) -> ProgressBar {
    if !show || len == 0 {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    match ProgressStyle::with_template("{msg} [{elapsed_precise}] [{wide_bar}] {pos}/{len}") {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => log::warn!("Invalid progress bar template: {}.", e),
    }
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_path() {
        assert!(matches!(
            Document::load(Path::new("")),
            Err(Error::EmptyInputPath)
        ));
    }

    #[test]
    fn missing_input() {
        assert!(matches!(
            Document::load(Path::new("does-not-exist.svg")),
            Err(Error::InputNotFound(_))
        ));
    }

    #[test]
    fn directory_input() {
        assert!(matches!(
            Document::load(Path::new("src")),
            Err(Error::InputNotAFile(_))
        ));
    }

    #[test]
    fn content_is_kept_on_error() {
        let mut doc = Document::from_data(b"<svg".to_vec());
        assert!(doc.remove(&Options::default()).is_err());
        assert_eq!(doc.content(), b"<svg");
    }

    #[test]
    fn invalid_accuracy() {
        let mut doc = Document::from_data(b"<svg xmlns='http://www.w3.org/2000/svg'/>".to_vec());
        let opt = Options {
            accuracy: 0.0,
            ..Options::default()
        };
        assert!(matches!(doc.remove(&opt), Err(Error::InvalidAccuracy(_))));
    }

    #[test]
    fn not_utf8() {
        let mut doc = Document::from_data(vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            doc.remove(&Options::default()),
            Err(Error::NotAnUtf8Str)
        ));
    }

    #[test]
    fn malformed_svgz() {
        let mut doc = Document::from_data(vec![0x1f, 0x8b, 0x00, 0x01, 0x02]);
        assert!(matches!(
            doc.remove(&Options::default()),
            Err(Error::MalformedGZip)
        ));
        assert_eq!(doc.content(), &[0x1f, 0x8b, 0x00, 0x01, 0x02]);
    }
}
