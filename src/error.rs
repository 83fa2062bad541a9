// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

/// List of all errors.
#[derive(Debug)]
pub enum Error {
    /// An empty input path was provided.
    EmptyInputPath,

    /// The input path does not exist.
    InputNotFound(PathBuf),

    /// The input path exists, but it's not a regular file.
    InputNotAFile(PathBuf),

    /// Only UTF-8 content are supported.
    NotAnUtf8Str,

    /// Compressed SVG must use the GZip algorithm.
    MalformedGZip,

    /// Failed to parse an XML data.
    ParsingFailed(roxmltree::Error),

    /// The root element is not an `svg` element.
    NotAnSvg,

    /// SVG normalization failed.
    NormalizationFailed(usvg::Error),

    /// A fill value from the skip list is neither `none` nor a valid color.
    InvalidFill(String),

    /// Union accuracy must be a positive number.
    InvalidAccuracy(f64),

    /// An I/O error.
    Io(std::io::Error),
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::ParsingFailed(e)
    }
}

impl From<usvg::Error> for Error {
    fn from(e: usvg::Error) -> Self {
        match e {
            usvg::Error::NotAnUtf8Str => Error::NotAnUtf8Str,
            usvg::Error::MalformedGZip => Error::MalformedGZip,
            e => Error::NormalizationFailed(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::EmptyInputPath => {
                write!(f, "the input path cannot be empty")
            }
            Error::InputNotFound(ref path) => {
                write!(f, "the input path {} does not exist", path.display())
            }
            Error::InputNotAFile(ref path) => {
                write!(f, "the input path {} is not a file", path.display())
            }
            Error::NotAnUtf8Str => {
                write!(f, "provided data has not an UTF-8 encoding")
            }
            Error::MalformedGZip => {
                write!(f, "provided data has a malformed GZip content")
            }
            Error::ParsingFailed(ref e) => {
                write!(f, "SVG data parsing failed cause {}", e)
            }
            Error::NotAnSvg => {
                write!(f, "the root element is not an 'svg' element")
            }
            Error::NormalizationFailed(ref e) => {
                write!(f, "SVG normalization failed cause {}", e)
            }
            Error::InvalidFill(ref value) => {
                write!(f, "'{}' is not a valid fill value", value)
            }
            Error::InvalidAccuracy(n) => {
                write!(f, "union accuracy must be a positive number, got {}", n)
            }
            Error::Io(ref e) => {
                write!(f, "{}", e)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::ParsingFailed(ref e) => Some(e),
            Error::NormalizationFailed(ref e) => Some(e),
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_message() {
        let e = Error::InputNotFound(PathBuf::from("does_not_exist.svg"));
        assert_eq!(
            e.to_string(),
            "the input path does_not_exist.svg does not exist"
        );
    }

    #[test]
    fn usvg_errors_are_flattened() {
        assert!(matches!(
            Error::from(usvg::Error::NotAnUtf8Str),
            Error::NotAnUtf8Str
        ));
        assert!(matches!(
            Error::from(usvg::Error::InvalidSize),
            Error::NormalizationFailed(_)
        ));
    }
}
