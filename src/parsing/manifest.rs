//! Manifest describing which classifier outputs belong to which reads file.
//!
//! Blocks repeat for any number of reads files; blank lines are ignored:
//!
//! ```text
//! reads_file_path
//! N
//! classifier1_name
//! classifier1_output_path
//! ...
//! classifierN_name
//! classifierN_output_path
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::parsing::classifier::{ClassifierFormat, ClassifierRegistry};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid manifest line {line}: {message}")]
    InvalidFormat { line: usize, message: String },

    #[error("Unsupported classifier '{name}' on manifest line {line} (known: {known})")]
    UnsupportedClassifier {
        name: String,
        line: usize,
        known: String,
    },

    #[error("Manifest lists no reads files")]
    Empty,
}

/// One classifier's output for a reads file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierInput {
    pub name: String,
    pub format: ClassifierFormat,
    pub path: PathBuf,
}

/// A reads file and the classifier outputs to reconcile for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSet {
    pub reads: PathBuf,
    pub classifiers: Vec<ClassifierInput>,
}

/// Parse a manifest file. Paths are kept as written.
///
/// # Errors
///
/// Returns `ManifestError::Io` if the file cannot be read, or any error from
/// [`parse_manifest_text`].
pub fn parse_manifest_file(
    path: &Path,
    registry: &ClassifierRegistry,
) -> Result<Vec<ReadSet>, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    parse_manifest_text(&content, registry)
}

/// Parse manifest text
///
/// # Errors
///
/// Returns `ManifestError::InvalidFormat` for a bad classifier count or a
/// truncated block, `ManifestError::UnsupportedClassifier` for a name missing
/// from `registry`, or `ManifestError::Empty` if no block is present.
pub fn parse_manifest_text(
    text: &str,
    registry: &ClassifierRegistry,
) -> Result<Vec<ReadSet>, ManifestError> {
    // Line numbers in errors are 1-based for user friendliness
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let mut read_sets = Vec::new();

    while let Some((reads_line, reads)) = lines.next() {
        let (count_line, count) = lines.next().ok_or_else(|| ManifestError::InvalidFormat {
            line: reads_line,
            message: format!("missing classifier count after '{reads}'"),
        })?;

        let count: usize = count.parse().map_err(|_| ManifestError::InvalidFormat {
            line: count_line,
            message: format!("invalid classifier count '{count}'"),
        })?;
        if count == 0 {
            return Err(ManifestError::InvalidFormat {
                line: count_line,
                message: "classifier count must be at least 1".to_string(),
            });
        }

        let mut classifiers = Vec::with_capacity(count);
        for _ in 0..count {
            let (name_line, name) = lines.next().ok_or_else(|| ManifestError::InvalidFormat {
                line: count_line,
                message: format!("expected {count} classifiers for '{reads}'"),
            })?;

            let format = registry
                .get(name)
                .ok_or_else(|| ManifestError::UnsupportedClassifier {
                    name: name.to_string(),
                    line: name_line,
                    known: registry.names().join(", "),
                })?;

            let (_, path) = lines.next().ok_or_else(|| ManifestError::InvalidFormat {
                line: name_line,
                message: format!("missing output path for classifier '{name}'"),
            })?;

            classifiers.push(ClassifierInput {
                name: name.to_string(),
                format: format.clone(),
                path: PathBuf::from(path),
            });
        }

        read_sets.push(ReadSet {
            reads: PathBuf::from(reads),
            classifiers,
        });
    }

    if read_sets.is_empty() {
        return Err(ManifestError::Empty);
    }

    Ok(read_sets)
}
