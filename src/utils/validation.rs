//! Centralized validation and helper functions.

use std::path::Path;

use crate::core::lineage::TaxonId;

/// Output files append a suffix to the prefix, keep room for it
pub const MAX_PREFIX_LENGTH: usize = 200;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cannot derive an output prefix from '{0}'")]
    InvalidPrefix(String),
    #[error("Output prefix too long: exceeds {MAX_PREFIX_LENGTH} characters")]
    PrefixTooLong,
}

/// Normalize a read name so classifier outputs and reads files agree.
///
/// Keeps the first whitespace-delimited token, drops leading FASTA/FASTQ
/// markers (`>`, `@`) and cuts a trailing mate suffix such as `/1`.
///
/// # Examples
///
/// ```
/// use metatax::utils::validation::normalize_read_name;
///
/// assert_eq!(normalize_read_name("@read_7/1 length=150"), "read_7");
/// assert_eq!(normalize_read_name(">read_7"), "read_7");
/// ```
#[must_use]
pub fn normalize_read_name(raw: &str) -> String {
    let token = raw.split_whitespace().next().unwrap_or_default();
    let token = token.trim_start_matches(['@', '>']);
    let token = token.split('/').next().unwrap_or_default();
    token.to_string()
}

/// Parse a taxon id field from classifier output.
///
/// Accepts a bare id (`562`) and the `name (taxid 562)` form written by
/// Kraken 2 with `--use-names`.
#[must_use]
pub fn parse_taxon_id(field: &str) -> Option<TaxonId> {
    let field = field.trim();
    if let Ok(id) = field.parse::<u32>() {
        return Some(TaxonId(id));
    }

    let start = field.rfind("(taxid ")? + "(taxid ".len();
    let end = field[start..].find(')')? + start;
    field[start..end].trim().parse().ok().map(TaxonId)
}

/// Derive the output file prefix for a reads file: its file name without
/// directories, kept as written.
///
/// # Errors
///
/// Returns `ValidationError::InvalidPrefix` if the path has no usable file
/// name (empty, only dots, or containing a path separator), or
/// `ValidationError::PrefixTooLong` if the name exceeds [`MAX_PREFIX_LENGTH`].
pub fn output_prefix(reads_path: &Path) -> Result<String, ValidationError> {
    let name = reads_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if name.is_empty() || name.chars().all(|c| c == '.') || name.contains(['/', '\\']) {
        return Err(ValidationError::InvalidPrefix(
            reads_path.display().to_string(),
        ));
    }

    if name.len() > MAX_PREFIX_LENGTH {
        return Err(ValidationError::PrefixTooLong);
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_read_name() {
        assert_eq!(normalize_read_name("read1"), "read1");
        assert_eq!(normalize_read_name("  read1  extra"), "read1");
        assert_eq!(normalize_read_name("@read1/2"), "read1");
        assert_eq!(normalize_read_name(">>read1"), "read1");
        assert_eq!(normalize_read_name(""), "");
    }

    #[test]
    fn test_parse_taxon_id() {
        assert_eq!(parse_taxon_id("562"), Some(TaxonId(562)));
        assert_eq!(parse_taxon_id(" 0 "), Some(TaxonId(0)));
        assert_eq!(
            parse_taxon_id("Escherichia coli (taxid 562)"),
            Some(TaxonId(562))
        );
        assert_eq!(parse_taxon_id("unclassified (taxid 0)"), Some(TaxonId(0)));
        assert_eq!(parse_taxon_id("NA"), None);
        assert_eq!(parse_taxon_id("-1"), None);
        assert_eq!(parse_taxon_id(""), None);
    }

    #[test]
    fn test_output_prefix() {
        assert_eq!(
            output_prefix(&PathBuf::from("/data/run1/sample_A.fastq")).unwrap(),
            "sample_A.fastq"
        );
        assert_eq!(
            output_prefix(&PathBuf::from("/data/reads with space.fa")).unwrap(),
            "reads with space.fa"
        );
        assert_eq!(
            output_prefix(&PathBuf::from("run#2(b).fq.gz")).unwrap(),
            "run#2(b).fq.gz"
        );
        assert!(output_prefix(&PathBuf::from("/")).is_err());
        assert!(output_prefix(&PathBuf::from("")).is_err());
        assert!(output_prefix(&PathBuf::from("data/..")).is_err());
        if cfg!(unix) {
            assert!(output_prefix(&PathBuf::from("dir\\reads.fq")).is_err());
        }

        let long = "a".repeat(MAX_PREFIX_LENGTH + 1);
        assert_eq!(
            output_prefix(&PathBuf::from(long)),
            Err(ValidationError::PrefixTooLong)
        );
    }
}
