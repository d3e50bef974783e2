//! Read-name extraction from FASTA/FASTQ files using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed files. Files named
//! `.fa`, `.fasta` or `.fna` (optionally `.gz`/`.bgz`) are read as FASTA,
//! anything else as FASTQ.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::{fasta, fastq};

use crate::parsing::classifier::ParseError;
use crate::utils::validation::normalize_read_name;

/// Sequence file flavour of a reads file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadsFormat {
    Fasta,
    Fastq,
}

impl ReadsFormat {
    /// Detect the format from the file name
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let name = path.to_string_lossy().to_lowercase();
        let name = name
            .strip_suffix(".gz")
            .or_else(|| name.strip_suffix(".bgz"))
            .unwrap_or(&name);

        if [".fa", ".fasta", ".fna"].iter().any(|ext| name.ends_with(ext)) {
            Self::Fasta
        } else {
            Self::Fastq
        }
    }
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a text file for buffered reading, decompressing `.gz`/`.bgz`
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened.
pub fn open_text(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Normalised names of every record in a reads file, in file order.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or `ParseError::Noodles`
/// if a record is malformed.
pub fn read_names(path: &Path) -> Result<Vec<String>, ParseError> {
    let reader = open_text(path)?;
    read_names_from(reader, ReadsFormat::from_path(path))
}

/// Normalised record names from an open reader
///
/// # Errors
///
/// Returns `ParseError::Noodles` if a record is malformed.
pub fn read_names_from<R: BufRead>(
    reader: R,
    format: ReadsFormat,
) -> Result<Vec<String>, ParseError> {
    let mut names = Vec::new();

    match format {
        ReadsFormat::Fasta => {
            let mut fasta_reader = fasta::io::Reader::new(reader);
            for result in fasta_reader.records() {
                let record = result.map_err(|e| {
                    ParseError::Noodles(format!("Failed to parse FASTA record: {e}"))
                })?;
                names.push(normalize_read_name(&String::from_utf8_lossy(record.name())));
            }
        }
        ReadsFormat::Fastq => {
            let mut fastq_reader = fastq::io::Reader::new(reader);
            for result in fastq_reader.records() {
                let record = result.map_err(|e| {
                    ParseError::Noodles(format!("Failed to parse FASTQ record: {e}"))
                })?;
                names.push(normalize_read_name(&String::from_utf8_lossy(record.name())));
            }
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    #[test]
    fn test_format_detection() {
        assert_eq!(ReadsFormat::from_path(&PathBuf::from("a.fa")), ReadsFormat::Fasta);
        assert_eq!(ReadsFormat::from_path(&PathBuf::from("a.FASTA")), ReadsFormat::Fasta);
        assert_eq!(ReadsFormat::from_path(&PathBuf::from("a.fna.gz")), ReadsFormat::Fasta);
        assert_eq!(ReadsFormat::from_path(&PathBuf::from("a.fastq")), ReadsFormat::Fastq);
        assert_eq!(ReadsFormat::from_path(&PathBuf::from("a.fq.gz")), ReadsFormat::Fastq);
        assert_eq!(ReadsFormat::from_path(&PathBuf::from("reads")), ReadsFormat::Fastq);
    }

    #[test]
    fn test_fasta_names() {
        let text = ">read1/1 sample=A\nACGT\n>read2\nGG\nTT\n";
        let names = read_names_from(text.as_bytes(), ReadsFormat::Fasta).unwrap();
        assert_eq!(names, vec!["read1", "read2"]);
    }

    #[test]
    fn test_fastq_names() {
        let text = "@read1/1\nACGT\n+\nIIII\n@read2 extra\nGG\n+\nII\n";
        let names = read_names_from(text.as_bytes(), ReadsFormat::Fastq).unwrap();
        assert_eq!(names, vec!["read1", "read2"]);
    }

    #[test]
    fn test_empty_input_has_no_reads() {
        let names = read_names_from(&b""[..], ReadsFormat::Fastq).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_gzipped_fastq_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reads.fastq.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"@r1\nAC\n+\nII\n@r2\nGT\n+\nII\n").unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_names(&path).unwrap(), vec!["r1", "r2"]);
    }

    #[test]
    fn test_missing_reads_file() {
        let result = read_names(Path::new("/nonexistent/reads.fq"));
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}
