//! FASTA loading (spec §3 "Reference"), generalised from the teacher's
//! `read_fasta` into a fallible loader that returns a [`Reference`].

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use log::info;

use crate::alphabet::is_valid_reference_byte;
use crate::error::GencallError;
use crate::reference::Reference;

/// Reads a (possibly multi-record) FASTA file into one concatenated,
/// upper-cased [`Reference`]. Header lines (`>...`) are dropped; record
/// boundaries are not preserved, matching the teacher's single-genome
/// assumption.
pub fn read_fasta(path: impl AsRef<Path>) -> Result<Reference, GencallError> {
    let path = path.as_ref();
    info!("loading reference FASTA from {}", path.display());

    let file = File::open(path).map_err(|source| GencallError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = io::BufReader::new(file);

    let mut saw_header = false;
    let mut bases = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| GencallError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if line.starts_with('>') {
            saw_header = true;
            continue;
        }
        bases.extend(line.trim_end().bytes().map(|b| b.to_ascii_uppercase()));
    }

    if !saw_header {
        return Err(GencallError::MalformedFasta {
            path: path.to_path_buf(),
        });
    }

    if let Some(offset) = bases.iter().position(|&b| !is_valid_reference_byte(b)) {
        return Err(GencallError::InvalidReferenceBase {
            path: path.to_path_buf(),
            offset,
            byte: bases[offset],
        });
    }

    info!("loaded {} bases ({})", bases.len(), preview(&bases));
    Ok(Reference::new(bases))
}

fn preview(bases: &[u8]) -> String {
    let head = &bases[..bases.len().min(30)];
    format!("{}...", String::from_utf8_lossy(head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_multi_line_multi_record_fasta() {
        let mut file = tempfile_with_contents(">chr1\nacgt\nACGT\n>chr2\nNNNN\n");
        let reference = read_fasta(file.path()).unwrap();
        assert_eq!(reference.bases(), b"ACGTACGTNNNN");
        file.flush().unwrap();
    }

    #[test]
    fn missing_header_is_malformed() {
        let file = tempfile_with_contents("ACGT\n");
        let err = read_fasta(file.path()).unwrap_err();
        assert!(matches!(err, GencallError::MalformedFasta { .. }));
    }

    #[test]
    fn rejects_bytes_outside_the_reference_alphabet() {
        let file = tempfile_with_contents(">chr1\nACGTZCGT\n");
        let err = read_fasta(file.path()).unwrap_err();
        assert!(matches!(
            err,
            GencallError::InvalidReferenceBase { offset: 4, byte: b'Z', .. }
        ));
    }

    fn tempfile_with_contents(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
}
