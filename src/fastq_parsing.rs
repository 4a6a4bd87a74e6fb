//! FASTQ loading (spec §3 "Read"), generalised from the teacher's
//! sequence-only `read_fastq` into a paired-end reader that also carries
//! base qualities.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::error::GencallError;

/// One FASTQ record: header discarded, `'+'` separator discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub bases: Vec<u8>,
    pub qualities: Vec<u8>,
}

/// One paired-end read: mate 1 and mate 2, read in lockstep from two
/// FASTQ files (spec §3 "Read pair").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub end1: FastqRecord,
    pub end2: FastqRecord,
}

/// Reads both mate files and zips them into [`ReadPair`]s, failing if
/// either file is malformed or the two have different record counts
/// (spec §4.6 "Input contract").
pub fn read_fastq_pairs(
    mate1_path: impl AsRef<Path>,
    mate2_path: impl AsRef<Path>,
) -> Result<Vec<ReadPair>, GencallError> {
    let mate1 = read_fastq_records(mate1_path.as_ref())?;
    let mate2 = read_fastq_records(mate2_path.as_ref())?;

    if mate1.len() != mate2.len() {
        return Err(GencallError::MismatchedMates {
            left: mate1.len(),
            right: mate2.len(),
        });
    }

    Ok(mate1
        .into_iter()
        .zip(mate2)
        .map(|(end1, end2)| ReadPair { end1, end2 })
        .collect())
}

/// Reads one FASTQ file into records. Each record occupies exactly four
/// lines: header, bases, `'+'`-line, qualities.
pub fn read_fastq_records(path: &Path) -> Result<Vec<FastqRecord>, GencallError> {
    let file = File::open(path).map_err(|source| GencallError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = io::BufReader::new(file);

    let lines: Vec<String> = reader
        .lines()
        .collect::<Result<_, _>>()
        .map_err(|source| GencallError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut records = Vec::with_capacity(lines.len() / 4);
    let mut chunks = lines.chunks_exact(4);
    for (chunk_index, chunk) in chunks.by_ref().enumerate() {
        let [header, bases, separator, qualities] = chunk else {
            unreachable!("chunks_exact(4) always yields 4 elements")
        };
        let line = chunk_index * 4 + 1;
        if !header.starts_with('@') || !separator.starts_with('+') {
            return Err(GencallError::MalformedFastq {
                path: path.to_path_buf(),
                line,
            });
        }
        let bases: Vec<u8> = bases.bytes().map(|b| b.to_ascii_uppercase()).collect();
        let qualities = qualities.as_bytes().to_vec();
        if bases.len() != qualities.len() {
            return Err(GencallError::MalformedFastq {
                path: path.to_path_buf(),
                line,
            });
        }
        records.push(FastqRecord { bases, qualities });
    }

    if !chunks.remainder().is_empty() {
        return Err(GencallError::MalformedFastq {
            path: path.to_path_buf(),
            line: lines.len(),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fastq(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_paired_records() {
        let mate1 = write_fastq("@r1\nACGT\n+\nIIII\n");
        let mate2 = write_fastq("@r1\nTGCA\n+\nIIII\n");
        let pairs = read_fastq_pairs(mate1.path(), mate2.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].end1.bases, b"ACGT");
        assert_eq!(pairs[0].end2.bases, b"TGCA");
    }

    #[test]
    fn mismatched_mate_counts_is_an_error() {
        let mate1 = write_fastq("@r1\nACGT\n+\nIIII\n@r2\nACGT\n+\nIIII\n");
        let mate2 = write_fastq("@r1\nTGCA\n+\nIIII\n");
        let err = read_fastq_pairs(mate1.path(), mate2.path()).unwrap_err();
        assert!(matches!(err, GencallError::MismatchedMates { left: 2, right: 1 }));
    }

    #[test]
    fn length_mismatch_within_a_record_is_malformed() {
        let mate1 = write_fastq("@r1\nACGT\n+\nII\n");
        let err = read_fastq_records(mate1.path()).unwrap_err();
        assert!(matches!(err, GencallError::MalformedFastq { .. }));
    }
}
