use std::path::PathBuf;

use thiserror::Error;

/// Configuration-time failures: anything that should stop the process
/// before the pipeline starts, with no partial output written.
#[derive(Debug, Error)]
pub enum GencallError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: malformed FASTA (no header line found before sequence data)")]
    MalformedFasta { path: PathBuf },

    #[error("{path}: invalid reference base {byte:?} at offset {offset} (expected A, C, G, T or N)")]
    InvalidReferenceBase { path: PathBuf, offset: usize, byte: u8 },

    #[error("{path}:{line}: malformed FASTQ record")]
    MalformedFastq { path: PathBuf, line: usize },

    #[error("{path}:{line}: malformed variant catalogue record: {reason}")]
    MalformedCatalogue {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("read mate files have differing record counts ({left} vs {right})")]
    MismatchedMates { left: usize, right: usize },

    #[error("index serialization failed: {0}")]
    Codec(#[from] bincode::error::EncodeError),

    #[error("index deserialization failed: {0}")]
    Decodec(#[from] bincode::error::DecodeError),
}
