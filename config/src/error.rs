use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// fatal conditions for the annotation/prediction pipeline
#[derive(Debug, Error)]
pub enum CasError {
    #[error("ERROR: malformed input in {path:?} (line {line}): {msg}")]
    InputFormat {
        path: PathBuf,
        line: usize,
        msg: String,
    },
    #[error("ERROR: protein {id:?} from {path:?} is not present in the protein table")]
    Lookup { id: String, path: PathBuf },
    #[error("ERROR: missing {role} artifact for {set}")]
    ArtifactMissing { set: String, role: String },
    #[error("ERROR: invalid artifact {path:?}: {msg}")]
    Artifact { path: PathBuf, msg: String },
    #[error("ERROR: invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CasError {
    pub fn input_format<P: Into<PathBuf>, S: Into<String>>(path: P, line: usize, msg: S) -> Self {
        CasError::InputFormat {
            path: path.into(),
            line,
            msg: msg.into(),
        }
    }

    /// true for errors that only invalidate a single domain-set
    pub fn is_set_local(&self) -> bool {
        matches!(
            self,
            CasError::ArtifactMissing { .. } | CasError::Artifact { .. }
        )
    }
}

/// recoverable conditions; logged once when raised and handed back to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    DuplicateId { id: String },
    NoCassettes { set: String },
    EmptyCassette { set: String, cassette: usize },
    LowConfidence {
        set: String,
        cassette: usize,
        n_miss: usize,
    },
}

impl Notice {
    pub fn raise(self) -> Self {
        log::warn!("{}", self);
        self
    }

    pub fn is_empty_cassette(&self) -> bool {
        matches!(self, Notice::EmptyCassette { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DuplicateId { id } => {
                write!(f, "Duplicated protein id {:?}, keeping first occurrence", id)
            }
            Notice::NoCassettes { set } => write!(
                f,
                "Could not find enough hits to build one or more cassettes for {}",
                set
            ),
            Notice::EmptyCassette { set, cassette } => write!(
                f,
                "Cassette #{} is either empty or composed only by unknown proteins for {}, skipping",
                cassette, set
            ),
            Notice::LowConfidence {
                set,
                cassette,
                n_miss,
            } => write!(
                f,
                "Cassette #{} for {} has {} missing proteins (more than {}), predictions will likely be weak",
                cassette,
                set,
                n_miss,
                crate::MAX_N_MISS
            ),
        }
    }
}
