use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod fns;
pub mod vocab;

pub use error::*;
pub use fns::*;
pub use vocab::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// numeric values
pub const NO_HIT: f64 = -1.0;
pub const MAX_N_MISS: usize = 2;
pub const MAX_GAP: usize = 2;
pub const MIN_PROTEINS: usize = 2;
pub const MAX_NT_DIFF: i64 = 500;
pub const MIN_HIT_FIELDS: usize = 6;
pub const BITSCORE_FIELD: usize = 5;
pub const NT_HEADER_FIELDS: usize = 5;

// labels
pub const UNKNOWN: &str = "unknown";
pub const HMM_SETS: [&str; 5] = ["HMM1", "HMM2", "HMM3", "HMM4", "HMM5"];
pub const DEFAULT_HMM_SET: &str = "HMM3";

// file names
pub const HIT_EXTENSION: &str = "tab";
pub const ANNOTATED_PROTEINS: &str = "annotated_proteins.tsv";
pub const CASSETTES: &str = "cassettes.tsv";
pub const CASSETTE_ARRAYS: &str = "cassette_arrays.txt";
pub const IMPUTATIONS: &str = "imputations.tsv";
pub const PREDICTIONS: &str = "castools_predictions.tsv";
pub const FEATURES_ARTIFACT: &str = "features.json";
pub const SCALER_ARTIFACT: &str = "scaler.json";
pub const ENCODER_ARTIFACT: &str = "encoder.json";
pub const FASTA_EXTENSIONS: [&str; 5] = ["fa", "fasta", "faa", "fna", "gz"];

/// input flavour of the FASTA handed to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceType {
    Protein,
    Nucleotide,
}

impl FromStr for SequenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "protein" => Ok(SequenceType::Protein),
            "dna" | "nucleotide" => Ok(SequenceType::Nucleotide),
            _ => Err(format!(
                "ERROR: {} is not a valid sequence type, must be one of (dna, protein)",
                s
            )),
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceType::Protein => write!(f, "protein"),
            SequenceType::Nucleotide => write!(f, "dna"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Classification,
    Regression,
    Mixed,
}

impl RunMode {
    pub fn imputes(&self) -> bool {
        matches!(self, RunMode::Regression | RunMode::Mixed)
    }

    pub fn classifies(&self) -> bool {
        matches!(self, RunMode::Classification | RunMode::Mixed)
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classification" => Ok(RunMode::Classification),
            "regression" => Ok(RunMode::Regression),
            "mixed" => Ok(RunMode::Mixed),
            _ => Err(format!(
                "ERROR: {} is not a valid run mode, must be one of (classification, regression, mixed)",
                s
            )),
        }
    }
}

/// model families shipped as pretrained artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    Cart,
    Ert,
    Svm,
}

impl ModelKind {
    pub fn classifier_name(&self) -> &'static str {
        match self {
            ModelKind::Cart => "DecisionTreeClassifier",
            ModelKind::Ert => "ExtraTreesClassifier",
            ModelKind::Svm => "SVC",
        }
    }

    pub fn regressor_name(&self) -> &'static str {
        match self {
            ModelKind::Cart => "DecisionTreeRegressor",
            ModelKind::Ert => "ExtraTreesRegressor",
            ModelKind::Svm => "SVR",
        }
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CART" => Ok(ModelKind::Cart),
            "ERT" => Ok(ModelKind::Ert),
            "SVM" => Ok(ModelKind::Svm),
            _ => Err(format!(
                "ERROR: {} is not a valid model, must be one of (CART, ERT, SVM)",
                s
            )),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Cart => write!(f, "CART"),
            ModelKind::Ert => write!(f, "ERT"),
            ModelKind::Svm => write!(f, "SVM"),
        }
    }
}

/// thresholds driving the cassette scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    pub max_gap: usize,
    pub min_core_proteins: usize,
    pub max_nt_distance: i64,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            max_gap: MAX_GAP,
            min_core_proteins: MIN_PROTEINS,
            max_nt_distance: MAX_NT_DIFF,
        }
    }
}

/// check a domain-set name against the shipped HMM sets
pub fn parse_hmm_set(s: &str) -> Result<String, String> {
    if HMM_SETS.contains(&s) {
        Ok(s.to_string())
    } else {
        Err(format!(
            "ERROR: {} is not a valid HMM set, must be one of {:?}",
            s, HMM_SETS
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enums() {
        assert_eq!("dna".parse::<SequenceType>(), Ok(SequenceType::Nucleotide));
        assert_eq!(
            "nucleotide".parse::<SequenceType>(),
            Ok(SequenceType::Nucleotide)
        );
        assert_eq!("Protein".parse::<SequenceType>(), Ok(SequenceType::Protein));
        assert!("rna".parse::<SequenceType>().is_err());

        assert_eq!("ert".parse::<ModelKind>(), Ok(ModelKind::Ert));
        assert_eq!("SVM".parse::<ModelKind>(), Ok(ModelKind::Svm));
        assert!("knn".parse::<ModelKind>().is_err());

        assert_eq!("mixed".parse::<RunMode>(), Ok(RunMode::Mixed));
        assert!(RunMode::Mixed.imputes() && RunMode::Mixed.classifies());
        assert!(!RunMode::Classification.imputes());
        assert!(!RunMode::Regression.classifies());
    }

    #[test]
    fn test_model_names() {
        assert_eq!(ModelKind::Cart.classifier_name(), "DecisionTreeClassifier");
        assert_eq!(ModelKind::Ert.regressor_name(), "ExtraTreesRegressor");
        assert_eq!(ModelKind::Svm.to_string(), "SVM");
    }

    #[test]
    fn test_parse_hmm_set() {
        assert_eq!(parse_hmm_set("HMM3"), Ok("HMM3".to_string()));
        assert!(parse_hmm_set("HMM6").is_err());
    }
}
