//! Predictor registry
//!
//! Every fitted object the pipeline needs for a domain-set is resolved through
//! `PredictorRegistry`, keyed by (domain-set, role). The pipeline never opens
//! model files itself.

use config::{CasError, ModelKind, ENCODER_ARTIFACT, FEATURES_ARTIFACT, SCALER_ARTIFACT};
use dashmap::DashMap;
use hashbrown::HashMap;
use log::debug;
use serde::de::DeserializeOwned;

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::{
    Classifier, ClassifierModel, Estimator, LabelDecoder, Normalizer, Regressor, RegressorModel,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactRole {
    Features,
    Normalizer,
    Regressor { kind: ModelKind, feature: String },
    Classifier { kind: ModelKind },
    LabelDecoder,
}

impl ArtifactRole {
    /// artifact file name inside a models directory
    pub fn file_name(&self, set: &str) -> String {
        match self {
            ArtifactRole::Features => format!("{}_{}", set, FEATURES_ARTIFACT),
            ArtifactRole::Normalizer => format!("{}_{}", set, SCALER_ARTIFACT),
            ArtifactRole::LabelDecoder => format!("{}_{}", set, ENCODER_ARTIFACT),
            ArtifactRole::Classifier { kind } => format!("{}_{}.json", set, kind.classifier_name()),
            ArtifactRole::Regressor { kind, feature } => {
                format!("{}_{}_{}.json", set, kind.regressor_name(), feature)
            }
        }
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRole::Features => write!(f, "feature vocabulary"),
            ArtifactRole::Normalizer => write!(f, "normalizer"),
            ArtifactRole::LabelDecoder => write!(f, "label decoder"),
            ArtifactRole::Classifier { kind } => write!(f, "{} classifier", kind),
            ArtifactRole::Regressor { kind, feature } => {
                write!(f, "{} regressor for {}", kind, feature)
            }
        }
    }
}

#[derive(Clone)]
pub enum Artifact {
    Features(Arc<Vec<String>>),
    Normalizer(Arc<Normalizer>),
    Regressor(Arc<dyn Regressor>),
    Classifier(Arc<dyn Classifier>),
    LabelDecoder(Arc<LabelDecoder>),
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Features(features) => write!(f, "Features({})", features.len()),
            Artifact::Normalizer(normalizer) => write!(f, "Normalizer({:?})", normalizer),
            Artifact::Regressor(_) => write!(f, "Regressor"),
            Artifact::Classifier(_) => write!(f, "Classifier"),
            Artifact::LabelDecoder(decoder) => write!(f, "LabelDecoder({})", decoder.classes.len()),
        }
    }
}

fn wrong_kind(set: &str, role: &ArtifactRole) -> CasError {
    CasError::ArtifactMissing {
        set: set.to_string(),
        role: role.to_string(),
    }
}

/// resolve (domain-set, role) to a callable artifact
pub trait PredictorRegistry: Send + Sync {
    fn resolve(&self, set: &str, role: &ArtifactRole) -> Result<Artifact, CasError>;

    fn features(&self, set: &str) -> Result<Arc<Vec<String>>, CasError> {
        let role = ArtifactRole::Features;
        match self.resolve(set, &role)? {
            Artifact::Features(features) => Ok(features),
            _ => Err(wrong_kind(set, &role)),
        }
    }

    fn normalizer(&self, set: &str) -> Result<Arc<Normalizer>, CasError> {
        let role = ArtifactRole::Normalizer;
        match self.resolve(set, &role)? {
            Artifact::Normalizer(normalizer) => Ok(normalizer),
            _ => Err(wrong_kind(set, &role)),
        }
    }

    fn regressor(
        &self,
        set: &str,
        kind: ModelKind,
        feature: &str,
    ) -> Result<Arc<dyn Regressor>, CasError> {
        let role = ArtifactRole::Regressor {
            kind,
            feature: feature.to_string(),
        };
        match self.resolve(set, &role)? {
            Artifact::Regressor(regressor) => Ok(regressor),
            _ => Err(wrong_kind(set, &role)),
        }
    }

    fn classifier(&self, set: &str, kind: ModelKind) -> Result<Arc<dyn Classifier>, CasError> {
        let role = ArtifactRole::Classifier { kind };
        match self.resolve(set, &role)? {
            Artifact::Classifier(classifier) => Ok(classifier),
            _ => Err(wrong_kind(set, &role)),
        }
    }

    fn decoder(&self, set: &str) -> Result<Arc<LabelDecoder>, CasError> {
        let role = ArtifactRole::LabelDecoder;
        match self.resolve(set, &role)? {
            Artifact::LabelDecoder(decoder) => Ok(decoder),
            _ => Err(wrong_kind(set, &role)),
        }
    }
}

/// JSON artifacts under a models directory, each loaded at most once
pub struct JsonRegistry {
    models_dir: PathBuf,
    cache: DashMap<PathBuf, Artifact>,
}

impl JsonRegistry {
    pub fn new<P: AsRef<Path>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.as_ref().to_path_buf(),
            cache: DashMap::new(),
        }
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Result<T, CasError> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| CasError::Artifact {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })
    }

    fn load(&self, role: &ArtifactRole, path: &Path) -> Result<Artifact, CasError> {
        debug!("Loading {}", path.display());

        let invalid = |msg: String| CasError::Artifact {
            path: path.to_path_buf(),
            msg,
        };

        let artifact = match role {
            ArtifactRole::Features => {
                let features: Vec<String> = Self::read(path)?;
                if features.is_empty() {
                    return Err(invalid("empty feature vocabulary".to_string()));
                }
                Artifact::Features(Arc::new(features))
            }
            ArtifactRole::Normalizer => {
                let normalizer: Normalizer = Self::read(path)?;
                normalizer.validate().map_err(invalid)?;
                Artifact::Normalizer(Arc::new(normalizer))
            }
            ArtifactRole::LabelDecoder => Artifact::LabelDecoder(Arc::new(Self::read(path)?)),
            ArtifactRole::Classifier { .. } => {
                let estimator: Estimator = Self::read(path)?;
                estimator.validate().map_err(invalid)?;
                Artifact::Classifier(Arc::new(ClassifierModel(estimator)))
            }
            ArtifactRole::Regressor { .. } => {
                let estimator: Estimator = Self::read(path)?;
                estimator.validate().map_err(invalid)?;
                Artifact::Regressor(Arc::new(RegressorModel(estimator)))
            }
        };

        Ok(artifact)
    }
}

impl PredictorRegistry for JsonRegistry {
    fn resolve(&self, set: &str, role: &ArtifactRole) -> Result<Artifact, CasError> {
        let path = self.models_dir.join(role.file_name(set));

        if let Some(artifact) = self.cache.get(&path) {
            return Ok(artifact.value().clone());
        }

        if !path.is_file() {
            return Err(CasError::ArtifactMissing {
                set: set.to_string(),
                role: format!("{} ({})", role, path.display()),
            });
        }

        // shard lock held while loading, so concurrent sets parse a file once
        let artifact = self
            .cache
            .entry(path.clone())
            .or_try_insert_with(|| self.load(role, &path))?;

        Ok(artifact.value().clone())
    }
}

/// artifacts held in memory, keyed by (domain-set, role)
#[derive(Default)]
pub struct MemoryRegistry {
    artifacts: HashMap<(String, ArtifactRole), Artifact>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set: &str, role: ArtifactRole, artifact: Artifact) -> &mut Self {
        self.artifacts.insert((set.to_string(), role), artifact);
        self
    }

    pub fn with_features(&mut self, set: &str, features: &[&str]) -> &mut Self {
        let features = features.iter().map(|f| f.to_string()).collect();
        self.insert(set, ArtifactRole::Features, Artifact::Features(Arc::new(features)))
    }

    pub fn with_normalizer(&mut self, set: &str, normalizer: Normalizer) -> &mut Self {
        self.insert(
            set,
            ArtifactRole::Normalizer,
            Artifact::Normalizer(Arc::new(normalizer)),
        )
    }

    pub fn with_classes(&mut self, set: &str, classes: &[&str]) -> &mut Self {
        let decoder = LabelDecoder {
            classes: classes.iter().map(|c| c.to_string()).collect(),
        };
        self.insert(
            set,
            ArtifactRole::LabelDecoder,
            Artifact::LabelDecoder(Arc::new(decoder)),
        )
    }

    pub fn with_classifier(
        &mut self,
        set: &str,
        kind: ModelKind,
        classifier: Arc<dyn Classifier>,
    ) -> &mut Self {
        self.insert(
            set,
            ArtifactRole::Classifier { kind },
            Artifact::Classifier(classifier),
        )
    }

    pub fn with_regressor(
        &mut self,
        set: &str,
        kind: ModelKind,
        feature: &str,
        regressor: Arc<dyn Regressor>,
    ) -> &mut Self {
        self.insert(
            set,
            ArtifactRole::Regressor {
                kind,
                feature: feature.to_string(),
            },
            Artifact::Regressor(regressor),
        )
    }
}

impl PredictorRegistry for MemoryRegistry {
    fn resolve(&self, set: &str, role: &ArtifactRole) -> Result<Artifact, CasError> {
        self.artifacts
            .get(&(set.to_string(), role.clone()))
            .cloned()
            .ok_or_else(|| CasError::ArtifactMissing {
                set: set.to_string(),
                role: role.to_string(),
            })
    }
}
