//! Missing-score imputation and cassette classification
//!
//! A cassette with unannotated proteins leaves zeros in its vector. For each
//! zero slot a per-feature regressor estimates the bitscore the slot would
//! have had from the remaining slots; the strongest `n_miss` estimates are
//! written back when positive. Classification then maps every non-empty
//! vector to a subtype label, or to the ranked class probabilities.

use cas_cassette::FeatureMatrix;
use config::{CasError, ModelKind, Notice, MAX_N_MISS};
use log::{debug, info};

use std::fmt;

use crate::registry::PredictorRegistry;

pub const PREDICTION_HEADER: &str =
    "domain_set\tcassette_id\tclassifier\tregressor\tpredicted_label";
pub const IMPUTATION_HEADER: &str =
    "domain_set\tcassette_id\tregressor\tfeature\trank\tn_miss\tvalue\twritten";

#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Label(String),
    Ranked(Vec<(String, f64)>),
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Label(label) => write!(f, "{}", label),
            Prediction::Ranked(ranked) => {
                let ranked = ranked
                    .iter()
                    .map(|(label, p)| format!("{} ({:.3})", label, p))
                    .collect::<Vec<_>>();
                write!(f, "{}", ranked.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub domain_set: String,
    pub cassette_id: usize,
    pub classifier: ModelKind,
    pub regressor: Option<ModelKind>,
    pub prediction: Prediction,
}

impl PredictionRecord {
    pub fn fmt(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.domain_set,
            self.cassette_id,
            self.classifier,
            self.regressor
                .map_or_else(|| "-".to_string(), |r| r.to_string()),
            self.prediction
        )
    }
}

/// one ranked regressor estimate for a zero slot
#[derive(Debug, Clone, PartialEq)]
pub struct ImputedScore {
    pub domain_set: String,
    pub cassette_id: usize,
    pub regressor: ModelKind,
    pub feature: String,
    pub rank: usize,
    pub n_miss: usize,
    pub value: f64,
    pub written: bool,
}

impl ImputedScore {
    pub fn fmt(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.3}\t{}",
            self.domain_set,
            self.cassette_id,
            self.regressor,
            self.feature,
            self.rank,
            self.n_miss,
            self.value,
            self.written
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Imputation {
    pub matrix: FeatureMatrix,
    pub imputations: Vec<ImputedScore>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub records: Vec<PredictionRecord>,
    pub notices: Vec<Notice>,
}

/// Fills the zero slots of every vector with regressor estimates
///
/// # Arguments
///
/// * `matrix` - normalized vectors of one domain-set
/// * `kind` - regressor family
/// * `registry` - source of the per-feature regressors
///
/// # Returns
///
/// * `Result<Imputation, CasError>` - imputed matrix without empty cassettes,
///   every ranked estimate taken and the notices raised
pub fn predict_missings(
    matrix: &FeatureMatrix,
    kind: ModelKind,
    registry: &dyn PredictorRegistry,
) -> Result<Imputation, CasError> {
    let set = matrix.domain_set.as_str();
    let mut rows = Vec::with_capacity(matrix.rows.len());
    let mut imputations = Vec::new();
    let mut notices = Vec::new();

    for row in matrix.rows.iter() {
        if row.is_all_zero() {
            notices.push(
                Notice::EmptyCassette {
                    set: set.to_string(),
                    cassette: row.cassette_id,
                }
                .raise(),
            );
            continue;
        }

        if row.n_miss > MAX_N_MISS {
            notices.push(
                Notice::LowConfidence {
                    set: set.to_string(),
                    cassette: row.cassette_id,
                    n_miss: row.n_miss,
                }
                .raise(),
            );
        }

        let mut filled = row.clone();
        if row.n_miss == 0 {
            debug!("No unlabeled proteins for cassette #{} and {}", row.cassette_id, set);
            rows.push(filled);
            continue;
        }

        let mut candidates = Vec::new();
        for j in row.zero_slots() {
            let feature = &matrix.features[j];
            let regressor = registry.regressor(set, kind, feature)?;

            let mut reduced = row.values.clone();
            reduced.remove(j);
            candidates.push((j, feature, regressor.predict(&reduced)));
        }

        // stable: equal estimates keep slot order
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let take = row.n_miss.min(candidates.len());
        for (rank, (j, feature, value)) in candidates.into_iter().take(take).enumerate() {
            let written = value > 0.0;
            if written {
                filled.values[j] = value;
            }

            info!(
                "{} missing bit-score prediction for cassette #{}, {} and {} ({}/{}): {:.3}",
                kind,
                row.cassette_id,
                set,
                feature,
                rank + 1,
                row.n_miss,
                value
            );

            imputations.push(ImputedScore {
                domain_set: set.to_string(),
                cassette_id: row.cassette_id,
                regressor: kind,
                feature: feature.clone(),
                rank: rank + 1,
                n_miss: row.n_miss,
                value,
                written,
            });
        }

        rows.push(filled);
    }

    Ok(Imputation {
        matrix: FeatureMatrix {
            domain_set: matrix.domain_set.clone(),
            features: matrix.features.clone(),
            rows,
        },
        imputations,
        notices,
    })
}

/// Predicts a subtype for every non-empty cassette with every classifier
///
/// `regressor` names the imputation the matrix went through, if any; without
/// one, vectors with more than `MAX_N_MISS` unknown proteins raise a
/// low-confidence notice.
pub fn classify(
    matrix: &FeatureMatrix,
    classifiers: &[ModelKind],
    regressor: Option<ModelKind>,
    probability: bool,
    registry: &dyn PredictorRegistry,
) -> Result<Classification, CasError> {
    let set = matrix.domain_set.as_str();
    let mut result = Classification::default();

    if matrix.rows.is_empty() {
        return Ok(result);
    }

    let decoder = registry.decoder(set)?;
    let models = classifiers
        .iter()
        .map(|kind| Ok((*kind, registry.classifier(set, *kind)?)))
        .collect::<Result<Vec<_>, CasError>>()?;

    let decode = |idx: usize| {
        decoder
            .decode(idx)
            .map(|label| label.to_string())
            .ok_or_else(|| CasError::ArtifactMissing {
                set: set.to_string(),
                role: format!("label for class index {}", idx),
            })
    };

    for row in matrix.rows.iter() {
        if row.is_all_zero() {
            result.notices.push(
                Notice::EmptyCassette {
                    set: set.to_string(),
                    cassette: row.cassette_id,
                }
                .raise(),
            );
            continue;
        }

        if regressor.is_none() && row.n_miss > MAX_N_MISS {
            result.notices.push(
                Notice::LowConfidence {
                    set: set.to_string(),
                    cassette: row.cassette_id,
                    n_miss: row.n_miss,
                }
                .raise(),
            );
        }

        for (kind, model) in models.iter() {
            let prediction = if probability {
                let mut ranked = model
                    .predict_proba(&row.values)
                    .into_iter()
                    .enumerate()
                    .filter(|(_, p)| *p > 0.0)
                    .map(|(idx, p)| Ok((decode(idx)?, p)))
                    .collect::<Result<Vec<_>, CasError>>()?;

                ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
                Prediction::Ranked(ranked)
            } else {
                Prediction::Label(decode(model.predict(&row.values))?)
            };

            info!("Cassette #{} -- {} ({}): {}", row.cassette_id, kind, set, prediction);

            result.records.push(PredictionRecord {
                domain_set: set.to_string(),
                cassette_id: row.cassette_id,
                classifier: *kind,
                regressor,
                prediction,
            });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classifier, Regressor};
    use crate::registry::MemoryRegistry;
    use cas_cassette::CassetteVector;
    use std::sync::Arc;

    struct Fixed(f64);
    impl Regressor for Fixed {
        fn predict(&self, _x: &[f64]) -> f64 {
            self.0
        }
    }

    struct Width(usize);
    impl Regressor for Width {
        fn predict(&self, x: &[f64]) -> f64 {
            assert_eq!(x.len(), self.0);
            1.0
        }
    }

    struct Proba(Vec<f64>);
    impl Classifier for Proba {
        fn predict(&self, _x: &[f64]) -> usize {
            0
        }

        fn predict_proba(&self, _x: &[f64]) -> Vec<f64> {
            self.0.clone()
        }
    }

    fn matrix(rows: Vec<(usize, Vec<f64>, usize)>) -> FeatureMatrix {
        FeatureMatrix {
            domain_set: "HMM3".into(),
            features: Arc::new(
                ["cas1", "cas2", "cas3", "cas9"]
                    .iter()
                    .map(|f| f.to_string())
                    .collect(),
            ),
            rows: rows
                .into_iter()
                .map(|(cassette_id, values, n_miss)| CassetteVector {
                    cassette_id,
                    values,
                    n_miss,
                })
                .collect(),
        }
    }

    #[test]
    fn test_only_positive_estimates_are_written() {
        let mut registry = MemoryRegistry::new();
        registry
            .with_regressor("HMM3", ModelKind::Ert, "cas2", Arc::new(Fixed(1.2)))
            .with_regressor("HMM3", ModelKind::Ert, "cas9", Arc::new(Fixed(-0.5)));

        let input = matrix(vec![(1, vec![5.0, 0.0, 3.0, 0.0], 2)]);
        let out = predict_missings(&input, ModelKind::Ert, &registry).unwrap();

        assert_eq!(out.matrix.rows[0].values, vec![5.0, 1.2, 3.0, 0.0]);
        assert_eq!(out.imputations.len(), 2);
        let first = &out.imputations[0];
        assert_eq!((first.feature.as_str(), first.rank, first.written), ("cas2", 1, true));
        let second = &out.imputations[1];
        assert_eq!((second.feature.as_str(), second.rank, second.written), ("cas9", 2, false));
        assert!(out.notices.is_empty());
    }

    #[test]
    fn test_nan_estimate_is_ranked_but_never_written() {
        let mut registry = MemoryRegistry::new();
        registry
            .with_regressor("HMM3", ModelKind::Svm, "cas2", Arc::new(Fixed(f64::NAN)))
            .with_regressor("HMM3", ModelKind::Svm, "cas3", Arc::new(Fixed(3.0)));

        let input = matrix(vec![(2, vec![5.0, 0.0, 0.0, 1.0], 2)]);
        let out = predict_missings(&input, ModelKind::Svm, &registry).unwrap();

        assert_eq!(out.matrix.rows[0].values, vec![5.0, 0.0, 3.0, 1.0]);
        assert_eq!(out.imputations.len(), 2);
        assert!(!out.imputations[0].written);
        assert_eq!(out.imputations[1].feature, "cas3");
        assert!(out.imputations[1].written);
    }

    #[test]
    fn test_imputation_takes_at_most_n_miss() {
        let mut registry = MemoryRegistry::new();
        registry
            .with_regressor("HMM3", ModelKind::Cart, "cas1", Arc::new(Fixed(2.0)))
            .with_regressor("HMM3", ModelKind::Cart, "cas2", Arc::new(Fixed(9.0)))
            .with_regressor("HMM3", ModelKind::Cart, "cas9", Arc::new(Width(3)));

        let input = matrix(vec![
            (4, vec![0.0, 0.0, 7.0, 0.0], 1),
            (5, vec![1.0, 2.0, 3.0, 4.0], 0),
        ]);
        let out = predict_missings(&input, ModelKind::Cart, &registry).unwrap();

        assert_eq!(out.matrix.rows[0].values, vec![0.0, 9.0, 7.0, 0.0]);
        assert_eq!(out.matrix.rows[0].cassette_id, 4);
        assert_eq!(out.matrix.rows[1].values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.imputations.len(), 1);
    }

    #[test]
    fn test_imputation_notices() {
        let registry = MemoryRegistry::new();

        let input = matrix(vec![(1, vec![0.0; 4], 3), (2, vec![1.0, 1.0, 1.0, 1.0], 3)]);
        let out = predict_missings(&input, ModelKind::Svm, &registry).unwrap();

        assert_eq!(
            out.notices,
            vec![
                Notice::EmptyCassette { set: "HMM3".into(), cassette: 1 },
                Notice::LowConfidence { set: "HMM3".into(), cassette: 2, n_miss: 3 },
            ]
        );
        assert_eq!(out.matrix.rows.len(), 1);
        assert_eq!(out.matrix.rows[0].cassette_id, 2);
    }

    #[test]
    fn test_missing_regressor_is_an_error() {
        let registry = MemoryRegistry::new();
        let input = matrix(vec![(1, vec![1.0, 0.0, 1.0, 1.0], 1)]);

        let err = predict_missings(&input, ModelKind::Ert, &registry).unwrap_err();
        assert!(err.is_set_local());
    }

    #[test]
    fn test_probabilities_are_ranked() {
        let mut registry = MemoryRegistry::new();
        registry
            .with_classes("HMM3", &["B", "C", "A"])
            .with_classifier("HMM3", ModelKind::Ert, Arc::new(Proba(vec![0.3, 0.0, 0.7])));

        let input = matrix(vec![(1, vec![1.0, 0.0, 0.0, 0.0], 0)]);
        let out = classify(&input, &[ModelKind::Ert], None, true, &registry).unwrap();

        assert_eq!(out.records.len(), 1);
        assert_eq!(
            out.records[0].prediction,
            Prediction::Ranked(vec![("A".to_string(), 0.7), ("B".to_string(), 0.3)])
        );
        assert_eq!(out.records[0].fmt(), "HMM3\t1\tERT\t-\tA (0.700), B (0.300)");
    }

    #[test]
    fn test_empty_cassette_is_not_classified() {
        let mut registry = MemoryRegistry::new();
        registry
            .with_classes("HMM3", &["I-E", "II-A"])
            .with_classifier("HMM3", ModelKind::Ert, Arc::new(Proba(vec![1.0, 0.0])))
            .with_classifier("HMM3", ModelKind::Cart, Arc::new(Proba(vec![1.0, 0.0])));

        let input = matrix(vec![(1, vec![0.0; 4], 0), (2, vec![0.0, 3.0, 0.0, 0.0], 4)]);
        let out = classify(
            &input,
            &[ModelKind::Cart, ModelKind::Ert],
            None,
            false,
            &registry,
        )
        .unwrap();

        assert!(out.records.iter().all(|r| r.cassette_id == 2));
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].prediction, Prediction::Label("I-E".into()));
        assert_eq!(
            out.notices,
            vec![
                Notice::EmptyCassette { set: "HMM3".into(), cassette: 1 },
                Notice::LowConfidence { set: "HMM3".into(), cassette: 2, n_miss: 4 },
            ]
        );

        // after imputation the missing count no longer lowers confidence
        let out =
            classify(&input, &[ModelKind::Ert], Some(ModelKind::Svm), false, &registry).unwrap();
        assert_eq!(out.notices.len(), 1);
        assert_eq!(out.records[0].fmt(), "HMM3\t2\tERT\tSVM\tI-E");
    }
}
