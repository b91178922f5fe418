//! Fitted model artifacts
//!
//! Normalizers, estimators and label decoders exported from the training
//! side as JSON. Only evaluation lives here: trees are walked from the root,
//! forests average their trees and linear models score each class row.

use cas_cassette::Normalize;
use serde::{Deserialize, Serialize};

/// per-feature scaling fitted on the training vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalizer {
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    MinMax { min: Vec<f64>, scale: Vec<f64> },
    MaxAbs { scale: Vec<f64> },
    Identity,
}

#[inline(always)]
fn nonzero(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

impl Normalizer {
    pub fn width(&self) -> Option<usize> {
        match self {
            Normalizer::Standard { scale, .. }
            | Normalizer::MinMax { scale, .. }
            | Normalizer::MaxAbs { scale } => Some(scale.len()),
            Normalizer::Identity => None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Normalizer::Standard { mean: a, scale: b } | Normalizer::MinMax { min: a, scale: b }
                if a.len() != b.len() =>
            {
                Err(format!(
                    "normalizer parameters differ in length ({} vs {})",
                    a.len(),
                    b.len()
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn inverse_transform(&self, row: &mut [f64]) {
        match self {
            Normalizer::Standard { mean, scale } => {
                for ((x, m), s) in row.iter_mut().zip(mean).zip(scale) {
                    *x = *x * nonzero(*s) + m;
                }
            }
            Normalizer::MinMax { min, scale } => {
                for ((x, m), s) in row.iter_mut().zip(min).zip(scale) {
                    *x = (*x - m) / nonzero(*s);
                }
            }
            Normalizer::MaxAbs { scale } => {
                for (x, s) in row.iter_mut().zip(scale) {
                    *x *= nonzero(*s);
                }
            }
            Normalizer::Identity => {}
        }
    }
}

impl Normalize for Normalizer {
    fn transform(&self, row: &mut [f64]) {
        match self {
            Normalizer::Standard { mean, scale } => {
                for ((x, m), s) in row.iter_mut().zip(mean).zip(scale) {
                    *x = (*x - m) / nonzero(*s);
                }
            }
            Normalizer::MinMax { min, scale } => {
                for ((x, m), s) in row.iter_mut().zip(min).zip(scale) {
                    *x = *x * s + m;
                }
            }
            Normalizer::MaxAbs { scale } => {
                for (x, s) in row.iter_mut().zip(scale) {
                    *x /= nonzero(*s);
                }
            }
            Normalizer::Identity => {}
        }
    }
}

/// flat array layout of a fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl Tree {
    pub fn validate(&self) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }

        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err("tree arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == -1 {
                if self.value[node].is_empty() {
                    return Err(format!("leaf {} has no value", node));
                }
                continue;
            }

            // children always come after their parent
            let ok = |child: i64| child > node as i64 && (child as usize) < n;
            if !ok(left) || !ok(right) || self.feature[node] < 0 {
                return Err(format!("node {} has invalid children or feature", node));
            }
        }

        Ok(())
    }

    /// value of the leaf reached by `x`
    pub fn leaf(&self, x: &[f64]) -> &[f64] {
        let mut node = 0;

        while self.children_left[node] != -1 {
            let value = x.get(self.feature[node] as usize).copied().unwrap_or(0.0);
            node = if value <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        &self.value[node]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Tree(Tree),
    Forest { trees: Vec<Tree> },
    Linear { coef: Vec<Vec<f64>>, intercept: Vec<f64> },
}

impl Estimator {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Estimator::Tree(tree) => tree.validate(),
            Estimator::Forest { trees } => {
                if trees.is_empty() {
                    return Err("forest has no trees".to_string());
                }
                trees.iter().try_for_each(|t| t.validate())
            }
            Estimator::Linear { coef, intercept } => {
                if coef.is_empty() || coef.len() != intercept.len() {
                    return Err(format!(
                        "linear model has {} coefficient rows and {} intercepts",
                        coef.len(),
                        intercept.len()
                    ));
                }
                Ok(())
            }
        }
    }

    /// coef . x + intercept for every row
    fn decision(coef: &[Vec<f64>], intercept: &[f64], x: &[f64]) -> Vec<f64> {
        coef.iter()
            .zip(intercept)
            .map(|(w, b)| w.iter().zip(x).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

#[inline(always)]
fn normalized(counts: &[f64]) -> Vec<f64> {
    let total = counts.iter().sum::<f64>();
    if total > 0.0 {
        counts.iter().map(|c| c / total).collect()
    } else {
        counts.to_vec()
    }
}

#[inline(always)]
fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, v)| {
            if *v > bv {
                (i, *v)
            } else {
                (bi, bv)
            }
        })
        .0
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp = scores.iter().map(|s| (s - max).exp()).collect::<Vec<_>>();
    let total = exp.iter().sum::<f64>();
    exp.iter().map(|e| e / total).collect()
}

pub trait Classifier: Send + Sync {
    /// encoded class index
    fn predict(&self, x: &[f64]) -> usize;
    /// probability per encoded class
    fn predict_proba(&self, x: &[f64]) -> Vec<f64>;
}

pub trait Regressor: Send + Sync {
    fn predict(&self, x: &[f64]) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierModel(pub Estimator);

impl Classifier for ClassifierModel {
    fn predict(&self, x: &[f64]) -> usize {
        match &self.0 {
            Estimator::Linear { coef, intercept } => {
                let scores = Estimator::decision(coef, intercept, x);
                if scores.len() == 1 {
                    (scores[0] > 0.0) as usize
                } else {
                    argmax(&scores)
                }
            }
            _ => argmax(&self.predict_proba(x)),
        }
    }

    fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        match &self.0 {
            Estimator::Tree(tree) => normalized(tree.leaf(x)),
            Estimator::Forest { trees } => {
                let mut acc: Vec<f64> = Vec::new();
                for tree in trees {
                    let proba = normalized(tree.leaf(x));
                    if acc.len() < proba.len() {
                        acc.resize(proba.len(), 0.0);
                    }
                    acc.iter_mut().zip(proba).for_each(|(a, p)| *a += p);
                }
                acc.iter().map(|a| a / trees.len() as f64).collect()
            }
            Estimator::Linear { coef, intercept } => {
                let scores = Estimator::decision(coef, intercept, x);
                if scores.len() == 1 {
                    let p = 1.0 / (1.0 + (-scores[0]).exp());
                    vec![1.0 - p, p]
                } else {
                    softmax(&scores)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressorModel(pub Estimator);

impl Regressor for RegressorModel {
    fn predict(&self, x: &[f64]) -> f64 {
        let first = |v: &[f64]| v.first().copied().unwrap_or(0.0);

        match &self.0 {
            Estimator::Tree(tree) => first(tree.leaf(x)),
            Estimator::Forest { trees } => {
                trees.iter().map(|t| first(t.leaf(x))).sum::<f64>() / trees.len() as f64
            }
            Estimator::Linear { coef, intercept } => {
                first(Estimator::decision(coef, intercept, x).as_slice())
            }
        }
    }
}

/// encoded class index -> subtype label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDecoder {
    pub classes: Vec<String>,
}

impl LabelDecoder {
    pub fn decode(&self, idx: usize) -> Option<&str> {
        self.classes.get(idx).map(|c| c.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(left: Vec<f64>, right: Vec<f64>) -> Tree {
        // x[1] <= 0.5 ? left : right
        Tree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![1, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![vec![0.0], left, right],
        }
    }

    #[test]
    fn test_normalizer_round_trip() {
        let normalizers = vec![
            Normalizer::Standard {
                mean: vec![10.0, 0.0, 3.0],
                scale: vec![2.0, 0.0, 0.5],
            },
            Normalizer::MinMax {
                min: vec![-0.1, 0.0, 0.2],
                scale: vec![0.01, 0.5, 0.002],
            },
            Normalizer::MaxAbs {
                scale: vec![250.0, 0.0, 12.0],
            },
            Normalizer::Identity,
        ];

        for normalizer in normalizers {
            let original = vec![120.5, 0.0, 33.3];
            let mut row = original.clone();

            normalizer.transform(&mut row);
            normalizer.inverse_transform(&mut row);

            for (a, b) in row.iter().zip(original.iter()) {
                assert!((a - b).abs() < 1e-9, "{:?}: {} != {}", normalizer, a, b);
            }
        }
    }

    #[test]
    fn test_normalizer_json() {
        let normalizer: Normalizer =
            serde_json::from_str(r#"{"kind": "min_max", "min": [0.0, -1.0], "scale": [0.5, 0.1]}"#)
                .unwrap();

        let mut row = vec![4.0, 20.0];
        normalizer.transform(&mut row);

        assert_eq!(row, vec![2.0, 1.0]);
        assert_eq!(normalizer.width(), Some(2));

        let bad = Normalizer::Standard {
            mean: vec![1.0],
            scale: vec![1.0, 2.0],
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_tree_classifier() {
        let clf = ClassifierModel(Estimator::Tree(stump(vec![3.0, 1.0], vec![0.0, 4.0])));

        assert_eq!(clf.predict_proba(&[9.0, 0.2]), vec![0.75, 0.25]);
        assert_eq!(clf.predict(&[9.0, 0.2]), 0);
        assert_eq!(clf.predict(&[0.0, 0.9]), 1);
        // threshold goes left
        assert_eq!(clf.predict(&[0.0, 0.5]), 0);
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = Estimator::Forest {
            trees: vec![
                stump(vec![1.0, 0.0], vec![0.0, 2.0]),
                stump(vec![1.0, 1.0], vec![1.0, 3.0]),
            ],
        };
        assert!(forest.validate().is_ok());

        let proba = ClassifierModel(forest).predict_proba(&[0.0, 1.0]);
        assert!((proba[0] - 0.125).abs() < 1e-12);
        assert!((proba[1] - 0.875).abs() < 1e-12);

        let reg = RegressorModel(Estimator::Forest {
            trees: vec![stump(vec![1.0], vec![5.0]), stump(vec![2.0], vec![7.0])],
        });
        assert_eq!(reg.predict(&[0.0, 0.0]), 1.5);
        assert_eq!(reg.predict(&[0.0, 3.0]), 6.0);
    }

    #[test]
    fn test_linear_models() {
        let binary = ClassifierModel(Estimator::Linear {
            coef: vec![vec![1.0, -1.0]],
            intercept: vec![0.0],
        });
        assert_eq!(binary.predict(&[2.0, 1.0]), 1);
        assert_eq!(binary.predict(&[1.0, 2.0]), 0);
        assert_eq!(binary.predict_proba(&[1.0, 1.0]), vec![0.5, 0.5]);

        let multi = ClassifierModel(Estimator::Linear {
            coef: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]],
            intercept: vec![0.0, 0.0, 0.0],
        });
        let proba = multi.predict_proba(&[0.0, 2.0]);
        assert_eq!(multi.predict(&[0.0, 2.0]), 1);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        let reg = RegressorModel(Estimator::Linear {
            coef: vec![vec![0.5, 2.0]],
            intercept: vec![1.0],
        });
        assert_eq!(reg.predict(&[2.0, 1.0]), 4.0);
    }

    #[test]
    fn test_estimator_json_and_validation() {
        let json = r#"{
            "kind": "tree",
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [1.5, -2.0, -2.0],
            "value": [[0.0], [0.3], [2.4]]
        }"#;

        let estimator: Estimator = serde_json::from_str(json).unwrap();
        assert!(estimator.validate().is_ok());
        assert_eq!(RegressorModel(estimator).predict(&[3.0]), 2.4);

        let cyclic = Tree {
            children_left: vec![0, -1],
            children_right: vec![1, -1],
            feature: vec![0, -2],
            threshold: vec![0.0, 0.0],
            value: vec![vec![0.0], vec![1.0]],
        };
        assert!(cyclic.validate().is_err());
        assert!(Estimator::Forest { trees: vec![] }.validate().is_err());
    }

    #[test]
    fn test_label_decoder() {
        let decoder: LabelDecoder = serde_json::from_str(r#"{"classes": ["I-B", "I-E"]}"#).unwrap();

        assert_eq!(decoder.decode(1), Some("I-E"));
        assert_eq!(decoder.decode(2), None);
    }
}
