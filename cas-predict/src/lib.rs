//! CRISPR-Cas subtype prediction
//!
//! Runs the whole castools pipeline: proteins are annotated and segmented
//! into cassettes per domain-set (cas-annotate, cas-cassette), cassettes are
//! vectorized with the domain-set's fitted feature vocabulary and scaler, and
//! the vectors go through optional missing-score regression and
//! classification. Domain-sets are independent and run in parallel; their
//! results are merged in domain-set order.

use cas_cassette::{lib_cas_cassette, vectorize, CassetteTable};
use config::{
    get_progress_bar, write_collection, CasError, CasVocabulary, ModelKind, Notice, RunMode,
    IMPUTATIONS,
};
use log::{error, info, warn};
use rayon::prelude::*;

use std::path::Path;

pub mod cli;
pub mod core;
pub mod models;
pub mod registry;

pub use crate::core::{
    classify, predict_missings, Classification, Imputation, ImputedScore, Prediction,
    PredictionRecord, IMPUTATION_HEADER, PREDICTION_HEADER,
};
pub use models::{Classifier, Estimator, LabelDecoder, Normalizer, Regressor, Tree};
pub use registry::{Artifact, ArtifactRole, JsonRegistry, MemoryRegistry, PredictorRegistry};

/// what to run on every domain-set
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub mode: RunMode,
    pub classifiers: Vec<ModelKind>,
    pub regressors: Vec<ModelKind>,
    pub probability: bool,
}

impl From<&cli::Args> for RunConfig {
    fn from(args: &cli::Args) -> Self {
        Self {
            mode: args.mode,
            classifiers: args.classifiers(),
            regressors: args.regressors(),
            probability: args.probability,
        }
    }
}

/// predictions, imputations and notices of one or more domain-sets
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub records: Vec<PredictionRecord>,
    pub imputations: Vec<ImputedScore>,
    pub notices: Vec<Notice>,
}

impl Report {
    fn extend(&mut self, other: Report) {
        self.records.extend(other.records);
        self.imputations.extend(other.imputations);
        self.notices.extend(other.notices);
    }
}

pub fn lib_cas_predict(args: cli::Args, vocab: &CasVocabulary) -> Result<Report, CasError> {
    let config = RunConfig::from(&args);
    let outdir = args.cassette.annotate.save_dir().cloned();
    let output = args.output.clone();
    let registry = JsonRegistry::new(&args.models_dir);

    let tables = lib_cas_cassette(args.cassette, vocab)?;
    let report = predict_tables(tables, &config, &registry, outdir.as_deref())?;

    write_report(&report, &output, outdir.as_deref())?;
    Ok(report)
}

/// Runs vectorization and prediction on every domain-set
///
/// Domain-sets whose artifacts are missing or invalid are logged and skipped;
/// any other error aborts the run.
pub fn predict_tables(
    tables: Vec<CassetteTable>,
    config: &RunConfig,
    registry: &dyn PredictorRegistry,
    outdir: Option<&Path>,
) -> Result<Report, CasError> {
    let pb = get_progress_bar(tables.len() as u64, "Predicting subtypes...");

    let results = tables
        .into_par_iter()
        .map(|table| {
            let set = table.domain_set.clone();
            let result = predict_set(table, config, registry, outdir);
            pb.inc(1);
            (set, result)
        })
        .collect::<Vec<_>>();

    pb.finish_and_clear();

    let mut report = Report::default();
    for (set, result) in results {
        match result {
            Ok(partial) => report.extend(partial),
            Err(e) if e.is_set_local() => {
                error!("{}", e);
                warn!("Skipping {}", set);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

/// vectorize, impute and classify a single domain-set
pub fn predict_set(
    table: CassetteTable,
    config: &RunConfig,
    registry: &dyn PredictorRegistry,
    outdir: Option<&Path>,
) -> Result<Report, CasError> {
    let set = table.domain_set.as_str();
    let mut report = Report::default();

    if table.is_empty() {
        report.notices.push(
            Notice::NoCassettes {
                set: set.to_string(),
            }
            .raise(),
        );
        return Ok(report);
    }

    let features = registry.features(set)?;
    let normalizer = registry.normalizer(set)?;

    if let Some(width) = normalizer.width() {
        if width != features.len() {
            return Err(CasError::Artifact {
                path: ArtifactRole::Normalizer.file_name(set).into(),
                msg: format!(
                    "scaler fitted on {} features, vocabulary has {}",
                    width,
                    features.len()
                ),
            });
        }
    }

    let mut matrix = match vectorize(&table, features, &*normalizer) {
        Ok(matrix) => matrix,
        Err(notice) => {
            report.notices.push(notice);
            return Ok(report);
        }
    };

    if let Some(outdir) = outdir {
        matrix.write(outdir)?;
    }

    // empty cassettes are reported here once, not again by every model
    report.notices.extend(matrix.drop_empty());

    if config.mode.classifies() && !config.mode.imputes() {
        let classification = classify(
            &matrix,
            &config.classifiers,
            None,
            config.probability,
            registry,
        )?;
        report.records.extend(classification.records);
        report.notices.extend(classification.notices);
    }

    if config.mode.imputes() {
        for kind in config.regressors.iter() {
            let imputation = predict_missings(&matrix, *kind, registry)?;
            report.imputations.extend(imputation.imputations);
            report.notices.extend(imputation.notices);

            if config.mode.classifies() {
                let classification = classify(
                    &imputation.matrix,
                    &config.classifiers,
                    Some(*kind),
                    config.probability,
                    registry,
                )?;
                report.records.extend(classification.records);
                report.notices.extend(classification.notices);
            }
        }
    }

    Ok(report)
}

/// write the prediction table and, when regressors ran, the imputation table
pub fn write_report(report: &Report, output: &Path, outdir: Option<&Path>) -> Result<(), CasError> {
    if report.records.is_empty() {
        info!("No predictions were made");
    } else {
        let lines = report.records.iter().map(|r| r.fmt()).collect::<Vec<_>>();
        write_collection(&lines, Some(PREDICTION_HEADER), output)?;
    }

    if let Some(outdir) = outdir {
        if !report.imputations.is_empty() {
            let lines = report.imputations.iter().map(|i| i.fmt()).collect::<Vec<_>>();
            write_collection(&lines, Some(IMPUTATION_HEADER), outdir.join(IMPUTATIONS))?;
        }
    }

    Ok(())
}
