use anyhow::Result;
use cas_annotate::lib_cas_annotate;
use cas_cassette::lib_cas_cassette;
use cas_predict::lib_cas_predict;
use config::{ArgCheck, CasVocabulary};
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Annotate,
    Cassette,
    Run,
}

/// Parse the arguments of a step and run it in-process
///
/// # Arguments
///
/// * `step` - which part of the pipeline to run
/// * `args` - the step arguments, without the program name
///
/// # Example
///
/// ```rust, no_run
/// use castools::{dispatch, Step};
///
/// let args = vec!["-f".to_string(), "proteins.faa".to_string()];
/// dispatch(Step::Annotate, args).unwrap();
/// ```
pub fn dispatch(step: Step, args: Vec<String>) -> Result<()> {
    let vocab = CasVocabulary::default();

    match step {
        Step::Annotate => {
            let args = cas_annotate::cli::Args::from(args);
            args.check()?;

            for (set, table) in lib_cas_annotate(args, &vocab)? {
                let hits = table.records().iter().filter(|r| r.is_annotated()).count();
                info!("{}: {} of {} proteins annotated", set, hits, table.len());
            }
        }
        Step::Cassette => {
            let args = cas_cassette::cli::Args::from(args);
            args.check()?;

            for table in lib_cas_cassette(args, &vocab)? {
                info!("{}: {} cassettes", table.domain_set, table.len());
            }
        }
        Step::Run => {
            let args = cas_predict::cli::Args::from(args);
            args.check()?;

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(args.threads)
                .build()?;

            let report = pool.install(|| lib_cas_predict(args, &vocab))?;
            info!(
                "Predictions: {}, imputed scores: {}, notices: {}",
                report.records.len(),
                report.imputations.len(),
                report.notices.len()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const GENES: [(&str, u64, u64); 6] = [
        ("c1_1", 1, 900),
        ("c1_2", 1001, 1900),
        ("c1_3", 2001, 2900),
        ("c1_4", 3001, 3900),
        ("c1_5", 4001, 4900),
        ("c1_6", 5001, 5900),
    ];

    fn write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    fn hit(gene: usize, score: f64) -> String {
        let (id, start, end) = GENES[gene];
        format!(
            "{} - family - 1e-20 {} 0.1 1e-20 {} 0.1 1.0 1 1 0 1 1 1 1 # {} # {} # 1 # ID=1_{};partial=00\n",
            id,
            score,
            score,
            start,
            end,
            gene + 1
        )
    }

    /// genes, hit tables and model artifacts for a single HMM3 cassette
    fn fixture(root: &Path) {
        let fasta = GENES
            .iter()
            .enumerate()
            .map(|(i, (id, start, end))| {
                format!(">{} # {} # {} # 1 # ID=1_{};partial=00\nMKVL\n", id, start, end, i + 1)
            })
            .collect::<String>();
        write(&root.join("genes.faa"), &fasta);

        let hits = root.join("hmmsearch").join("HMM3");
        std::fs::create_dir_all(&hits).unwrap();
        write(&hits.join("cas1_I.tab"), &hit(0, 80.0));
        write(&hits.join("csn1_II.tab"), &hit(2, 300.0));
        write(&hits.join("notes.tab"), &hit(1, 999.0));

        let models = root.join("models");
        std::fs::create_dir_all(&models).unwrap();
        write(
            &models.join("HMM3_features.json"),
            r#"["cas1", "cas2", "cas9", "cas4"]"#,
        );
        write(&models.join("HMM3_scaler.json"), r#"{"kind": "identity"}"#);
        write(&models.join("HMM3_encoder.json"), r#"{"classes": ["I-E", "II-A"]}"#);
        write(
            &models.join("HMM3_ExtraTreesClassifier.json"),
            r#"{
                "kind": "forest",
                "trees": [{
                    "children_left": [1, -1, -1],
                    "children_right": [2, -1, -1],
                    "feature": [2, -2, -2],
                    "threshold": [100.0, -2.0, -2.0],
                    "value": [[4.0, 4.0], [4.0, 0.0], [0.0, 4.0]]
                }]
            }"#,
        );
        write(
            &models.join("HMM3_ExtraTreesRegressor_cas2.json"),
            r#"{"kind": "linear", "coef": [[0.0, 0.0, 0.0]], "intercept": [5.0]}"#,
        );
        write(
            &models.join("HMM3_ExtraTreesRegressor_cas4.json"),
            r#"{"kind": "linear", "coef": [[0.0, 0.0, 0.0]], "intercept": [1.5]}"#,
        );
    }

    fn args(root: &Path, extra: &[&str]) -> Vec<String> {
        let path = |p: &str| root.join(p).display().to_string();

        let mut args = vec![
            "-f".to_string(),
            path("genes.faa"),
            "-s".to_string(),
            "HMM3".to_string(),
            "--sequence-type".to_string(),
            "dna".to_string(),
            "--hmmsearch-output-dir".to_string(),
            path("hmmsearch"),
            "--cassette-output-dir".to_string(),
            path("out"),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        args
    }

    #[test]
    fn test_annotate_and_cassette_steps() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        dispatch(Step::Cassette, args(dir.path(), &[])).unwrap();

        let annotated =
            std::fs::read_to_string(dir.path().join("out/HMM3_annotated_proteins.tsv")).unwrap();
        assert!(annotated.contains("c1_3_ID=1_3\t2001\t2900\t1\t300\tcas9"));
        assert!(annotated.contains("c1_2_ID=1_2\t1001\t1900\t1\t-1\tunknown"));

        let cassettes = std::fs::read_to_string(dir.path().join("out/HMM3_cassettes.tsv")).unwrap();
        let ids = cassettes
            .lines()
            .skip(1)
            .map(|l| l.split('\t').nth(1).unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["c1_1_ID=1_1", "c1_2_ID=1_2", "c1_3_ID=1_3"]);
    }

    #[test]
    fn test_full_run_in_mixed_mode() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let output = dir.path().join("out").join("predictions.tsv");
        let output = output.display().to_string();
        let models = dir.path().join("models").display().to_string();

        dispatch(
            Step::Run,
            args(
                dir.path(),
                &["--models-dir", &models, "-m", "mixed", "-o", &output, "-t", "2"],
            ),
        )
        .unwrap();

        let predictions = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            predictions.lines().collect::<Vec<_>>(),
            vec![cas_predict::PREDICTION_HEADER, "HMM3\t1\tERT\tERT\tII-A"]
        );

        let imputations = std::fs::read_to_string(dir.path().join("out/imputations.tsv")).unwrap();
        assert_eq!(
            imputations.lines().nth(1),
            Some("HMM3\t1\tERT\tcas2\t1\t1\t5.000\ttrue")
        );

        let arrays =
            std::fs::read_to_string(dir.path().join("out/HMM3_cassette_arrays.txt")).unwrap();
        assert_eq!(arrays.lines().next(), Some("# cas1 cas2 cas9 cas4"));
    }

    #[test]
    fn test_run_rejects_missing_models_dir() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path());

        let missing = dir.path().join("nowhere").display().to_string();
        let res = dispatch(Step::Run, args(dir.path(), &["--models-dir", &missing]));

        assert!(res.is_err());
    }
}
