use clap::{ArgAction, Parser};
use config::{ArgCheck, ModelKind, RunMode, PREDICTIONS};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[command(flatten)]
    pub cassette: cas_cassette::cli::Args,

    #[arg(
        short = 'c',
        long = "classifiers",
        value_name = "MODELS",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "ERT",
        help = "Classifiers (CART, ERT, SVM) delimited by comma"
    )]
    pub classifiers: Vec<ModelKind>,

    #[arg(
        short = 'r',
        long = "regressors",
        value_name = "MODELS",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "ERT",
        help = "Regressors (CART, ERT, SVM) delimited by comma"
    )]
    pub regressors: Vec<ModelKind>,

    #[arg(
        short = 'p',
        long = "class-probabilities",
        help = "Flag to report every class with its probability",
        value_name = "FLAG",
        default_missing_value("true"),
        default_value("false"),
        num_args(0..=1),
        require_equals(true),
        action = ArgAction::Set,
    )]
    pub probability: bool,

    #[arg(
        short = 'm',
        long = "mode",
        value_name = "MODE",
        default_value = "classification",
        help = "Run mode (classification, regression or mixed)"
    )]
    pub mode: RunMode,

    #[arg(
        long = "models-dir",
        value_name = "DIR",
        default_value = "trained_models",
        help = "Directory with the exported feature, scaler, encoder and model artifacts"
    )]
    pub models_dir: PathBuf,

    #[arg(
        short = 'o',
        long = "output-file",
        value_name = "PATH",
        default_value = PREDICTIONS,
        help = "Where to store the prediction table"
    )]
    pub output: PathBuf,

    #[arg(
        short = 't',
        long = "threads",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get()
    )]
    pub threads: usize,
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }

    pub fn classifiers(&self) -> Vec<ModelKind> {
        let mut kinds = self.classifiers.clone();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    pub fn regressors(&self) -> Vec<ModelKind> {
        let mut kinds = self.regressors.clone();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

impl ArgCheck for Args {
    fn get_fasta(&self) -> &PathBuf {
        self.cassette.get_fasta()
    }

    fn get_hit_dir(&self) -> &PathBuf {
        self.cassette.get_hit_dir()
    }

    fn get_hmm_sets(&self) -> &Vec<String> {
        self.cassette.get_hmm_sets()
    }

    fn get_models_dir(&self) -> Option<&PathBuf> {
        Some(&self.models_dir)
    }
}
