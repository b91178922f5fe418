use clap::Parser;
use config::{ArgCheck, SegmentParams, MAX_GAP, MAX_NT_DIFF, MIN_PROTEINS};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[group(skip)]
pub struct Args {
    #[command(flatten)]
    pub annotate: cas_annotate::cli::Args,

    #[arg(
        long = "max-gap",
        value_name = "N",
        default_value_t = MAX_GAP,
        help = "Unannotated proteins tolerated between two Cas proteins"
    )]
    pub max_gap: usize,

    #[arg(
        long = "min-proteins",
        value_name = "N",
        default_value_t = MIN_PROTEINS,
        help = "Annotated proteins needed before a candidate can be closed"
    )]
    pub min_proteins: usize,

    #[arg(
        long = "max-nt-distance",
        value_name = "BP",
        default_value_t = MAX_NT_DIFF,
        allow_negative_numbers = true,
        help = "Largest intergenic distance allowed inside a cassette"
    )]
    pub max_nt_distance: i64,
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }

    pub fn params(&self) -> SegmentParams {
        SegmentParams {
            max_gap: self.max_gap,
            min_core_proteins: self.min_proteins,
            max_nt_distance: self.max_nt_distance,
        }
    }
}

impl ArgCheck for Args {
    fn get_fasta(&self) -> &PathBuf {
        self.annotate.get_fasta()
    }

    fn get_hit_dir(&self) -> &PathBuf {
        self.annotate.get_hit_dir()
    }

    fn get_hmm_sets(&self) -> &Vec<String> {
        self.annotate.get_hmm_sets()
    }

    fn get_models_dir(&self) -> Option<&PathBuf> {
        None
    }
}
