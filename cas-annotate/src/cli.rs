use clap::Parser;
use config::{parse_hmm_set, ArgCheck, SequenceType};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[group(skip)]
pub struct Args {
    #[arg(
        short = 'f',
        long = "fasta",
        required = true,
        value_name = "PATH",
        help = "Path to protein FASTA [gene-called proteins for dna input], .gz accepted"
    )]
    pub fasta: PathBuf,

    #[arg(
        short = 's',
        long = "hmm-sets",
        value_name = "HMM_SETS",
        value_delimiter = ',',
        num_args = 1..,
        default_value = config::DEFAULT_HMM_SET,
        value_parser = parse_hmm_set,
        help = "HMM sets to use (HMM1 to HMM5) delimited by comma"
    )]
    pub hmm_sets: Vec<String>,

    #[arg(
        long = "sequence-type",
        value_name = "TYPE",
        default_value = "protein",
        help = "Sequence type of the original input (dna or protein)"
    )]
    pub sequence_type: SequenceType,

    #[arg(
        long = "hmmsearch-output-dir",
        value_name = "DIR",
        default_value = "hmmsearch_output",
        help = "Directory with one sub-directory of hmmsearch --tblout files per HMM set"
    )]
    pub hmmsearch_dir: PathBuf,

    #[arg(
        long = "cassette-output-dir",
        value_name = "DIR",
        default_value = "cassette",
        help = "Directory where intermediate tables are written"
    )]
    pub outdir: PathBuf,

    #[arg(
        long = "no-save",
        help = "Do not write intermediate tables",
        default_value_t = false
    )]
    pub no_save: bool,
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }

    /// sorted, de-duplicated domain-sets
    pub fn sets(&self) -> Vec<String> {
        let mut sets = self.hmm_sets.clone();
        sets.sort();
        sets.dedup();
        sets
    }

    pub fn save_dir(&self) -> Option<&PathBuf> {
        if self.no_save {
            None
        } else {
            Some(&self.outdir)
        }
    }
}

impl ArgCheck for Args {
    fn get_fasta(&self) -> &PathBuf {
        &self.fasta
    }

    fn get_hit_dir(&self) -> &PathBuf {
        &self.hmmsearch_dir
    }

    fn get_hmm_sets(&self) -> &Vec<String> {
        &self.hmm_sets
    }

    fn get_models_dir(&self) -> Option<&PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::from(
            vec!["-f", "in.faa", "-s", "HMM4,HMM1,HMM4", "--sequence-type", "dna"]
                .into_iter()
                .map(String::from)
                .collect(),
        );

        assert_eq!(args.sets(), vec!["HMM1".to_string(), "HMM4".to_string()]);
        assert_eq!(args.sequence_type, SequenceType::Nucleotide);
        assert_eq!(args.hmmsearch_dir, PathBuf::from("hmmsearch_output"));
        assert_eq!(args.save_dir(), Some(&PathBuf::from("cassette")));
    }

    #[test]
    fn test_rejects_unknown_set() {
        let parsed = Args::try_parse_from(["cas-annotate", "-f", "in.faa", "-s", "HMM9"]);
        assert!(parsed.is_err());
    }
}
