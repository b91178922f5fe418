//! Cassette segmentation and vectorization
//!
//! Takes the per domain-set annotated tables produced by cas-annotate, splits
//! them into candidate CRISPR-Cas cassettes and turns each cassette into a
//! fixed-width bitscore vector over the domain-set's feature vocabulary.

use cas_annotate::{lib_cas_annotate, AnnotatedTables};
use config::{
    set_artifact, write_collection, CasError, CasVocabulary, SegmentParams, SequenceType,
    CASSETTES,
};
use rayon::prelude::*;

use std::path::Path;

pub mod cli;
pub mod core;
pub mod vector;

pub use crate::core::{build_cassettes, is_valid_cassette, Cassette, CassetteTable};
pub use vector::{cassette_vector, vectorize, CassetteVector, FeatureMatrix, Normalize};

pub fn lib_cas_cassette(
    args: cli::Args,
    vocab: &CasVocabulary,
) -> Result<Vec<CassetteTable>, CasError> {
    let params = args.params();
    let mode = args.annotate.sequence_type;
    let outdir = args.annotate.save_dir().cloned();

    let tables = lib_cas_annotate(args.annotate, vocab)?;
    segment_tables(tables, mode, &params, vocab, outdir.as_deref())
}

/// segment every annotated table [sets run in parallel, output keeps set order]
pub fn segment_tables(
    tables: AnnotatedTables,
    mode: SequenceType,
    params: &SegmentParams,
    vocab: &CasVocabulary,
    outdir: Option<&Path>,
) -> Result<Vec<CassetteTable>, CasError> {
    tables
        .into_par_iter()
        .map(|(set, table)| {
            log::info!("Building cassettes for {}...", set);
            let cassettes = CassetteTable {
                cassettes: build_cassettes(&table, mode, params, vocab),
                domain_set: set,
            };

            if let Some(outdir) = outdir {
                write_collection(
                    &cassettes.lines(),
                    Some(&CassetteTable::header()),
                    set_artifact(outdir, &cassettes.domain_set, CASSETTES),
                )?;
            }

            Ok(cassettes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_annotate::{ProteinRecord, ProteinTable};

    #[test]
    fn test_segment_tables_keeps_order_and_writes() {
        let dir = tempfile::tempdir().unwrap();

        let annotated = |labels: &[&str]| {
            labels
                .iter()
                .enumerate()
                .map(|(i, l)| {
                    let start = 1 + i as u64 * 1000;
                    let mut r =
                        ProteinRecord::with_coords(format!("p{}", i), start, start + 800, -1);
                    if *l != config::UNKNOWN {
                        r.annotation = l.to_string();
                        r.bitscore = 25.0;
                    }
                    r
                })
                .collect::<ProteinTable>()
        };

        let tables = vec![
            ("HMM1".to_string(), annotated(&["cas1", "cas2", "cas4"])),
            (
                "HMM2".to_string(),
                annotated(&["cas1", "cas3", config::UNKNOWN, config::UNKNOWN, config::UNKNOWN]),
            ),
        ];

        let out = segment_tables(
            tables,
            SequenceType::Nucleotide,
            &SegmentParams::default(),
            &CasVocabulary::default(),
            Some(dir.path()),
        )
        .unwrap();

        assert_eq!(out[0].domain_set, "HMM1");
        assert!(out[0].is_empty());
        assert_eq!(out[1].len(), 1);

        let written = std::fs::read_to_string(dir.path().join("HMM2_cassettes.tsv")).unwrap();
        assert_eq!(written.lines().count(), 3);
        assert!(dir.path().join("HMM1_cassettes.tsv").exists());
    }
}
