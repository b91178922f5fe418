//! Protein table construction and domain-hit aggregation
//!
//! The first half of the castools pipeline. A FASTA of proteins (either given
//! directly or produced by a gene caller from nucleotide input) becomes an
//! ordered table of protein records, and every requested HMM set's hmmsearch
//! output is merged onto its own copy of that table, keeping only the
//! strongest positive hit per protein.

use config::{
    open_reader, set_artifact, write_collection, CasError, CasVocabulary, Notice, SequenceType,
    ANNOTATED_PROTEINS, HIT_EXTENSION,
};
use log::{debug, info};
use rayon::prelude::*;

use std::io::BufRead;
use std::path::{Path, PathBuf};

pub mod cli;
pub mod record;
pub use record::{DomainHit, Header, ProteinRecord, ProteinTable, TABLE_HEADER};

/// per domain-set annotated tables, in sorted domain-set order
pub type AnnotatedTables = Vec<(String, ProteinTable)>;

pub fn lib_cas_annotate(
    args: cli::Args,
    vocab: &CasVocabulary,
) -> Result<AnnotatedTables, CasError> {
    let (table, _) = build_table(&args.fasta, args.sequence_type)?;

    if let Some(outdir) = args.save_dir() {
        std::fs::create_dir_all(outdir)?;
    }

    annotate_proteins(
        &table,
        &args.hmmsearch_dir,
        &args.sets(),
        args.sequence_type,
        vocab,
        args.save_dir().map(|p| p.as_path()),
    )
}

/// one record per distinct header identifier, in first-seen order
pub fn build_table<P: AsRef<Path>>(
    fasta: P,
    mode: SequenceType,
) -> Result<(ProteinTable, Vec<Notice>), CasError> {
    info!("Reading proteins from {}...", fasta.as_ref().display());

    let reader = open_reader(&fasta)?;
    let mut table = ProteinTable::new();
    let mut notices = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.starts_with('>') {
            continue;
        }

        let header = Header::parse(&line, mode)
            .map_err(|e| CasError::input_format(fasta.as_ref(), idx + 1, e))?;
        let id = header.id.clone();

        if !table.insert(header.into_record()) {
            notices.push(Notice::DuplicateId { id }.raise());
        }
    }

    info!("Proteins in table: {}", table.len());
    Ok((table, notices))
}

/// annotate a copy of the table for every domain-set [sets run in parallel]
pub fn annotate_proteins<P: AsRef<Path> + Sync>(
    table: &ProteinTable,
    hmmsearch_dir: P,
    sets: &[String],
    mode: SequenceType,
    vocab: &CasVocabulary,
    outdir: Option<&Path>,
) -> Result<AnnotatedTables, CasError> {
    sets.par_iter()
        .map(|set| {
            let annotated = add_bitscores(
                hmmsearch_dir.as_ref().join(set),
                table.clone(),
                mode,
                vocab,
            )?;

            if let Some(outdir) = outdir {
                write_collection(
                    &annotated.lines(),
                    Some(TABLE_HEADER),
                    set_artifact(outdir, set, ANNOTATED_PROTEINS),
                )?;
            }

            Ok((set.clone(), annotated))
        })
        .collect()
}

/// merge every recognised hit table under `hit_dir` onto `table`
pub fn add_bitscores<P: AsRef<Path>>(
    hit_dir: P,
    mut table: ProteinTable,
    mode: SequenceType,
    vocab: &CasVocabulary,
) -> Result<ProteinTable, CasError> {
    let mut updates = 0;

    for path in hit_files(hit_dir.as_ref())? {
        let fname = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or_default();

        let label = match vocab.label_from_file(fname) {
            Some(label) => label,
            None => {
                debug!("Skipping {:?}: not a recognised Cas family", path);
                continue;
            }
        };

        let reader = open_reader(&path)?;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            let hit = DomainHit::parse(&line, &label, mode)
                .map_err(|e| CasError::input_format(&path, idx + 1, e))?;

            let record = table
                .get_mut(&hit.protein_id)
                .ok_or_else(|| CasError::Lookup {
                    id: hit.protein_id.clone(),
                    path: path.clone(),
                })?;

            if record.offer(&hit) {
                updates += 1;
            }
        }
    }

    info!(
        "Annotated {} proteins from {} ({} score updates)",
        table.records().iter().filter(|r| r.is_annotated()).count(),
        hit_dir.as_ref().display(),
        updates
    );

    Ok(table)
}

/// *.tab files in a directory, sorted by file name
fn hit_files(dir: &Path) -> Result<Vec<PathBuf>, CasError> {
    let mut files = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == HIT_EXTENSION))
        .collect::<Vec<_>>();

    files.sort();
    Ok(files)
}
