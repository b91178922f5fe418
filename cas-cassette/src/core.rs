//! Cassette segmentation
//!
//! Gene-called proteins arrive in genomic order. The scan walks them once and
//! groups runs of annotated proteins, tolerating a few unannotated proteins in
//! between, into candidate operons. A candidate is closed by the first record
//! that can no longer extend it, trimmed of trailing unknowns and kept only if
//! it carries at least two distinct Cas families, one of them a core gene.
//!
//! Protein input has no coordinates, so every protein is one cassette.

use cas_annotate::{ProteinRecord, ProteinTable, TABLE_HEADER};
use config::{CasVocabulary, SegmentParams, SequenceType};
use hashbrown::HashSet;
use log::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct Cassette {
    pub id: usize,
    pub members: Vec<ProteinRecord>,
}

impl Cassette {
    /// unannotated members
    pub fn n_miss(&self) -> usize {
        self.members.iter().filter(|r| !r.is_annotated()).count()
    }

    /// distinct annotated labels
    pub fn labels(&self) -> HashSet<&str> {
        self.members
            .iter()
            .filter(|r| r.is_annotated())
            .map(|r| r.annotation.as_str())
            .collect()
    }
}

/// accepted cassettes of one domain-set, ids 1..=n in discovery order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CassetteTable {
    pub domain_set: String,
    pub cassettes: Vec<Cassette>,
}

impl CassetteTable {
    pub fn len(&self) -> usize {
        self.cassettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cassettes.is_empty()
    }

    pub fn header() -> String {
        format!("cassette_id\t{}", TABLE_HEADER)
    }

    /// member rows prefixed by their cassette id
    pub fn lines(&self) -> Vec<String> {
        self.cassettes
            .iter()
            .flat_map(|c| c.members.iter().map(move |r| format!("{}\t{}", c.id, r.fmt())))
            .collect()
    }
}

#[derive(Debug, PartialEq)]
enum ScanState {
    Idle,
    Accumulating {
        members: Vec<ProteinRecord>,
        gap: usize,
        cas_count: usize,
    },
}

impl ScanState {
    /// advance the scan by one record, handing back a closed candidate if any
    fn step(
        self,
        record: ProteinRecord,
        nt_diff: i64,
        params: &SegmentParams,
    ) -> (ScanState, Option<Vec<ProteinRecord>>) {
        let near = nt_diff <= params.max_nt_distance;

        match self {
            ScanState::Idle if record.is_annotated() => (
                ScanState::Accumulating {
                    members: vec![record],
                    gap: 0,
                    cas_count: 1,
                },
                None,
            ),
            ScanState::Idle => (ScanState::Idle, None),
            ScanState::Accumulating {
                mut members,
                gap,
                cas_count,
            } => {
                if record.is_annotated() && near && gap <= params.max_gap {
                    members.push(record);
                    (
                        ScanState::Accumulating {
                            members,
                            gap: 0,
                            cas_count: cas_count + 1,
                        },
                        None,
                    )
                } else if !record.is_annotated() && near && gap < params.max_gap {
                    members.push(record);
                    (
                        ScanState::Accumulating {
                            members,
                            gap: gap + 1,
                            cas_count,
                        },
                        None,
                    )
                } else if cas_count >= params.min_core_proteins {
                    // closing record is consumed, never seeds the next candidate
                    (ScanState::Idle, Some(trim_unknown_tail(members)))
                } else {
                    (ScanState::Idle, None)
                }
            }
        }
    }
}

#[inline(always)]
fn trim_unknown_tail(mut members: Vec<ProteinRecord>) -> Vec<ProteinRecord> {
    while members.last().map_or(false, |r| !r.is_annotated()) {
        members.pop();
    }
    members
}

#[inline(always)]
fn signed_distance(prev_end: Option<u64>, start: Option<u64>) -> i64 {
    match (prev_end, start) {
        (Some(end), Some(start)) => start as i64 - end as i64,
        _ => 0,
    }
}

/// at least two distinct families and one core gene among them
pub fn is_valid_cassette(members: &[ProteinRecord], vocab: &CasVocabulary) -> bool {
    let labels = members
        .iter()
        .filter(|r| r.is_annotated())
        .map(|r| r.annotation.as_str())
        .collect::<HashSet<_>>();

    labels.len() > 1 && labels.iter().any(|l| vocab.is_core(l))
}

/// Groups an annotated protein table into cassettes
///
/// # Arguments
///
/// * `table` - annotated proteins in genomic order
/// * `mode` - input sequence type
/// * `params` - gap, core-count and distance thresholds
/// * `vocab` - core gene vocabulary
///
/// # Returns
///
/// * `Vec<Cassette>` - accepted cassettes with contiguous 1-based ids
///
/// # Example
///
/// ```rust, no_run
/// use cas_annotate::build_table;
/// use cas_cassette::build_cassettes;
/// use config::{CasVocabulary, SegmentParams, SequenceType};
///
/// let vocab = CasVocabulary::default();
/// let (table, _) = build_table("genes.faa", SequenceType::Nucleotide).unwrap();
/// let params = SegmentParams::default();
/// let cassettes = build_cassettes(&table, SequenceType::Nucleotide, &params, &vocab);
/// ```
pub fn build_cassettes(
    table: &ProteinTable,
    mode: SequenceType,
    params: &SegmentParams,
    vocab: &CasVocabulary,
) -> Vec<Cassette> {
    if mode == SequenceType::Protein {
        if table.is_empty() {
            return Vec::new();
        }

        return vec![Cassette {
            id: 1,
            members: table.records().to_vec(),
        }];
    }

    let mut cassettes = Vec::new();
    let mut state = ScanState::Idle;
    let mut prev_end = None;

    for record in table.records() {
        let nt_diff = signed_distance(prev_end, record.start);
        prev_end = record.end;

        let (next, closed) = state.step(record.clone(), nt_diff, params);
        state = next;

        if let Some(members) = closed {
            if is_valid_cassette(&members, vocab) {
                cassettes.push(Cassette {
                    id: cassettes.len() + 1,
                    members,
                });
            } else {
                debug!(
                    "Discarding candidate of {} proteins: not enough Cas evidence",
                    members.len()
                );
            }
        }
    }

    // INFO: a candidate still open here is dropped; only a record that fails
    // to extend it can close it
    if let ScanState::Accumulating { members, .. } = state {
        debug!("Dropping open candidate of {} proteins at end of input", members.len());
    }

    info!("Cassettes found: {}", cassettes.len());
    cassettes
}
