use config::{set_artifact, write_collection, CasError, Notice, CASSETTE_ARRAYS};
use hashbrown::HashMap;
use log::info;

use std::path::Path;
use std::sync::Arc;

use crate::core::{Cassette, CassetteTable};

/// per-feature rescaling applied to a whole batch of vectors
pub trait Normalize: Send + Sync {
    fn transform(&self, row: &mut [f64]);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CassetteVector {
    pub cassette_id: usize,
    pub values: Vec<f64>,
    pub n_miss: usize,
}

impl CassetteVector {
    #[inline(always)]
    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn zero_slots(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == 0.0)
            .map(|(j, _)| j)
            .collect()
    }

    pub fn fmt(&self) -> String {
        self.values
            .iter()
            .map(|v| format!("{:.18e}", v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// vectors of one domain-set sharing a feature vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub domain_set: String,
    pub features: Arc<Vec<String>>,
    pub rows: Vec<CassetteVector>,
}

impl FeatureMatrix {
    pub fn header(&self) -> String {
        format!("# {}", self.features.join(" "))
    }

    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.fmt()).collect()
    }

    /// drop all-zero rows, one notice per dropped cassette
    pub fn drop_empty(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        let set = self.domain_set.clone();

        self.rows.retain(|row| {
            if row.is_all_zero() {
                notices.push(
                    Notice::EmptyCassette {
                        set: set.clone(),
                        cassette: row.cassette_id,
                    }
                    .raise(),
                );
                false
            } else {
                true
            }
        });

        notices
    }

    pub fn write<P: AsRef<Path>>(&self, outdir: P) -> Result<(), CasError> {
        write_collection(
            &self.lines(),
            Some(&self.header()),
            set_artifact(outdir, &self.domain_set, CASSETTE_ARRAYS),
        )
    }
}

/// raw bitscore vector of one cassette; slots keep their strongest hit
pub fn cassette_vector(cassette: &Cassette, index: &HashMap<&str, usize>) -> CassetteVector {
    let mut values = vec![0.0_f64; index.len()];

    for record in cassette.members.iter().filter(|r| r.is_annotated()) {
        if let Some(&j) = index.get(record.annotation.as_str()) {
            values[j] = values[j].max(record.bitscore);
        }
    }

    CassetteVector {
        cassette_id: cassette.id,
        values,
        n_miss: cassette.n_miss(),
    }
}

/// Turns the cassettes of one domain-set into normalized feature vectors
///
/// Fails with a `NoCassettes` notice when the table holds nothing to vectorize.
pub fn vectorize(
    table: &CassetteTable,
    features: Arc<Vec<String>>,
    normalizer: &dyn Normalize,
) -> Result<FeatureMatrix, Notice> {
    if table.is_empty() {
        return Err(Notice::NoCassettes {
            set: table.domain_set.clone(),
        }
        .raise());
    }

    let rows = {
        let index = features
            .iter()
            .enumerate()
            .map(|(j, f)| (f.as_str(), j))
            .collect::<HashMap<_, _>>();

        table
            .cassettes
            .iter()
            .map(|c| {
                let mut row = cassette_vector(c, &index);
                normalizer.transform(&mut row.values);
                row
            })
            .collect::<Vec<_>>()
    };

    info!("{}: {} cassette vectors", table.domain_set, rows.len());

    Ok(FeatureMatrix {
        domain_set: table.domain_set.clone(),
        features,
        rows,
    })
}
