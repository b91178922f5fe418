use config::{SequenceType, BITSCORE_FIELD, MIN_HIT_FIELDS, NO_HIT, NT_HEADER_FIELDS, UNKNOWN};
use hashbrown::HashMap;

pub const TABLE_HEADER: &str = "protein_id\tstart\tend\tstrand\tbitscore\tannotation";

#[derive(Debug, PartialEq, Clone)]
pub struct ProteinRecord {
    pub id: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub strand: Option<i8>,
    pub bitscore: f64,
    pub annotation: String,
}

impl ProteinRecord {
    pub fn new(id: String) -> Self {
        Self {
            id,
            start: None,
            end: None,
            strand: None,
            bitscore: NO_HIT,
            annotation: UNKNOWN.to_string(),
        }
    }

    pub fn with_coords(id: String, start: u64, end: u64, strand: i8) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            strand: Some(strand),
            ..Self::new(id)
        }
    }

    #[inline(always)]
    pub fn is_annotated(&self) -> bool {
        self.annotation != UNKNOWN
    }

    /// keep the hit only if it beats the stored score and zero
    #[inline(always)]
    pub fn offer(&mut self, hit: &DomainHit) -> bool {
        if hit.bitscore > 0.0 && hit.bitscore > self.bitscore {
            self.bitscore = hit.bitscore;
            self.annotation = hit.label.clone();
            return true;
        }

        false
    }

    pub fn fmt(&self) -> String {
        let show = |v: Option<String>| v.unwrap_or_else(|| String::from("."));

        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            show(self.start.map(|s| s.to_string())),
            show(self.end.map(|e| e.to_string())),
            show(self.strand.map(|s| s.to_string())),
            self.bitscore,
            self.annotation
        )
    }
}

/// ordered protein table; row order is first appearance in the FASTA
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ProteinTable {
    records: Vec<ProteinRecord>,
    index: HashMap<String, usize>,
}

impl ProteinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// returns false when the id is already present [first occurrence wins]
    pub fn insert(&mut self, record: ProteinRecord) -> bool {
        if self.index.contains_key(&record.id) {
            return false;
        }

        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ProteinRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ProteinRecord> {
        match self.index.get(id) {
            Some(&i) => self.records.get_mut(i),
            None => None,
        }
    }

    pub fn records(&self) -> &[ProteinRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        self.records.iter().map(|r| r.fmt()).collect()
    }
}

impl FromIterator<ProteinRecord> for ProteinTable {
    fn from_iter<I: IntoIterator<Item = ProteinRecord>>(iter: I) -> Self {
        let mut table = ProteinTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

/// a single hmmsearch --tblout row, already labelled with its domain
#[derive(Debug, PartialEq, Clone)]
pub struct DomainHit {
    pub protein_id: String,
    pub bitscore: f64,
    pub label: String,
}

impl DomainHit {
    pub fn parse(line: &str, label: &str, mode: SequenceType) -> Result<Self, String> {
        let fields = line.split_whitespace().collect::<Vec<_>>();
        if fields.len() < MIN_HIT_FIELDS {
            return Err(format!(
                "expected at least {} columns, found {}",
                MIN_HIT_FIELDS,
                fields.len()
            ));
        }

        let bitscore = fields[BITSCORE_FIELD]
            .parse::<f64>()
            .map_err(|_| format!("cannot parse bitscore {:?}", fields[BITSCORE_FIELD]))?;

        let mut protein_id = fields[0].to_string();
        if mode == SequenceType::Nucleotide {
            let last = fields.last().ok_or("cannot read last column")?;
            protein_id.push('_');
            protein_id.push_str(first_meta_field(last));
        }

        Ok(Self {
            protein_id,
            bitscore,
            label: label.to_string(),
        })
    }
}

/// identifier [and coordinates for gene-called input] from a FASTA header
#[derive(Debug, PartialEq, Clone)]
pub struct Header {
    pub id: String,
    pub coords: Option<(u64, u64, i8)>,
}

impl Header {
    pub fn parse(line: &str, mode: SequenceType) -> Result<Self, String> {
        let line = line.trim().trim_start_matches('>');

        match mode {
            SequenceType::Protein => {
                let id = line
                    .split_whitespace()
                    .next()
                    .ok_or("header has no identifier")?;

                Ok(Self {
                    id: id.to_string(),
                    coords: None,
                })
            }
            SequenceType::Nucleotide => {
                let fields = line.split('#').collect::<Vec<_>>();
                if fields.len() != NT_HEADER_FIELDS {
                    return Err(format!(
                        "expected '{{id}} # {{start}} # {{end}} # {{strand}} # {{metadata}}', found {} fields",
                        fields.len()
                    ));
                }

                let get = |field: &str, name: &str| {
                    field
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| format!("cannot parse {} {:?}", name, field.trim()))
                };

                let source = fields[0].trim();
                if source.is_empty() {
                    return Err("header has no identifier".to_string());
                }

                let (start, end) = (get(fields[1], "start")?, get(fields[2], "end")?);
                let strand = match fields[3].trim() {
                    "1" | "+1" => 1,
                    "-1" => -1,
                    other => return Err(format!("strand must be 1 or -1, found {:?}", other)),
                };

                Ok(Self {
                    id: format!("{}_{}", source, first_meta_field(fields[4])),
                    coords: Some((start, end, strand)),
                })
            }
        }
    }

    pub fn into_record(self) -> ProteinRecord {
        match self.coords {
            Some((start, end, strand)) => {
                ProteinRecord::with_coords(self.id, start, end, strand)
            }
            None => ProteinRecord::new(self.id),
        }
    }
}

/// first ';' field of a gene-caller metadata column [e.g. ID=1_1;partial=00 -> ID=1_1]
#[inline(always)]
pub fn first_meta_field(meta: &str) -> &str {
    meta.trim().split(';').next().unwrap_or_default().trim()
}
