//! Cas protein vocabularies: family synonyms, the core gene set and the
//! pattern used to recognise a domain name from a hit-table file name.

use hashbrown::{HashMap, HashSet};
use regex::Regex;

/// historical family names collapsed onto a canonical Cas label [keys are lower-case]
pub const CAS_SYNONYMS: [(&str, &str); 45] = [
    ("csa1", "cas4"),
    ("csa4", "cas8"),
    ("csx9", "cas8"),
    ("csh1", "cas8"),
    ("csd1", "cas8"),
    ("csp2", "cas8"),
    ("gsu0054", "cas5"),
    ("csc3", "cas10"),
    ("csc2", "cas7"),
    ("csc1", "cas5"),
    ("cse1", "cas8"),
    ("cse3", "cas6"),
    ("cse4", "cas7"),
    ("casb", "cse2"),
    ("casc", "cas7"),
    ("casd", "cas5"),
    ("case", "cas6"),
    ("csy1", "cas8"),
    ("csy2", "cas5"),
    ("csy3", "cas7"),
    ("csy4", "cas6"),
    ("cst1", "cas8"),
    ("cst2", "cas7"),
    ("cst5t", "cas5"),
    ("csn1", "cas9"),
    ("csf4", "DinG"),
    ("csf2", "cas7"),
    ("csf3", "cas5"),
    ("c2c2", "cas13"),
    ("cpf1", "cas12"),
    ("c2c1", "cas12"),
    ("c2c3", "cas12"),
    ("casy", "cas12"),
    ("casx", "cas12"),
    ("c2c6", "cas13"),
    ("c2c7", "cas13"),
    ("csx10", "cas5"),
    // csm/cmr proteins are kept as is except for these backbone members
    ("csm3", "cas7"),
    ("csm4", "cas5"),
    ("csm5", "cas7"),
    ("cmr1", "cas7"),
    ("cmr6", "cas7"),
    ("cmr4", "cas7"),
    ("cmr3", "cas5"),
    // spelling only
    ("ding", "DinG"),
];

/// families that on their own are enough evidence of a real cassette
pub const CORE_GENES: [&str; 37] = [
    "cas3", "cas5", "cas7", "cas8", "cas9", "cas10", "csn2", "cas12", "cpf1", "casx", "c2c1",
    "c2c3", "casy", "cas13", "c2c2", "c2c6", "c2c7", "csc2", "csc1", "cse1", "cse2", "cas11",
    "csy1", "csy2", "csy3", "csf5", "csf1", "csf3", "csm2", "csm3", "csm4", "csm5", "cmr1",
    "cmr3", "cmr4", "cmr5", "cmr6",
];

pub const CAS_PATTERN: &str = r"(?i)^(?:(?:cas|csa|csb|csc|cse|csy|csf|csm|csx|all|cmr|csn|cpf|c2c|csh|csd|csp|cst)(?:\d+|[bcdexyr])|ding|gsu0054|cst5t)$";

/// read-only vocabularies, built once and shared by reference
#[derive(Debug, Clone)]
pub struct CasVocabulary {
    synonyms: HashMap<&'static str, &'static str>,
    core: HashSet<String>,
    pattern: Regex,
}

impl Default for CasVocabulary {
    fn default() -> Self {
        let synonyms = CAS_SYNONYMS.iter().copied().collect::<HashMap<_, _>>();
        let core = CORE_GENES.iter().map(|g| g.to_lowercase()).collect();
        let pattern = Regex::new(CAS_PATTERN).expect("ERROR: invalid Cas pattern");

        Self {
            synonyms,
            core,
            pattern,
        }
    }
}

impl CasVocabulary {
    /// canonical label for a raw family name, None if the name is not a Cas family
    pub fn canonical(&self, raw: &str) -> Option<String> {
        let name = raw.trim().to_lowercase();
        if !self.pattern.is_match(&name) {
            return None;
        }

        match self.synonyms.get(name.as_str()) {
            Some(label) => Some((*label).to_string()),
            None => Some(name),
        }
    }

    /// domain label from a hit-table file name [text before the first '_' or '.']
    pub fn label_from_file(&self, fname: &str) -> Option<String> {
        let stem = fname.split(['_', '.']).next().unwrap_or_default();
        self.canonical(stem)
    }

    pub fn is_core(&self, label: &str) -> bool {
        self.core.contains(&label.to_lowercase())
    }

    pub fn synonyms(&self) -> impl Iterator<Item = (&&'static str, &&'static str)> {
        self.synonyms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_keys_are_unique() {
        let keys = CAS_SYNONYMS
            .iter()
            .map(|(k, _)| k.to_lowercase())
            .collect::<HashSet<_>>();

        // no family name maps to two different labels
        assert_eq!(keys.len(), CAS_SYNONYMS.len());
    }

    #[test]
    fn test_every_synonym_is_recognised() {
        let vocab = CasVocabulary::default();
        for (key, _) in vocab.synonyms() {
            assert!(vocab.canonical(key).is_some(), "{} not recognised", key);
        }
    }

    #[test]
    fn test_canonical_labels() {
        let vocab = CasVocabulary::default();

        assert_eq!(vocab.canonical("csn1"), Some("cas9".to_string()));
        assert_eq!(vocab.canonical("Cas1"), Some("cas1".to_string()));
        assert_eq!(vocab.canonical("casB"), Some("cse2".to_string()));
        assert_eq!(vocab.canonical("GSU0054"), Some("cas5".to_string()));
        assert_eq!(vocab.canonical("DinG"), Some("DinG".to_string()));
        assert_eq!(vocab.canonical("csf4"), Some("DinG".to_string()));
        assert_eq!(vocab.canonical("tnpA"), None);
        assert_eq!(vocab.canonical("cas"), None);
    }

    #[test]
    fn test_label_from_file() {
        let vocab = CasVocabulary::default();

        assert_eq!(
            vocab.label_from_file("cpf1_Type_V.tab"),
            Some("cas12".to_string())
        );
        assert_eq!(vocab.label_from_file("cas2.tab"), Some("cas2".to_string()));
        assert_eq!(vocab.label_from_file("README.tab"), None);
    }

    #[test]
    fn test_core_membership() {
        let vocab = CasVocabulary::default();

        assert!(vocab.is_core("cas9"));
        assert!(vocab.is_core("casX"));
        assert!(!vocab.is_core("cas1"));
        assert!(!vocab.is_core("DinG"));
    }
}
