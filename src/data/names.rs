// names.rs - Document, folder and sequence name grammar

use crate::error::{FinalizeError, Result};
use regex::Regex;
use std::collections::BTreeMap;

pub const POLIO_TYPES: [&str; 4] = ["PV1", "PV2", "PV3", "nOPV2"];
pub const NOPV2_TYPE: &str = "nOPV2";
/// Row names under which the nOPV2 reference may appear in an alignment
pub const NOPV2_REFERENCE_NAMES: [&str; 2] = ["nOPV2", "MZ245455"];

const SAMPLE_NAME: &str = r"(\d{10})\s*[-_]\s*([A-Za-z\d]+)";
const SAMPLE_NAME_FOR_CONTROLS: &str =
    r"(.+)\s*[-_]\s*([Cc]ontrol(?:\s*[-_]\s*[Rr]ep\s*)?(?:\s*[-_]\s*\d+)?)";
const DOCUMENT_NAME_END: &str =
    r"\s*[-_]\s*([A-Za-z\d\s()-_]+?)\s*[-_]\s*[Ff]inal [Cc]on(?:tig|sensus)\s*(?:\(reversed\))?$";

const VP1_EXCERPT_PREFIX: &str = "input";

/// Reference genome accession → types it may stand for
pub fn default_reference_types() -> BTreeMap<String, Vec<String>> {
    [
        ("AY184219", vec!["PV1"]),
        ("AY184220", vec!["PV2", "nOPV2"]),
        ("AY184221", vec!["PV3"]),
        ("MZ245455", vec!["nOPV2"]),
        ("nOPV2", vec!["nOPV2"]),
    ]
    .into_iter()
    .map(|(name, types)| (name.to_string(), types.into_iter().map(String::from).collect()))
    .collect()
}

pub fn sample_name(csid: &str, cuid: &str) -> String {
    format!("{}_{}", csid, cuid)
}

pub fn genome_name(sample: &str, genome_type: &str) -> String {
    format!("{} - {}", sample, genome_type)
}

/// `{run}_{csid}_{cuid}_{type}`; the sample name already joins CSID and CUID with `_`
pub fn database_name(run_name: &str, sample: &str, genome_type: &str) -> String {
    format!("{}_{}_{}", run_name, sample, genome_type)
}

pub fn is_polio_type(simplified_type: &str) -> bool {
    POLIO_TYPES.contains(&simplified_type)
}

pub fn is_nopv2(simplified_type: &str) -> bool {
    simplified_type.eq_ignore_ascii_case(NOPV2_TYPE)
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// FASTA id of a VP1 excerpt handed to the aligner
pub fn vp1_excerpt_id(sample: &str, genome_type: &str) -> String {
    format!("{}|{}|{}", VP1_EXCERPT_PREFIX, sample, genome_type)
}

/// Inverse of [`vp1_excerpt_id`]; `None` for reference panel rows
pub fn parse_vp1_excerpt_id(id: &str) -> Option<(String, String)> {
    let rest = id.strip_prefix(VP1_EXCERPT_PREFIX)?.strip_prefix('|')?;
    let (sample, genome_type) = rest.split_once('|')?;
    Some((sample.to_string(), genome_type.to_string()))
}

/// Sample and type parsed from a consensus or contig document name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGenome {
    pub csid: String,
    pub cuid: String,
    /// Type with all whitespace removed
    pub genome_type: String,
}

impl ParsedGenome {
    pub fn sample(&self) -> String {
        sample_name(&self.csid, &self.cuid)
    }

    pub fn genome_name(&self) -> String {
        genome_name(&self.sample(), &self.genome_type)
    }
}

/// Compiled name patterns
#[derive(Debug, Clone)]
pub struct NameGrammar {
    document: Regex,
    document_for_controls: Regex,
    sample_folder: Regex,
    sample_folder_for_controls: Regex,
    type_folder: Regex,
    duplicate_type: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| FinalizeError::Config(format!("Invalid name pattern '{}': {}", pattern, e)))
}

impl NameGrammar {
    pub fn new() -> Result<Self> {
        Ok(Self {
            document: compile(&format!(r"^\s*{}{}", SAMPLE_NAME, DOCUMENT_NAME_END))?,
            document_for_controls: compile(&format!(r"^\s*{}{}", SAMPLE_NAME_FOR_CONTROLS, DOCUMENT_NAME_END))?,
            sample_folder: compile(&format!(r"^(?:Folder:)?\s*{}\s*$", SAMPLE_NAME))?,
            sample_folder_for_controls: compile(&format!(r"^(?:Folder:)?\s*{}\s*$", SAMPLE_NAME_FOR_CONTROLS))?,
            type_folder: compile(r"^(?:Folder:)?\s*([A-Za-z\d\s()-_]+)\s*[-_]\s*[Ff]inal [Cc]ontig.*$")?,
            duplicate_type: compile(r"^\s*(.*)\s*\(\s*\d+\s*\)\s*$")?,
        })
    }

    /// `CSID-CUID - TYPE - Final Consensus`, with the control-sample form as a fallback
    pub fn parse_document(&self, name: &str) -> Option<ParsedGenome> {
        let captures = self
            .document
            .captures(name)
            .or_else(|| self.document_for_controls.captures(name))?;
        Some(ParsedGenome {
            csid: captures.get(1)?.as_str().trim().to_string(),
            cuid: captures.get(2)?.as_str().trim().to_string(),
            genome_type: strip_whitespace(captures.get(3)?.as_str()),
        })
    }

    /// Sample name of a per-sample folder, `None` when the folder does not name a sample
    pub fn parse_sample_folder(&self, name: &str) -> Option<String> {
        let captures = self
            .sample_folder
            .captures(name)
            .or_else(|| self.sample_folder_for_controls.captures(name))?;
        Some(sample_name(
            captures.get(1)?.as_str().trim(),
            captures.get(2)?.as_str().trim(),
        ))
    }

    /// Type label of a `TYPE - Final Contig ...` folder
    pub fn parse_type_folder(&self, name: &str) -> Option<String> {
        let captures = self.type_folder.captures(name)?;
        Some(strip_whitespace(captures.get(1)?.as_str()))
    }

    /// Drop a trailing `(n)` duplicate counter: `PV1(2)` → `PV1`
    pub fn simplify_type(&self, genome_type: &str) -> String {
        match self.duplicate_type.captures(genome_type).and_then(|c| c.get(1)) {
            Some(base) => base.as_str().trim().to_string(),
            None => genome_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_names() {
        let grammar = NameGrammar::new().unwrap();
        let parsed = grammar
            .parse_document("0123456789-AB12 - PV1 - Final Consensus")
            .unwrap();
        assert_eq!(parsed.sample(), "0123456789_AB12");
        assert_eq!(parsed.genome_type, "PV1");
        assert_eq!(parsed.genome_name(), "0123456789_AB12 - PV1");

        let parsed = grammar
            .parse_document("0123456789_AB12_nOPV2 (2) - Final Contig (reversed)")
            .unwrap();
        assert_eq!(parsed.genome_type, "nOPV2(2)");
        assert_eq!(grammar.simplify_type(&parsed.genome_type), "nOPV2");

        assert!(grammar.parse_document("random document").is_none());
        assert!(grammar.parse_document("12345-AB - PV1 - Final Consensus").is_none());
    }

    #[test]
    fn test_parse_control_documents() {
        let grammar = NameGrammar::new().unwrap();
        let parsed = grammar
            .parse_document("RUN42-Control-Rep-2 - PV2 - Final Consensus")
            .unwrap();
        assert_eq!(parsed.genome_type, "PV2");
        assert!(parsed.cuid.starts_with("Control"));
    }

    #[test]
    fn test_folder_names() {
        let grammar = NameGrammar::new().unwrap();
        assert_eq!(
            grammar.parse_sample_folder("Folder: 0123456789-AB12").as_deref(),
            Some("0123456789_AB12")
        );
        assert_eq!(
            grammar.parse_type_folder("AY184220 - Final Contig BLAST").as_deref(),
            Some("AY184220")
        );
        assert!(grammar.parse_type_folder("Nucleotide collection").is_none());
    }

    #[test]
    fn test_vp1_excerpt_ids() {
        let id = vp1_excerpt_id("0123456789_AB12", "PV3");
        assert_eq!(id, "input|0123456789_AB12|PV3");
        assert_eq!(
            parse_vp1_excerpt_id(&id),
            Some(("0123456789_AB12".to_string(), "PV3".to_string()))
        );
        assert_eq!(parse_vp1_excerpt_id("AY184219"), None);
    }

    #[test]
    fn test_helpers() {
        assert!(is_polio_type("nOPV2"));
        assert!(!is_polio_type("EV71"));
        assert!(is_nopv2("NOPV2"));
        assert_eq!(database_name("RUN1", "0123456789_AB12", "PV1"), "RUN1_0123456789_AB12_PV1");
        assert_eq!(default_reference_types()["AY184220"], vec!["PV2", "nOPV2"]);
    }
}
