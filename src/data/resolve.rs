// resolve.rs - Map a BLAST folder label onto one of a sample's types

use crate::data::names::NameGrammar;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeResolution {
    Resolved(String),
    /// No unique type; `candidates` lists what competed (empty when nothing matched)
    Unresolved { label: String, candidates: Vec<String> },
}

/// Resolves labels for one sample
pub struct TypeResolver<'a> {
    reference_types: &'a BTreeMap<String, Vec<String>>,
    grammar: &'a NameGrammar,
}

impl<'a> TypeResolver<'a> {
    pub fn new(reference_types: &'a BTreeMap<String, Vec<String>>, grammar: &'a NameGrammar) -> Self {
        Self {
            reference_types,
            grammar,
        }
    }

    /// Try, in order: the label itself, the reference genome it names (must map
    /// to exactly one of `sample_types`), and the single type named by the
    /// folder's files.
    pub fn resolve(&self, label: &str, sample_types: &BTreeSet<String>, file_names: &[String]) -> TypeResolution {
        if sample_types.contains(label) {
            return TypeResolution::Resolved(label.to_string());
        }

        let mut candidates = Vec::new();
        if let Some(types) = self.reference_types.get(label) {
            let matches: Vec<&String> = types.iter().filter(|t| sample_types.contains(*t)).collect();
            if let [only] = matches.as_slice() {
                return TypeResolution::Resolved((*only).clone());
            }
            if matches.len() > 1 {
                candidates = matches.into_iter().cloned().collect();
            }
        }

        let file_types: BTreeSet<String> = file_names
            .iter()
            .filter_map(|name| self.grammar.parse_document(name))
            .map(|parsed| parsed.genome_type)
            .collect();
        if file_types.len() == 1 {
            if let Some(only) = file_types.iter().next() {
                if sample_types.contains(only) {
                    return TypeResolution::Resolved(only.clone());
                }
            }
        } else if file_types.len() > 1 && candidates.is_empty() {
            candidates = file_types.into_iter().collect();
        }

        TypeResolution::Unresolved {
            label: label.to_string(),
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::names::default_reference_types;

    fn types(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolution_chain() {
        let grammar = NameGrammar::new().unwrap();
        let map = default_reference_types();
        let resolver = TypeResolver::new(&map, &grammar);

        assert_eq!(
            resolver.resolve("PV1", &types(&["PV1"]), &[]),
            TypeResolution::Resolved("PV1".to_string())
        );
        assert_eq!(
            resolver.resolve("AY184220", &types(&["PV1", "nOPV2"]), &[]),
            TypeResolution::Resolved("nOPV2".to_string())
        );
        let files = vec!["0123456789-AB12 - PV3 - Final Contig".to_string()];
        assert_eq!(
            resolver.resolve("renamed", &types(&["PV1", "PV3"]), &files),
            TypeResolution::Resolved("PV3".to_string())
        );
    }

    #[test]
    fn test_unresolved_outcomes() {
        let grammar = NameGrammar::new().unwrap();
        let map = default_reference_types();
        let resolver = TypeResolver::new(&map, &grammar);

        assert_eq!(
            resolver.resolve("AY184220", &types(&["PV2", "nOPV2"]), &[]),
            TypeResolution::Unresolved {
                label: "AY184220".to_string(),
                candidates: vec!["PV2".to_string(), "nOPV2".to_string()],
            }
        );
        assert_eq!(
            resolver.resolve("EV71", &types(&["PV1"]), &[]),
            TypeResolution::Unresolved {
                label: "EV71".to_string(),
                candidates: Vec::new(),
            }
        );
    }
}
