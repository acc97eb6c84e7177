// record.rs - Per sample×type analysis record

use crate::core::grading::{self, Grade};
use crate::core::recombination::RecombinationStatus;
use crate::core::snp::SingleNucleotidePolymorphism;
use serde::{Deserialize, Serialize};

/// One database search hit for a sample×type consensus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastHit {
    pub accession: String,
    pub description: String,
    pub grade: f64,
    pub percent_pairwise_identity: f64,
    pub percent_query_coverage: f64,
}

/// Highest-grade hit; the first one wins ties
pub fn best_hit(hits: &[BlastHit]) -> Option<&BlastHit> {
    let mut best: Option<&BlastHit> = None;
    for hit in hits {
        if best.map_or(true, |current| hit.grade > current.grade) {
            best = Some(hit);
        }
    }
    best
}

/// Everything measured for one sample×type.
///
/// Fields that a stage may fail to compute are `Option`s: `None` means the data
/// was unavailable, which the grader treats differently from a measured zero.
/// The grade and notes are never stored; they are derived on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisRecord {
    pub sample: String,
    pub genome_type: String,
    pub full_length: usize,
    pub total_gap_count: usize,
    pub cds_gap_count: Option<usize>,
    pub cds_minimum_coverage: Option<usize>,
    pub vp1_minimum_coverage: Option<usize>,
    pub average_coverage: f64,
    pub percent_covered_by_reads: f64,
    pub best_hit: Option<BlastHit>,
    pub vp1_snps: Option<Vec<SingleNucleotidePolymorphism>>,
    pub vp1_gap_count: Option<usize>,
    pub partial_vp1: bool,
    pub partial_cds_note: Option<String>,
    pub recombination: RecombinationStatus,
}

impl AnalysisRecord {
    pub fn new(sample: impl Into<String>, genome_type: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            genome_type: genome_type.into(),
            ..Default::default()
        }
    }

    /// `"{sample} - {type}"`, the name non-fatal errors are recorded under
    pub fn genome_name(&self) -> String {
        crate::data::names::genome_name(&self.sample, &self.genome_type)
    }

    /// CDS gaps, or every gap when the CDS could not be resolved
    pub fn effective_cds_gap_count(&self) -> usize {
        self.cds_gap_count.unwrap_or(self.total_gap_count)
    }

    pub fn grade(&self) -> Grade {
        grading::grade(self)
    }

    pub fn notes(&self) -> String {
        grading::notes(self)
    }

    pub fn vp1_snp_summary(&self) -> String {
        grading::vp1_snp_summary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(accession: &str, grade: f64) -> BlastHit {
        BlastHit {
            accession: accession.to_string(),
            description: format!("{} description", accession),
            grade,
            percent_pairwise_identity: 99.0,
            percent_query_coverage: 100.0,
        }
    }

    #[test]
    fn test_best_hit_prefers_first_on_ties() {
        let hits = vec![hit("A", 90.0), hit("B", 95.0), hit("C", 95.0)];
        assert_eq!(best_hit(&hits).map(|h| h.accession.as_str()), Some("B"));
        assert!(best_hit(&[]).is_none());
    }

    #[test]
    fn test_cds_gap_fallback() {
        let mut record = AnalysisRecord::new("0123456789_X1", "PV1");
        record.total_gap_count = 7;
        assert_eq!(record.effective_cds_gap_count(), 7);
        record.cds_gap_count = Some(0);
        assert_eq!(record.effective_cds_gap_count(), 0);
        assert_eq!(record.genome_name(), "0123456789_X1 - PV1");
    }
}
