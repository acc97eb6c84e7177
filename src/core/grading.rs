// grading.rs - Four-level QC grade, notes and VP1 SNP summary

use crate::core::record::AnalysisRecord;
use serde::Serialize;
use std::fmt;

pub const AVERAGE_COVERAGE_FOR_GREEN: f64 = 50.0;
pub const AVERAGE_COVERAGE_FOR_YELLOW: f64 = 25.0;
pub const CDS_MINIMUM_COVERAGE_FOR_GREEN: usize = 3;
/// VP1 is the genotyping region, so this one is a hard gate
pub const VP1_MINIMUM_COVERAGE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Grade {
    Green,
    YellowKeep,
    YellowRedo,
    RedRedo,
}

impl Grade {
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Green => "GREEN",
            Grade::YellowKeep => "YELLOW_KEEP",
            Grade::YellowRedo => "YELLOW-REDO",
            Grade::RedRedo => "RED-REDO",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn grade(record: &AnalysisRecord) -> Grade {
    let cds_problem = record.effective_cds_gap_count() > 0 || record.partial_cds_note.is_some();

    let mut grade = if record.average_coverage > AVERAGE_COVERAGE_FOR_GREEN {
        if cds_problem {
            Grade::YellowRedo
        } else if record.total_gap_count > 0 {
            Grade::YellowKeep
        } else {
            Grade::Green
        }
    } else if record.average_coverage > AVERAGE_COVERAGE_FOR_YELLOW {
        if cds_problem {
            Grade::YellowRedo
        } else {
            Grade::YellowKeep
        }
    } else {
        Grade::RedRedo
    };

    if grade == Grade::Green
        && record
            .cds_minimum_coverage
            .map_or(true, |coverage| coverage < CDS_MINIMUM_COVERAGE_FOR_GREEN)
    {
        grade = Grade::YellowRedo;
    }

    if record
        .vp1_minimum_coverage
        .map_or(true, |coverage| coverage < VP1_MINIMUM_COVERAGE)
    {
        grade = Grade::RedRedo;
    }
    grade
}

/// Human-readable notes joined with `"; "`, in a fixed order
pub fn notes(record: &AnalysisRecord) -> String {
    let mut notes: Vec<String> = Vec::new();

    match record.cds_minimum_coverage {
        None => notes.push("CDS coverage data unavailable".to_string()),
        Some(coverage) if record.total_gap_count == 0 && coverage < CDS_MINIMUM_COVERAGE_FOR_GREEN => {
            notes.push(format!(
                "CDS min. coverage too low: {} <= {}",
                coverage,
                CDS_MINIMUM_COVERAGE_FOR_GREEN - 1
            ));
        }
        Some(_) => {}
    }

    match record.vp1_minimum_coverage {
        None => notes.push("VP1 coverage data unavailable".to_string()),
        Some(coverage) if coverage < VP1_MINIMUM_COVERAGE => {
            notes.push(format!(
                "VP1 min. coverage too low: {} <= {}",
                coverage,
                VP1_MINIMUM_COVERAGE - 1
            ));
        }
        Some(_) => {}
    }

    if record.total_gap_count > 0 {
        notes.push(format!("Gaps (n = {})", record.total_gap_count));
    }
    if let Some(note) = &record.partial_cds_note {
        notes.push(note.clone());
    }
    if let Some(note) = record.recombination.note() {
        notes.push(note.to_string());
    }
    notes.join("; ")
}

/// `-` when VP1 was not called or only partially covered, otherwise the SNP count,
/// spelled out as gaps plus SNPs when the region has ambiguous bases
pub fn vp1_snp_summary(record: &AnalysisRecord) -> String {
    let (Some(snps), Some(gaps)) = (&record.vp1_snps, record.vp1_gap_count) else {
        return "-".to_string();
    };
    if record.partial_vp1 {
        return "-".to_string();
    }
    if gaps == 0 {
        snps.len().to_string()
    } else {
        format!("{} = {} (Gaps) + {} (SNPs)", gaps + snps.len(), gaps, snps.len())
    }
}
