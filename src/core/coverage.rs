// coverage.rs - Gap counts, window minimum coverage and partial-CDS detection

use crate::core::interval::{
    containing_region, count_ambiguous, count_ambiguous_in, is_gap, non_gap_span, AnnotationIssue,
    AnnotationSet, ColumnRange, Interval, Region,
};
use crate::error::{NonFatalError, NonFatalErrors};

/// Label used in partial-CDS notes when no mature peptide contains the boundary
pub const MISSING_MATURE_PEPTIDE_LABEL: &str = "MISSING_MATURE_PEPTIDE_ANNOTATION";

/// Per-column read depth of a contig alignment
pub trait ColumnCoverage {
    fn column_count(&self) -> usize;

    /// Rows with a non-gap base at `column`, the reference row included
    fn depth(&self, column: usize) -> usize;
}

impl ColumnCoverage for [usize] {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn depth(&self, column: usize) -> usize {
        self.get(column).copied().unwrap_or(0)
    }
}

impl ColumnCoverage for Vec<usize> {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn depth(&self, column: usize) -> usize {
        self.as_slice().depth(column)
    }
}

/// Minimum read depth over the non-gap consensus columns of `range`.
///
/// One is subtracted from each column's depth to drop the reference row. Gap
/// columns are skipped; a window with no non-gap column has no minimum.
pub fn minimum_coverage<C: ColumnCoverage + ?Sized>(
    consensus: &[u8],
    coverage: &C,
    range: ColumnRange,
) -> Option<usize> {
    range
        .iter()
        .filter(|&column| consensus.get(column).is_some_and(|&base| !is_gap(base)))
        .map(|column| coverage.depth(column).saturating_sub(1))
        .min()
}

/// Mean reads-only depth over columns where the reference has a base, and the
/// percentage of those columns covered by at least one read.
pub fn reference_coverage<C: ColumnCoverage + ?Sized>(reference: &[u8], coverage: &C) -> (f64, f64) {
    let mut columns = 0usize;
    let mut covered = 0usize;
    let mut total_depth = 0usize;
    for (column, &base) in reference.iter().enumerate() {
        if is_gap(base) {
            continue;
        }
        let reads = coverage.depth(column).saturating_sub(1);
        columns += 1;
        total_depth += reads;
        if reads > 0 {
            covered += 1;
        }
    }
    if columns == 0 {
        return (0.0, 0.0);
    }
    (
        total_depth as f64 / columns as f64,
        covered as f64 / columns as f64 * 100.0,
    )
}

/// Consensus-level statistics: length, `N` count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsensusStats {
    pub full_length: usize,
    pub total_gap_count: usize,
}

pub fn consensus_stats(sequence: &[u8]) -> ConsensusStats {
    ConsensusStats {
        full_length: sequence.len(),
        total_gap_count: count_ambiguous(sequence),
    }
}

/// Bases `[min - 1, max)` of an unaligned consensus, clamped to its length
pub fn vp1_excerpt(sequence: &[u8], vp1: Interval) -> &[u8] {
    let start = vp1.min.saturating_sub(1).min(sequence.len());
    let stop = vp1.max.min(sequence.len()).max(start);
    &sequence[start..stop]
}

/// Minimum coverage inside the CDS and VP1 windows of a contig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowCoverage {
    pub cds_minimum: Option<usize>,
    pub vp1_minimum: Option<usize>,
}

/// Resolve the CDS and VP1 windows on the contig reference and measure their
/// minimum coverage. Unresolvable windows stay unset and are recorded against
/// `genome_name`.
pub fn contig_window_coverage<C: ColumnCoverage + ?Sized>(
    genome_name: &str,
    consensus: &[u8],
    coverage: &C,
    annotations: &AnnotationSet,
    errors: &mut NonFatalErrors,
) -> WindowCoverage {
    if annotations.is_empty() {
        errors.record(NonFatalError::GenomesWithoutAnnotations, genome_name);
        return WindowCoverage::default();
    }
    let columns = coverage.column_count().min(consensus.len());
    let window_minimum = |interval: Interval| {
        interval
            .clipped_columns(columns)
            .and_then(|range| minimum_coverage(consensus, coverage, range))
    };

    let vp1_minimum = match annotations.find_unique("VP1") {
        Ok(interval) => window_minimum(interval),
        Err(issue) => {
            let error = match issue {
                AnnotationIssue::Missing | AnnotationIssue::NoAnnotations => {
                    NonFatalError::ContigsWithoutAVp1Annotation
                }
                AnnotationIssue::Duplicate | AnnotationIssue::IntervalCount(_) => {
                    NonFatalError::ContigsWithUnexpectedVp1Intervals
                }
            };
            errors.record(error, genome_name);
            None
        }
    };

    let cds_minimum = match annotations.find_unique("CDS") {
        Ok(interval) => window_minimum(interval),
        Err(issue) => {
            let error = match issue {
                AnnotationIssue::Missing | AnnotationIssue::NoAnnotations => {
                    NonFatalError::ContigsWithoutACdsAnnotation
                }
                AnnotationIssue::Duplicate | AnnotationIssue::IntervalCount(_) => {
                    NonFatalError::ContigsWithUnexpectedCdsIntervals
                }
            };
            errors.record(error, genome_name);
            None
        }
    };

    WindowCoverage {
        cds_minimum,
        vp1_minimum,
    }
}

/// `"Partial CDS (X-:-Y)"` when the covered span starts after or ends before the CDS.
///
/// `span` is the sample row's first/last non-gap column; boundaries are named
/// after the mature peptide that contains them.
pub fn partial_cds_note(span: ColumnRange, cds: ColumnRange, mature_peptides: &[Region]) -> Option<String> {
    let mut portions = Vec::new();
    if span.start > cds.start {
        let name = containing_region(mature_peptides, span.start)
            .map_or(MISSING_MATURE_PEPTIDE_LABEL, |region| region.name.as_str());
        portions.push(format!("{}-", name));
    }
    if span.stop < cds.stop {
        let name = containing_region(mature_peptides, span.stop)
            .map_or(MISSING_MATURE_PEPTIDE_LABEL, |region| region.name.as_str());
        portions.push(format!("-{}", name));
    }
    if portions.is_empty() {
        None
    } else {
        Some(format!("Partial CDS ({})", portions.join(":")))
    }
}

/// CDS-restricted gap count and covered span of an aligned sample row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGapSummary {
    pub cds_gap_count: usize,
    pub span: Option<ColumnRange>,
}

pub fn row_gap_summary(sample: &[u8], cds: ColumnRange) -> RowGapSummary {
    RowGapSummary {
        cds_gap_count: count_ambiguous_in(sample, cds),
        span: non_gap_span(sample),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interval::Annotation;

    fn region(name: &str, start: usize, stop: usize) -> Region {
        Region {
            name: name.to_string(),
            columns: ColumnRange::new(start, stop),
        }
    }

    #[test]
    fn test_minimum_coverage_skips_gap_columns() {
        let coverage = vec![10, 0, 5];
        assert_eq!(minimum_coverage(b"A-C", &coverage, ColumnRange::new(0, 2)), Some(4));
        assert_eq!(minimum_coverage(b"---", &coverage, ColumnRange::new(0, 2)), None);
    }

    #[test]
    fn test_reference_coverage() {
        let coverage = vec![1, 3, 5, 9];
        let (average, percent) = reference_coverage(b"AC-G", &coverage);
        assert!((average - (0.0 + 2.0 + 8.0) / 3.0).abs() < 1e-9);
        assert!((percent - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_consensus_stats() {
        let stats = consensus_stats(b"ACGNNTn");
        assert_eq!(stats.full_length, 7);
        assert_eq!(stats.total_gap_count, 3);
    }

    #[test]
    fn test_vp1_excerpt_is_clamped() {
        assert_eq!(vp1_excerpt(b"AACCGGTT", Interval::new(3, 6)), b"CCGG");
        assert_eq!(vp1_excerpt(b"AACCGGTT", Interval::new(7, 20)), b"TT");
        assert_eq!(vp1_excerpt(b"AACC", Interval::new(9, 20)), b"");
    }

    #[test]
    fn test_window_coverage_records_missing_annotations() {
        let mut errors = NonFatalErrors::new();
        let coverage = vec![4; 10];
        let result = contig_window_coverage("S1 - PV1", b"ACGTACGTAC", &coverage, &AnnotationSet::default(), &mut errors);
        assert_eq!(result, WindowCoverage::default());
        assert_eq!(errors.names(NonFatalError::GenomesWithoutAnnotations), ["S1 - PV1"]);

        let mut errors = NonFatalErrors::new();
        let annotations = AnnotationSet::new(vec![Annotation {
            name: "CDS".to_string(),
            kind: "CDS".to_string(),
            intervals: vec![Interval::new(2, 8)],
        }]);
        let coverage = vec![4, 4, 7, 6, 9, 9, 9, 9, 4, 4];
        let result = contig_window_coverage("S1 - PV1", b"ACGTACGTAC", &coverage, &annotations, &mut errors);
        assert_eq!(result.cds_minimum, Some(3));
        assert_eq!(result.vp1_minimum, None);
        assert_eq!(errors.names(NonFatalError::ContigsWithoutAVp1Annotation), ["S1 - PV1"]);
    }

    #[test]
    fn test_partial_cds_note() {
        let peptides = vec![region("VP4", 10, 19), region("VP2", 20, 39), region("3D", 40, 59)];
        let cds = ColumnRange::new(10, 59);
        assert_eq!(partial_cds_note(ColumnRange::new(0, 70), cds, &peptides), None);
        assert_eq!(
            partial_cds_note(ColumnRange::new(25, 70), cds, &peptides).as_deref(),
            Some("Partial CDS (VP2-)")
        );
        assert_eq!(
            partial_cds_note(ColumnRange::new(25, 45), cds, &peptides).as_deref(),
            Some("Partial CDS (VP2-:-3D)")
        );
        assert_eq!(
            partial_cds_note(ColumnRange::new(0, 5), cds, &peptides).as_deref(),
            Some("Partial CDS (-MISSING_MATURE_PEPTIDE_ANNOTATION)")
        );
    }

    #[test]
    fn test_row_gap_summary() {
        let summary = row_gap_summary(b"--ACNNGT-N--", ColumnRange::new(3, 8));
        assert_eq!(summary.cds_gap_count, 2);
        assert_eq!(summary.span, Some(ColumnRange::new(2, 9)));
    }
}
