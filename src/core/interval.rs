// interval.rs - Annotated intervals and column-range helpers

use serde::{Deserialize, Serialize};

/// Annotation type carried by mature-peptide features
pub const MATURE_PEPTIDE_TYPE: &str = "mat_peptide";

/// Annotated interval, 1-based and inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub min: usize,
    pub max: usize,
}

impl Interval {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn len(&self) -> usize {
        (self.max + 1).saturating_sub(self.min)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 0-based inclusive column range
    pub fn columns(&self) -> ColumnRange {
        ColumnRange::new(self.min.saturating_sub(1), self.max.saturating_sub(1))
    }

    /// 0-based inclusive column range restricted to `[0, column_count)`, if anything is left
    pub fn clipped_columns(&self, column_count: usize) -> Option<ColumnRange> {
        if column_count == 0 {
            return None;
        }
        self.columns().clip(0, column_count - 1)
    }
}

/// 0-based inclusive range of alignment columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub start: usize,
    pub stop: usize,
}

impl ColumnRange {
    pub fn new(start: usize, stop: usize) -> Self {
        Self { start, stop }
    }

    pub fn len(&self) -> usize {
        (self.stop + 1).saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, column: usize) -> bool {
        column >= self.start && column <= self.stop
    }

    pub fn clip(&self, lower: usize, upper: usize) -> Option<ColumnRange> {
        let start = self.start.max(lower);
        let stop = self.stop.min(upper);
        (start <= stop).then_some(ColumnRange::new(start, stop))
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.stop
    }
}

/// Named feature with one or more intervals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub kind: String,
    pub intervals: Vec<Interval>,
}

impl Annotation {
    pub fn is_mature_peptide(&self) -> bool {
        self.kind == MATURE_PEPTIDE_TYPE
    }

    pub fn single_interval(&self) -> Option<Interval> {
        match self.intervals.as_slice() {
            [interval] => Some(*interval),
            _ => None,
        }
    }
}

/// Why a named annotation could not be resolved to a single interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationIssue {
    /// The sequence carries no annotations at all
    NoAnnotations,
    Missing,
    /// More than one annotation carries the name
    Duplicate,
    /// The annotation has this many intervals instead of one
    IntervalCount(usize),
}

/// Mature-peptide region in 0-based column coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub columns: ColumnRange,
}

/// All annotations attached to one sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
}

impl AnnotationSet {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Resolve the annotation called `name` (case-insensitive) to its single interval.
    pub fn find_unique(&self, name: &str) -> Result<Interval, AnnotationIssue> {
        if self.annotations.is_empty() {
            return Err(AnnotationIssue::NoAnnotations);
        }
        let mut matches = self
            .annotations
            .iter()
            .filter(|annotation| annotation.name.eq_ignore_ascii_case(name));
        let first = matches.next().ok_or(AnnotationIssue::Missing)?;
        if matches.next().is_some() {
            return Err(AnnotationIssue::Duplicate);
        }
        first
            .single_interval()
            .ok_or(AnnotationIssue::IntervalCount(first.intervals.len()))
    }

    /// Mature-peptide regions sorted by start column.
    ///
    /// Any mature peptide with more than one interval invalidates the whole set.
    pub fn mature_peptides(&self) -> Result<Vec<Region>, AnnotationIssue> {
        let mut regions = Vec::new();
        for annotation in self.annotations.iter().filter(|a| a.is_mature_peptide()) {
            let interval = annotation
                .single_interval()
                .ok_or(AnnotationIssue::IntervalCount(annotation.intervals.len()))?;
            regions.push(Region {
                name: annotation.name.clone(),
                columns: interval.columns(),
            });
        }
        regions.sort_by_key(|region| region.columns.start);
        Ok(regions)
    }
}

/// Last region (in start order) whose span contains `column`
pub fn containing_region(regions: &[Region], column: usize) -> Option<&Region> {
    regions.iter().rev().find(|region| region.columns.contains(column))
}

pub fn is_ambiguous(base: u8) -> bool {
    base == b'N' || base == b'n'
}

pub fn is_gap(base: u8) -> bool {
    base == b'-'
}

/// Number of `N`/`n` bases in the whole sequence
pub fn count_ambiguous(sequence: &[u8]) -> usize {
    sequence.iter().filter(|&&base| is_ambiguous(base)).count()
}

/// Number of `N`/`n` bases inside `range`; columns beyond the sequence end count as nothing
pub fn count_ambiguous_in(sequence: &[u8], range: ColumnRange) -> usize {
    range
        .iter()
        .filter_map(|column| sequence.get(column))
        .filter(|&&base| is_ambiguous(base))
        .count()
}

/// First and last columns that are not alignment gaps
pub fn non_gap_span(sequence: &[u8]) -> Option<ColumnRange> {
    let start = sequence.iter().position(|&base| !is_gap(base))?;
    let stop = sequence.iter().rposition(|&base| !is_gap(base))?;
    Some(ColumnRange::new(start, stop))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(name: &str, kind: &str, intervals: &[(usize, usize)]) -> Annotation {
        Annotation {
            name: name.to_string(),
            kind: kind.to_string(),
            intervals: intervals.iter().map(|&(a, b)| Interval::new(a, b)).collect(),
        }
    }

    #[test]
    fn test_interval_columns_and_clipping() {
        let interval = Interval::new(3, 10);
        assert_eq!(interval.len(), 8);
        assert_eq!(interval.columns(), ColumnRange::new(2, 9));
        assert_eq!(interval.clipped_columns(6), Some(ColumnRange::new(2, 5)));
        assert_eq!(interval.clipped_columns(2), None);
        assert_eq!(interval.clipped_columns(0), None);
    }

    #[test]
    fn test_find_unique_issues() {
        let empty = AnnotationSet::default();
        assert_eq!(empty.find_unique("CDS"), Err(AnnotationIssue::NoAnnotations));

        let set = AnnotationSet::new(vec![
            annotation("CDS", "CDS", &[(10, 100)]),
            annotation("vp1", "mat_peptide", &[(40, 60)]),
            annotation("VP1", "mat_peptide", &[(40, 60)]),
            annotation("2A", "mat_peptide", &[(61, 70), (72, 80)]),
        ]);
        assert_eq!(set.find_unique("cds"), Ok(Interval::new(10, 100)));
        assert_eq!(set.find_unique("VP1"), Err(AnnotationIssue::Duplicate));
        assert_eq!(set.find_unique("2A"), Err(AnnotationIssue::IntervalCount(2)));
        assert_eq!(set.find_unique("3D"), Err(AnnotationIssue::Missing));
        assert_eq!(set.mature_peptides(), Err(AnnotationIssue::IntervalCount(2)));
    }

    #[test]
    fn test_mature_peptides_sorted() {
        let set = AnnotationSet::new(vec![
            annotation("VP1", "mat_peptide", &[(41, 60)]),
            annotation("CDS", "CDS", &[(1, 100)]),
            annotation("VP4", "mat_peptide", &[(1, 20)]),
            annotation("VP2", "mat_peptide", &[(21, 40)]),
        ]);
        let regions = set.mature_peptides().unwrap();
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["VP4", "VP2", "VP1"]);
        assert_eq!(containing_region(&regions, 25).map(|r| r.name.as_str()), Some("VP2"));
        assert!(containing_region(&regions, 80).is_none());
    }

    #[test]
    fn test_gap_helpers() {
        let seq = b"--ACNnT-N--";
        assert_eq!(count_ambiguous(seq), 3);
        assert_eq!(count_ambiguous_in(seq, ColumnRange::new(0, 5)), 2);
        assert_eq!(count_ambiguous_in(seq, ColumnRange::new(8, 40)), 1);
        assert_eq!(non_gap_span(seq), Some(ColumnRange::new(2, 8)));
        assert_eq!(non_gap_span(b"----"), None);
    }
}
