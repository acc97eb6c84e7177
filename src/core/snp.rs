// snp.rs - Per-position mismatch detection between a reference and a query row

use crate::core::interval::{is_ambiguous, is_gap, ColumnRange};
use serde::Serialize;

/// Fold `U`/`u` onto `T`/`t`; every other byte passes through unchanged.
#[inline]
pub fn normalize_base(base: u8) -> u8 {
    match base {
        b'U' => b'T',
        b'u' => b't',
        other => other,
    }
}

/// Case-insensitive comparison after U→T normalization
#[inline]
pub fn bases_match(reference: u8, query: u8) -> bool {
    normalize_base(reference).eq_ignore_ascii_case(&normalize_base(query))
}

/// Result of scanning one coordinate range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnpScan {
    /// 0-based positions of mismatching, non-ambiguous query bases, ascending
    pub positions: Vec<usize>,
    /// Ambiguous (`N`) query bases in the range
    pub gap_count: usize,
}

/// Scan `start..=stop` for SNPs of `query` against `reference`.
///
/// An `N` in the query is counted as a gap and never reported as a SNP. Positions
/// past the end of either sequence are ignored, and `start > stop` yields nothing.
pub fn find_snps(reference: &[u8], query: &[u8], start: usize, stop: usize) -> SnpScan {
    let mut scan = SnpScan::default();
    if start > stop {
        return scan;
    }
    for position in start..=stop {
        let (Some(&reference_base), Some(&query_base)) = (reference.get(position), query.get(position)) else {
            break;
        };
        if is_ambiguous(query_base) {
            scan.gap_count += 1;
        } else if !bases_match(reference_base, query_base) {
            scan.positions.push(position);
        }
    }
    scan
}

/// A single-nucleotide difference inside a named region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleNucleotidePolymorphism {
    pub reference: String,
    pub ref_base: char,
    pub alt_base: char,
    /// 1-based position within the region
    pub position: usize,
}

impl SingleNucleotidePolymorphism {
    /// `REF{position}ALT`, e.g. `A123G`
    pub fn concatenation(&self) -> String {
        format!("{}{}{}", self.ref_base, self.position, self.alt_base)
    }
}

/// SNP call over one region of an aligned sample row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSnpCall {
    pub snps: Vec<SingleNucleotidePolymorphism>,
    pub gap_count: usize,
    /// At least one column of the region is an alignment gap in the sample row
    pub partial: bool,
}

/// Call SNPs of an aligned sample row across `region` of the reference row.
///
/// Alignment gaps mark the call as partial, `N` counts as a gap, and every other
/// normalized mismatch becomes a SNP numbered from the region start.
pub fn call_region_snps(
    reference_name: &str,
    reference: &[u8],
    sample: &[u8],
    region: ColumnRange,
) -> RegionSnpCall {
    let mut call = RegionSnpCall::default();
    for column in region.iter() {
        let (Some(&reference_base), Some(&sample_base)) = (reference.get(column), sample.get(column)) else {
            call.partial = true;
            continue;
        };
        if is_gap(sample_base) {
            call.partial = true;
        } else if is_ambiguous(sample_base) {
            call.gap_count += 1;
        } else if !bases_match(reference_base, sample_base) {
            call.snps.push(SingleNucleotidePolymorphism {
                reference: reference_name.to_string(),
                ref_base: normalize_base(reference_base).to_ascii_uppercase() as char,
                alt_base: normalize_base(sample_base).to_ascii_uppercase() as char,
                position: column - region.start + 1,
            });
        }
    }
    call
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sequences_have_no_snps() {
        let scan = find_snps(b"ACGTACGT", b"ACGTACGT", 0, 7);
        assert!(scan.positions.is_empty());
        assert_eq!(scan.gap_count, 0);
    }

    #[test]
    fn test_u_and_t_are_equivalent() {
        assert!(find_snps(b"AUG", b"ATG", 0, 2).positions.is_empty());
        assert!(find_snps(b"aug", b"ATG", 0, 2).positions.is_empty());
        assert!(find_snps(b"ATG", b"auG", 0, 2).positions.is_empty());
    }

    #[test]
    fn test_ambiguous_bases_count_as_gaps() {
        let scan = find_snps(b"ACGTACGT", b"ANGTCCnT", 0, 7);
        assert_eq!(scan.positions, vec![4]);
        assert_eq!(scan.gap_count, 2);
    }

    #[test]
    fn test_range_is_inclusive_and_bounded() {
        let scan = find_snps(b"AAAAAA", b"CCCCCC", 2, 3);
        assert_eq!(scan.positions, vec![2, 3]);
        assert_eq!(find_snps(b"AAAA", b"CCCC", 3, 1), SnpScan::default());
        assert_eq!(find_snps(b"AAAA", b"CCCC", 2, 100).positions, vec![2, 3]);
    }

    #[test]
    fn test_region_call() {
        let reference = b"ttACGTACGTtt";
        let sample = b"ttAGGTNC-Ttt";
        let call = call_region_snps("AY184219", reference, sample, ColumnRange::new(2, 9));
        assert!(call.partial);
        assert_eq!(call.gap_count, 1);
        assert_eq!(call.snps.len(), 1);
        assert_eq!(call.snps[0].position, 2);
        assert_eq!(call.snps[0].ref_base, 'C');
        assert_eq!(call.snps[0].alt_base, 'G');
        assert_eq!(call.snps[0].concatenation(), "C2G");
    }

    #[test]
    fn test_region_call_normalizes_uracil() {
        let call = call_region_snps("ref", b"ACGU", b"acgt", ColumnRange::new(0, 3));
        assert!(call.snps.is_empty());
        assert!(!call.partial);
    }
}
