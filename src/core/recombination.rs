// recombination.rs - Flank-versus-VP1 SNP density test for recombination breakpoints

use crate::core::interval::{containing_region, ColumnRange, Region};
use crate::core::snp::find_snps;

/// Minimum SNP frequency before the 5' flank is tested
pub const FIVE_PRIME_MIN_SNP_FREQUENCY: f64 = 0.07;
/// Minimum SNP frequency before the 3' flank is tested
pub const THREE_PRIME_MIN_SNP_FREQUENCY: f64 = 0.13;
/// One-tailed critical value (~95%, large-sample approximation)
pub const T_STATISTIC_ONE_TAIL_THRESHOLD: f64 = 1.646;

/// Outcome of the recombination screen for one sample row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecombinationStatus {
    /// No whole-genome alignment analysed the genome
    #[default]
    Indeterminate,
    IndeterminateDueToGaps,
    /// Screened, nothing flagged
    Cleared,
    FivePrime,
    ThreePrime,
    Double,
}

impl RecombinationStatus {
    pub fn from_flags(five_prime: bool, three_prime: bool) -> Self {
        match (five_prime, three_prime) {
            (true, true) => RecombinationStatus::Double,
            (true, false) => RecombinationStatus::FivePrime,
            (false, true) => RecombinationStatus::ThreePrime,
            (false, false) => RecombinationStatus::Cleared,
        }
    }

    pub fn note(&self) -> Option<&'static str> {
        match self {
            RecombinationStatus::Indeterminate => Some("recombination status indeterminate"),
            RecombinationStatus::IndeterminateDueToGaps => {
                Some("recombination status indeterminate due to gaps")
            }
            RecombinationStatus::Cleared => None,
            RecombinationStatus::FivePrime => Some("5' recombination"),
            RecombinationStatus::ThreePrime => Some("3' recombination"),
            RecombinationStatus::Double => Some("double recombination"),
        }
    }
}

/// The three column windows compared by the test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecombinationWindows {
    pub five_prime: Option<ColumnRange>,
    pub vp1: Option<ColumnRange>,
    pub three_prime: Option<ColumnRange>,
}

/// Partition the covered span of a sample row into 5' flank, VP1 and 3' flank.
///
/// `span` is the row's first/last non-gap column, `mature_peptides` must be
/// sorted by start (as returned by `AnnotationSet::mature_peptides`) and `vp1`
/// is the VP1 mature peptide when exactly one exists. Without a VP1 region the
/// VP1 window falls back to the whole span. Returns `None` when there are no
/// mature peptides to anchor the flanks on.
pub fn recombination_windows(
    span: ColumnRange,
    mature_peptides: &[Region],
    vp1: Option<ColumnRange>,
) -> Option<RecombinationWindows> {
    let first = mature_peptides.first()?;
    let last = mature_peptides.last()?;

    // 5' flank ends at the peptide holding the first covered base, or before the
    // first peptide when the row starts in the 5' UTR
    let mut five_prime_stop = match containing_region(mature_peptides, span.start) {
        Some(region) => Some(region.columns.stop),
        None => first.columns.start.checked_sub(1),
    };
    if let Some(vp1) = vp1 {
        five_prime_stop = five_prime_stop.and_then(|stop| vp1.start.checked_sub(1).map(|bound| stop.min(bound)));
    }
    let five_prime = five_prime_stop
        .map(|stop| stop.min(span.stop))
        .filter(|&stop| stop >= span.start)
        .map(|stop| ColumnRange::new(span.start, stop));

    // The 3' UTR is too short to test on its own, so the last peptide is folded in
    let mut three_prime_start = match containing_region(mature_peptides, span.stop) {
        Some(region) => region.columns.start,
        None => last.columns.start,
    };
    if let Some(vp1) = vp1 {
        three_prime_start = three_prime_start.max(vp1.stop + 1);
    }
    let three_prime_start = three_prime_start.max(span.start);
    let three_prime =
        (three_prime_start <= span.stop).then(|| ColumnRange::new(three_prime_start, span.stop));

    let vp1 = match vp1 {
        Some(vp1) => vp1.clip(span.start, span.stop),
        None => Some(span),
    };

    Some(RecombinationWindows {
        five_prime,
        vp1,
        three_prime,
    })
}

/// Distance from every column of `window` to the nearest of `snps` (sorted ascending).
/// With no SNPs at all every distance is `f64::MAX`.
pub fn distance_profile(window: ColumnRange, snps: &[usize]) -> Vec<f64> {
    window
        .iter()
        .map(|column| {
            let index = snps.partition_point(|&snp| snp < column);
            let after = snps.get(index).map(|&snp| snp - column);
            let before = index.checked_sub(1).map(|i| column - snps[i]);
            match (before, after) {
                (Some(b), Some(a)) => b.min(a) as f64,
                (Some(d), None) | (None, Some(d)) => d as f64,
                (None, None) => f64::MAX,
            }
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator); zero for fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64
}

/// Welch's t comparing VP1 against a flank; positive when the flank's SNPs sit closer together.
/// Two constant profiles have no spread to test against and give 0.
pub fn welch_t_statistic(vp1: &[f64], flank: &[f64]) -> f64 {
    let standard_error =
        (sample_variance(flank) / flank.len() as f64 + sample_variance(vp1) / vp1.len() as f64).sqrt();
    if standard_error == 0.0 || !standard_error.is_finite() {
        return 0.0;
    }
    (mean(vp1) - mean(flank)) / standard_error
}

struct WindowScan {
    snp_count: usize,
    gap_count: usize,
    distances: Vec<f64>,
}

fn scan_window(reference: &[u8], sample: &[u8], window: ColumnRange) -> WindowScan {
    let scan = find_snps(reference, sample, window.start, window.stop);
    WindowScan {
        snp_count: scan.positions.len(),
        gap_count: scan.gap_count,
        distances: distance_profile(window, &scan.positions),
    }
}

/// Run the flank-versus-VP1 screen on one aligned sample row.
///
/// `reference` is the row the SNPs are called against (the nOPV2 reference for
/// nOPV2 genomes). Any ambiguous base inside a window makes the result
/// indeterminate; a VP1 window without SNPs is rescanned over the whole span
/// before giving up on the test.
pub fn detect_recombination(
    reference: &[u8],
    sample: &[u8],
    span: ColumnRange,
    windows: &RecombinationWindows,
) -> RecombinationStatus {
    let Some(vp1_window) = windows.vp1 else {
        return RecombinationStatus::Indeterminate;
    };
    let five_prime = windows.five_prime.map(|w| (w, scan_window(reference, sample, w)));
    let three_prime = windows.three_prime.map(|w| (w, scan_window(reference, sample, w)));

    let mut vp1 = scan_window(reference, sample, vp1_window);
    if vp1.snp_count == 0 {
        // Gap count stays the one from the VP1 window itself
        let fallback = find_snps(reference, sample, span.start, span.stop);
        vp1.snp_count = fallback.positions.len();
        vp1.distances = distance_profile(vp1_window, &fallback.positions);
    }

    let flank_gaps = five_prime
        .iter()
        .chain(three_prime.iter())
        .any(|(_, scan)| scan.gap_count > 0);
    if vp1.gap_count > 0 || flank_gaps {
        return RecombinationStatus::IndeterminateDueToGaps;
    }
    if vp1.snp_count == 0 {
        return RecombinationStatus::Cleared;
    }

    let flagged = |flank: &Option<(ColumnRange, WindowScan)>, min_frequency: f64| {
        let Some((window, scan)) = flank else {
            return false;
        };
        let length = window.len();
        if length < 2 || (scan.snp_count as f64 / length as f64) < min_frequency {
            return false;
        }
        let t = welch_t_statistic(&vp1.distances, &scan.distances);
        log::debug!("flank {}..={} t = {:.3}", window.start, window.stop, t);
        t > T_STATISTIC_ONE_TAIL_THRESHOLD
    };

    RecombinationStatus::from_flags(
        flagged(&five_prime, FIVE_PRIME_MIN_SNP_FREQUENCY),
        flagged(&three_prime, THREE_PRIME_MIN_SNP_FREQUENCY),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interval::non_gap_span;

    fn region(name: &str, min: usize, max: usize) -> Region {
        Region {
            name: name.to_string(),
            columns: ColumnRange::new(min - 1, max - 1),
        }
    }

    /// VP2 21-100, VP1 101-200, 2A 201-300, 3D 301-390 on a 400 column alignment
    fn peptides() -> Vec<Region> {
        vec![
            region("VP2", 21, 100),
            region("VP1", 101, 200),
            region("2A", 201, 300),
            region("3D", 301, 390),
        ]
    }

    fn reference() -> Vec<u8> {
        b"ACGT".iter().copied().cycle().take(400).collect()
    }

    fn mutate(sequence: &mut [u8], columns: impl Iterator<Item = usize>) {
        for column in columns {
            sequence[column] = if sequence[column] == b'A' { b'C' } else { b'A' };
        }
    }

    fn screen(reference: &[u8], sample: &[u8]) -> RecombinationStatus {
        let span = non_gap_span(sample).unwrap();
        let peptides = peptides();
        let vp1 = Some(peptides[1].columns);
        let windows = recombination_windows(span, &peptides, vp1).unwrap();
        detect_recombination(reference, sample, span, &windows)
    }

    #[test]
    fn test_windows_for_full_length_row() {
        let peptides = peptides();
        let windows =
            recombination_windows(ColumnRange::new(0, 399), &peptides, Some(peptides[1].columns)).unwrap();
        assert_eq!(windows.five_prime, Some(ColumnRange::new(0, 19)));
        assert_eq!(windows.vp1, Some(ColumnRange::new(100, 199)));
        assert_eq!(windows.three_prime, Some(ColumnRange::new(300, 399)));
    }

    #[test]
    fn test_windows_for_partial_row() {
        let peptides = peptides();
        let windows =
            recombination_windows(ColumnRange::new(50, 250), &peptides, Some(peptides[1].columns)).unwrap();
        assert_eq!(windows.five_prime, Some(ColumnRange::new(50, 99)));
        assert_eq!(windows.vp1, Some(ColumnRange::new(100, 199)));
        assert_eq!(windows.three_prime, Some(ColumnRange::new(200, 250)));

        let windows = recombination_windows(ColumnRange::new(50, 250), &peptides, None).unwrap();
        assert_eq!(windows.vp1, Some(ColumnRange::new(50, 250)));
        assert!(recombination_windows(ColumnRange::new(0, 10), &[], None).is_none());
    }

    #[test]
    fn test_distance_profile() {
        let profile = distance_profile(ColumnRange::new(0, 5), &[1, 4]);
        assert_eq!(profile, vec![1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        assert!(distance_profile(ColumnRange::new(0, 1), &[]).iter().all(|&d| d == f64::MAX));
    }

    #[test]
    fn test_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((sample_variance(&values) - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(sample_variance(&[1.0]), 0.0);
    }

    #[test]
    fn test_welch_t_statistic() {
        // Means 5 and 2, both variances 2, two values each
        let t = welch_t_statistic(&[4.0, 6.0], &[1.0, 3.0]);
        assert!((t - 3.0 / 2.0_f64.sqrt()).abs() < 1e-12);
        assert!(welch_t_statistic(&[1.0, 3.0], &[4.0, 6.0]) < 0.0);

        assert_eq!(welch_t_statistic(&[3.0, 3.0], &[1.0, 1.0]), 0.0);
        assert_eq!(welch_t_statistic(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_three_prime_cluster_is_flagged() {
        let reference = reference();
        let mut sample = reference.clone();
        mutate(&mut sample, 300..=314);
        assert_eq!(screen(&reference, &sample), RecombinationStatus::ThreePrime);
        assert_eq!(screen(&reference, &sample).note(), Some("3' recombination"));
    }

    #[test]
    fn test_five_prime_cluster_is_flagged() {
        let reference = reference();
        let mut sample = reference.clone();
        mutate(&mut sample, 0..=4);
        let status = screen(&reference, &sample);
        assert_eq!(status, RecombinationStatus::FivePrime);
        assert_eq!(status.note(), Some("5' recombination"));
    }

    #[test]
    fn test_clusters_on_both_flanks() {
        let reference = reference();
        let mut sample = reference.clone();
        mutate(&mut sample, (0..=4).chain(300..=314));
        assert_eq!(screen(&reference, &sample), RecombinationStatus::Double);
    }

    #[test]
    fn test_identical_row_is_cleared() {
        let reference = reference();
        let status = screen(&reference, &reference);
        assert_eq!(status, RecombinationStatus::Cleared);
        assert_eq!(status.note(), None);
    }

    #[test]
    fn test_ambiguous_bases_make_it_indeterminate() {
        let reference = reference();
        let mut sample = reference.clone();
        sample[150] = b'N';
        assert_eq!(
            screen(&reference, &sample).note(),
            Some("recombination status indeterminate due to gaps")
        );
    }
}
