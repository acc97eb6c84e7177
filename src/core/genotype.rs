// genotype.rs - Nearest reference genotype for every sample VP1 excerpt

use crate::core::snp::bases_match;
use crate::data::names::parse_vp1_excerpt_id;
use crate::data::sequence::SequenceRecord;
use serde::Serialize;

/// Closest panel reference for one sample×type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenotypeAssignment {
    pub closest_reference: String,
    pub differences: usize,
    /// Fraction in `[0, 1]`
    pub identity: f64,
}

/// A sample row of the VP1 alignment with its assignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenotypedSample {
    pub sample: String,
    pub genome_type: String,
    pub assignment: GenotypeAssignment,
}

/// Mismatches over the shorter of the two rows, U and T treated as equal
pub fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).filter(|(x, y)| !bases_match(**x, **y)).count()
}

/// Nearest panel row to `sample`; ties keep the first panel row seen
pub fn closest_genotype<'a, I>(sample: &[u8], panel: I) -> Option<GenotypeAssignment>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let mut best: Option<GenotypeAssignment> = None;
    for reference in panel {
        let differences = hamming_distance(sample, &reference.sequence);
        if best.as_ref().map_or(true, |current| differences < current.differences) {
            let max_length = sample.len().max(reference.sequence.len());
            let identity = if max_length == 0 {
                1.0
            } else {
                1.0 - differences as f64 / max_length as f64
            };
            best = Some(GenotypeAssignment {
                closest_reference: reference.name(),
                differences,
                identity,
            });
        }
    }
    best
}

/// Assign a genotype to every sample row of a pooled VP1 alignment.
///
/// Sample rows are recognised by their excerpt id; every other row is part of
/// the reference panel. Samples are only ever compared against panel rows.
pub fn assign_genotypes(alignment: &[SequenceRecord]) -> Vec<GenotypedSample> {
    let panel: Vec<&SequenceRecord> = alignment
        .iter()
        .filter(|row| parse_vp1_excerpt_id(&row.id).is_none())
        .collect();
    if panel.is_empty() {
        log::warn!("VP1 alignment has no reference panel rows; no genotypes assigned");
        return Vec::new();
    }

    alignment
        .iter()
        .filter_map(|row| {
            let (sample, genome_type) = parse_vp1_excerpt_id(&row.id)?;
            let assignment = closest_genotype(&row.sequence, panel.iter().copied())?;
            Some(GenotypedSample {
                sample,
                genome_type,
                assignment,
            })
        })
        .collect()
}
