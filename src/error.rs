// error.rs - Fatal run errors and the non-fatal error accumulator

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors that abort the whole run (or the phase that raised them).
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Required input document \"{0}\" was not provided")]
    MissingReference(String),

    #[error(
        "Alignment document \"{alignment}\" is missing nOPV2/MZ245455, but it contains an nOPV2 genome. \
         Please add MZ245455 to this alignment and re-run"
    )]
    MissingNopv2Reference { alignment: String },

    #[error("Folder \"{label}\" of sample \"{sample}\" maps to more than one type: {}", .candidates.join(", "))]
    AmbiguousType {
        sample: String,
        label: String,
        candidates: Vec<String>,
    },

    #[error("Multiple {kind} documents from sample \"{sample}\" and type \"{genome_type}\" were provided")]
    DuplicateDocument {
        kind: &'static str,
        sample: String,
        genome_type: String,
    },

    #[error("Input document name \"{0}\" had an unrecognized format (example: CSID-CUID - type - Final Consensus)")]
    UnrecognizedName(String),

    #[error("VP1 aligner '{aligner}' failed: {message}")]
    Aligner { aligner: String, message: String },
}

pub type Result<T> = std::result::Result<T, FinalizeError>;

impl FinalizeError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        FinalizeError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        FinalizeError::Parse {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }
}

/// What kind of input a non-fatal error was raised against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NonFatalErrorCategory {
    Genome,
    Alignment,
    Contig,
}

impl NonFatalErrorCategory {
    pub fn name(&self) -> &'static str {
        match self {
            NonFatalErrorCategory::Genome => "genomes",
            NonFatalErrorCategory::Alignment => "alignments",
            NonFatalErrorCategory::Contig => "contigs",
        }
    }
}

/// Structural problems that are recorded against a genome and reported at the end of a run.
/// Declaration order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NonFatalError {
    GenomesWithoutAnnotations,
    ContigsWithoutACdsAnnotation,
    GenomesWithoutACdsAnnotation,
    ContigsWithUnexpectedCdsIntervals,
    GenomesWithoutAVp1Annotation,
    ContigsWithoutAVp1Annotation,
    GenomesWithUnexpectedVp1Intervals,
    ContigsWithUnexpectedVp1Intervals,
    ContigsWithoutAConsensusRow,
    ContigsWithoutAReferenceRow,
    AlignmentsWithoutReferenceSequences,
    AlignmentsWithoutAVp1Annotation,
    AlignmentsWithUnexpectedVp1Intervals,
    GenomesWithUnexpectedCdsIntervals,
    GenomesWithUnexpectedMaturePeptideIntervals,
    GenomesWithoutMaturePeptideAnnotations,
    GenomesWithNoCorrespondingFiles,
}

impl NonFatalError {
    pub fn description(&self) -> &'static str {
        match self {
            NonFatalError::GenomesWithoutAnnotations => "no annotations",
            NonFatalError::ContigsWithoutACdsAnnotation
            | NonFatalError::GenomesWithoutACdsAnnotation => "no CDS annotation",
            NonFatalError::ContigsWithUnexpectedCdsIntervals | NonFatalError::GenomesWithUnexpectedCdsIntervals => {
                "an unexpected number of \"CDS\" annotation intervals (# != 1)"
            }
            NonFatalError::GenomesWithoutAVp1Annotation
            | NonFatalError::ContigsWithoutAVp1Annotation => "no VP1 annotation",
            NonFatalError::GenomesWithUnexpectedVp1Intervals
            | NonFatalError::ContigsWithUnexpectedVp1Intervals
            | NonFatalError::AlignmentsWithUnexpectedVp1Intervals => {
                "an unexpected number of \"VP1\" annotation intervals (# != 1)"
            }
            NonFatalError::ContigsWithoutAConsensusRow => "no consensus row",
            NonFatalError::ContigsWithoutAReferenceRow => "no reference row",
            NonFatalError::AlignmentsWithoutReferenceSequences => "no reference sequence",
            NonFatalError::AlignmentsWithoutAVp1Annotation => "no \"VP1\" annotation",
            NonFatalError::GenomesWithUnexpectedMaturePeptideIntervals => {
                "an unexpected number of \"mat_peptide\" annotation intervals (# != 1)"
            }
            NonFatalError::GenomesWithoutMaturePeptideAnnotations => "no \"mat_peptide\" annotations",
            NonFatalError::GenomesWithNoCorrespondingFiles => {
                "no corresponding files within the \"Final Assemblies\" folder, but were found within an alignment"
            }
        }
    }

    pub fn category(&self) -> NonFatalErrorCategory {
        match self {
            NonFatalError::ContigsWithoutACdsAnnotation
            | NonFatalError::ContigsWithUnexpectedCdsIntervals
            | NonFatalError::ContigsWithoutAVp1Annotation
            | NonFatalError::ContigsWithUnexpectedVp1Intervals
            | NonFatalError::ContigsWithoutAConsensusRow
            | NonFatalError::ContigsWithoutAReferenceRow => NonFatalErrorCategory::Contig,
            NonFatalError::AlignmentsWithoutReferenceSequences
            | NonFatalError::AlignmentsWithoutAVp1Annotation
            | NonFatalError::AlignmentsWithUnexpectedVp1Intervals => NonFatalErrorCategory::Alignment,
            _ => NonFatalErrorCategory::Genome,
        }
    }
}

impl fmt::Display for NonFatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with {}", self.category().name(), self.description())
    }
}

/// Append-only multiset of (error, genome name) pairs.
///
/// Every task owns one; the orchestrator merges them once the phase has joined,
/// so nothing here needs to be shared across threads.
#[derive(Debug, Default, Clone, Serialize)]
pub struct NonFatalErrors {
    entries: BTreeMap<NonFatalError, Vec<String>>,
}

impl NonFatalErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, error: NonFatalError, name: impl Into<String>) {
        self.entries.entry(error).or_default().push(name.into());
    }

    pub fn merge(&mut self, other: NonFatalErrors) {
        for (error, names) in other.entries {
            self.entries.entry(error).or_default().extend(names);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn names(&self, error: NonFatalError) -> &[String] {
        self.entries.get(&error).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NonFatalError, &Vec<String>)> {
        self.entries.iter()
    }

    /// Names sort within each block so the report does not depend on task completion order.
    pub fn report(&self) -> String {
        self.entries
            .iter()
            .map(|(error, names)| {
                let mut names = names.clone();
                names.sort();
                format!(
                    "The following {} had {}:\n{}",
                    error.category().name(),
                    error.description(),
                    names.join("\n")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
