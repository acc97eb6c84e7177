// mod.rs - Core logic module

pub mod aligner;
pub mod coverage;
pub mod genotype;
pub mod grading;
pub mod interval;
pub mod orchestrator;
pub mod recombination;
pub mod record;
pub mod snp;

// Re-export main types for convenience
pub use aligner::{CommandAligner, PrealignedVp1, Vp1Aligner};
pub use genotype::{assign_genotypes, GenotypeAssignment, GenotypedSample};
pub use grading::Grade;
pub use interval::{Annotation, AnnotationSet, ColumnRange, Interval, Region};
pub use orchestrator::{finalize_run, RunOutput, RunSettings, SampleOutcome};
pub use recombination::RecombinationStatus;
pub use record::{AnalysisRecord, BlastHit};
pub use snp::SingleNucleotidePolymorphism;
