// lib.rs - polioqc library root

//! # polioqc - Run finalization for poliovirus NGS assemblies
//!
//! Takes the per-sample consensus sequences, read alignments and reference
//! alignments of one sequencing run and produces the release tables: a QC grade
//! per genome, a recombination screen of every whole-genome alignment row, and
//! the closest reference genotype of every VP1 excerpt.
//!
//! ## Features
//!
//! - **Coverage & gaps**: CDS/VP1 minimum read depth, `N` counts, partial-CDS notes
//! - **Recombination**: Welch t-test of SNP spacing in VP1 against its flanks
//! - **Genotyping**: nearest panel reference over a pooled VP1 alignment
//! - **Parallel**: per-genome and per-alignment work runs on a bounded rayon pool
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use polioqc::prelude::*;
//!
//! let manifest = Manifest::from_file("run.toml")?;
//! let settings = RunSettings {
//!     run_name: "RUN7".to_string(),
//!     ..RunSettings::default()
//! };
//! let aligner = PrealignedVp1::new("vp1_alignment.fasta");
//! let output = finalize_run(&manifest, &settings, Some(&aligner))?;
//! write_outputs(&output, std::path::Path::new("final"), TableFormat::Csv, "")?;
//! # Ok::<(), polioqc::error::FinalizeError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, Config, ValidationResult};
    pub use crate::core::{finalize_run, RunOutput, RunSettings};
    pub use crate::core::{AnalysisRecord, Grade, RecombinationStatus};
    pub use crate::core::{CommandAligner, PrealignedVp1, Vp1Aligner};
    pub use crate::data::{Manifest, NameGrammar};
    pub use crate::error::{FinalizeError, NonFatalError, NonFatalErrors};
    pub use crate::output::{write_outputs, TableFormat};
}

// Re-export main types at the root level for convenience
pub use core::{AnalysisRecord, RunOutput, RunSettings};
pub use error::{FinalizeError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "polioqc v{} - QC grading, recombination screening and VP1 genotyping for poliovirus runs",
        VERSION
    )
}
