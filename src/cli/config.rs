// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub manifest: Option<String>,
    pub output_dir: Option<String>,
    pub run_name: Option<String>,
    pub format: Option<String>,

    // Performance
    pub threads: Option<usize>,

    // VP1 genotyping
    pub aligner: Option<String>,
    pub aligner_program: Option<String>,
    pub aligner_args: Option<Vec<String>>,
    pub vp1_alignment: Option<String>,
    pub genotype_panel: Option<String>,

    // Reference genome accession → types it may stand for
    pub reference_types: Option<BTreeMap<String, Vec<String>>>,

    // Flags
    pub no_progress: Option<bool>,
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# polioqc.toml - Configuration file for polioqc
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Run manifest listing every consensus, contig, alignment and BLAST folder
manifest = "/path/to/run.toml"

# Directory receiving finalAnalysis, databaseData, vp1Snps and the reports
output_dir = "final"

# Shortened run name used in database names (defaults to the manifest's run_name)
# run_name = "RUN7"

# Table format: csv, tsv
format = "csv"

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
threads = 8

# =============================================================================
# VP1 GENOTYPING
# =============================================================================

# VP1 aligner: prealigned (read vp1_alignment) or command (run an external aligner)
aligner = "prealigned"

# Pre-computed alignment of the sample VP1 excerpts plus the reference panel
# vp1_alignment = "vp1_alignment.fasta"

# External aligner, invoked as: <program> <args...> <input.fasta>
# aligner_program = "mafft"
# aligner_args = ["--auto", "--quiet"]

# Reference panel appended to the excerpts before alignment
# genotype_panel = "vp1_panel.fasta"

# =============================================================================
# REFERENCE GENOMES
# =============================================================================

# Types each reference accession may stand for when resolving BLAST folders
[reference_types]
AY184219 = ["PV1"]
AY184220 = ["PV2", "nOPV2"]
AY184221 = ["PV3"]
MZ245455 = ["nOPV2"]
nOPV2 = ["nOPV2"]
"#
        .to_string()
    }
}
