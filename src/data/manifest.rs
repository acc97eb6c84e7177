// manifest.rs - Run manifest: every input document of one sequencing run

use crate::core::record::BlastHit;
use crate::error::{FinalizeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_consensus_row() -> String {
    "Consensus".to_string()
}

/// A `... - Final Consensus` document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsensusEntry {
    pub name: String,
    /// Single-record FASTA
    pub fasta: PathBuf,
    pub annotations: Option<PathBuf>,
}

/// A `... - Final Contig` read alignment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContigEntry {
    pub name: String,
    pub fasta: PathBuf,
    /// Annotations of the reference row
    pub annotations: Option<PathBuf>,
    #[serde(default = "default_consensus_row")]
    pub consensus_row: String,
    pub reference_row: Option<String>,
    /// Assembler-reported mean coverage, used instead of the computed one
    pub average_coverage: Option<f64>,
    /// Assembler-reported percentage of the reference covered by reads
    pub percent_covered: Option<f64>,
}

/// Whole-genome or VP1 alignment of consensus sequences against a reference
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlignmentEntry {
    pub name: String,
    pub fasta: PathBuf,
    /// Annotations of the reference row
    pub annotations: Option<PathBuf>,
    pub reference_row: Option<String>,
}

impl AlignmentEntry {
    /// Names ending in `VP1` (any case, trailing whitespace allowed)
    pub fn is_vp1(&self) -> bool {
        self.name.trim_end().to_ascii_lowercase().ends_with("vp1")
    }
}

/// One BLAST result folder inside a sample folder
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlastFolderEntry {
    /// Sample folder name, e.g. `0123456789-AB12`
    pub sample: String,
    /// Type folder name, e.g. `AY184219 - Final Contig BLAST`
    pub label: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub hits: Vec<BlastHit>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Manifest {
    pub run_name: Option<String>,
    /// Reference panel FASTA for genotyping
    pub genotype_panel: Option<PathBuf>,
    /// Pre-computed VP1 alignment
    pub vp1_alignment: Option<PathBuf>,
    #[serde(default)]
    pub sample_folders: Vec<String>,
    #[serde(default)]
    pub consensus: Vec<ConsensusEntry>,
    #[serde(default)]
    pub contig: Vec<ContigEntry>,
    #[serde(default)]
    pub alignment: Vec<AlignmentEntry>,
    #[serde(default)]
    pub blast_folder: Vec<BlastFolderEntry>,
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

fn resolve_optional(base: &Path, path: &mut Option<PathBuf>) {
    if let Some(path) = path {
        resolve(base, path);
    }
}

impl Manifest {
    /// Load a manifest; relative paths are taken from the manifest's directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FinalizeError::io(path, e))?;
        let mut manifest = Self::from_toml(&content, path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.resolve_paths(base);
        log::info!(
            "Loaded manifest {}: {} consensus, {} contig, {} alignment documents",
            path.display(),
            manifest.consensus.len(),
            manifest.contig.len(),
            manifest.alignment.len()
        );
        Ok(manifest)
    }

    pub fn from_toml(content: &str, source: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| FinalizeError::parse(source, e.to_string()))
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        resolve_optional(base, &mut self.genotype_panel);
        resolve_optional(base, &mut self.vp1_alignment);
        for entry in &mut self.consensus {
            resolve(base, &mut entry.fasta);
            resolve_optional(base, &mut entry.annotations);
        }
        for entry in &mut self.contig {
            resolve(base, &mut entry.fasta);
            resolve_optional(base, &mut entry.annotations);
        }
        for entry in &mut self.alignment {
            resolve(base, &mut entry.fasta);
            resolve_optional(base, &mut entry.annotations);
        }
    }
}
