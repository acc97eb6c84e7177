// aligner.rs - VP1 multiple-sequence alignment collaborators

use crate::data::sequence::{parse_fasta, read_fasta, write_fasta, SequenceRecord};
use crate::error::{FinalizeError, Result};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Aligns the pooled VP1 excerpts together with the genotype panel
pub trait Vp1Aligner: Send + Sync {
    fn name(&self) -> &str;

    /// Return the aligned rows; ids must be preserved
    fn align(&self, records: &[SequenceRecord]) -> Result<Vec<SequenceRecord>>;
}

/// An alignment produced ahead of time; the input rows are ignored
#[derive(Debug, Clone)]
pub struct PrealignedVp1 {
    pub path: PathBuf,
}

impl PrealignedVp1 {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Vp1Aligner for PrealignedVp1 {
    fn name(&self) -> &str {
        "prealigned"
    }

    fn align(&self, records: &[SequenceRecord]) -> Result<Vec<SequenceRecord>> {
        let aligned = read_fasta(&self.path)?;
        log::info!(
            "Using pre-computed VP1 alignment {} ({} rows, {} excerpts submitted)",
            self.path.display(),
            aligned.len(),
            records.len()
        );
        Ok(aligned)
    }
}

/// Runs an external aligner on a temporary FASTA and reads the alignment from stdout,
/// e.g. `mafft --auto input.fasta`
#[derive(Debug, Clone)]
pub struct CommandAligner {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandAligner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn failure(&self, message: impl Into<String>) -> FinalizeError {
        FinalizeError::Aligner {
            aligner: self.program.clone(),
            message: message.into(),
        }
    }
}

impl Vp1Aligner for CommandAligner {
    fn name(&self) -> &str {
        &self.program
    }

    fn align(&self, records: &[SequenceRecord]) -> Result<Vec<SequenceRecord>> {
        let mut input = tempfile::Builder::new()
            .prefix("vp1_excerpts_")
            .suffix(".fasta")
            .tempfile()
            .map_err(|e| self.failure(format!("cannot create temporary input: {}", e)))?;
        let input_path = input.path().to_path_buf();
        write_fasta(input.as_file_mut(), records, &input_path)?;

        log::info!("Aligning {} VP1 rows with {}", records.len(), self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&input_path)
            .output()
            .map_err(|e| self.failure(format!("cannot start: {}", e)))?;
        if !output.status.success() {
            return Err(self.failure(format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let aligned = parse_fasta(Cursor::new(output.stdout), Path::new(&self.program))?;
        if aligned.len() != records.len() {
            return Err(self.failure(format!(
                "returned {} rows for {} input sequences",
                aligned.len(),
                records.len()
            )));
        }
        Ok(aligned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_prealigned_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, ">R1\nAA-A\n>input|S|PV1\nAAAT").unwrap();
        let aligner = PrealignedVp1::new(file.path());
        let rows = aligner.align(&[]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sequence, b"AA-A".to_vec());
        assert_eq!(aligner.name(), "prealigned");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_aligner_round_trips_through_cat() {
        let aligner = CommandAligner::new("cat", Vec::new());
        let records = vec![SequenceRecord::new("R1", "AAAA"), SequenceRecord::new("input|S|PV1", "AAAT")];
        let rows = aligner.align(&records).unwrap();
        assert_eq!(rows, records);
    }

    #[test]
    fn test_command_aligner_reports_missing_program() {
        let aligner = CommandAligner::new("definitely-not-an-aligner-xyz", Vec::new());
        let err = aligner.align(&[SequenceRecord::new("R1", "A")]).unwrap_err();
        assert!(err.to_string().contains("definitely-not-an-aligner-xyz"));
    }
}
