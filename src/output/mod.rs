// mod.rs - Output writers: delimited tables, non-fatal error report, run summary

pub mod tables;

use crate::core::orchestrator::RunOutput;
use crate::error::{FinalizeError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tables::Table;

pub use tables::{genotype_rows, genotype_table, qc_rows, qc_table, snp_rows, snp_table, Column};

pub const FINAL_ANALYSIS: &str = "finalAnalysis";
pub const DATABASE_DATA: &str = "databaseData";
pub const VP1_SNPS: &str = "vp1Snps";
pub const NON_FATAL_ERRORS_FILE: &str = "nonFatalErrors.txt";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Delimited text flavour of the three tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    #[default]
    Csv,
    Tsv,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Tsv => "tsv",
        }
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            TableFormat::Csv => b',',
            TableFormat::Tsv => b'\t',
        }
    }
}

impl FromStr for TableFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "tsv" => Ok(TableFormat::Tsv),
            _ => Err(format!("Unsupported output format: {}. Use: csv, tsv", value)),
        }
    }
}

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        create_dir_all(parent).map_err(|e| FinalizeError::io(parent, e))?;
    }
    Ok(())
}

/// Write the header lines of `table` followed by one line per row
pub fn write_table<R>(path: &Path, table: &Table<R>, rows: &[R], format: TableFormat) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_path(path)
        .map_err(|e| FinalizeError::io(path, e.into()))?;

    for header in table.header_lines() {
        writer
            .write_record(&header)
            .map_err(|e| FinalizeError::io(path, e.into()))?;
    }
    for row in rows {
        writer
            .write_record(table.render(row))
            .map_err(|e| FinalizeError::io(path, e.into()))?;
    }
    writer.flush().map_err(|e| FinalizeError::io(path, e))?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Files produced by [`write_outputs`]
#[derive(Debug, Clone, Default)]
pub struct WrittenOutputs {
    pub final_analysis: PathBuf,
    pub database_data: PathBuf,
    pub vp1_snps: PathBuf,
    pub non_fatal_errors: Option<PathBuf>,
    pub run_summary: PathBuf,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    tool: &'static str,
    version: &'static str,
    generated: chrono::DateTime<chrono::Utc>,
    command_line: &'a str,
    run_name: &'a str,
    samples: usize,
    genomes: usize,
    samples_without_data: usize,
    genotyped: usize,
    vp1_snps: usize,
    non_fatal_errors: BTreeMap<String, Vec<String>>,
}

fn summarize<'a>(output: &'a RunOutput, command_line: &'a str, snp_count: usize) -> RunSummary<'a> {
    let non_fatal_errors = output
        .non_fatal_errors
        .iter()
        .map(|(error, names)| {
            let mut names = names.clone();
            names.sort();
            (error.to_string(), names)
        })
        .collect();
    RunSummary {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        generated: chrono::Utc::now(),
        command_line,
        run_name: &output.run_name,
        samples: output.samples.len(),
        genomes: output.records().count(),
        samples_without_data: output.samples.iter().filter(|s| s.records.is_empty()).count(),
        genotyped: output.genotypes.len(),
        vp1_snps: snp_count,
        non_fatal_errors,
    }
}

/// Write every output of a finished run into `output_dir`
pub fn write_outputs(
    output: &RunOutput,
    output_dir: &Path,
    format: TableFormat,
    command_line: &str,
) -> Result<WrittenOutputs> {
    create_dir_all(output_dir).map_err(|e| FinalizeError::io(output_dir, e))?;
    let table_path = |stem: &str| output_dir.join(format!("{}.{}", stem, format.extension()));

    let final_analysis = table_path(FINAL_ANALYSIS);
    write_table(&final_analysis, &qc_table(), &qc_rows(output), format)?;

    let database_data = table_path(DATABASE_DATA);
    write_table(
        &database_data,
        &genotype_table(&output.run_name),
        &genotype_rows(output),
        format,
    )?;

    let vp1_snps = table_path(VP1_SNPS);
    let snps = snp_rows(output);
    write_table(&vp1_snps, &snp_table(), &snps, format)?;

    let non_fatal_errors = if output.non_fatal_errors.is_empty() {
        None
    } else {
        let path = output_dir.join(NON_FATAL_ERRORS_FILE);
        fs::write(&path, output.non_fatal_errors.report() + "\n").map_err(|e| FinalizeError::io(&path, e))?;
        Some(path)
    };

    let run_summary = output_dir.join(RUN_SUMMARY_FILE);
    let summary = summarize(output, command_line, snps.len());
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| FinalizeError::parse(&run_summary, e.to_string()))?;
    fs::write(&run_summary, json).map_err(|e| FinalizeError::io(&run_summary, e))?;

    Ok(WrittenOutputs {
        final_analysis,
        database_data,
        vp1_snps,
        non_fatal_errors,
        run_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orchestrator::SampleOutcome;
    use crate::core::record::AnalysisRecord;
    use crate::error::{NonFatalError, NonFatalErrors};
    use tempfile::TempDir;

    fn sample_output() -> RunOutput {
        let mut errors = NonFatalErrors::new();
        errors.record(NonFatalError::GenomesWithoutAnnotations, "0123456789_AB12 - PV2");
        RunOutput {
            run_name: "RUN7".to_string(),
            samples: vec![SampleOutcome {
                sample: "0123456789_AB12".to_string(),
                records: vec![AnalysisRecord::new("0123456789_AB12", "PV2")],
            }],
            genotypes: Vec::new(),
            non_fatal_errors: errors,
        }
    }

    #[test]
    fn test_table_format_parsing() {
        assert_eq!("TSV".parse::<TableFormat>(), Ok(TableFormat::Tsv));
        assert_eq!(TableFormat::Csv.extension(), "csv");
        assert!("xlsx".parse::<TableFormat>().is_err());
    }

    #[test]
    fn test_write_outputs_tsv() {
        let dir = TempDir::new().unwrap();
        let written = write_outputs(&sample_output(), dir.path(), TableFormat::Tsv, "polioqc -m run.toml").unwrap();

        let qc = fs::read_to_string(&written.final_analysis).unwrap();
        let lines: Vec<&str> = qc.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Color Result\tAnalysis\tBarcode"));
        assert!(lines[1].starts_with("Key\tKey\tNumber\tName"));
        assert!(lines[2].contains("0123456789_AB12\tPV2"));

        let snps = fs::read_to_string(&written.vp1_snps).unwrap();
        assert_eq!(snps.trim_end(), "SAMPLE_NAME\tTYPE\tREFERENCE_NAME\tPOSITION\tREF\tALT\tCONCATENATION");

        let report = fs::read_to_string(written.non_fatal_errors.unwrap()).unwrap();
        assert!(report.contains("0123456789_AB12 - PV2"));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written.run_summary).unwrap()).unwrap();
        assert_eq!(summary["run_name"], "RUN7");
        assert_eq!(summary["genomes"], 1);
        assert_eq!(summary["command_line"], "polioqc -m run.toml");
    }

    #[test]
    fn test_no_error_file_when_clean() {
        let dir = TempDir::new().unwrap();
        let mut output = sample_output();
        output.non_fatal_errors = NonFatalErrors::new();
        let written = write_outputs(&output, dir.path(), TableFormat::Csv, "").unwrap();
        assert!(written.non_fatal_errors.is_none());
        assert!(!dir.path().join(NON_FATAL_ERRORS_FILE).exists());
        assert!(dir.path().join("databaseData.csv").exists());
    }
}
