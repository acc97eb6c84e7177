// sequence.rs - FASTA records and read-alignment (contig) loading

use crate::core::coverage::ColumnCoverage;
use crate::core::interval::is_gap;
use crate::error::{FinalizeError, Result};
use bio::io::fasta;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// One FASTA row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            description: None,
            sequence: sequence.into(),
        }
    }

    /// Full header text: the id, plus the description when there is one
    pub fn name(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.id, description),
            None => self.id.clone(),
        }
    }

    /// Match on the id or the full header
    pub fn is_named(&self, name: &str) -> bool {
        self.id == name || self.name() == name
    }
}

/// Read every record from a FASTA stream; `source` names the stream in errors
pub fn parse_fasta<R: Read>(reader: R, source: &Path) -> Result<Vec<SequenceRecord>> {
    fasta::Reader::new(reader)
        .records()
        .map(|record| {
            let record = record.map_err(|e| FinalizeError::parse(source, format!("invalid FASTA record: {}", e)))?;
            Ok(SequenceRecord {
                id: record.id().to_string(),
                description: record.desc().map(str::to_string),
                sequence: record.seq().to_vec(),
            })
        })
        .collect()
}

pub fn read_fasta(path: &Path) -> Result<Vec<SequenceRecord>> {
    let file = File::open(path).map_err(|e| FinalizeError::io(path, e))?;
    parse_fasta(BufReader::new(file), path)
}

/// Read a FASTA file that must hold exactly one record
pub fn read_single_fasta(path: &Path) -> Result<SequenceRecord> {
    let mut records = read_fasta(path)?;
    if records.len() != 1 {
        return Err(FinalizeError::parse(
            path,
            format!("expected exactly one sequence, found {}", records.len()),
        ));
    }
    records
        .pop()
        .ok_or_else(|| FinalizeError::parse(path, "expected exactly one sequence"))
}

pub fn write_fasta<W: Write>(writer: W, records: &[SequenceRecord], target: &Path) -> Result<()> {
    let mut writer = fasta::Writer::new(writer);
    for record in records {
        writer
            .write(&record.id, record.description.as_deref(), &record.sequence)
            .map_err(|e| FinalizeError::io(target, e))?;
    }
    writer.flush().map_err(|e| FinalizeError::io(target, e))
}

/// Why a read alignment could not be split into its rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContigIssue {
    MissingConsensusRow,
    /// The named reference row is absent, or no row besides the consensus exists
    MissingReferenceRow,
}

/// Reads aligned against a reference, with a consensus row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigAlignment {
    pub reference: Vec<u8>,
    pub consensus: Vec<u8>,
    /// Non-gap rows per column, consensus row excluded, reference row included
    pub depth: Vec<usize>,
}

impl ContigAlignment {
    /// Build from aligned rows. The reference row is `reference_row` when given,
    /// otherwise the first row that is not the consensus.
    pub fn from_rows(
        rows: &[SequenceRecord],
        reference_row: Option<&str>,
        consensus_row: &str,
    ) -> std::result::Result<Self, ContigIssue> {
        let consensus_index = rows
            .iter()
            .position(|row| row.is_named(consensus_row))
            .ok_or(ContigIssue::MissingConsensusRow)?;
        let consensus = rows[consensus_index].sequence.clone();

        let reference = match reference_row {
            Some(name) => rows.iter().enumerate().find(|(i, row)| *i != consensus_index && row.is_named(name)),
            None => rows.iter().enumerate().find(|(i, _)| *i != consensus_index),
        }
        .map(|(_, row)| row.sequence.clone())
        .ok_or(ContigIssue::MissingReferenceRow)?;

        let columns = rows.iter().map(|row| row.sequence.len()).max().unwrap_or(0);
        let mut depth = vec![0usize; columns];
        for (_, row) in rows.iter().enumerate().filter(|(i, _)| *i != consensus_index) {
            for (column, &base) in row.sequence.iter().enumerate() {
                if !is_gap(base) {
                    depth[column] += 1;
                }
            }
        }

        Ok(Self {
            reference,
            consensus,
            depth,
        })
    }
}

impl ColumnCoverage for ContigAlignment {
    fn column_count(&self) -> usize {
        self.depth.len()
    }

    fn depth(&self, column: usize) -> usize {
        self.depth.as_slice().depth(column)
    }
}
