// tables.rs - Column definitions for the QC, genotype and VP1 SNP tables

use crate::core::genotype::GenotypedSample;
use crate::core::orchestrator::RunOutput;
use crate::core::record::{AnalysisRecord, BlastHit};
use crate::core::snp::SingleNucleotidePolymorphism;
use crate::data::names;

/// Type cell of a sample that produced no genome
pub const NO_DATA_TYPE: &str = "Insufficient amount of viral data";

fn decimal(value: f64) -> String {
    format!("{:.2}", value)
}

/// One output column: its title lines and how to render a row
pub struct Column<R> {
    pub titles: Vec<&'static str>,
    extractor: Box<dyn Fn(&R) -> String + Send + Sync>,
}

impl<R> Column<R> {
    pub fn new<F>(titles: &[&'static str], extractor: F) -> Self
    where
        F: Fn(&R) -> String + Send + Sync + 'static,
    {
        Self {
            titles: titles.to_vec(),
            extractor: Box::new(extractor),
        }
    }

    pub fn render(&self, row: &R) -> String {
        (self.extractor)(row)
    }
}

/// Ordered columns; every column has the same number of title lines
pub struct Table<R> {
    pub columns: Vec<Column<R>>,
}

impl<R> Table<R> {
    pub fn new(columns: Vec<Column<R>>) -> Self {
        Self { columns }
    }

    pub fn header_line_count(&self) -> usize {
        self.columns.iter().map(|c| c.titles.len()).max().unwrap_or(0)
    }

    pub fn header_lines(&self) -> Vec<Vec<&'static str>> {
        (0..self.header_line_count())
            .map(|line| {
                self.columns
                    .iter()
                    .map(|column| column.titles.get(line).copied().unwrap_or(""))
                    .collect()
            })
            .collect()
    }

    pub fn render(&self, row: &R) -> Vec<String> {
        self.columns.iter().map(|column| column.render(row)).collect()
    }
}

// ============================================================================
// QC TABLE
// ============================================================================

/// A QC table row: a measured genome, or a sample folder with nothing in it
#[derive(Debug, Clone, Copy)]
pub enum QcRow<'a> {
    Genome(&'a AnalysisRecord),
    NoData { sample: &'a str },
}

impl<'a> QcRow<'a> {
    fn sample(&self) -> &'a str {
        match *self {
            QcRow::Genome(record) => &record.sample,
            QcRow::NoData { sample } => sample,
        }
    }

    /// Render `f` for a genome row, `placeholder` otherwise
    fn genome_or(&self, placeholder: &str, f: impl Fn(&AnalysisRecord) -> String) -> String {
        match *self {
            QcRow::Genome(record) => f(record),
            QcRow::NoData { .. } => placeholder.to_string(),
        }
    }
}

/// Rendering of a BLAST-derived number; empty when no hit was resolved
fn hit_decimal(record: &AnalysisRecord, value: impl Fn(&BlastHit) -> f64) -> String {
    record.best_hit.as_ref().map(|hit| decimal(value(hit))).unwrap_or_default()
}

pub fn qc_table<'a>() -> Table<QcRow<'a>> {
    Table::new(vec![
        Column::new(&["Color Result", "Key"], |row: &QcRow| {
            row.genome_or("RED-REDO", |record| record.grade().label().to_string())
        }),
        Column::new(&["Analysis", "Key"], |_: &QcRow| String::new()),
        Column::new(&["Barcode", "Number"], |_: &QcRow| String::new()),
        Column::new(&["Sample", "Name"], |row: &QcRow| row.sample().to_string()),
        Column::new(&["Type", ""], |row: &QcRow| {
            row.genome_or(NO_DATA_TYPE, |record| record.genome_type.clone())
        }),
        Column::new(&["F.C.", "Length"], |row: &QcRow| {
            row.genome_or("", |record| record.full_length.to_string())
        }),
        Column::new(&["Avg.", "Coverage"], |row: &QcRow| {
            row.genome_or("", |record| decimal(record.average_coverage))
        }),
        Column::new(&["% F.C. Covered", "by Reads (i.e. gaps)"], |row: &QcRow| {
            row.genome_or("", |record| decimal(record.percent_covered_by_reads))
        }),
        Column::new(&["% Pairwise", "Identity"], |row: &QcRow| {
            row.genome_or("", |record| hit_decimal(record, |hit| hit.percent_pairwise_identity))
        }),
        Column::new(&["% Query", "Coverage"], |row: &QcRow| {
            row.genome_or("", |record| hit_decimal(record, |hit| hit.percent_query_coverage))
        }),
        Column::new(&["Top BLAST Hit", ""], |row: &QcRow| {
            row.genome_or("", |record| {
                record.best_hit.as_ref().map(|hit| hit.description.clone()).unwrap_or_default()
            })
        }),
        Column::new(&["Accession", "Number"], |row: &QcRow| {
            row.genome_or("", |record| {
                record.best_hit.as_ref().map(|hit| hit.accession.clone()).unwrap_or_default()
            })
        }),
        Column::new(&["Notes", ""], |row: &QcRow| row.genome_or("", |record| record.notes())),
        Column::new(&["VP1 SNP", ""], |row: &QcRow| {
            row.genome_or("-", |record| record.vp1_snp_summary())
        }),
    ])
}

/// Every genome in output order; samples without genomes get one placeholder row
pub fn qc_rows(output: &RunOutput) -> Vec<QcRow<'_>> {
    output
        .samples
        .iter()
        .flat_map(|outcome| {
            if outcome.records.is_empty() {
                vec![QcRow::NoData {
                    sample: &outcome.sample,
                }]
            } else {
                outcome.records.iter().map(QcRow::Genome).collect()
            }
        })
        .collect()
}

// ============================================================================
// GENOTYPE TABLE
// ============================================================================

/// A genotyped VP1 excerpt with the QC record of its genome, when there is one
#[derive(Debug, Clone, Copy)]
pub struct GenotypeRow<'a> {
    pub genotyped: &'a GenotypedSample,
    pub record: Option<&'a AnalysisRecord>,
}

impl GenotypeRow<'_> {
    fn vp1_gap_count(&self) -> Option<usize> {
        self.record.and_then(|record| record.vp1_gap_count)
    }
}

pub fn genotype_table<'a>(run_name: &str) -> Table<GenotypeRow<'a>> {
    let run_name = run_name.to_string();
    Table::new(vec![
        Column::new(&["DB_Name"], move |row: &GenotypeRow| {
            names::database_name(&run_name, &row.genotyped.sample, &row.genotyped.genome_type)
        }),
        Column::new(&["Genotype_Seq"], |row: &GenotypeRow| {
            row.genotyped.assignment.closest_reference.clone()
        }),
        Column::new(&["PerID"], |row: &GenotypeRow| {
            format!("{:.2}%", row.genotyped.assignment.identity * 100.0)
        }),
        Column::new(&["Ntdiff_ofGENO"], |row: &GenotypeRow| {
            row.genotyped.assignment.differences.to_string()
        }),
        Column::new(&["VP1_Gap_Count"], |row: &GenotypeRow| {
            row.vp1_gap_count().map_or_else(|| "-".to_string(), |gaps| gaps.to_string())
        }),
        // N positions count as differences from the genotype, so they are taken back out
        Column::new(&["VP1_SNP_Count"], |row: &GenotypeRow| {
            row.vp1_gap_count()
                .map(|gaps| (row.genotyped.assignment.differences as i64 - gaps as i64).to_string())
                .unwrap_or_default()
        }),
    ])
}

pub fn genotype_rows(output: &RunOutput) -> Vec<GenotypeRow<'_>> {
    output
        .genotypes
        .iter()
        .map(|genotyped| GenotypeRow {
            genotyped,
            record: output.record(&genotyped.sample, &genotyped.genome_type),
        })
        .collect()
}

// ============================================================================
// VP1 SNP TABLE
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct SnpRow<'a> {
    pub record: &'a AnalysisRecord,
    pub snp: &'a SingleNucleotidePolymorphism,
}

pub fn snp_table<'a>() -> Table<SnpRow<'a>> {
    Table::new(vec![
        Column::new(&["SAMPLE_NAME"], |row: &SnpRow| row.record.sample.clone()),
        Column::new(&["TYPE"], |row: &SnpRow| row.record.genome_type.clone()),
        Column::new(&["REFERENCE_NAME"], |row: &SnpRow| row.snp.reference.clone()),
        Column::new(&["POSITION"], |row: &SnpRow| row.snp.position.to_string()),
        Column::new(&["REF"], |row: &SnpRow| row.snp.ref_base.to_string()),
        Column::new(&["ALT"], |row: &SnpRow| row.snp.alt_base.to_string()),
        Column::new(&["CONCATENATION"], |row: &SnpRow| row.snp.concatenation()),
    ])
}

pub fn snp_rows(output: &RunOutput) -> Vec<SnpRow<'_>> {
    output
        .records()
        .flat_map(|record| {
            record
                .vp1_snps
                .iter()
                .flatten()
                .map(move |snp| SnpRow { record, snp })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::genotype::GenotypeAssignment;
    use crate::core::orchestrator::SampleOutcome;
    use crate::error::NonFatalErrors;

    fn measured_record() -> AnalysisRecord {
        let mut record = AnalysisRecord::new("0123456789_AB12", "PV1");
        record.full_length = 7400;
        record.average_coverage = 812.456;
        record.percent_covered_by_reads = 99.5;
        record.cds_gap_count = Some(0);
        record.cds_minimum_coverage = Some(40);
        record.vp1_minimum_coverage = Some(55);
        record.vp1_gap_count = Some(1);
        record.vp1_snps = Some(vec![SingleNucleotidePolymorphism {
            reference: "AY184219".to_string(),
            ref_base: 'A',
            alt_base: 'G',
            position: 12,
        }]);
        record.best_hit = Some(BlastHit {
            accession: "AY184219".to_string(),
            description: "Human poliovirus 1 strain Sabin 1, complete genome".to_string(),
            grade: 99.0,
            percent_pairwise_identity: 99.876,
            percent_query_coverage: 100.0,
        });
        record
    }

    fn output_with(records: Vec<AnalysisRecord>, genotypes: Vec<GenotypedSample>) -> RunOutput {
        RunOutput {
            run_name: "RUN7".to_string(),
            samples: vec![
                SampleOutcome {
                    sample: "0123456789_AB12".to_string(),
                    records,
                },
                SampleOutcome {
                    sample: "9876543210_CD34".to_string(),
                    records: Vec::new(),
                },
            ],
            genotypes,
            non_fatal_errors: NonFatalErrors::new(),
        }
    }

    #[test]
    fn test_qc_table_headers() {
        let table = qc_table();
        let headers = table.header_lines();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].len(), 14);
        assert_eq!(headers[0][0], "Color Result");
        assert_eq!(headers[1][7], "by Reads (i.e. gaps)");
        assert_eq!(headers[1][4], "");
    }

    #[test]
    fn test_qc_rows_and_placeholder() {
        let output = output_with(vec![measured_record()], Vec::new());
        let table = qc_table();
        let rows: Vec<Vec<String>> = qc_rows(&output).iter().map(|row| table.render(row)).collect();
        assert_eq!(rows.len(), 2);

        let genome = &rows[0];
        assert_eq!(genome[3], "0123456789_AB12");
        assert_eq!(genome[4], "PV1");
        assert_eq!(genome[5], "7400");
        assert_eq!(genome[6], "812.46");
        assert_eq!(genome[8], "99.88");
        assert_eq!(genome[11], "AY184219");
        assert_eq!(genome[13], "2 = 1 (Gaps) + 1 (SNPs)");

        let placeholder = &rows[1];
        assert_eq!(placeholder[0], "RED-REDO");
        assert_eq!(placeholder[3], "9876543210_CD34");
        assert_eq!(placeholder[4], NO_DATA_TYPE);
        assert_eq!(placeholder[13], "-");
        for (index, cell) in placeholder.iter().enumerate() {
            if ![0, 3, 4, 13].contains(&index) {
                assert_eq!(cell, "", "column {} should be empty", index);
            }
        }
    }

    #[test]
    fn test_genotype_table() {
        let genotyped = GenotypedSample {
            sample: "0123456789_AB12".to_string(),
            genome_type: "PV1".to_string(),
            assignment: GenotypeAssignment {
                closest_reference: "AY184219 Sabin 1".to_string(),
                differences: 5,
                identity: 0.99457,
            },
        };
        let mut unknown = genotyped.clone();
        unknown.genome_type = "PV3".to_string();
        let output = output_with(vec![measured_record()], vec![genotyped]);
        let table = genotype_table("RUN7");
        let rows = genotype_rows(&output);
        assert_eq!(
            table.render(&rows[0]),
            ["RUN7_0123456789_AB12_PV1", "AY184219 Sabin 1", "99.46%", "5", "1", "4"]
        );

        let row = GenotypeRow {
            genotyped: &unknown,
            record: None,
        };
        let cells = table.render(&row);
        assert_eq!(cells[4], "-");
        assert_eq!(cells[5], "");
    }

    #[test]
    fn test_snp_table() {
        let output = output_with(vec![measured_record()], Vec::new());
        let table = snp_table();
        let rows = snp_rows(&output);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            table.render(&rows[0]),
            ["0123456789_AB12", "PV1", "AY184219", "12", "A", "G", "A12G"]
        );
        assert_eq!(table.header_line_count(), 1);
    }
}
