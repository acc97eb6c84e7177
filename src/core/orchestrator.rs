// orchestrator.rs - Run finalization: per-genome analysis, alignment passes, genotyping

use crate::core::aligner::Vp1Aligner;
use crate::core::coverage::{
    consensus_stats, contig_window_coverage, partial_cds_note, reference_coverage, row_gap_summary, vp1_excerpt,
};
use crate::core::genotype::{assign_genotypes, GenotypedSample};
use crate::core::interval::{AnnotationIssue, AnnotationSet};
use crate::core::recombination::{detect_recombination, recombination_windows, RecombinationStatus};
use crate::core::record::{best_hit, AnalysisRecord, BlastHit};
use crate::core::snp::{call_region_snps, RegionSnpCall};
use crate::data::annotation::load_optional_annotations;
use crate::data::manifest::{AlignmentEntry, ConsensusEntry, ContigEntry, Manifest};
use crate::data::names::{self, NameGrammar, NOPV2_REFERENCE_NAMES};
use crate::data::resolve::{TypeResolution, TypeResolver};
use crate::data::sequence::{read_fasta, read_single_fasta, ContigAlignment, ContigIssue, SequenceRecord};
use crate::error::{FinalizeError, NonFatalError, NonFatalErrors, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// Knobs for one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Shortened run name used in database names
    pub run_name: String,
    /// Worker threads; `None` uses rayon's default
    pub threads: Option<usize>,
    /// Reference genome accession → types it may stand for
    pub reference_types: BTreeMap<String, Vec<String>>,
    pub show_progress: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            run_name: String::new(),
            threads: None,
            reference_types: names::default_reference_types(),
            show_progress: false,
        }
    }
}

/// All records of one sample; no records means the sample folder held no usable data
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    pub sample: String,
    pub records: Vec<AnalysisRecord>,
}

/// Everything a finished run produced, already in output order
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub run_name: String,
    pub samples: Vec<SampleOutcome>,
    pub genotypes: Vec<GenotypedSample>,
    pub non_fatal_errors: NonFatalErrors,
}

impl RunOutput {
    pub fn record(&self, sample: &str, genome_type: &str) -> Option<&AnalysisRecord> {
        self.samples
            .iter()
            .find(|outcome| outcome.sample == sample)?
            .records
            .iter()
            .find(|record| record.genome_type == genome_type)
    }

    pub fn records(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.samples.iter().flat_map(|outcome| outcome.records.iter())
    }
}

/// Case-insensitive first, exact spelling as the tie-breaker
fn sort_key(value: &str) -> (String, String) {
    (value.to_lowercase(), value.to_string())
}

fn progress_bar(len: usize, show: bool, message: &'static str) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message);
    pb
}

// ============================================================================
// INVENTORY
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct GenomeDocuments<'m> {
    consensus: Option<&'m ConsensusEntry>,
    contig: Option<&'m ContigEntry>,
}

/// sample → type → documents
type Inventory<'m> = BTreeMap<String, BTreeMap<String, GenomeDocuments<'m>>>;

fn build_inventory<'m>(manifest: &'m Manifest, grammar: &NameGrammar) -> Result<Inventory<'m>> {
    let mut inventory: Inventory<'m> = BTreeMap::new();

    for folder in &manifest.sample_folders {
        match grammar.parse_sample_folder(folder) {
            Some(sample) => {
                inventory.entry(sample).or_default();
            }
            None => log::warn!("Ignoring folder '{}': not a sample folder name", folder),
        }
    }

    for entry in &manifest.consensus {
        let parsed = grammar
            .parse_document(&entry.name)
            .ok_or_else(|| FinalizeError::UnrecognizedName(entry.name.clone()))?;
        let documents = inventory
            .entry(parsed.sample())
            .or_default()
            .entry(parsed.genome_type.clone())
            .or_default();
        if documents.consensus.is_some() {
            return Err(FinalizeError::DuplicateDocument {
                kind: "consensus",
                sample: parsed.sample(),
                genome_type: parsed.genome_type,
            });
        }
        documents.consensus = Some(entry);
    }

    for entry in &manifest.contig {
        let parsed = grammar
            .parse_document(&entry.name)
            .ok_or_else(|| FinalizeError::UnrecognizedName(entry.name.clone()))?;
        let documents = inventory
            .entry(parsed.sample())
            .or_default()
            .entry(parsed.genome_type.clone())
            .or_default();
        if documents.contig.is_some() {
            return Err(FinalizeError::DuplicateDocument {
                kind: "contig",
                sample: parsed.sample(),
                genome_type: parsed.genome_type,
            });
        }
        documents.contig = Some(entry);
    }

    Ok(inventory)
}

/// Best BLAST hit per (sample, type). An ambiguous folder aborts the run.
fn collect_best_hits(
    manifest: &Manifest,
    inventory: &Inventory<'_>,
    grammar: &NameGrammar,
    reference_types: &BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<(String, String), BlastHit>> {
    let resolver = TypeResolver::new(reference_types, grammar);
    let mut hits = BTreeMap::new();

    for folder in &manifest.blast_folder {
        let Some(sample) = grammar.parse_sample_folder(&folder.sample) else {
            log::warn!("Ignoring BLAST folder under '{}': not a sample folder name", folder.sample);
            continue;
        };
        let Some(types) = inventory.get(&sample).filter(|types| !types.is_empty()) else {
            log::debug!("No genomes for sample {}; BLAST folder '{}' skipped", sample, folder.label);
            continue;
        };
        let Some(label) = grammar.parse_type_folder(&folder.label) else {
            log::debug!("'{}' is not a type folder", folder.label);
            continue;
        };
        let sample_types: BTreeSet<String> = types.keys().cloned().collect();

        match resolver.resolve(&label, &sample_types, &folder.files) {
            TypeResolution::Resolved(genome_type) => {
                if let Some(hit) = best_hit(&folder.hits) {
                    hits.insert((sample, genome_type), hit.clone());
                }
            }
            TypeResolution::Unresolved { label, candidates } if candidates.len() > 1 => {
                return Err(FinalizeError::AmbiguousType {
                    sample,
                    label,
                    candidates,
                });
            }
            TypeResolution::Unresolved { label, .. } => {
                log::warn!("BLAST folder '{}' of sample {} matches none of its types; skipped", label, sample);
            }
        }
    }
    Ok(hits)
}

// ============================================================================
// PHASE 1: PER-GENOME DOCUMENTS
// ============================================================================

struct GenomeTask<'m> {
    sample: String,
    genome_type: String,
    documents: GenomeDocuments<'m>,
}

struct GenomeAnalysis {
    record: AnalysisRecord,
    vp1_excerpt: Option<SequenceRecord>,
    errors: NonFatalErrors,
}

fn analyze_consensus(
    entry: &ConsensusEntry,
    record: &mut AnalysisRecord,
    grammar: &NameGrammar,
    errors: &mut NonFatalErrors,
) -> Result<Option<SequenceRecord>> {
    let consensus = read_single_fasta(&entry.fasta)?;
    let stats = consensus_stats(&consensus.sequence);
    record.full_length = stats.full_length;
    record.total_gap_count = stats.total_gap_count;

    let genome_name = record.genome_name();
    let annotations = load_optional_annotations(entry.annotations.as_deref())?;
    let vp1 = match annotations.find_unique("VP1") {
        Ok(interval) => interval,
        Err(AnnotationIssue::NoAnnotations) => {
            errors.record(NonFatalError::GenomesWithoutAnnotations, genome_name);
            return Ok(None);
        }
        Err(AnnotationIssue::Missing) => {
            errors.record(NonFatalError::GenomesWithoutAVp1Annotation, genome_name);
            return Ok(None);
        }
        Err(AnnotationIssue::Duplicate | AnnotationIssue::IntervalCount(_)) => {
            errors.record(NonFatalError::GenomesWithUnexpectedVp1Intervals, genome_name);
            return Ok(None);
        }
    };

    if !names::is_polio_type(&grammar.simplify_type(&record.genome_type)) {
        return Ok(None);
    }
    Ok(Some(SequenceRecord::new(
        names::vp1_excerpt_id(&record.sample, &record.genome_type),
        vp1_excerpt(&consensus.sequence, vp1),
    )))
}

fn analyze_contig(entry: &ContigEntry, record: &mut AnalysisRecord, errors: &mut NonFatalErrors) -> Result<()> {
    let rows = read_fasta(&entry.fasta)?;
    let genome_name = record.genome_name();
    let contig = match ContigAlignment::from_rows(&rows, entry.reference_row.as_deref(), &entry.consensus_row) {
        Ok(contig) => contig,
        Err(ContigIssue::MissingConsensusRow) => {
            errors.record(NonFatalError::ContigsWithoutAConsensusRow, genome_name);
            return Ok(());
        }
        Err(ContigIssue::MissingReferenceRow) => {
            errors.record(NonFatalError::ContigsWithoutAReferenceRow, genome_name);
            return Ok(());
        }
    };

    let (average, percent) = reference_coverage(&contig.reference, &contig);
    record.average_coverage = entry.average_coverage.unwrap_or(average);
    record.percent_covered_by_reads = entry.percent_covered.unwrap_or(percent);

    let annotations = load_optional_annotations(entry.annotations.as_deref())?;
    let windows = contig_window_coverage(&genome_name, &contig.consensus, &contig, &annotations, errors);
    record.cds_minimum_coverage = windows.cds_minimum;
    record.vp1_minimum_coverage = windows.vp1_minimum;
    Ok(())
}

fn analyze_genome(task: &GenomeTask<'_>, grammar: &NameGrammar) -> Result<GenomeAnalysis> {
    let mut record = AnalysisRecord::new(&task.sample, &task.genome_type);
    let mut errors = NonFatalErrors::new();
    let mut excerpt = None;

    if let Some(entry) = task.documents.consensus {
        excerpt = analyze_consensus(entry, &mut record, grammar, &mut errors)?;
    }
    if let Some(entry) = task.documents.contig {
        analyze_contig(entry, &mut record, &mut errors)?;
    }

    Ok(GenomeAnalysis {
        record,
        vp1_excerpt: excerpt,
        errors,
    })
}

// ============================================================================
// PHASE 2: ALIGNMENTS
// ============================================================================

enum AlignmentUpdate {
    Vp1(RegionSnpCall),
    WholeGenome {
        cds_gap_count: usize,
        partial_cds_note: Option<String>,
        recombination: Option<RecombinationStatus>,
    },
}

struct RowUpdate {
    sample: String,
    genome_type: String,
    update: AlignmentUpdate,
}

#[derive(Default)]
struct AlignmentAnalysis {
    updates: Vec<RowUpdate>,
    errors: NonFatalErrors,
}

/// Explicit row, else the first row named after a known reference genome
fn find_reference_row<'r>(
    rows: &'r [SequenceRecord],
    explicit: Option<&str>,
    reference_types: &BTreeMap<String, Vec<String>>,
) -> Option<&'r SequenceRecord> {
    match explicit {
        Some(name) => rows.iter().find(|row| row.is_named(name)),
        None => rows
            .iter()
            .find(|row| reference_types.contains_key(&row.id) || reference_types.contains_key(&row.name())),
    }
}

/// Sample rows of an alignment that belong to a known genome; unknown genomes are recorded
fn sample_rows<'r>(
    rows: &'r [SequenceRecord],
    grammar: &NameGrammar,
    known: &BTreeSet<(String, String)>,
    errors: &mut NonFatalErrors,
) -> Vec<(String, String, &'r SequenceRecord)> {
    let mut selected = Vec::new();
    for row in rows {
        let Some(parsed) = grammar.parse_document(&row.name()) else {
            continue;
        };
        let sample = parsed.sample();
        if !known.contains(&(sample.clone(), parsed.genome_type.clone())) {
            errors.record(NonFatalError::GenomesWithNoCorrespondingFiles, parsed.genome_name());
            continue;
        }
        selected.push((sample, parsed.genome_type, row));
    }
    selected
}

fn analyze_vp1_alignment(
    entry: &AlignmentEntry,
    rows: &[SequenceRecord],
    reference: &SequenceRecord,
    annotations: &AnnotationSet,
    grammar: &NameGrammar,
    known: &BTreeSet<(String, String)>,
) -> AlignmentAnalysis {
    let mut analysis = AlignmentAnalysis::default();
    let vp1 = match annotations.find_unique("VP1") {
        Ok(interval) => interval.columns(),
        Err(AnnotationIssue::NoAnnotations | AnnotationIssue::Missing) => {
            analysis
                .errors
                .record(NonFatalError::AlignmentsWithoutAVp1Annotation, entry.name.clone());
            return analysis;
        }
        Err(AnnotationIssue::Duplicate | AnnotationIssue::IntervalCount(_)) => {
            analysis
                .errors
                .record(NonFatalError::AlignmentsWithUnexpectedVp1Intervals, entry.name.clone());
            return analysis;
        }
    };

    for (sample, genome_type, row) in sample_rows(rows, grammar, known, &mut analysis.errors) {
        let call = call_region_snps(&reference.id, &reference.sequence, &row.sequence, vp1);
        analysis.updates.push(RowUpdate {
            sample,
            genome_type,
            update: AlignmentUpdate::Vp1(call),
        });
    }
    analysis
}

fn analyze_genome_alignment(
    entry: &AlignmentEntry,
    rows: &[SequenceRecord],
    reference: &SequenceRecord,
    annotations: &AnnotationSet,
    grammar: &NameGrammar,
    known: &BTreeSet<(String, String)>,
) -> Result<AlignmentAnalysis> {
    let mut analysis = AlignmentAnalysis::default();
    let label = format!(
        "Reference sequence \"{}\" within alignment \"{}\"",
        reference.id, entry.name
    );

    let cds = match annotations.find_unique("CDS") {
        Ok(interval) => interval.columns(),
        Err(AnnotationIssue::NoAnnotations | AnnotationIssue::Missing) => {
            analysis.errors.record(NonFatalError::GenomesWithoutACdsAnnotation, label);
            return Ok(analysis);
        }
        Err(AnnotationIssue::Duplicate | AnnotationIssue::IntervalCount(_)) => {
            analysis.errors.record(NonFatalError::GenomesWithUnexpectedCdsIntervals, label);
            return Ok(analysis);
        }
    };
    let peptides = match annotations.mature_peptides() {
        Ok(peptides) => peptides,
        Err(_) => {
            analysis
                .errors
                .record(NonFatalError::GenomesWithUnexpectedMaturePeptideIntervals, label);
            return Ok(analysis);
        }
    };
    if peptides.is_empty() {
        analysis
            .errors
            .record(NonFatalError::GenomesWithoutMaturePeptideAnnotations, label.clone());
    }

    let vp1_peptides: Vec<_> = peptides
        .iter()
        .filter(|region| region.name.eq_ignore_ascii_case("VP1"))
        .collect();
    let vp1 = match vp1_peptides.as_slice() {
        [only] => Some(only.columns),
        _ => {
            if !peptides.is_empty() {
                analysis
                    .errors
                    .record(NonFatalError::AlignmentsWithUnexpectedVp1Intervals, entry.name.clone());
            }
            None
        }
    };

    let nopv2_reference = rows
        .iter()
        .find(|row| NOPV2_REFERENCE_NAMES.iter().any(|name| row.is_named(name)));

    for (sample, genome_type, row) in sample_rows(rows, grammar, known, &mut analysis.errors) {
        let summary = row_gap_summary(&row.sequence, cds);
        let Some(span) = summary.span else {
            analysis.updates.push(RowUpdate {
                sample,
                genome_type,
                update: AlignmentUpdate::WholeGenome {
                    cds_gap_count: summary.cds_gap_count,
                    partial_cds_note: None,
                    recombination: None,
                },
            });
            continue;
        };

        let recombination = match recombination_windows(span, &peptides, vp1) {
            Some(windows) => {
                let reference_sequence = if names::is_nopv2(&grammar.simplify_type(&genome_type)) {
                    let nopv2 = nopv2_reference.ok_or_else(|| FinalizeError::MissingNopv2Reference {
                        alignment: entry.name.clone(),
                    })?;
                    &nopv2.sequence
                } else {
                    &reference.sequence
                };
                Some(detect_recombination(reference_sequence, &row.sequence, span, &windows))
            }
            None => None,
        };

        analysis.updates.push(RowUpdate {
            sample,
            genome_type,
            update: AlignmentUpdate::WholeGenome {
                cds_gap_count: summary.cds_gap_count,
                partial_cds_note: partial_cds_note(span, cds, &peptides),
                recombination,
            },
        });
    }
    Ok(analysis)
}

fn analyze_alignment(
    entry: &AlignmentEntry,
    grammar: &NameGrammar,
    known: &BTreeSet<(String, String)>,
    reference_types: &BTreeMap<String, Vec<String>>,
) -> Result<AlignmentAnalysis> {
    let rows = read_fasta(&entry.fasta)?;
    let Some(reference) = find_reference_row(&rows, entry.reference_row.as_deref(), reference_types) else {
        let mut analysis = AlignmentAnalysis::default();
        analysis
            .errors
            .record(NonFatalError::AlignmentsWithoutReferenceSequences, entry.name.clone());
        return Ok(analysis);
    };
    let annotations = load_optional_annotations(entry.annotations.as_deref())?;

    if entry.is_vp1() {
        Ok(analyze_vp1_alignment(entry, &rows, reference, &annotations, grammar, known))
    } else {
        analyze_genome_alignment(entry, &rows, reference, &annotations, grammar, known)
    }
}

fn apply_update(record: &mut AnalysisRecord, update: AlignmentUpdate) {
    match update {
        AlignmentUpdate::Vp1(call) => {
            record.vp1_snps = Some(call.snps);
            record.vp1_gap_count = Some(call.gap_count);
            record.partial_vp1 = record.partial_vp1 || call.partial;
        }
        AlignmentUpdate::WholeGenome {
            cds_gap_count,
            partial_cds_note,
            recombination,
        } => {
            record.cds_gap_count = Some(cds_gap_count);
            if partial_cds_note.is_some() {
                record.partial_cds_note = partial_cds_note;
            }
            if let Some(status) = recombination {
                record.recombination = status;
            }
        }
    }
}

// ============================================================================
// PHASE 3: GENOTYPING
// ============================================================================

fn genotype_excerpts(
    excerpts: Vec<SequenceRecord>,
    manifest: &Manifest,
    aligner: Option<&dyn Vp1Aligner>,
) -> Result<Vec<GenotypedSample>> {
    if excerpts.is_empty() {
        log::info!("No polio VP1 excerpts; genotyping skipped");
        return Ok(Vec::new());
    }
    let Some(aligner) = aligner else {
        log::warn!("No VP1 aligner configured; {} excerpts left ungenotyped", excerpts.len());
        return Ok(Vec::new());
    };

    let mut input = excerpts;
    match &manifest.genotype_panel {
        Some(panel) => input.extend(read_fasta(panel)?),
        None if aligner.name() != "prealigned" => {
            return Err(FinalizeError::MissingReference("genotype panel".to_string()));
        }
        None => {}
    }

    let aligned = aligner.align(&input)?;
    let genotyped = assign_genotypes(&aligned);
    log::info!("Assigned genotypes to {} VP1 excerpts", genotyped.len());
    Ok(genotyped)
}

// ============================================================================
// RUN
// ============================================================================

fn run_phases(
    manifest: &Manifest,
    settings: &RunSettings,
    aligner: Option<&dyn Vp1Aligner>,
    grammar: &NameGrammar,
) -> Result<RunOutput> {
    let inventory = build_inventory(manifest, grammar)?;
    let mut best_hits = collect_best_hits(manifest, &inventory, grammar, &settings.reference_types)?;

    let tasks: Vec<GenomeTask<'_>> = inventory
        .iter()
        .flat_map(|(sample, types)| {
            types.iter().map(move |(genome_type, documents)| GenomeTask {
                sample: sample.clone(),
                genome_type: genome_type.clone(),
                documents: *documents,
            })
        })
        .collect();
    log::info!("Analysing {} genomes from {} samples", tasks.len(), inventory.len());

    let start = Instant::now();
    let pb = progress_bar(tasks.len(), settings.show_progress, "genomes");
    let analyses = tasks
        .par_iter()
        .map(|task| {
            let analysis = analyze_genome(task, grammar);
            pb.inc(1);
            analysis
        })
        .collect::<Result<Vec<_>>>()?;
    pb.finish_and_clear();
    log::info!("Genome documents analysed in {:.2?}", start.elapsed());

    let mut non_fatal_errors = NonFatalErrors::new();
    let mut records: BTreeMap<(String, String), AnalysisRecord> = BTreeMap::new();
    let mut excerpts = Vec::new();
    for analysis in analyses {
        non_fatal_errors.merge(analysis.errors);
        excerpts.extend(analysis.vp1_excerpt);
        let mut record = analysis.record;
        record.best_hit = best_hits.remove(&(record.sample.clone(), record.genome_type.clone()));
        records.insert((record.sample.clone(), record.genome_type.clone()), record);
    }

    let known: BTreeSet<(String, String)> = records.keys().cloned().collect();
    let pb = progress_bar(manifest.alignment.len(), settings.show_progress, "alignments");
    let alignment_analyses = manifest
        .alignment
        .par_iter()
        .map(|entry| {
            let analysis = analyze_alignment(entry, grammar, &known, &settings.reference_types);
            pb.inc(1);
            analysis
        })
        .collect::<Result<Vec<_>>>()?;
    pb.finish_and_clear();

    for analysis in alignment_analyses {
        non_fatal_errors.merge(analysis.errors);
        for row in analysis.updates {
            if let Some(record) = records.get_mut(&(row.sample, row.genome_type)) {
                apply_update(record, row.update);
            }
        }
    }

    let mut genotypes = genotype_excerpts(excerpts, manifest, aligner)?;
    genotypes.sort_by_key(|g| (sort_key(&g.sample), sort_key(&g.genome_type)));

    let mut samples: Vec<SampleOutcome> = inventory
        .keys()
        .map(|sample| SampleOutcome {
            sample: sample.clone(),
            records: Vec::new(),
        })
        .collect();
    for ((sample, _), record) in records {
        if let Some(outcome) = samples.iter_mut().find(|outcome| outcome.sample == sample) {
            outcome.records.push(record);
        }
    }
    samples.sort_by_key(|outcome| sort_key(&outcome.sample));
    for outcome in &mut samples {
        outcome.records.sort_by_key(|record| sort_key(&record.genome_type));
    }

    Ok(RunOutput {
        run_name: settings.run_name.clone(),
        samples,
        genotypes,
        non_fatal_errors,
    })
}

/// Finalize one run described by `manifest`.
///
/// Genome documents are analysed in parallel, then alignments, then the pooled
/// VP1 excerpts are genotyped on the calling thread. The first fatal error of a
/// phase fails the run; non-fatal problems are collected in the output.
pub fn finalize_run(
    manifest: &Manifest,
    settings: &RunSettings,
    aligner: Option<&dyn Vp1Aligner>,
) -> Result<RunOutput> {
    let grammar = NameGrammar::new()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.threads.unwrap_or(0))
        .build()
        .map_err(|e| FinalizeError::Config(format!("Failed to build thread pool: {}", e)))?;
    log::debug!("Thread pool ready with {} threads", pool.current_num_threads());
    pool.install(|| run_phases(manifest, settings, aligner, &grammar))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_reference_row() {
        let rows = vec![
            SequenceRecord::new("0123456789-AB12 - PV1 - Final Consensus", b"ACGT".to_vec()),
            SequenceRecord::new("AY184219", b"ACGA".to_vec()),
        ];
        let map = names::default_reference_types();
        assert_eq!(find_reference_row(&rows, None, &map).map(|r| r.id.as_str()), Some("AY184219"));
        assert!(find_reference_row(&rows, Some("MZ245455"), &map).is_none());
        assert!(find_reference_row(&rows[..1], None, &map).is_none());
    }

    #[test]
    fn test_apply_update_keeps_existing_note() {
        let mut record = AnalysisRecord::new("0123456789-AB12", "PV1");
        apply_update(
            &mut record,
            AlignmentUpdate::WholeGenome {
                cds_gap_count: 4,
                partial_cds_note: Some("Partial CDS (VP2-)".to_string()),
                recombination: Some(RecombinationStatus::Cleared),
            },
        );
        apply_update(
            &mut record,
            AlignmentUpdate::WholeGenome {
                cds_gap_count: 2,
                partial_cds_note: None,
                recombination: None,
            },
        );
        assert_eq!(record.cds_gap_count, Some(2));
        assert_eq!(record.partial_cds_note.as_deref(), Some("Partial CDS (VP2-)"));
        assert_eq!(record.recombination, RecombinationStatus::Cleared);

        apply_update(&mut record, AlignmentUpdate::Vp1(RegionSnpCall::default()));
        assert_eq!(record.vp1_snps, Some(Vec::new()));
        assert_eq!(record.vp1_gap_count, Some(0));
        assert!(!record.partial_vp1);
    }

    #[test]
    fn test_sort_key_is_case_insensitive() {
        let mut values = vec!["pv2", "PV1", "nOPV2"];
        values.sort_by_key(|v| sort_key(v));
        assert_eq!(values, ["nOPV2", "PV1", "pv2"]);
    }
}
