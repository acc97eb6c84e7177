// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// polioqc - Finalize a poliovirus sequencing run: QC grades, recombination, VP1 genotypes
pub struct Args {
    /// path to the run manifest (.toml)
    #[argh(option, short = 'm')]
    pub manifest: Option<String>,

    /// output directory for the tables and reports
    #[argh(option, short = 'o')]
    pub output_dir: Option<String>,

    /// shortened run name used in database names (default: manifest run_name)
    #[argh(option)]
    pub run_name: Option<String>,

    /// output format: csv, tsv (default: csv)
    #[argh(option, default = "String::from(\"csv\")")]
    pub format: String,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// VP1 aligner: prealigned, command (default: prealigned)
    #[argh(option, default = "String::from(\"prealigned\")")]
    pub aligner: String,

    /// external aligner program for --aligner command (e.g. mafft)
    #[argh(option)]
    pub aligner_program: Option<String>,

    /// argument passed to the external aligner before the input path (repeatable)
    #[argh(option)]
    pub aligner_arg: Vec<String>,

    /// pre-computed VP1 alignment FASTA (overrides the manifest's vp1_alignment)
    #[argh(option)]
    pub vp1_alignment: Option<String>,

    /// genotype reference panel FASTA (overrides the manifest's genotype_panel)
    #[argh(option)]
    pub genotype_panel: Option<String>,

    /// hide progress bars
    #[argh(switch)]
    pub no_progress: bool,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
