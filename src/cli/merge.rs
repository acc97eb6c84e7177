// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: &Config) -> Self {
        // Input/Output
        if self.manifest.is_none() {
            self.manifest = config.manifest.clone();
        }
        if self.output_dir.is_none() {
            self.output_dir = config.output_dir.clone();
        }
        if self.run_name.is_none() {
            self.run_name = config.run_name.clone();
        }

        // Format and aligner (only override defaults, not explicit CLI values)
        if let (true, Some(format)) = (self.format == "csv", &config.format) {
            self.format = format.clone();
        }
        if let (true, Some(aligner)) = (self.aligner == "prealigned", &config.aligner) {
            self.aligner = aligner.clone();
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // VP1 genotyping
        if self.aligner_program.is_none() {
            self.aligner_program = config.aligner_program.clone();
        }
        if self.aligner_arg.is_empty() {
            self.aligner_arg = config.aligner_args.clone().unwrap_or_default();
        }
        if self.vp1_alignment.is_none() {
            self.vp1_alignment = config.vp1_alignment.clone();
        }
        if self.genotype_panel.is_none() {
            self.genotype_panel = config.genotype_panel.clone();
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.no_progress && config.no_progress.unwrap_or(false) {
            self.no_progress = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<(Self, Config), String> {
        let config = Config::from_file(config_path)?;
        let merged = self.merge_with_config(&config);
        Ok((merged, config))
    }
}
