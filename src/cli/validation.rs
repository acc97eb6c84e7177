// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::cli::config::Config;
use crate::data::names;
use crate::output::TableFormat;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How the pooled VP1 excerpts get aligned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignerChoice {
    /// Alignment file given explicitly; `None` defers to the manifest's `vp1_alignment`
    Prealigned(Option<PathBuf>),
    Command { program: String, args: Vec<String> },
}

/// Arguments checked and converted into the types the pipeline runs on
pub struct ValidationResult {
    pub manifest: PathBuf,
    pub output_dir: PathBuf,
    pub format: TableFormat,
    pub aligner: AlignerChoice,
    pub genotype_panel: Option<PathBuf>,
    pub reference_types: BTreeMap<String, Vec<String>>,
}

fn existing_file(option: &str, value: &str) -> Result<PathBuf, String> {
    let path = Path::new(value);
    if !path.is_file() {
        return Err(format!("--{} file not found: {}", option, value));
    }
    Ok(path.to_path_buf())
}

/// Validate all command line arguments
pub fn validate_args(args: &Args, config: &Config) -> Result<ValidationResult, String> {
    let manifest = existing_file("manifest", args.manifest.as_deref().ok_or("--manifest is required")?)?;

    let output_dir = match &args.output_dir {
        Some(dir) => PathBuf::from(dir),
        None if args.dry_run => PathBuf::new(),
        None => return Err("--output-dir is required".to_string()),
    };
    if output_dir.is_file() {
        return Err(format!("--output-dir points at a file: {}", output_dir.display()));
    }

    let format: TableFormat = args.format.parse()?;

    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err("Thread count must be at least 1".to_string());
        }
    }

    if let Some(run_name) = &args.run_name {
        if run_name.trim().is_empty() || run_name.chars().any(char::is_whitespace) {
            return Err(format!("Run name '{}' must be non-empty and contain no whitespace", run_name));
        }
    }

    let aligner = match args.aligner.to_lowercase().as_str() {
        "prealigned" => AlignerChoice::Prealigned(
            args.vp1_alignment
                .as_deref()
                .map(|path| existing_file("vp1-alignment", path))
                .transpose()?,
        ),
        "command" => {
            let program = args
                .aligner_program
                .clone()
                .ok_or("--aligner command requires --aligner-program")?;
            if program.trim().is_empty() {
                return Err("--aligner-program must not be empty".to_string());
            }
            AlignerChoice::Command {
                program,
                args: args.aligner_arg.clone(),
            }
        }
        other => return Err(format!("Invalid aligner '{}'. Available: prealigned, command", other)),
    };

    let genotype_panel = args
        .genotype_panel
        .as_deref()
        .map(|path| existing_file("genotype-panel", path))
        .transpose()?;

    let reference_types = config
        .reference_types
        .clone()
        .unwrap_or_else(names::default_reference_types);
    if let Some((accession, _)) = reference_types.iter().find(|(_, types)| types.is_empty()) {
        return Err(format!("Reference genome '{}' maps to no types", accession));
    }

    Ok(ValidationResult {
        manifest,
        output_dir,
        format,
        aligner,
        genotype_panel,
        reference_types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["polioqc"], args).unwrap()
    }

    #[test]
    fn test_valid_arguments() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("run.toml");
        fs::write(&manifest, "run_name = \"RUN7\"\n").unwrap();
        let manifest = manifest.to_str().unwrap();

        let args = parse(&["-m", manifest, "-o", "out", "--format", "TSV", "--threads", "2"]);
        let result = validate_args(&args, &Config::new()).unwrap();
        assert_eq!(result.format, TableFormat::Tsv);
        assert_eq!(result.aligner, AlignerChoice::Prealigned(None));
        assert_eq!(result.reference_types["MZ245455"], ["nOPV2"]);

        let args = parse(&[
            "-m",
            manifest,
            "-o",
            "out",
            "--aligner",
            "command",
            "--aligner-program",
            "muscle",
            "--aligner-arg",
            "align",
        ]);
        let result = validate_args(&args, &Config::new()).unwrap();
        assert_eq!(
            result.aligner,
            AlignerChoice::Command {
                program: "muscle".to_string(),
                args: vec!["align".to_string()],
            }
        );
    }

    #[test]
    fn test_invalid_arguments() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("run.toml");
        fs::write(&manifest, "").unwrap();
        let manifest = manifest.to_str().unwrap();

        assert!(validate_args(&parse(&[]), &Config::new()).is_err());
        assert!(validate_args(&parse(&["-m", "missing.toml", "-o", "out"]), &Config::new()).is_err());
        assert!(validate_args(&parse(&["-m", manifest]), &Config::new()).is_err());
        assert!(validate_args(&parse(&["-m", manifest, "--dry-run"]), &Config::new()).is_ok());
        assert!(validate_args(&parse(&["-m", manifest, "-o", "out", "--threads", "0"]), &Config::new()).is_err());
        assert!(validate_args(&parse(&["-m", manifest, "-o", "out", "--format", "xlsx"]), &Config::new()).is_err());
        assert!(validate_args(&parse(&["-m", manifest, "-o", "out", "--aligner", "command"]), &Config::new()).is_err());
        assert!(validate_args(&parse(&["-m", manifest, "-o", "out", "--run-name", "RUN 7"]), &Config::new()).is_err());

        let mut config = Config::new();
        config.reference_types = Some(BTreeMap::from([("AY184219".to_string(), Vec::new())]));
        assert!(validate_args(&parse(&["-m", manifest, "-o", "out"]), &config).is_err());
    }
}
