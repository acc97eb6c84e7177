// main.rs - CLI entry point

use polioqc::cli::{validate_args, AlignerChoice, Args, Config};
use polioqc::core::{finalize_run, CommandAligner, PrealignedVp1, RunSettings, Vp1Aligner};
use polioqc::data::Manifest;
use polioqc::output::write_outputs;
use std::time::Instant;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load configuration file if specified
    let (args, config) = match args.config.clone() {
        Some(config_path) => args.with_config_file(&config_path)?,
        None => (args, Config::new()),
    };

    let validated = validate_args(&args, &config)?;

    println!("🚀 polioqc v{}", env!("CARGO_PKG_VERSION"));
    let total_start = Instant::now();

    let mut manifest = Manifest::from_file(&validated.manifest).map_err(|e| e.to_string())?;
    if let Some(panel) = validated.genotype_panel.clone() {
        manifest.genotype_panel = Some(panel);
    }
    let run_name = args
        .run_name
        .clone()
        .or_else(|| manifest.run_name.clone())
        .ok_or("--run-name is required when the manifest has no run_name")?;

    println!("📂 Run: {}", run_name);
    println!(
        "📄 Documents: {} consensus, {} contig, {} alignments, {} BLAST folders",
        manifest.consensus.len(),
        manifest.contig.len(),
        manifest.alignment.len(),
        manifest.blast_folder.len()
    );

    match args.threads {
        Some(n) => println!("🧵 Threads: {}", n),
        None => println!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads()),
    }

    let aligner: Option<Box<dyn Vp1Aligner>> = match &validated.aligner {
        AlignerChoice::Prealigned(path) => path
            .clone()
            .or_else(|| manifest.vp1_alignment.clone())
            .map(|path| Box::new(PrealignedVp1::new(path)) as Box<dyn Vp1Aligner>),
        AlignerChoice::Command { program, args } => {
            Some(Box::new(CommandAligner::new(program.clone(), args.clone())) as Box<dyn Vp1Aligner>)
        }
    };
    match &aligner {
        Some(aligner) => println!("🧬 VP1 aligner: {}", aligner.name()),
        None => println!("⚠️  No VP1 alignment available - genotyping will be skipped"),
    }

    if args.dry_run {
        println!("✅ Dry run: inputs validated, nothing computed");
        return Ok(());
    }

    let settings = RunSettings {
        run_name,
        threads: args.threads,
        reference_types: validated.reference_types.clone(),
        show_progress: !args.no_progress,
    };

    println!("\n🔄 Finalizing run...");
    let output = finalize_run(&manifest, &settings, aligner.as_deref()).map_err(|e| e.to_string())?;

    let written = write_outputs(&output, &validated.output_dir, validated.format, &command_line)
        .map_err(|e| e.to_string())?;
    println!("✅ QC table written to: {}", written.final_analysis.display());
    println!("✅ Genotype table written to: {}", written.database_data.display());
    println!("✅ VP1 SNP table written to: {}", written.vp1_snps.display());
    println!("📁 Run summary: {}", written.run_summary.display());

    if let Some(path) = &written.non_fatal_errors {
        println!(
            "\n⚠️  {} non-fatal errors (also written to {}):\n",
            output.non_fatal_errors.len(),
            path.display()
        );
        println!("{}", output.non_fatal_errors.report());
    }

    let elapsed = total_start.elapsed().as_secs();
    println!("\n⏱️  Runtime: {} minutes, {} seconds", elapsed / 60, elapsed % 60);
    Ok(())
}
