use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use rust_sdkmigrate::conflicts::ConflictStrategy;
use rust_sdkmigrate::{
    analyze_project, migrate_directory, CancellationToken, MigrateOptions, MigrationConfig,
};

#[derive(Parser)]
#[command(name = "sdk-migrate")]
#[command(author, version, about = "Converts legacy MSBuild projects into SDK-style projects")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every legacy project under a directory
    Migrate {
        /// Directory to scan (or a single project file)
        dir: PathBuf,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Write migrated projects here instead of in place
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Target framework for every project (e.g. net8.0)
        #[arg(short, long)]
        target_framework: Option<String>,

        /// Do not keep copies of the original files
        #[arg(long)]
        no_backup: bool,

        /// Proceed despite overridable pre-flight warnings
        #[arg(long)]
        force: bool,

        /// Worker threads
        #[arg(short, long)]
        parallelism: Option<usize>,

        /// Write Directory.Packages.props and drop versions from projects
        #[arg(long)]
        central_packages: bool,

        /// Version conflict strategy (highest, lowest, latest-stable, most-common, semantic, framework)
        #[arg(short, long)]
        strategy: Option<ConflictStrategy>,

        /// Write the text report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Configuration file (defaults to sdkmigrate.toml in the scanned directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show how one project would be classified
    Analyze {
        /// Path to the project file
        project: PathBuf,

        /// Target framework override
        #[arg(short, long)]
        target_framework: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Migrate {
            dir,
            dry_run,
            output_dir,
            target_framework,
            no_backup,
            force,
            parallelism,
            central_packages,
            strategy,
            report,
            config,
        } => {
            let mut options = MigrateOptions::new(dir);
            let config = match config {
                Some(path) => Some(MigrationConfig::from_file(&path)?),
                None => MigrationConfig::discover(&options.root)?,
            };
            if let Some(config) = config {
                options.apply_config(config);
            }

            options.dry_run = dry_run;
            options.output_dir = output_dir;
            options.backup = !no_backup;
            options.force = force;
            options.report_path = report;
            if let Some(tfm) = target_framework {
                options.target_framework = Some(tfm);
            }
            if let Some(parallelism) = parallelism {
                options.parallelism = parallelism.max(1);
            }
            if central_packages {
                options.central_package_management = true;
            }
            if let Some(strategy) = strategy {
                options.strategy = strategy;
            }

            let report = migrate_directory(options, &CancellationToken::new())?;
            print!("{}", report.render());

            if report.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Analyze {
            project,
            target_framework,
        } => {
            let mut options = MigrateOptions::new(
                project.parent().map(PathBuf::from).unwrap_or_default(),
            );
            options.target_framework = target_framework;
            let analysis = analyze_project(&project, &options)?;
            let classification = &analysis.classification;

            println!("Project: {}", analysis.project_path.display());
            if analysis.already_sdk_style {
                println!("Already SDK-style; nothing to migrate");
                return Ok(ExitCode::SUCCESS);
            }
            println!("Variant: {}", classification.variant);
            if let Some(sdk) = classification.variant.sdk_name() {
                println!("SDK: {}", sdk);
            }
            if !classification.frameworks.is_empty() {
                println!("Target frameworks: {}", classification.frameworks.join(";"));
            }
            let flags = &classification.flags;
            println!("WPF: {}", flags.use_wpf);
            println!("Windows Forms: {}", flags.use_windows_forms);
            println!("Test project: {}", flags.is_test_project);
            for note in &classification.notes {
                println!("Note: {}", note);
            }
            if !classification.is_migratable() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
