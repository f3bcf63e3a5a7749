use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use pspscan::action::ActionRegistry;
use pspscan::config::{Config, DescriptionStore, FsStore};
use pspscan::detect::DetectionOutcome;
use pspscan::error::PspError;
use pspscan::fingerprint::build_fingerprint;
use pspscan::output::OutputFormat;
use pspscan::probe::ProbeRegistry;
use pspscan::remediate::manager::ActionManager;
use pspscan::remediate::{build_actions, FailureKind};
use pspscan::transport::local::LocalHost;
use pspscan::{run_vendor, RemediationStatus, TracingSink};

#[derive(Parser)]
#[command(
    name = "pspscan",
    about = "Host security-product detection and remediation engine",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect products and run remediation actions for the given vendors
    Run {
        /// Vendor identifiers ({vendor}-fp.xml must exist in the data dir)
        #[arg(required = true)]
        vendors: Vec<String>,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Override the description-file directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Structurally validate a vendor's description files without probing
    Check {
        /// Vendor identifier
        vendor: String,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Override the description-file directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// List all registered probe and action kinds
    ListKinds,

    /// Generate a starter pspscan.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pspscan=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            vendors,
            config,
            data_dir,
            format,
            output,
        } => cmd_run(vendors, config, data_dir, format, output),
        Commands::Check {
            vendor,
            config,
            data_dir,
        } => cmd_check(vendor, config, data_dir),
        Commands::ListKinds => cmd_list_kinds(),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn store_for(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<FsStore, PspError> {
    let config_path = config.unwrap_or_else(|| PathBuf::from("pspscan.toml"));
    let config = Config::load(&config_path)?;
    Ok(FsStore::new(data_dir.unwrap_or(config.data_dir)))
}

fn cmd_run(
    vendors: Vec<String>,
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    format_str: String,
    output_path: Option<PathBuf>,
) -> Result<i32, PspError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let store = store_for(config, data_dir)?;
    let transport = LocalHost::new();
    let sink = TracingSink;

    let mut rendered = String::new();
    let mut exit_code = 0;
    for vendor in &vendors {
        match run_vendor(vendor, &store, &transport, &sink) {
            Ok(report) => {
                if matches!(
                    report.remediation,
                    RemediationStatus::ValidationFailed { .. } | RemediationStatus::Aborted
                ) {
                    exit_code = exit_code.max(1);
                }
                rendered.push_str(&pspscan::output::render(&report, format)?);
                if format == OutputFormat::Json {
                    rendered.push('\n');
                }
            }
            // a bad vendor must not stop the others
            Err(e) => {
                eprintln!("vendor '{}' failed: {}", vendor, e);
                exit_code = 2;
            }
        }
    }

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(exit_code)
}

fn cmd_check(
    vendor: String,
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<i32, PspError> {
    let store = store_for(config, data_dir)?;
    let mut problems = 0;

    match store.fingerprint(&vendor)? {
        None => println!("{vendor}-fp.xml: not found"),
        Some(text) => {
            match build_fingerprint(&format!("{vendor}-fp.xml"), &text, &ProbeRegistry::builtin())
            {
                Ok(roots) => println!("{vendor}-fp.xml: ok ({} root probe(s))", roots.len()),
                Err(e) => {
                    println!("{vendor}-fp.xml: {e}");
                    problems += 1;
                }
            }
        }
    }

    match store.actions(&vendor)? {
        None => println!("{vendor}-actions.xml: not found"),
        Some(text) => {
            // structural check only: condition references resolve against a
            // live detection run, so they are reported, not counted
            match build_actions(
                &format!("{vendor}-actions.xml"),
                &text,
                &ActionRegistry::builtin(),
                &DetectionOutcome::default(),
            ) {
                Ok(roots) => {
                    let manager = ActionManager::new(roots);
                    let failures = manager.validate();
                    let params: Vec<_> = failures
                        .iter()
                        .filter(|f| f.kind == FailureKind::IncompleteParams)
                        .collect();
                    for failure in &params {
                        println!("{vendor}-actions.xml: {failure}");
                    }
                    problems += params.len();
                    let references: Vec<_> = failures
                        .iter()
                        .filter(|f| f.kind == FailureKind::UnresolvedReference)
                        .collect();
                    if params.is_empty() {
                        println!("{vendor}-actions.xml: ok ({} reference(s) resolved at run time)", references.len());
                    }
                }
                Err(e) => {
                    println!("{vendor}-actions.xml: {e}");
                    problems += 1;
                }
            }
        }
    }

    Ok(if problems == 0 { 0 } else { 1 })
}

fn cmd_list_kinds() -> Result<i32, PspError> {
    println!("{:<14} ROLE", "KIND");
    println!("{}", "-".repeat(40));
    for kind in ProbeRegistry::builtin().kinds() {
        println!("{:<14} fingerprint probe", kind);
    }
    for kind in ActionRegistry::builtin().kinds() {
        println!("{:<14} remediation action", kind);
    }
    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, PspError> {
    let path = PathBuf::from("pspscan.toml");

    if path.exists() && !force {
        eprintln!("pspscan.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created pspscan.toml");

    Ok(0)
}
