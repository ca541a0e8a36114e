mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_STORE_ERROR};
use lockcheck_core::{Engine, EngineConfig, CONFIG_FILE_NAME};
use lockcheck_store::FsStore;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "lockcheck",
    version,
    about = "Reconcile a project's installed package manifest against author lock files"
)]
struct Cli {
    /// Project root containing the installed manifest and the locks directory.
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Config file (defaults to lockcheck.toml in the project root).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare the installed manifest against every lock file.
    Check {
        /// Patch the installed manifest when issues are found.
        #[arg(long, default_value_t = false)]
        fix: bool,
        /// Do not run the configured resolver after fixing.
        #[arg(long, default_value_t = false)]
        no_resolve: bool,
    },
    /// Print the merged requirements of all lock files.
    Requirements,
    /// Validate a manifest or lock document.
    Validate {
        /// Path to the JSON document.
        file: PathBuf,
    },
    /// Write a lock file from installed packages.
    Lock {
        /// Author part of the lock file name.
        #[arg(long)]
        author: String,
        /// Asset part of the lock file name.
        #[arg(long)]
        asset: String,
        /// Package to include; repeatable. Prompts when omitted on a TTY.
        #[arg(long = "package", short = 'p')]
        packages: Vec<String>,
    },
    /// Patch the installed manifest to satisfy every lock file.
    Repair {
        /// Do not run the configured resolver after patching.
        #[arg(long, default_value_t = false)]
        no_resolve: bool,
    },
    /// Accept installed versions by disabling all lock files.
    Accept {
        /// Do not ask for confirmation.
        #[arg(long, short, default_value_t = false)]
        yes: bool,
    },
}

fn load_config(cli: &Cli) -> Result<EngineConfig, String> {
    match &cli.config {
        Some(path) => EngineConfig::load(path),
        None => EngineConfig::load_or_default(&cli.project.join(CONFIG_FILE_NAME)),
    }
    .map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();
    let config = load_config(&cli);

    let debug = config.as_ref().is_ok_and(|c| c.debug);
    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose || debug {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LOCKCHECK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = match config {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let engine = Engine::from_config(FsStore::new(), &cli.project, config);
    tracing::debug!(
        "manifest {}, locks {}",
        engine.layout().manifest_path().display(),
        engine.layout().locks_dir().display()
    );
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Check { fix, no_resolve } => {
            commands::check::run(&engine, fix, no_resolve, json_output)
        }
        Commands::Requirements => commands::requirements::run(&engine, json_output),
        Commands::Validate { file } => commands::validate::run(&engine, &file, json_output),
        Commands::Lock {
            author,
            asset,
            packages,
        } => commands::lock::run(&engine, &author, &asset, &packages, json_output),
        Commands::Repair { no_resolve } => commands::repair::run(&engine, no_resolve, json_output),
        Commands::Accept { yes } => commands::accept::run(&engine, yes, json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:")
                || msg.starts_with("failed to parse manifest")
                || msg.starts_with("invalid manifest")
            {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("store error:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
