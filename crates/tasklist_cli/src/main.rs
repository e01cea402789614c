use std::io;
use std::process::ExitCode;
use tasklist_cli::cli::{Cli, collect_config_overrides};
use tasklist_cli::commands::{RunOptions, run_command};
use tasklist_cli::console::Console;
use tasklist_cli::shell::{self, Parsed};
use tasklist_core::config::{Config, ConfigOverrides};
use tasklist_core::error::AppError;
use tasklist_core::storage::json_store;
use tasklist_core::task_api::TaskSession;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TASKLIST_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Option<Cli>) -> Result<(), AppError> {
    let overrides = match cli.as_ref() {
        Some(cli) => {
            collect_config_overrides(&cli.config_override).map_err(AppError::invalid_input)?
        }
        None => ConfigOverrides::default(),
    };

    let loaded = Config::load();
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(error = %err, "could not read config, using defaults");
    }
    let config = loaded.config.with_overrides(&overrides);

    let path = json_store::store_path(&config)?;
    let mut session = TaskSession::open(path);

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());

    match cli {
        Some(cli) => {
            let options = RunOptions {
                json: cli.json,
                interactive: false,
                palette: config.palette(),
            };
            run_command(cli.command, &mut session, &mut console, &options)
        }
        None => shell::run_interactive(&mut session, &mut console, &mut io::stderr(), &config),
    }
}

fn main() -> ExitCode {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    let cli = if args.next().is_none() {
        None
    } else {
        match shell::parse_args(std::env::args_os()) {
            Parsed::Run(cli) => Some(*cli),
            Parsed::Info(text) => {
                print!("{text}");
                return ExitCode::SUCCESS;
            }
            Parsed::Failed(err) => {
                eprintln!("ERROR: {err}");
                return ExitCode::FAILURE;
            }
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}
