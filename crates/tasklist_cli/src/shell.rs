use crate::cli::{Cli, collect_config_overrides};
use crate::commands::{RunOptions, run_command};
use crate::console::Console;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{BufRead, Write};
use tasklist_core::config::Config;
use tasklist_core::error::AppError;
use tasklist_core::task_api::TaskSession;

/// Outcome of handing argv to clap.
pub enum Parsed {
    Run(Box<Cli>),
    /// `--help` or `--version`: text to print, not an error.
    Info(String),
    Failed(AppError),
}

pub fn parse_args<I, T>(argv: I) -> Parsed
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(argv) {
        Ok(cli) => Parsed::Run(Box::new(cli)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Parsed::Info(err.to_string())
        }
        Err(err) => Parsed::Failed(normalize_parse_error(err)),
    }
}

pub fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

pub fn help_text() -> String {
    let mut cmd = Cli::command();
    cmd.render_help().to_string()
}

/// Reads one command per line until `exit`, `quit` or end of input.
/// Command failures go to `errors` and the loop carries on.
pub fn run_interactive<R: BufRead, W: Write, E: Write>(
    session: &mut TaskSession,
    console: &mut Console<R, W>,
    errors: &mut E,
    config: &Config,
) -> Result<(), AppError> {
    let base_palette = config.palette();
    let count = session.store().len();
    writeln!(
        console.output(),
        "{} ({count} task{} loaded, type 'help' for commands)",
        base_palette.heading("tasklist"),
        if count == 1 { "" } else { "s" }
    )?;

    loop {
        write!(console.output(), "tasklist> ")?;
        console.output().flush()?;

        let Some(input) = console.read_line()? else {
            break;
        };

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            writeln!(console.output(), "{}", help_text())?;
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                writeln!(errors, "ERROR: {err}")?;
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasklist".to_string());
        argv.extend(args);

        let cli = match parse_args(argv) {
            Parsed::Run(cli) => cli,
            Parsed::Info(text) => {
                write!(console.output(), "{text}")?;
                continue;
            }
            Parsed::Failed(err) => {
                writeln!(errors, "ERROR: {err}")?;
                continue;
            }
        };

        let options = match line_options(&cli, config) {
            Ok(options) => options,
            Err(err) => {
                writeln!(errors, "ERROR: {err}")?;
                continue;
            }
        };

        if let Err(err) = run_command(cli.command, session, console, &options) {
            tracing::debug!(code = err.code(), "command failed");
            writeln!(errors, "ERROR: {err}")?;
        }
    }

    Ok(())
}

/// Per-line overrides only restyle output; the session stays bound to its file.
fn line_options(cli: &Cli, config: &Config) -> Result<RunOptions, AppError> {
    let overrides = collect_config_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    if overrides.store_path.is_some() {
        return Err(AppError::invalid_input(
            "store_path cannot change inside an interactive session",
        ));
    }

    Ok(RunOptions {
        json: cli.json,
        interactive: true,
        palette: config.with_overrides(&overrides).palette(),
    })
}
