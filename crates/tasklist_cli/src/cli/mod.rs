use clap::{Parser, Subcommand};
use tasklist_core::config::{ConfigOverrides, parse_switch};
use tasklist_core::model::{Priority, TaskStatus};
use tasklist_core::store::SortCriterion;

#[derive(Parser, Debug)]
#[command(name = "tasklist", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasklist add "Buy milk" -d "Two litres" -p high --due 2026-12-01
    /// Example: tasklist add (interactive mode asks for every field)
    Add {
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
        /// low, medium, high (or 1-3)
        #[arg(short = 'p', long)]
        priority: Option<Priority>,
        /// pending, in_progress, done, cancelled (or 1-4)
        #[arg(short = 's', long)]
        status: Option<TaskStatus>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        due: Option<String>,
        /// 1-5, defaults to 3
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// List tasks, optionally filtered and sorted
    ///
    /// Example: tasklist list --status pending
    /// Example: tasklist list --sort due_at --desc
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        /// title, due_at, created_at or difficulty; the new order is saved
        #[arg(long)]
        sort: Option<SortCriterion>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Show details of a task
    ///
    /// Example: tasklist show 3f2b...
    Show { id: String },
    /// Edit one or more fields of a task
    ///
    /// Example: tasklist edit 3f2b... --status done
    /// Example: tasklist edit 3f2b... (interactive mode asks which field)
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        due: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: tasklist delete 3f2b...
    Delete { id: String },
    /// Search titles and descriptions (case-insensitive)
    ///
    /// Example: tasklist search milk
    Search {
        #[arg(default_value = "")]
        term: String,
    },
    /// Show counts and percentages by status and difficulty
    ///
    /// Example: tasklist stats
    Stats,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverride {
    Color(bool),
    StorePath(String),
}

/// Parse a raw `KEY=VALUE` override string.
pub fn parse_config_override(raw: &str) -> Result<ConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim();
    let field = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;
    if value.is_empty() {
        return Err(format!("{CONFIG_OVERRIDE_FLAG} {field} needs a value"));
    }

    match field.as_str() {
        "color" | "colour" => parse_switch(value)
            .map(ConfigOverride::Color)
            .ok_or_else(|| format!("{field} expects on or off, got '{value}'")),
        "store_path" | "store" | "path" => Ok(ConfigOverride::StorePath(value.to_string())),
        other => Err(format!("unknown config field '{other}'")),
    }
}

pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        match parse_config_override(entry)? {
            ConfigOverride::Color(on) => overrides.color = Some(on),
            ConfigOverride::StorePath(path) => overrides.store_path = Some(path),
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
