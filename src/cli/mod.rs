pub mod areas;
pub mod blocks;
pub mod dashboard;
pub mod output;
pub mod targets;

use std::fmt::Display;
use std::{env, path::PathBuf};

use anyhow::Result;
use areas::{process_areas_command, AreasCommand};
use blocks::{process_blocks_command, process_log_command, BlocksCommand, LogCommand};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use dashboard::{process_dashboard_command, DashboardCommand};
use targets::{process_targets_command, TargetsCommand};
use tokio::io;
use tracing::level_filters::LevelFilter;

use crate::store::entities::AreaEntity;
use crate::store::JsonStore;
use crate::utils::logging::{enable_logging, CLI_PREFIX};

#[derive(Parser, Debug)]
#[command(name = "Timeblocks", version, long_about = None)]
#[command(about = "Track time blocks across life areas from the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show aggregate progress for a week, month, year or all time")]
    Dashboard {
        #[command(flatten)]
        command: DashboardCommand,
    },
    #[command(about = "Log a new block")]
    Log {
        #[command(flatten)]
        command: LogCommand,
    },
    #[command(about = "List, edit, delete or duplicate logged blocks")]
    Blocks {
        #[command(subcommand)]
        command: BlocksCommand,
    },
    #[command(about = "Manage life areas and their display order")]
    Areas {
        #[command(subcommand)]
        command: AreasCommand,
    },
    #[command(about = "Manage monthly targets")]
    Targets {
        #[command(subcommand)]
        command: TargetsCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let application_path = match args.dir {
        Some(dir) => dir,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &application_path, logging_level, args.log)?;

    let store = JsonStore::new(application_path.join("records"))?;

    match args.commands {
        Commands::Dashboard { command } => process_dashboard_command(&store, command).await,
        Commands::Log { command } => process_log_command(&store, command).await,
        Commands::Blocks { command } => process_blocks_command(&store, command).await,
        Commands::Areas { command } => process_areas_command(&store, command).await,
        Commands::Targets { command } => process_targets_command(&store, command).await,
    }
}

pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path =
                PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
            path.push("timeblocks");
            path
        }
        #[cfg(target_os = "linux")]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
            path.push("timeblocks");
            path
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Parses a human date argument ("yesterday", "15/03/2025"), defaulting to
/// today when absent.
pub(crate) fn parse_date_arg(value: Option<&str>, style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    match value {
        None => Ok(now.date_naive()),
        Some(s) => match parse_date_string(s, now, style.into()) {
            Ok(v) => Ok(v.date_naive()),
            Err(e) => Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate date {s}: {e}"),
                )
                .into()),
        },
    }
}

/// Resolves an area by name, case-insensitively.
pub(crate) fn find_area<'a>(areas: &'a [AreaEntity], name: &str) -> Result<&'a AreaEntity> {
    areas
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            let known = areas
                .iter()
                .map(|a| a.name.as_ref())
                .collect::<Vec<_>>()
                .join(", ");
            Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    if known.is_empty() {
                        format!("No area named \"{name}\". Create one with `areas add`")
                    } else {
                        format!("No area named \"{name}\". Known areas: {known}")
                    },
                )
                .into()
        })
}
