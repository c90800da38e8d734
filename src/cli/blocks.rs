use anyhow::{bail, Result};
use chrono::Local;
use clap::Subcommand;

use crate::dashboard::period::{resolve_period, ViewType};
use crate::store::entities::{BlockEntity, BlockType, NewBlock};
use crate::store::RecordStore;

use super::output::print_block_line;
use super::{find_area, parse_date_arg, DateStyle};

#[derive(clap::Args, Debug)]
pub struct LogCommand {
    #[arg(help = "Area name, case-insensitive")]
    pub area: String,
    #[arg(value_enum)]
    pub kind: BlockType,
    #[arg(long, short, help = "Block date, defaults to today")]
    pub date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk)]
    pub date_style: DateStyle,
    #[arg(
        long,
        short,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Duration in minutes, defaults per block kind"
    )]
    pub minutes: Option<u32>,
    #[arg(long, short)]
    pub notes: Option<String>,
}

pub async fn process_log_command(store: &impl RecordStore, command: LogCommand) -> Result<()> {
    let areas = store.areas().await?;
    let area = find_area(&areas, &command.area)?;
    let date = parse_date_arg(command.date.as_deref(), command.date_style)?;

    let created = store
        .insert_block(NewBlock {
            date,
            area_id: area.id,
            block_type: command.kind,
            duration_minutes: command.minutes.unwrap_or_else(|| command.kind.default_minutes()),
            notes: command.notes.map(Into::into),
        })
        .await?;

    print_refetched(store, created.id, "Logged").await
}

#[derive(Subcommand, Debug)]
pub enum BlocksCommand {
    #[command(about = "List blocks in a period, newest first")]
    List {
        #[arg(long, short, value_enum, default_value_t = ViewType::Month)]
        view: ViewType,
        #[arg(long, short)]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk)]
        date_style: DateStyle,
    },
    #[command(about = "Change fields of a logged block")]
    Edit {
        id: u64,
        #[arg(long)]
        area: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<BlockType>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk)]
        date_style: DateStyle,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        minutes: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, conflicts_with = "notes")]
        clear_notes: bool,
    },
    #[command(about = "Delete a logged block")]
    Delete { id: u64 },
    #[command(about = "Log a copy of an existing block, keeping its date")]
    Duplicate { id: u64 },
}

pub async fn process_blocks_command(
    store: &impl RecordStore,
    command: BlocksCommand,
) -> Result<()> {
    match command {
        BlocksCommand::List {
            view,
            date,
            date_style,
        } => {
            let today = Local::now().date_naive();
            let reference = parse_date_arg(date.as_deref(), date_style)?;
            let range = resolve_period(view, reference, today);

            let areas = store.areas().await?;
            let blocks = store.blocks_between(range.start, range.end).await?;
            println!("{}", range.label());
            for block in &blocks {
                print_block_line(block, &areas);
            }
            Ok(())
        }
        BlocksCommand::Edit {
            id,
            area,
            kind,
            date,
            date_style,
            minutes,
            notes,
            clear_notes,
        } => {
            let mut block = require_block(store, id).await?;

            if let Some(name) = area {
                let areas = store.areas().await?;
                block.area_id = find_area(&areas, &name)?.id;
            }
            if let Some(kind) = kind {
                block.block_type = kind;
            }
            if let Some(date) = date {
                block = block.with_date(parse_date_arg(Some(&date), date_style)?);
            }
            if let Some(minutes) = minutes {
                block = block.with_duration(minutes);
            }
            if clear_notes {
                block.notes = None;
            } else if let Some(notes) = notes {
                block.notes = Some(notes.into());
            }

            store.update_block(block).await?;
            print_refetched(store, id, "Updated").await
        }
        BlocksCommand::Delete { id } => {
            require_block(store, id).await?;
            store.delete_block(id).await?;
            println!("Deleted block #{id}");
            Ok(())
        }
        BlocksCommand::Duplicate { id } => {
            let block = require_block(store, id).await?;
            let created = store.insert_block(block.into()).await?;
            print_refetched(store, created.id, "Logged").await
        }
    }
}

async fn require_block(store: &impl RecordStore, id: u64) -> Result<BlockEntity> {
    match store.block(id).await? {
        Some(block) => Ok(block),
        None => bail!("No block with id {id}"),
    }
}

/// Mutations re-read the stored record before confirming, so the output
/// reflects what actually landed on disk.
async fn print_refetched(store: &impl RecordStore, id: u64, verb: &str) -> Result<()> {
    let block = require_block(store, id).await?;
    let areas = store.areas().await?;
    print!("{verb} ");
    print_block_line(&block, &areas);
    Ok(())
}
