use anyhow::{bail, Result};
use clap::Subcommand;

use crate::dashboard::progress::reorder_updates;
use crate::store::entities::{AreaEntity, NewArea};
use crate::store::RecordStore;

use super::output::{parse_hex_color, swatch};

/// Suggested palette, cycled through when areas are added without an
/// explicit color.
pub const PRESET_COLORS: [&str; 11] = [
    "#ef4444", "#f97316", "#f59e0b", "#84cc16", "#10b981", "#06b6d4", "#3b82f6", "#6366f1",
    "#8b5cf6", "#d946ef", "#f43f5e",
];

#[derive(Subcommand, Debug)]
pub enum AreasCommand {
    #[command(about = "List areas in display order")]
    List,
    #[command(about = "Create a new area, appended to the end of the list")]
    Add {
        name: String,
        #[arg(long, short, help = "Hex color like #3b82f6, defaults to a preset")]
        color: Option<String>,
    },
    #[command(about = "Rename or recolor an area")]
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, short)]
        color: Option<String>,
    },
    #[command(about = "Delete an area together with its blocks and targets")]
    Delete { id: u64 },
    #[command(about = "Move an area between 1-based positions of the displayed list")]
    Move { from: usize, to: usize },
}

pub async fn process_areas_command(store: &impl RecordStore, command: AreasCommand) -> Result<()> {
    match command {
        AreasCommand::List => {
            print_area_list(&store.areas().await?);
            Ok(())
        }
        AreasCommand::Add { name, color } => {
            let areas = store.areas().await?;
            if areas.iter().any(|a| a.name.eq_ignore_ascii_case(&name)) {
                bail!("An area named \"{name}\" already exists");
            }
            let color = match color {
                Some(color) => validate_color(color)?,
                None => PRESET_COLORS[areas.len() % PRESET_COLORS.len()].to_string(),
            };
            let display_order = areas
                .iter()
                .filter_map(|a| a.display_order)
                .max()
                .map(|order| order + 1)
                .unwrap_or(0);

            store
                .insert_area(NewArea {
                    name: name.into(),
                    color: color.into(),
                    display_order: Some(display_order),
                })
                .await?;
            print_area_list(&store.areas().await?);
            Ok(())
        }
        AreasCommand::Edit { id, name, color } => {
            let areas = store.areas().await?;
            let mut area = require_area(&areas, id)?.clone();
            if let Some(name) = name {
                area.name = name.into();
            }
            if let Some(color) = color {
                area.color = validate_color(color)?.into();
            }
            store.update_area(area).await?;
            print_area_list(&store.areas().await?);
            Ok(())
        }
        AreasCommand::Delete { id } => {
            let areas = store.areas().await?;
            let area = require_area(&areas, id)?;
            let name = area.name.clone();
            store.delete_area(id).await?;
            println!("Deleted {name} and all of its blocks and targets");
            print_area_list(&store.areas().await?);
            Ok(())
        }
        AreasCommand::Move { from, to } => {
            let areas = store.areas().await?;
            if from == 0 || to == 0 || from > areas.len() || to > areas.len() {
                bail!("Positions must be between 1 and {}", areas.len());
            }
            // One write per changed record. A crash mid-way leaves a partial
            // order, which the next reorder repairs.
            for update in reorder_updates(&areas, from - 1, to - 1) {
                store.update_area(update).await?;
            }
            print_area_list(&store.areas().await?);
            Ok(())
        }
    }
}

fn require_area(areas: &[AreaEntity], id: u64) -> Result<&AreaEntity> {
    match areas.iter().find(|a| a.id == id) {
        Some(area) => Ok(area),
        None => bail!("No area with id {id}"),
    }
}

fn validate_color(color: String) -> Result<String> {
    if parse_hex_color(&color).is_none() {
        bail!("Expected a hex color like #3b82f6, got {color}");
    }
    Ok(color)
}

fn print_area_list(areas: &[AreaEntity]) {
    for (position, area) in areas.iter().enumerate() {
        println!(
            "{}. {} {}\t{}\t#{}",
            position + 1,
            swatch(&area.color),
            area.name,
            area.color,
            area.id
        );
    }
}
