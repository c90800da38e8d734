use anyhow::{bail, Result};
use chrono::Local;
use clap::Subcommand;

use crate::store::entities::{AreaEntity, BlockType, MonthKey, NewTarget, TargetEntity};
use crate::store::RecordStore;

use super::find_area;
use super::output::swatch;

#[derive(Subcommand, Debug)]
pub enum TargetsCommand {
    #[command(about = "List targets for a month")]
    List {
        #[arg(long, short, help = "Month as YYYY-MM, defaults to the current month")]
        month: Option<MonthKey>,
    },
    #[command(about = "Set a monthly target, replacing the count of an existing one")]
    Set {
        #[arg(help = "Area name, case-insensitive")]
        area: String,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
        #[arg(long, short, value_enum, help = "Count only this block kind")]
        kind: Option<BlockType>,
        #[arg(long, short, help = "Month as YYYY-MM, defaults to the current month")]
        month: Option<MonthKey>,
    },
    #[command(about = "Delete a target")]
    Delete { id: u64 },
}

pub async fn process_targets_command(
    store: &impl RecordStore,
    command: TargetsCommand,
) -> Result<()> {
    match command {
        TargetsCommand::List { month } => {
            let month = resolve_month(month);
            let areas = store.areas().await?;
            let targets = store.targets_for_month(month).await?;
            println!("{month}");
            print_target_list(&targets, &areas);
            Ok(())
        }
        TargetsCommand::Set {
            area,
            count,
            kind,
            month,
        } => {
            let month = resolve_month(month);
            let areas = store.areas().await?;
            let area = find_area(&areas, &area)?;

            // One target per (area, kind) in a month. Setting again replaces
            // the count instead of stacking a second target.
            let targets = store.targets_for_month(month).await?;
            let existing = targets
                .iter()
                .find(|t| t.area_id == area.id && t.block_type == kind);
            match existing {
                Some(target) => {
                    store
                        .update_target(TargetEntity {
                            target_count: count,
                            ..target.clone()
                        })
                        .await?
                }
                None => {
                    store
                        .insert_target(NewTarget {
                            month,
                            area_id: area.id,
                            block_type: kind,
                            target_count: count,
                        })
                        .await?;
                }
            }

            print_target_list(&store.targets_for_month(month).await?, &areas);
            Ok(())
        }
        TargetsCommand::Delete { id } => {
            store.delete_target(id).await?;
            println!("Deleted target #{id}");
            Ok(())
        }
    }
}

fn resolve_month(month: Option<MonthKey>) -> MonthKey {
    month.unwrap_or_else(|| MonthKey::from_date(Local::now().date_naive()))
}

fn print_target_list(targets: &[TargetEntity], areas: &[AreaEntity]) {
    if targets.is_empty() {
        println!("No targets set for this month");
        return;
    }
    for target in targets {
        let (name, color) = areas
            .iter()
            .find(|a| a.id == target.area_id)
            .map(|a| (a.name.as_ref(), a.color.as_ref()))
            .unwrap_or(("Unknown", ""));
        let kind = target
            .block_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "Any".to_string());
        println!(
            "#{}\t{} {}\t{kind}\t{} per month",
            target.id,
            swatch(color),
            name,
            target.target_count
        );
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::store::entities::{BlockType, MonthKey, NewArea};
    use crate::store::{JsonStore, RecordStore};
    use crate::utils::logging::TEST_LOGGING;

    use super::{process_targets_command, TargetsCommand};

    async fn store_with_area(dir: &std::path::Path) -> Result<JsonStore> {
        let store = JsonStore::new(dir.to_path_buf())?;
        store
            .insert_area(NewArea {
                name: "startup".into(),
                color: "#3b82f6".into(),
                display_order: Some(0),
            })
            .await?;
        Ok(store)
    }

    #[tokio::test]
    async fn test_set_replaces_existing_target_count() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store_with_area(dir.path()).await?;
        let month = MonthKey::new(2024, 5).unwrap();

        for count in [8, 12] {
            process_targets_command(
                &store,
                TargetsCommand::Set {
                    area: "startup".to_string(),
                    count,
                    kind: Some(BlockType::Deep),
                    month: Some(month),
                },
            )
            .await?;
        }

        let targets = store.targets_for_month(month).await?;
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].target_count, 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_typed_and_typeless_targets_coexist() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store_with_area(dir.path()).await?;
        let month = MonthKey::new(2024, 5).unwrap();

        for kind in [Some(BlockType::Deep), None] {
            process_targets_command(
                &store,
                TargetsCommand::Set {
                    area: "startup".to_string(),
                    count: 4,
                    kind,
                    month: Some(month),
                },
            )
            .await?;
        }

        let targets = store.targets_for_month(month).await?;
        assert_eq!(targets.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_target() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = store_with_area(dir.path()).await?;
        let month = MonthKey::new(2024, 5).unwrap();

        process_targets_command(
            &store,
            TargetsCommand::Set {
                area: "startup".to_string(),
                count: 4,
                kind: None,
                month: Some(month),
            },
        )
        .await?;
        let targets = store.targets_for_month(month).await?;

        process_targets_command(&store, TargetsCommand::Delete { id: targets[0].id }).await?;
        assert!(store.targets_for_month(month).await?.is_empty());
        Ok(())
    }
}
