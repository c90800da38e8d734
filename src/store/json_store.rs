use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use fs4::tokio::AsyncFileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use super::entities::{
    AreaEntity, BlockEntity, MonthKey, NewArea, NewBlock, NewTarget, TargetEntity,
};
use super::RecordStore;

const AREAS_FILE: &str = "areas.json";
const BLOCKS_FILE: &str = "blocks.json";
const TARGETS_FILE: &str = "targets.json";

/// The main realization of [RecordStore]. Each record set lives in its own
/// json-lines file under the data directory. Reads take a shared file lock,
/// writes an exclusive one; a mutation re-reads the whole set, applies the
/// change, and rewrites the file.
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&data_dir)?;

        Ok(Self { data_dir })
    }

    async fn read_rows<T: DeserializeOwned + Send>(&self, name: &str) -> Result<Vec<T>> {
        async fn extract<T: DeserializeOwned>(
            path: &Path,
        ) -> std::result::Result<Vec<T>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let buffer = BufReader::new(file);
            let mut lines = buffer.lines();
            let mut rows = vec![];
            while let Ok(Some(v)) = lines.next_line().await {
                match serde_json::from_str::<T>(&v) {
                    Ok(v) => rows.push(v),
                    Err(e) => {
                        // ignore illegal values. Might happen after shutdowns
                        warn!(
                            "During parsing in path {:?} found illegal json string {}:  {e}",
                            path, &v
                        )
                    }
                }
            }

            lines.into_inner().into_inner().unlock_async().await?;

            Ok(rows)
        }

        match extract(&self.data_dir.join(name)).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(vec![])
                } else {
                    Err(e)?
                }
            }
        }
    }

    async fn write_rows<T: Serialize + Sync>(&self, name: &str, rows: &[T]) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(self.data_dir.join(name))
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::overwrite_with_file(&mut file, rows).await;
        file.unlock_async().await?;
        result
    }

    async fn overwrite_with_file<T: Serialize>(file: &mut File, rows: &[T]) -> Result<()> {
        let mut buffer = Vec::<u8>::new();
        for row in rows {
            serde_json::to_writer(&mut buffer, row)?;
            buffer.push(b'\n');
        }

        file.set_len(0).await?;
        file.seek(std::io::SeekFrom::Start(0)).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map_or(1, |v| v + 1)
}

impl RecordStore for JsonStore {
    async fn areas(&self) -> Result<Vec<AreaEntity>> {
        let mut areas: Vec<AreaEntity> = self.read_rows(AREAS_FILE).await?;
        // unordered areas sort after every ordered one
        areas.sort_by_key(|a| (a.display_order.is_none(), a.display_order, a.id));
        Ok(areas)
    }

    async fn blocks_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BlockEntity>> {
        let mut blocks: Vec<BlockEntity> = self.read_rows(BLOCKS_FILE).await?;
        blocks.retain(|b| b.date >= start && b.date <= end);
        blocks.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(blocks)
    }

    async fn block(&self, id: u64) -> Result<Option<BlockEntity>> {
        let blocks: Vec<BlockEntity> = self.read_rows(BLOCKS_FILE).await?;
        Ok(blocks.into_iter().find(|b| b.id == id))
    }

    async fn targets_for_month(&self, month: MonthKey) -> Result<Vec<TargetEntity>> {
        let mut targets: Vec<TargetEntity> = self.read_rows(TARGETS_FILE).await?;
        targets.retain(|t| t.month == month);
        Ok(targets)
    }

    async fn insert_area(&self, area: NewArea) -> Result<AreaEntity> {
        let mut areas: Vec<AreaEntity> = self.read_rows(AREAS_FILE).await?;
        let entity = AreaEntity {
            id: next_id(areas.iter().map(|a| a.id)),
            name: area.name,
            color: area.color,
            display_order: area.display_order,
            created_at: Utc::now(),
        };
        areas.push(entity.clone());
        self.write_rows(AREAS_FILE, &areas).await?;
        Ok(entity)
    }

    async fn update_area(&self, area: AreaEntity) -> Result<()> {
        let mut areas: Vec<AreaEntity> = self.read_rows(AREAS_FILE).await?;
        let Some(slot) = areas.iter_mut().find(|a| a.id == area.id) else {
            bail!("No area with id {}", area.id);
        };
        *slot = area;
        self.write_rows(AREAS_FILE, &areas).await
    }

    async fn delete_area(&self, id: u64) -> Result<()> {
        let mut areas: Vec<AreaEntity> = self.read_rows(AREAS_FILE).await?;
        if !areas.iter().any(|a| a.id == id) {
            bail!("No area with id {id}");
        }
        areas.retain(|a| a.id != id);
        self.write_rows(AREAS_FILE, &areas).await?;

        // Dependent records go with the area. The three writes are not
        // atomic as a group; a failure midway leaves earlier ones committed.
        let mut blocks: Vec<BlockEntity> = self.read_rows(BLOCKS_FILE).await?;
        blocks.retain(|b| b.area_id != id);
        self.write_rows(BLOCKS_FILE, &blocks).await?;

        let mut targets: Vec<TargetEntity> = self.read_rows(TARGETS_FILE).await?;
        targets.retain(|t| t.area_id != id);
        self.write_rows(TARGETS_FILE, &targets).await
    }

    async fn insert_block(&self, block: NewBlock) -> Result<BlockEntity> {
        let mut blocks: Vec<BlockEntity> = self.read_rows(BLOCKS_FILE).await?;
        let entity = BlockEntity {
            id: next_id(blocks.iter().map(|b| b.id)),
            date: block.date,
            area_id: block.area_id,
            block_type: block.block_type,
            duration_minutes: block.duration_minutes,
            notes: block.notes,
            created_at: Utc::now(),
        };
        blocks.push(entity.clone());
        self.write_rows(BLOCKS_FILE, &blocks).await?;
        Ok(entity)
    }

    async fn update_block(&self, block: BlockEntity) -> Result<()> {
        let mut blocks: Vec<BlockEntity> = self.read_rows(BLOCKS_FILE).await?;
        let Some(slot) = blocks.iter_mut().find(|b| b.id == block.id) else {
            bail!("No block with id {}", block.id);
        };
        *slot = block;
        self.write_rows(BLOCKS_FILE, &blocks).await
    }

    async fn delete_block(&self, id: u64) -> Result<()> {
        let mut blocks: Vec<BlockEntity> = self.read_rows(BLOCKS_FILE).await?;
        if !blocks.iter().any(|b| b.id == id) {
            bail!("No block with id {id}");
        }
        blocks.retain(|b| b.id != id);
        self.write_rows(BLOCKS_FILE, &blocks).await
    }

    async fn insert_target(&self, target: NewTarget) -> Result<TargetEntity> {
        let mut targets: Vec<TargetEntity> = self.read_rows(TARGETS_FILE).await?;
        let entity = TargetEntity {
            id: next_id(targets.iter().map(|t| t.id)),
            month: target.month,
            area_id: target.area_id,
            block_type: target.block_type,
            target_count: target.target_count,
            created_at: Utc::now(),
        };
        targets.push(entity.clone());
        self.write_rows(TARGETS_FILE, &targets).await?;
        Ok(entity)
    }

    async fn update_target(&self, target: TargetEntity) -> Result<()> {
        let mut targets: Vec<TargetEntity> = self.read_rows(TARGETS_FILE).await?;
        let Some(slot) = targets.iter_mut().find(|t| t.id == target.id) else {
            bail!("No target with id {}", target.id);
        };
        *slot = target;
        self.write_rows(TARGETS_FILE, &targets).await
    }

    async fn delete_target(&self, id: u64) -> Result<()> {
        let mut targets: Vec<TargetEntity> = self.read_rows(TARGETS_FILE).await?;
        if !targets.iter().any(|t| t.id == id) {
            bail!("No target with id {id}");
        }
        targets.retain(|t| t.id != id);
        self.write_rows(TARGETS_FILE, &targets).await
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use chrono::{Datelike, NaiveDate};
    use tempfile::tempdir;

    use crate::store::entities::{BlockType, MonthKey, NewArea, NewBlock, NewTarget};
    use crate::store::{JsonStore, RecordStore};

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();

    fn new_area(name: &str, display_order: Option<u32>) -> NewArea {
        NewArea {
            name: name.into(),
            color: "#ef4444".into(),
            display_order,
        }
    }

    fn new_block(area_id: u64, date: NaiveDate) -> NewBlock {
        NewBlock {
            date,
            area_id,
            block_type: BlockType::Deep,
            duration_minutes: 90,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_area_ordering_unordered_last() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().to_owned())?;

        store.insert_area(new_area("second", Some(1))).await?;
        store.insert_area(new_area("unordered", None)).await?;
        store.insert_area(new_area("first", Some(0))).await?;

        let areas = store.areas().await?;
        let names: Vec<&str> = areas.iter().map(|a| a.name.as_ref()).collect();
        assert_eq!(names, vec!["first", "second", "unordered"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_blocks_between_filters_and_sorts_newest_first() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().to_owned())?;
        let area = store.insert_area(new_area("startup", Some(0))).await?;

        for day in [1, 3, 20] {
            store
                .insert_block(new_block(
                    area.id,
                    NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                ))
                .await?;
        }
        store
            .insert_block(new_block(
                area.id,
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            ))
            .await?;

        let blocks = store
            .blocks_between(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            )
            .await?;

        let days: Vec<u32> = blocks.iter().map(|b| b.date.day()).collect();
        assert_eq!(days, vec![20, 3, 1]);
        Ok(())
    }

    #[tokio::test]
    async fn test_block_update_and_delete() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().to_owned())?;
        let area = store.insert_area(new_area("gym", Some(0))).await?;
        let block = store.insert_block(new_block(area.id, TEST_DATE)).await?;

        store
            .update_block(block.clone().with_duration(45))
            .await?;
        let stored = store.block(block.id).await?.unwrap();
        assert_eq!(stored.duration_minutes, 45);

        store.delete_block(block.id).await?;
        assert!(store.block(block.id).await?.is_none());

        assert!(store.delete_block(block.id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_targets_queried_by_month() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().to_owned())?;
        let area = store.insert_area(new_area("startup", Some(0))).await?;

        let may = MonthKey::new(2024, 5).unwrap();
        store
            .insert_target(NewTarget {
                month: may,
                area_id: area.id,
                block_type: Some(BlockType::Deep),
                target_count: 10,
            })
            .await?;
        store
            .insert_target(NewTarget {
                month: may.succ(),
                area_id: area.id,
                block_type: Some(BlockType::Deep),
                target_count: 12,
            })
            .await?;

        let targets = store.targets_for_month(may).await?;
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].target_count, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_area_cascades() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().to_owned())?;
        let keep = store.insert_area(new_area("keep", Some(0))).await?;
        let drop = store.insert_area(new_area("drop", Some(1))).await?;

        store.insert_block(new_block(keep.id, TEST_DATE)).await?;
        store.insert_block(new_block(drop.id, TEST_DATE)).await?;
        let month = MonthKey::from_date(TEST_DATE);
        store
            .insert_target(NewTarget {
                month,
                area_id: drop.id,
                block_type: Some(BlockType::Deep),
                target_count: 4,
            })
            .await?;

        store.delete_area(drop.id).await?;

        assert_eq!(store.areas().await?.len(), 1);
        let blocks = store
            .blocks_between(NaiveDate::MIN, NaiveDate::MAX)
            .await?;
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].area_id, keep.id);
        assert!(store.targets_for_month(month).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_skips_corrupted_lines() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().to_owned())?;
        let area = store.insert_area(new_area("startup", Some(0))).await?;
        store.insert_block(new_block(area.id, TEST_DATE)).await?;

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join("blocks.json"))?;
        file.write_all(b"{\"id\": 99, truncated by shutdo")?;

        let blocks = store
            .blocks_between(NaiveDate::MIN, NaiveDate::MAX)
            .await?;
        assert_eq!(blocks.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_ids_are_assigned_incrementally() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonStore::new(dir.path().to_owned())?;
        let a = store.insert_area(new_area("a", None)).await?;
        let b = store.insert_area(new_area("b", None)).await?;
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        store.delete_area(a.id).await?;
        let c = store.insert_area(new_area("c", None)).await?;
        assert_eq!(c.id, 3);
        Ok(())
    }
}
