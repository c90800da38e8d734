pub mod entities;
pub mod json_store;

pub use json_store::JsonStore;

use std::future::Future;

use anyhow::Result;
use chrono::NaiveDate;

use entities::{
    AreaEntity, BlockEntity, MonthKey, NewArea, NewBlock, NewTarget, TargetEntity,
};

/// Interface for abstracting storage of the three record sets. The dashboard
/// only ever needs an ordered area scan, a date-range block query, and an
/// equality target query; mutations are direct per-record writes with no
/// transactional guarantees across calls.
pub trait RecordStore {
    /// All areas, ordered by display order with unordered areas last.
    fn areas(&self) -> impl Future<Output = Result<Vec<AreaEntity>>> + Send;

    /// Blocks with `start <= date <= end`, newest first.
    fn blocks_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<BlockEntity>>> + Send;

    fn block(&self, id: u64) -> impl Future<Output = Result<Option<BlockEntity>>> + Send;

    /// Targets stored under the given month key.
    fn targets_for_month(
        &self,
        month: MonthKey,
    ) -> impl Future<Output = Result<Vec<TargetEntity>>> + Send;

    fn insert_area(&self, area: NewArea) -> impl Future<Output = Result<AreaEntity>> + Send;

    fn update_area(&self, area: AreaEntity) -> impl Future<Output = Result<()>> + Send;

    /// Removes the area together with its blocks and targets.
    fn delete_area(&self, id: u64) -> impl Future<Output = Result<()>> + Send;

    fn insert_block(&self, block: NewBlock) -> impl Future<Output = Result<BlockEntity>> + Send;

    fn update_block(&self, block: BlockEntity) -> impl Future<Output = Result<()>> + Send;

    fn delete_block(&self, id: u64) -> impl Future<Output = Result<()>> + Send;

    fn insert_target(&self, target: NewTarget)
        -> impl Future<Output = Result<TargetEntity>> + Send;

    fn update_target(&self, target: TargetEntity) -> impl Future<Output = Result<()>> + Send;

    fn delete_target(&self, id: u64) -> impl Future<Output = Result<()>> + Send;
}
