use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::store::entities::{AreaEntity, BlockEntity, BlockType, MonthKey};

use super::period::{PeriodRange, ViewType};

/// Headline numbers for the current period.
#[derive(Debug, PartialEq, Eq)]
pub struct Summary {
    pub total_blocks: usize,
    pub total_minutes: u64,
    pub average_minutes: u64,
}

pub fn summarize(blocks: &[BlockEntity]) -> Summary {
    let total_blocks = blocks.len();
    let total_minutes: u64 = blocks.iter().map(|b| b.duration_minutes as u64).sum();
    let average_minutes = if total_blocks == 0 {
        0
    } else {
        (total_minutes as f64 / total_blocks as f64).round() as u64
    };
    Summary {
        total_blocks,
        total_minutes,
        average_minutes,
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TypeCount {
    pub block_type: BlockType,
    pub count: usize,
}

/// One entry per fixed block type in enumeration order, zero-filled.
pub fn type_breakdown(blocks: &[BlockEntity]) -> Vec<TypeCount> {
    BlockType::ALL
        .into_iter()
        .map(|block_type| TypeCount {
            block_type,
            count: blocks.iter().filter(|b| b.block_type == block_type).count(),
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
pub struct AreaCount {
    pub area_id: u64,
    pub name: Arc<str>,
    pub color: Arc<str>,
    pub count: usize,
}

/// Per-area block counts in area display order. Areas without blocks in the
/// period are left out of this breakdown (but not out of target progress).
pub fn area_breakdown(areas: &[AreaEntity], blocks: &[BlockEntity]) -> Vec<AreaCount> {
    areas
        .iter()
        .map(|area| AreaCount {
            area_id: area.id,
            name: area.name.clone(),
            color: area.color.clone(),
            count: blocks.iter().filter(|b| b.area_id == area.id).count(),
        })
        .filter(|entry| entry.count > 0)
        .collect()
}

/// One point of the activity chart.
#[derive(Debug, PartialEq, Eq)]
pub struct ActivityBucket {
    pub label: String,
    pub count: usize,
}

/// Buckets the period's blocks for charting. Week and month views bucket per
/// calendar day, year per calendar month, both zero-filled across the whole
/// window. The all-time view spans from the earliest to the latest logged
/// block's month and is empty when there are no blocks at all.
pub fn activity_series(blocks: &[BlockEntity], range: &PeriodRange) -> Vec<ActivityBucket> {
    match range.view {
        ViewType::Week | ViewType::Month => {
            let mut per_day = HashMap::<NaiveDate, usize>::new();
            for block in blocks {
                *per_day.entry(block.date).or_default() += 1;
            }
            range
                .start
                .iter_days()
                .take_while(|day| *day <= range.end)
                .map(|day| ActivityBucket {
                    label: match range.view {
                        ViewType::Week => day.format("%a").to_string(),
                        _ => day.day().to_string(),
                    },
                    count: per_day.get(&day).copied().unwrap_or(0),
                })
                .collect()
        }
        ViewType::Year => monthly_buckets(
            blocks,
            MonthKey::from_date(range.start),
            MonthKey::from_date(range.end),
            |month| month.first_day().format("%b").to_string(),
        ),
        ViewType::All => {
            let months = blocks.iter().map(BlockEntity::month_key);
            let Some(first) = months.clone().min() else {
                return vec![];
            };
            // min exists, so max does too
            let last = months.max().unwrap();
            monthly_buckets(blocks, first, last, |month| {
                month.first_day().format("%b %Y").to_string()
            })
        }
    }
}

fn monthly_buckets(
    blocks: &[BlockEntity],
    from: MonthKey,
    to: MonthKey,
    label: impl Fn(MonthKey) -> String,
) -> Vec<ActivityBucket> {
    let mut per_month = HashMap::<MonthKey, usize>::new();
    for block in blocks {
        *per_month.entry(block.month_key()).or_default() += 1;
    }
    MonthKey::range_inclusive(from, to)
        .into_iter()
        .map(|month| ActivityBucket {
            label: label(month),
            count: per_month.get(&month).copied().unwrap_or(0),
        })
        .collect()
}
