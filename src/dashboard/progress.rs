use crate::store::entities::{AreaEntity, BlockEntity, TargetEntity};

use super::period::ViewType;

/// One monthly target joined with its in-period completions.
#[derive(Debug)]
pub struct TargetProgress {
    pub target: TargetEntity,
    /// Target count scaled to the view granularity, never persisted.
    pub adapted_count: u32,
    pub completed: usize,
    /// Clamped to [0, 100] even when completions exceed the target.
    pub percentage: u8,
    /// Matching blocks, most recent date first.
    pub blocks: Vec<BlockEntity>,
}

/// Progress of a single area: its targets plus raw totals so areas without
/// targets still surface when they have activity.
#[derive(Debug)]
pub struct AreaProgress {
    pub area: AreaEntity,
    pub targets: Vec<TargetProgress>,
    pub total_blocks: usize,
    pub total_minutes: u64,
}

/// Scales a stored monthly target count to the view granularity.
pub fn adapt_target_count(view: ViewType, monthly: u32) -> u32 {
    match view {
        ViewType::Week => monthly.div_ceil(4),
        ViewType::Year => monthly.saturating_mul(12),
        ViewType::Month | ViewType::All => monthly,
    }
}

pub fn completion_percentage(completed: usize, adapted: u32) -> u8 {
    if adapted == 0 {
        return 0;
    }
    let raw = (completed as f64 / adapted as f64 * 100.).round() as u64;
    raw.min(100) as u8
}

/// Joins every area with its reference-month targets and in-period blocks.
/// Areas with neither targets nor blocks are dropped; area order is kept.
pub fn target_progress(
    areas: &[AreaEntity],
    targets: &[TargetEntity],
    blocks: &[BlockEntity],
    view: ViewType,
) -> Vec<AreaProgress> {
    areas
        .iter()
        .map(|area| {
            let area_blocks: Vec<&BlockEntity> =
                blocks.iter().filter(|b| b.area_id == area.id).collect();
            let total_minutes = area_blocks
                .iter()
                .map(|b| b.duration_minutes as u64)
                .sum();

            let targets = targets
                .iter()
                .filter(|t| t.area_id == area.id)
                .map(|target| {
                    let mut matching: Vec<BlockEntity> = area_blocks
                        .iter()
                        .filter(|b| target.matches(b))
                        .map(|b| (*b).clone())
                        .collect();
                    matching.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

                    let adapted_count = adapt_target_count(view, target.target_count);
                    let completed = matching.len();
                    TargetProgress {
                        target: target.clone(),
                        adapted_count,
                        completed,
                        percentage: completion_percentage(completed, adapted_count),
                        blocks: matching,
                    }
                })
                .collect::<Vec<_>>();

            AreaProgress {
                area: area.clone(),
                total_blocks: area_blocks.len(),
                total_minutes,
                targets,
            }
        })
        .filter(|progress| !progress.targets.is_empty() || progress.total_blocks > 0)
        .collect()
}

/// One cell of the completion grid.
#[derive(Debug, PartialEq, Eq)]
pub enum GridCell<'a> {
    Filled(&'a BlockEntity),
    Empty,
}

/// One cell per unit of the adapted target: the most recent completions fill
/// from the left, the rest are placeholders. Completions beyond the adapted
/// count are not represented.
pub fn grid_cells(progress: &TargetProgress) -> Vec<GridCell<'_>> {
    let adapted = progress.adapted_count as usize;
    let filled = progress.blocks.len().min(adapted);
    let mut cells: Vec<GridCell> = progress.blocks[..filled].iter().map(GridCell::Filled).collect();
    cells.extend((filled..adapted).map(|_| GridCell::Empty));
    cells
}

/// Remove-at-source, insert-at-destination over the displayed list.
pub fn move_index<T: Clone>(list: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = list.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    moved
}

/// Areas whose display order changes when the displayed list is reordered
/// by moving `from` to `to`. Each returned area carries its new order; only
/// changed areas are written, one update per record.
pub fn reorder_updates(displayed: &[AreaEntity], from: usize, to: usize) -> Vec<AreaEntity> {
    move_index(displayed, from, to)
        .into_iter()
        .enumerate()
        .filter(|(index, area)| area.display_order != Some(*index as u32))
        .map(|(index, mut area)| {
            area.display_order = Some(index as u32);
            area
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use crate::dashboard::period::ViewType;
    use crate::store::entities::{AreaEntity, BlockEntity, BlockType, MonthKey, TargetEntity};

    use super::{
        adapt_target_count, completion_percentage, grid_cells, move_index, reorder_updates,
        target_progress, GridCell,
    };

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();

    fn area(id: u64, order: Option<u32>) -> AreaEntity {
        AreaEntity {
            id,
            name: format!("area {id}").into(),
            color: "#10b981".into(),
            display_order: order,
            created_at: Utc::now(),
        }
    }

    fn block(id: u64, area_id: u64, date: NaiveDate, block_type: BlockType) -> BlockEntity {
        BlockEntity {
            id,
            date,
            area_id,
            block_type,
            duration_minutes: 90,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn target(id: u64, area_id: u64, block_type: Option<BlockType>, count: u32) -> TargetEntity {
        TargetEntity {
            id,
            month: MonthKey::new(2024, 5).unwrap(),
            area_id,
            block_type,
            target_count: count,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_target_adaptation_by_view() {
        assert_eq!(adapt_target_count(ViewType::Week, 10), 3);
        assert_eq!(adapt_target_count(ViewType::Year, 10), 120);
        assert_eq!(adapt_target_count(ViewType::Month, 10), 10);
        assert_eq!(adapt_target_count(ViewType::All, 10), 10);
        assert_eq!(adapt_target_count(ViewType::Week, 8), 2);
    }

    #[test]
    fn test_percentage_is_clamped_and_guards_zero() {
        assert_eq!(completion_percentage(15, 10), 100);
        assert_eq!(completion_percentage(3, 10), 30);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(0, 10), 0);
        assert_eq!(completion_percentage(5, 0), 0);
    }

    #[test]
    fn test_progress_joins_targets_with_matching_blocks() {
        let areas = [area(1, Some(0))];
        let targets = [target(1, 1, Some(BlockType::Deep), 10)];
        let blocks = [
            block(1, 1, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), BlockType::Deep),
            block(2, 1, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(), BlockType::Deep),
            block(3, 1, TEST_DATE, BlockType::Gym),
        ];

        let progress = target_progress(&areas, &targets, &blocks, ViewType::Month);
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].total_blocks, 3);
        assert_eq!(progress[0].total_minutes, 270);

        let deep = &progress[0].targets[0];
        assert_eq!(deep.completed, 2);
        assert_eq!(deep.percentage, 20);
        // most recent first
        assert_eq!(deep.blocks[0].id, 2);
        assert_eq!(deep.blocks[1].id, 1);
    }

    #[test]
    fn test_typeless_target_matches_every_block_type() {
        let areas = [area(1, Some(0))];
        let targets = [target(1, 1, None, 5)];
        let blocks = [
            block(1, 1, TEST_DATE, BlockType::Deep),
            block(2, 1, TEST_DATE, BlockType::Gym),
        ];
        let progress = target_progress(&areas, &targets, &blocks, ViewType::Month);
        assert_eq!(progress[0].targets[0].completed, 2);
    }

    #[test]
    fn test_areas_without_targets_or_blocks_are_dropped() {
        let areas = [area(1, Some(0)), area(2, Some(1)), area(3, Some(2))];
        let targets = [target(1, 1, Some(BlockType::Deep), 10)];
        let blocks = [block(1, 2, TEST_DATE, BlockType::Gym)];

        let progress = target_progress(&areas, &targets, &blocks, ViewType::Month);
        let ids: Vec<u64> = progress.iter().map(|p| p.area.id).collect();
        // area 3 has neither targets nor blocks
        assert_eq!(ids, vec![1, 2]);
        // area 2 surfaces with raw totals only
        assert!(progress[1].targets.is_empty());
        assert_eq!(progress[1].total_blocks, 1);
    }

    #[test]
    fn test_grid_fills_most_recent_up_to_adapted_count() {
        let areas = [area(1, Some(0))];
        let targets = [target(1, 1, Some(BlockType::Deep), 3)];
        let blocks: Vec<BlockEntity> = (1..=5)
            .map(|i| {
                block(
                    i,
                    1,
                    NaiveDate::from_ymd_opt(2024, 5, i as u32).unwrap(),
                    BlockType::Deep,
                )
            })
            .collect();

        let progress = target_progress(&areas, &targets, &blocks, ViewType::Month);
        let cells = grid_cells(&progress[0].targets[0]);
        assert_eq!(cells.len(), 3);
        // 5 completions against a target of 3: only the 3 most recent show
        assert!(cells.iter().all(|c| matches!(c, GridCell::Filled(_))));
        let GridCell::Filled(first) = &cells[0] else {
            unreachable!()
        };
        assert_eq!(first.id, 5);
    }

    #[test]
    fn test_grid_pads_with_placeholders() {
        let areas = [area(1, Some(0))];
        let targets = [target(1, 1, Some(BlockType::Deep), 4)];
        let blocks = [block(1, 1, TEST_DATE, BlockType::Deep)];

        let progress = target_progress(&areas, &targets, &blocks, ViewType::Month);
        let cells = grid_cells(&progress[0].targets[0]);
        assert_eq!(cells.len(), 4);
        assert!(matches!(cells[0], GridCell::Filled(_)));
        assert_eq!(cells.iter().filter(|c| **c == GridCell::Empty).count(), 3);
    }

    #[test]
    fn test_move_index_matches_drag_semantics() {
        let list = vec!["a", "b", "c", "d"];
        assert_eq!(move_index(&list, 2, 0), vec!["c", "a", "b", "d"]);
        assert_eq!(move_index(&list, 0, 3), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_reorder_updates_only_changed_areas() {
        let displayed = [area(10, Some(0)), area(20, Some(1)), area(30, Some(2))];

        // swapping the first two leaves the third untouched
        let updates = reorder_updates(&displayed, 0, 1);
        let changed: Vec<(u64, Option<u32>)> =
            updates.iter().map(|a| (a.id, a.display_order)).collect();
        assert_eq!(changed, vec![(20, Some(0)), (10, Some(1))]);
    }

    #[test]
    fn test_reorder_assigns_order_to_unordered_areas() {
        let displayed = [area(10, Some(0)), area(20, None)];
        let updates = reorder_updates(&displayed, 1, 0);
        let changed: Vec<(u64, Option<u32>)> =
            updates.iter().map(|a| (a.id, a.display_order)).collect();
        assert_eq!(changed, vec![(20, Some(0)), (10, Some(1))]);
    }
}
