use ansi_term::Colour;
use chrono::NaiveDate;

use crate::dashboard::progress::{grid_cells, AreaProgress, GridCell};
use crate::dashboard::stats::{ActivityBucket, AreaCount, Summary, TypeCount};
use crate::store::entities::{AreaEntity, BlockEntity};

const BAR_WIDTH: usize = 30;
const COMPLETED_CELL_COLOR: (u8, u8, u8) = (135, 255, 108);

pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours > 0 && mins > 0 {
        format!("{hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h")
    } else {
        format!("{mins}m")
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub(crate) fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Colored dot for an area. Unparsable colors fall back to an uncolored dot.
pub fn swatch(color: &str) -> String {
    match parse_hex_color(color) {
        Some((r, g, b)) => Colour::RGB(r, g, b).paint("●").to_string(),
        None => "●".to_string(),
    }
}

pub fn area_name(areas: &[AreaEntity], area_id: u64) -> &str {
    // dangling references degrade to a placeholder instead of failing
    areas
        .iter()
        .find(|a| a.id == area_id)
        .map(|a| a.name.as_ref())
        .unwrap_or("Unknown")
}

fn bar(count: usize, max: usize) -> String {
    if count == 0 || max == 0 {
        return String::new();
    }
    let length = (count * BAR_WIDTH).div_ceil(max).min(BAR_WIDTH);
    "█".repeat(length)
}

pub fn print_summary(summary: &Summary) {
    println!(
        "{} blocks\t{} total\t{} avg",
        summary.total_blocks,
        format_minutes(summary.total_minutes),
        format_minutes(summary.average_minutes)
    );
}

pub fn print_type_breakdown(breakdown: &[TypeCount]) {
    println!("Blocks by type");
    let max = breakdown.iter().map(|t| t.count).max().unwrap_or(0);
    for entry in breakdown {
        println!(
            "  {:<8}{:<4}{}",
            entry.block_type.to_string(),
            entry.count,
            bar(entry.count, max)
        );
    }
}

pub fn print_area_breakdown(breakdown: &[AreaCount]) {
    println!("Blocks by area");
    if breakdown.is_empty() {
        println!("  No blocks in this period");
        return;
    }
    let max = breakdown.iter().map(|a| a.count).max().unwrap_or(0);
    for entry in breakdown {
        println!(
            "  {} {:<16}{:<4}{}",
            swatch(&entry.color),
            entry.name,
            entry.count,
            bar(entry.count, max)
        );
    }
}

pub fn print_activity_series(series: &[ActivityBucket]) {
    println!("Activity");
    if series.is_empty() {
        println!("  No activity recorded yet");
        return;
    }
    let max = series.iter().map(|b| b.count).max().unwrap_or(0);
    let label_width = series.iter().map(|b| b.label.len()).max().unwrap_or(0);
    for bucket in series {
        println!(
            "  {:>label_width$}  {:<4}{}",
            bucket.label,
            bucket.count,
            bar(bucket.count, max)
        );
    }
}

pub fn print_progress(groups: &[AreaProgress]) {
    for group in groups {
        println!(
            "{} {}\t{} blocks, {}",
            swatch(&group.area.color),
            group.area.name,
            group.total_blocks,
            format_minutes(group.total_minutes)
        );

        if group.targets.is_empty() {
            println!(
                "    Total: {} blocks ({})",
                group.total_blocks,
                format_minutes(group.total_minutes)
            );
        }

        for progress in &group.targets {
            let kind = progress
                .target
                .block_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "Any".to_string());
            println!(
                "    {kind} {}/{} ({}%)\t{}",
                progress.completed,
                progress.adapted_count,
                progress.percentage,
                render_grid(&grid_cells(progress))
            );
            for block in progress.blocks.iter().take(progress.adapted_count as usize) {
                match &block.notes {
                    Some(notes) => println!(
                        "      {}\t{}\t{notes}",
                        format_date(block.date),
                        format_minutes(block.duration_minutes as u64)
                    ),
                    None => println!(
                        "      {}\t{}",
                        format_date(block.date),
                        format_minutes(block.duration_minutes as u64)
                    ),
                }
            }
        }
        println!();
    }
}

fn render_grid(cells: &[GridCell<'_>]) -> String {
    let (r, g, b) = COMPLETED_CELL_COLOR;
    cells
        .iter()
        .map(|cell| match cell {
            GridCell::Filled(_) => Colour::RGB(r, g, b).paint("■").to_string(),
            GridCell::Empty => "□".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn print_block_line(block: &BlockEntity, areas: &[AreaEntity]) {
    let name = area_name(areas, block.area_id);
    match &block.notes {
        Some(notes) => println!(
            "#{}\t{}\t{}\t{}\t{}\t{notes}",
            block.id,
            format_date(block.date),
            name,
            block.block_type,
            format_minutes(block.duration_minutes as u64)
        ),
        None => println!(
            "#{}\t{}\t{}\t{}\t{}",
            block.id,
            format_date(block.date),
            name,
            block.block_type,
            format_minutes(block.duration_minutes as u64)
        ),
    }
}
