use anyhow::Result;
use chrono::Local;

use crate::dashboard::period::{resolve_period, step_reference, ViewType};
use crate::dashboard::progress::target_progress;
use crate::dashboard::stats::{activity_series, area_breakdown, summarize, type_breakdown};
use crate::store::entities::MonthKey;
use crate::store::RecordStore;

use super::output::{
    print_activity_series, print_area_breakdown, print_block_line, print_progress, print_summary,
    print_type_breakdown,
};
use super::{parse_date_arg, DateStyle};

const RECENT_LIMIT: usize = 10;

#[derive(clap::Args, Debug)]
pub struct DashboardCommand {
    #[arg(long, short, value_enum, default_value_t = ViewType::Month)]
    pub view: ViewType,
    #[arg(long, short, help = "Reference date, like \"today\" or \"12 Mar 2025\"")]
    pub date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk)]
    pub date_style: DateStyle,
    #[arg(
        long,
        short,
        default_value_t = 0,
        allow_negative_numbers = true,
        help = "Shift the period by this many weeks/months/years"
    )]
    pub step: i32,
}

pub async fn process_dashboard_command(
    store: &impl RecordStore,
    command: DashboardCommand,
) -> Result<()> {
    let today = Local::now().date_naive();
    let reference = step_reference(
        command.view,
        parse_date_arg(command.date.as_deref(), command.date_style)?,
        command.step,
    );
    let range = resolve_period(command.view, reference, today);

    let areas = store.areas().await?;
    let blocks = store.blocks_between(range.start, range.end).await?;
    let targets = store.targets_for_month(MonthKey::from_date(reference)).await?;

    println!("{}", range.label());
    println!();
    print_summary(&summarize(&blocks));
    println!();
    print_type_breakdown(&type_breakdown(&blocks));
    println!();
    print_area_breakdown(&area_breakdown(&areas, &blocks));
    println!();
    print_activity_series(&activity_series(&blocks, &range));
    println!();

    let progress = target_progress(&areas, &targets, &blocks, command.view);
    if !progress.is_empty() {
        println!("Targets");
        print_progress(&progress);
    }

    if !blocks.is_empty() {
        println!("Recent activity");
        for block in blocks.iter().take(RECENT_LIMIT) {
            print_block_line(block, &areas);
        }
    }

    Ok(())
}
