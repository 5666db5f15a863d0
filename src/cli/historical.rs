use super::ui;
use crate::core::engine::RateEngine;
use crate::core::forex::RatePoint;
use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use comfy_table::{Attribute, Cell, Table};
use rust_decimal::Decimal;

/// Days covered when no start date is given.
const DEFAULT_WINDOW_DAYS: i64 = 30;

pub async fn run(
    engine: &RateEngine,
    from: &str,
    to: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let start = start.unwrap_or(end - Duration::days(DEFAULT_WINDOW_DAYS));

    let pb = ui::new_spinner("Fetching historical rates");
    let result = engine.get_historical_rates(from, to, start, end).await;
    pb.finish_and_clear();
    let series = result?;

    println!(
        "\n{} {}",
        ui::style_text(
            &format!("{} → {}", from.to_uppercase(), to.to_uppercase()),
            ui::StyleType::Title
        ),
        ui::style_text(&format!("({start} to {end})"), ui::StyleType::Subtle),
    );
    if series.is_empty() {
        println!("No rates available for this period.");
        return Ok(());
    }
    println!("{}", series_table(&series));
    Ok(())
}

/// Percentage change from the first to the last point.
fn period_change(series: &[RatePoint]) -> Option<Decimal> {
    let first = series.first()?.rate;
    let last = series.last()?.rate;
    if first.is_zero() {
        return None;
    }
    Some((last - first) / first * Decimal::ONE_HUNDRED)
}

fn series_table(series: &[RatePoint]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Rate")]);

    for point in series {
        table.add_row(vec![
            Cell::new(point.date.to_string()),
            ui::rate_cell(point.rate),
        ]);
    }

    if series.len() > 1 {
        table.add_row(vec![
            Cell::new("Change").add_attribute(Attribute::Bold),
            period_change(series).map_or_else(ui::na_cell, ui::change_cell),
        ]);
    }
    table
}
