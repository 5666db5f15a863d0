use super::ui;
use crate::core::engine::{RateEngine, RateEntry, RatesTable};
use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

pub async fn run(engine: &RateEngine, base: &str) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching rates for {}", base.to_uppercase()));
    let result = engine.get_rates(base, Utc::now()).await;
    pb.finish_and_clear();
    let table = result?;

    if table.rates.is_empty() {
        println!("No other currencies are registered.");
        return Ok(());
    }

    println!(
        "\nRates for 1 {}",
        ui::style_text(&table.base, ui::StyleType::Title)
    );
    println!("{}", rates_table(&table));

    let failed = table
        .rates
        .iter()
        .filter(|(_, entry)| matches!(entry, RateEntry::Failed { .. }))
        .count();
    if failed > 0 {
        println!(
            "{}",
            ui::style_text(
                &format!("{failed} of {} rates could not be resolved", table.rates.len()),
                ui::StyleType::Error
            )
        );
    }
    Ok(())
}

fn rates_table(table: &RatesTable) -> Table {
    let mut rendered = ui::new_styled_table();
    rendered.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Rate"),
        ui::header_cell("Change"),
        ui::header_cell("Updated"),
    ]);

    for (code, entry) in &table.rates {
        let row = match entry {
            RateEntry::Quote {
                value,
                change,
                timestamp,
            } => vec![
                Cell::new(code),
                ui::rate_cell(*value),
                ui::change_cell(*change),
                Cell::new(ui::style_text(timestamp, ui::StyleType::Subtle)),
            ],
            RateEntry::Failed { error } => vec![
                Cell::new(code),
                ui::na_cell(),
                ui::na_cell(),
                ui::error_cell(error),
            ],
        };
        rendered.add_row(row);
    }
    rendered
}
