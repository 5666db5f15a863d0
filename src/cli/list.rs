use super::ui;
use crate::core::currency::CurrencyView;
use crate::core::engine::RateEngine;
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn run(engine: &RateEngine) -> Result<()> {
    let currencies = engine.list_currencies().await?;
    if currencies.is_empty() {
        println!("No currencies are registered.");
        return Ok(());
    }

    println!("{}", ui::style_text("Currencies", ui::StyleType::Title));
    println!("{}", currency_table(&currencies));
    Ok(())
}

fn currency_table(currencies: &[CurrencyView]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("Code"),
        ui::header_cell("Symbol"),
        ui::header_cell("Country"),
        ui::header_cell("Subdivision"),
        ui::header_cell("Rate"),
        ui::header_cell("Direction"),
        ui::header_cell("Peg"),
    ]);

    for currency in currencies {
        table.add_row(vec![
            Cell::new(&currency.name),
            Cell::new(&currency.short),
            Cell::new(&currency.symbol),
            Cell::new(&currency.country),
            currency
                .breakdown
                .as_deref()
                .map_or_else(ui::na_cell, Cell::new),
            ui::rate_cell(currency.exchange_rate),
            Cell::new(currency.exchange_direction.to_string()),
            Cell::new(&currency.forex),
        ]);
    }
    table
}
