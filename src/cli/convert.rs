use super::ui;
use crate::core::engine::RateEngine;
use crate::core::error::RateError;
use anyhow::Result;
use rust_decimal::Decimal;
use tracing::info;

pub async fn run(engine: &RateEngine, amount: Decimal, from: &str, to: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(RateError::InvalidAmount.into());
    }

    info!("Converting {amount} {from} to {to}");
    let result = engine.convert(amount, from, to).await?;

    println!(
        "{} {} = {} {}",
        amount.normalize(),
        from.to_uppercase(),
        ui::style_text(&result.normalize().to_string(), ui::StyleType::TotalValue),
        ui::style_text(&to.to_uppercase(), ui::StyleType::TotalLabel),
    );
    Ok(())
}
