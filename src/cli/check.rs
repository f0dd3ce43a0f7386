use super::{fetch_request, open_store, ui};
use crate::core::config::AppConfig;
use crate::core::{ObservationStore, QuoteSet, RateSource};
use crate::providers::FrankfurterProvider;
use anyhow::{Context, Result};
use comfy_table::Cell;

fn quotes_table(quotes: &QuoteSet, config: &AppConfig) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Tracked"),
    ]);
    for quote in quotes.quotes() {
        let tracked = if config.target_currencies.contains(&quote.target) {
            "yes"
        } else {
            "no"
        };
        table.add_row(vec![
            Cell::new(format!("{}->{}", quote.base, quote.target)),
            ui::rate_cell(quote.rate),
            Cell::new(tracked),
        ]);
    }
    table.to_string()
}

/// Verifies the database can be prepared and the API answers, without storing anything.
pub async fn run(config: &AppConfig) -> Result<()> {
    let store = open_store(config)?;
    store
        .ensure_schema()
        .context("Database setup failed")?;
    println!(
        "{} {}",
        ui::style_text("Database ready:", ui::StyleType::Success),
        store.path().display()
    );

    let source = FrankfurterProvider::new(&config.api_url);
    let request = fetch_request(config);
    match source
        .fetch_rates(&request.base, &request.targets, request.timeout)
        .await
    {
        Ok(quotes) => {
            println!(
                "{} {}\n",
                ui::style_text("API connection successful:", ui::StyleType::Success),
                config.api_url
            );
            println!("{}", quotes_table(&quotes, config));
            Ok(())
        }
        Err(e) => {
            println!(
                "{} {e}",
                ui::style_text("API connection failed:", ui::StyleType::Error)
            );
            Err(e).context("Rate API check failed")
        }
    }
}
