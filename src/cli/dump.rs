use super::ui;
use crate::core::Observation;
use crate::core::config::AppConfig;
use crate::store::SqliteStore;
use anyhow::{Context, Result};
use comfy_table::Cell;

pub const DEFAULT_LIMIT: usize = 10;

fn recent_table(observations: &[Observation]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Captured (UTC)"),
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
    ]);
    for obs in observations {
        table.add_row(vec![
            ui::timestamp_cell(Some(obs.captured_at)),
            Cell::new(format!("{}->{}", obs.base_currency, obs.target_currency)),
            ui::rate_cell(obs.rate),
        ]);
    }
    table.to_string()
}

/// Shows the tables in the database and the most recently captured rates.
///
/// Storage errors are returned as is; nothing is created or retried.
pub fn run(config: &AppConfig, limit: usize) -> Result<()> {
    let path = config.database_path()?;
    let store = SqliteStore::new(&path);
    let context = || format!("Error accessing database {}", path.display());

    let tables = store.table_names().with_context(context)?;
    println!("{}", ui::style_text("Tables in database:", ui::StyleType::Title));
    for table in &tables {
        println!(" - {table}");
    }

    let recent = store.recent(limit).with_context(context)?;
    println!(
        "\n{}",
        ui::style_text("Latest exchange rates:", ui::StyleType::Title)
    );
    if recent.is_empty() {
        println!("{}", ui::style_text("(none)", ui::StyleType::Subtle));
    } else {
        println!("{}", recent_table(&recent));
    }
    Ok(())
}
