use super::ui;
use crate::core::config::AppConfig;
use crate::core::{Observation, ObservationStore};
use crate::store::SqliteStore;
use anyhow::{Context, Result};
use comfy_table::Cell;

pub fn display_as_table(observations: &[Observation]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Captured (UTC)"),
        ui::header_cell("Recorded (UTC)"),
    ]);

    for obs in observations {
        table.add_row(vec![
            Cell::new(format!("{}->{}", obs.base_currency, obs.target_currency)),
            ui::rate_cell(obs.rate),
            ui::timestamp_cell(Some(obs.captured_at)),
            ui::timestamp_cell(obs.recorded_at),
        ]);
    }

    table.to_string()
}

/// Latest observations, empty when nothing has been fetched yet.
pub fn load_latest(store: &SqliteStore) -> Result<Vec<Observation>> {
    if !store.path().exists() {
        return Ok(Vec::new());
    }
    store
        .latest_per_pair()
        .with_context(|| format!("Failed to read {}", store.path().display()))
}

/// Prints the most recent rate for every tracked pair.
pub fn run(config: &AppConfig) -> Result<()> {
    let store = SqliteStore::new(config.database_path()?);
    let latest = load_latest(&store)?;

    println!("{}\n", ui::style_text("Latest exchange rates", ui::StyleType::Title));
    if latest.is_empty() {
        println!(
            "{}",
            ui::style_text("No exchange rates recorded yet", ui::StyleType::Subtle)
        );
    } else {
        println!("{}", display_as_table(&latest));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_display_as_table() {
        let observations = vec![Observation {
            id: 1,
            captured_at: Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap(),
            base_currency: "USD".parse().unwrap(),
            target_currency: "EUR".parse().unwrap(),
            rate: 0.9,
            recorded_at: None,
        }];

        let output = display_as_table(&observations);
        assert!(output.contains("USD->EUR"));
        assert!(output.contains("0.9000"));
        assert!(output.contains("2026-10-15 09:00:00"));
        assert!(output.contains("N/A"));
    }

    #[test]
    fn test_load_latest_before_first_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("data").join("rates.db");
        let store = SqliteStore::new(&db_path);

        assert!(load_latest(&store).unwrap().is_empty());
        assert!(!db_path.exists());
        assert!(!dir.path().join("data").exists());
    }
}
