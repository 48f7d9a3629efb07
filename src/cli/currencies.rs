use super::ui;
use crate::core::{CatalogLoader, CurrencyCatalog};
use anyhow::{Context, Result};
use comfy_table::Cell;

impl CurrencyCatalog {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Code"), ui::header_cell("Currency")]);
        for currency in self.iter() {
            table.add_row(vec![Cell::new(&currency.code), Cell::new(&currency.name)]);
        }

        format!(
            "{}\n\n{}\n{}",
            ui::style_text("Available currencies", ui::StyleType::Title),
            table,
            ui::style_text(
                "Rates are updated by the API service around 4pm CET.",
                ui::StyleType::Subtle
            )
        )
    }
}

pub async fn run(loader: &CatalogLoader) -> Result<()> {
    let pb = ui::new_spinner("Loading...");
    let catalog = loader.load().await;
    pb.finish_and_clear();

    let catalog = catalog.context("Currency selection is unavailable")?;
    println!("{}", catalog.display_as_table());
    Ok(())
}
