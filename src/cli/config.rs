use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path};

pub fn show() -> Result<()> {
    let settings = load_settings();
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    for (key, value) in settings.entries() {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    println!("Settings ({})\n{table}", settings_path().display());
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let mut settings = load_settings();
    settings.set(key, value)?;
    save_settings(&settings)?;
    println!("Saved {key} = {value}");
    Ok(())
}
