use colored::Colorize;

use crate::error::Result;
use crate::loader::{load, Role};
use crate::settings::expand_path;

pub fn run(file: &str, role: &str, sheet: Option<&str>) -> Result<()> {
    let role = Role::from_key(role)?;
    let table = load(&expand_path(file), role, sheet)?;
    println!(
        "{} {role} sheet uploaded successfully: {} rows",
        "\u{2713}".green().bold(),
        table.len()
    );
    println!("Columns: {}", table.headers.join(", "));
    Ok(())
}
