//! Rules command - list the rule catalogs

use crate::rules::Engine;
use anyhow::Result;
use console::style;
use std::str::FromStr;

pub fn run(engine: Option<&str>) -> Result<()> {
    let engines = match engine {
        Some(name) => vec![Engine::from_str(name)?],
        None => Engine::ALL.to_vec(),
    };

    for engine in engines {
        let catalog = engine.catalog();
        println!(
            "\n{} ({} rules)",
            style(format!("{} engine", engine)).bold(),
            catalog.len()
        );
        for rule in catalog {
            println!(
                "  {:<36} {:<24} {:<9} {}",
                style(rule.id()).cyan(),
                rule.category().label(),
                rule.default_severity().to_string(),
                style(rule.description()).dim()
            );
        }
    }
    println!();
    Ok(())
}
