use crate::error::Result;
use mkite_conformer::recipes::{EntryPoint, registry::RecipeRegistry};

fn format_entries(entries: &[&EntryPoint]) -> Vec<String> {
    let key_width = entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
    entries
        .iter()
        .map(|e| {
            format!(
                "{}  {:<width$}  {}",
                e.namespace,
                e.key,
                e.target,
                width = key_width
            )
        })
        .collect()
}

pub fn run() -> Result<()> {
    let registry = RecipeRegistry::with_builtin();
    for line in format_entries(&registry.list()) {
        println!("{}", line);
    }
    Ok(())
}
