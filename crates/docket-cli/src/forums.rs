//! # Forums Subcommand
//!
//! Lists the built-in forum registry with each forum's jurisdictions,
//! permitted documents and time limit.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use docket_routing::ForumRegistry;

/// Arguments for the `docket forums` subcommand.
#[derive(Args, Debug)]
pub struct ForumsArgs {
    /// Print the registry as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ForumRow {
    id: String,
    name: String,
    jurisdictions: Vec<String>,
    documents: Vec<String>,
    prerequisites: usize,
    time_limit_months: Option<u32>,
}

fn rows(registry: &ForumRegistry) -> Vec<ForumRow> {
    registry
        .iter()
        .map(|f| ForumRow {
            id: f.id.to_string(),
            name: f.name.clone(),
            jurisdictions: f.jurisdictions.iter().map(ToString::to_string).collect(),
            documents: f.documents.iter().map(ToString::to_string).collect(),
            prerequisites: f.prerequisites.len(),
            time_limit_months: f.time_limit.as_ref().map(|t| t.months),
        })
        .collect()
}

/// Execute the forums subcommand. Always returns 0.
pub fn run_forums(args: &ForumsArgs) -> Result<u8> {
    let registry = ForumRegistry::builtin().context("built-in forum registry is invalid")?;
    let rows = rows(&registry);
    if args.json {
        crate::print_json(&rows)?;
        return Ok(0);
    }
    for row in &rows {
        let limit = row
            .time_limit_months
            .map(|m| format!("{m} months"))
            .unwrap_or_else(|| "none".to_string());
        println!("{}  ({})", row.id, row.name);
        println!("  jurisdictions: {}", row.jurisdictions.join(", "));
        println!("  documents:     {}", row.documents.join(", "));
        println!("  time limit:    {limit}");
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_rows_cover_every_forum() {
        let registry = ForumRegistry::builtin().unwrap();
        let rows = rows(&registry);
        assert_eq!(rows.len(), registry.len());
        let et = rows.iter().find(|r| r.id == "employment-tribunal").unwrap();
        assert_eq!(et.documents, vec!["et1-claim-form"]);
        assert_eq!(et.time_limit_months, Some(3));
    }

    #[test]
    fn forums_command_succeeds() {
        assert_eq!(run_forums(&ForumsArgs { json: true }).unwrap(), 0);
        assert_eq!(run_forums(&ForumsArgs { json: false }).unwrap(), 0);
    }
}
