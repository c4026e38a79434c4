//! # docket-cli: CLI Tool for the Docket Stack
//!
//! Runs the pipeline's pure stages against a fact snapshot on disk:
//!
//! - `docket check`: sufficiency report.
//! - `docket route`: routing decision plus gate verdict.
//! - `docket generate`: the whole pipeline in-process with the development
//!   collaborators.
//! - `docket forums`: the forum registry.
//!
//! Every subcommand returns an exit code: 0 on success, 1 when the pipeline
//! refuses the case (insufficient facts, a blocking gate, a failed
//! classification), 2 on operational error.
//!
//! ```bash
//! docket check case.yaml
//! docket route case.yaml --today 2026-06-15
//! docket generate case.json --forum county-court-money-claim
//! ```

pub mod check;
pub mod forums;
pub mod generate;
pub mod route;

use std::path::Path;

use anyhow::{bail, Context, Result};

use docket_routing::CaseStrategy;

/// Exit code for a domain-level refusal.
pub const EXIT_REFUSED: u8 = 1;

/// Read a fact snapshot. `.json` files are parsed as JSON, everything
/// else as YAML.
pub fn load_snapshot(path: &Path) -> Result<CaseStrategy> {
    if !path.exists() {
        bail!("snapshot file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let snapshot = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot JSON: {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse snapshot YAML: {}", path.display()))?
    };
    Ok(snapshot)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;

    pub const EMPLOYMENT_YAML: &str = "\
domain: employment
key_facts:
  - Worked at Acme Ltd for four years
  - Dismissed without warning
  - No disciplinary process was followed
  - Final two months of wages unpaid
  - Manager gave no written reasons
desired_outcome: reinstatement and back pay
evidence:
  - id: e1
    description: payslips
counterparty: Acme Ltd
";

    pub fn snapshot_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn yaml_and_json_snapshots_load() {
        let yaml = snapshot_file(EMPLOYMENT_YAML, ".yaml");
        let s = load_snapshot(yaml.path()).unwrap();
        assert_eq!(s.domain.as_deref(), Some("employment"));
        assert_eq!(s.key_facts.len(), 5);

        let json = snapshot_file(r#"{"domain": "tenancy", "key_facts": ["a"]}"#, ".json");
        let s = load_snapshot(json.path()).unwrap();
        assert_eq!(s.domain.as_deref(), Some("tenancy"));
    }

    #[test]
    fn missing_and_malformed_snapshots_fail() {
        assert!(load_snapshot(Path::new("/nonexistent/case.yaml")).is_err());
        let bad = snapshot_file("{not json", ".json");
        assert!(load_snapshot(bad.path()).is_err());
    }
}
