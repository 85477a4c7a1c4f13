//! Show the bounds of a specifier set.

use crate::output::{self, Table};
use anyhow::{Context as _, Result};
use clap::Args;
use compreq_core::{get_bounds, Bounds, SpecifierSet};

#[derive(Args, Debug, Clone)]
pub struct BoundsArgs {
    /// Specifier set, e.g. ">=1.2,<2,!=1.5"
    pub specifiers: String,
}

/// Label and value pairs describing `bounds`.
pub fn describe(bounds: &Bounds) -> Result<Vec<(&'static str, String)>> {
    let bound = |version: Option<&compreq_core::Version>, inclusive: bool| {
        version.map_or_else(
            || "none".to_string(),
            |v| format!("{v} ({})", if inclusive { "inclusive" } else { "exclusive" }),
        )
    };
    let exclusions = if bounds.exclusions.is_empty() {
        "none".to_string()
    } else {
        bounds
            .exclusions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    Ok(vec![
        ("Lower", bound(bounds.lower.as_ref(), bounds.lower_inclusive)),
        ("Upper", bound(bounds.upper.as_ref(), bounds.upper_inclusive)),
        ("Exclusions", exclusions),
        ("Interval", bounds.to_string()),
        ("Minimal", bounds.minimal_specifier_set(true)?.to_string()),
    ])
}

pub fn run(args: &BoundsArgs) -> Result<()> {
    let specifier_set: SpecifierSet = args
        .specifiers
        .parse()
        .with_context(|| format!("invalid specifiers '{}'", args.specifiers))?;
    let bounds = get_bounds(&specifier_set)?;

    output::header(&format!("Bounds of {}", output::version(&args.specifiers)));
    let mut table = Table::new();
    for (label, value) in describe(&bounds)? {
        table.row([label.to_string(), value]);
    }
    table.print();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe_str(spec: &str) -> Vec<(&'static str, String)> {
        describe(&get_bounds(&spec.parse().unwrap()).unwrap()).unwrap()
    }

    #[test]
    fn describes_closed_interval() {
        let rows = describe_str(">=1,<2,!=1.5,!=3");
        assert_eq!(
            rows,
            [
                ("Lower", "1 (inclusive)".to_string()),
                ("Upper", "2 (exclusive)".to_string()),
                ("Exclusions", "1.5".to_string()),
                ("Interval", "[1, 2) except 1.5".to_string()),
                ("Minimal", "!=1.5,<2,>=1".to_string()),
            ]
        );
    }

    #[test]
    fn describes_unbounded() {
        let rows = describe_str("");
        assert_eq!(rows[0].1, "none");
        assert_eq!(rows[1].1, "none");
        assert_eq!(rows[3].1, "(-inf, +inf)");
        assert_eq!(rows[4].1, "");
    }
}
