//! Resolve requirements given on the command line.

use crate::context::CliContext;
use crate::policy::{apply_policy, Policy};
use anyhow::{Context as _, Result};
use clap::Args;
use compreq_core::{Requirement, RequirementSet};

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Requirements, e.g. `requests` or `numpy>=1.26`
    #[arg(required = true)]
    pub requirements: Vec<String>,

    /// Compute versions for requirements without specifiers
    #[arg(long, value_enum)]
    pub policy: Option<Policy>,
}

/// Parse requirement arguments into a set.
pub fn parse_requirements(requirements: &[String]) -> Result<RequirementSet> {
    requirements
        .iter()
        .map(|text| {
            text.parse::<Requirement>()
                .with_context(|| format!("invalid requirement '{text}'"))
        })
        .collect()
}

pub fn run(ctx: &CliContext, args: &ResolveArgs) -> Result<()> {
    let mut requirements = parse_requirements(&args.requirements)?;

    if let Some(policy) = args.policy {
        let cr = ctx.compreq(ctx.python_specifier(None)?)?;
        requirements = apply_policy(&cr, &requirements, policy, true)?;
    }

    print!("{requirements}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_sorts() {
        let set = parse_requirements(&["zlib>=1".into(), "attrs".into()]).unwrap();
        assert_eq!(set.to_string(), "attrs\nzlib>=1\n");
    }

    #[test]
    fn reports_bad_requirement() {
        let err = parse_requirements(&["foo>=".into()]).unwrap_err();
        assert!(format!("{err:#}").contains("invalid requirement 'foo>='"));
    }
}
