//! List the releases of a package.

use crate::context::CliContext;
use crate::output::{self, Table};
use anyhow::{Context as _, Result};
use clap::Args;
use compreq_core::{Age, Level, ReleaseSet};
use compreq_lazy::operators::{count, devreleases, max_age, min_age, prereleases, releases};
use compreq_lazy::LazyReleaseSet;

#[derive(Args, Debug, Clone)]
pub struct ReleasesArgs {
    /// Package name; `python` lists Python itself
    pub package: String,

    /// Include pre-releases
    #[arg(long)]
    pub pre: bool,

    /// Include pre-releases and development releases
    #[arg(long)]
    pub dev: bool,

    /// Only releases at least this many days old
    #[arg(long, value_name = "DAYS")]
    pub min_age_days: Option<u32>,

    /// Only releases at most this many days old
    #[arg(long, value_name = "DAYS")]
    pub max_age_days: Option<u32>,

    /// Only the N latest buckets at LEVEL, e.g. `minor:3`
    #[arg(long, value_name = "LEVEL:N", value_parser = parse_count)]
    pub count: Option<(Level, usize)>,
}

/// Parse `LEVEL:N`.
pub fn parse_count(value: &str) -> Result<(Level, usize), String> {
    let (level, n) = value
        .split_once(':')
        .ok_or_else(|| format!("expected LEVEL:N, got '{value}'"))?;
    let level = level.parse::<Level>().map_err(|e| e.to_string())?;
    let n = n
        .parse::<usize>()
        .map_err(|e| format!("invalid count '{n}': {e}"))?;
    Ok((level, n))
}

/// The release set the arguments describe.
pub fn build(args: &ReleasesArgs) -> Result<LazyReleaseSet> {
    let mut set = if args.dev {
        devreleases()
    } else if args.pre {
        prereleases()
    } else {
        releases()
    };
    if let Some(days) = args.min_age_days {
        set = min_age(set, Age::days(days))?;
    }
    if let Some(days) = args.max_age_days {
        set = max_age(set, Age::days(days))?;
    }
    if let Some((level, n)) = args.count {
        set = count(level, n, set)?;
    }
    Ok(set)
}

fn print(set: &ReleaseSet) {
    let mut table = Table::new();
    table.headers(["Version", "Released", "Successor"]);
    for release in set.iter().rev() {
        table.row([
            release.version.to_string(),
            release.released_time.format("%Y-%m-%d").to_string(),
            release
                .successor
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
        ]);
    }
    table.print();
}

pub fn run(ctx: &CliContext, args: &ReleasesArgs) -> Result<()> {
    let expression = build(args)?;
    tracing::debug!(%expression, package = %args.package, "resolving releases");

    let cr = ctx.compreq(ctx.python_specifier(None)?)?;
    let set = cr
        .resolve_release_set(&args.package, expression)
        .with_context(|| format!("cannot list releases of {}", args.package))?;

    if set.is_empty() {
        output::warning(&format!("no releases of {} match", output::package(&args.package)));
        return Ok(());
    }
    output::header(&format!("{} releases of {}", set.len(), output::package(&args.package)));
    print(&set);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compreq_core::{MINOR, REL_MAJOR};
    use test_case::test_case;

    fn args() -> ReleasesArgs {
        ReleasesArgs {
            package: "foo".into(),
            pre: false,
            dev: false,
            min_age_days: None,
            max_age_days: None,
            count: None,
        }
    }

    #[test_case("minor:3", MINOR, 3 ; "absolute")]
    #[test_case("rel_major:1", REL_MAJOR, 1 ; "relative")]
    fn parses_count(value: &str, level: Level, n: usize) {
        assert_eq!(parse_count(value).unwrap(), (level, n));
    }

    #[test_case("minor" ; "missing count")]
    #[test_case("minor:x" ; "bad count")]
    #[test_case("sideways:2" ; "bad level")]
    fn rejects_count(value: &str) {
        assert!(parse_count(value).is_err());
    }

    #[test]
    fn builds_nested_filters() {
        let plain = build(&args()).unwrap();
        assert_eq!(plain, releases());

        let filtered = build(&ReleasesArgs {
            dev: true,
            min_age_days: Some(30),
            count: Some((MINOR, 2)),
            ..args()
        })
        .unwrap();
        let expected = count(MINOR, 2, min_age(devreleases(), Age::days(30)).unwrap()).unwrap();
        assert_eq!(filtered, expected);
    }
}
