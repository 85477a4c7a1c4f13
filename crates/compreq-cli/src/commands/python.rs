//! Compute the range of supported Python versions.

use crate::context::CliContext;
use crate::output;
use anyhow::{bail, Context as _, Result};
use clap::Args;
use compreq_core::{
    get_bounds, Age, ReleaseSet, Requirement, SpecifierSet, MAJOR, MINOR, PYTHON,
};
use compreq_lazy::operators::{ceil_ver, floor_ver, max_ver, min_age, releases, VERSION};
use compreq_lazy::{CompReq, Context};
use compreq_manifest::{
    python_classifiers, set_workflow_python_versions, workflow_files, ManifestFile,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone)]
pub struct PythonArgs {
    /// Oldest supported minor version: newest release at least this old
    #[arg(long, default_value_t = 3, value_name = "YEARS")]
    pub min_age_years: u32,

    /// Poetry `pyproject.toml` to update
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Also point the isort, black and mypy target versions in the manifest
    /// at the oldest supported minor version
    #[arg(long, requires = "manifest")]
    pub tool_configs: bool,

    /// Directory of GitHub Actions workflows whose `python-version` entries
    /// and `python` matrices to update
    #[arg(long, value_name = "DIR")]
    pub github_workflows: Option<PathBuf>,

    /// Print the result instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

/// `>=` the minor series of the newest release at least `years` old, `<`
/// the next major version.
pub fn python_range<C: Context>(cr: &CompReq<C>, years: u32) -> Result<SpecifierSet> {
    let lower = floor_ver(MINOR, max_ver(min_age(releases(), Age::years(years))?)?, false)?;
    let upper = ceil_ver(MAJOR, max_ver(releases())?, false)?;
    let range = cr.resolve_specifier_set(
        PYTHON,
        vec![VERSION.ge(lower)?, VERSION.lt(upper)?],
    )?;
    Ok(range)
}

/// Python releases inside `range`.
pub fn python_releases<C: Context>(cr: &CompReq<C>, range: &SpecifierSet) -> Result<ReleaseSet> {
    Ok(cr.resolve_release_set(PYTHON, range.clone())?)
}

/// Rewrite the Python versions of every workflow in `dir`, returning the
/// files whose contents changed. Nothing is written on a dry run.
pub fn update_workflows(dir: &Path, supported: &ReleaseSet, dry_run: bool) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();
    for mut workflow in workflow_files(dir)? {
        set_workflow_python_versions(&mut workflow, supported);
        if !workflow.is_modified() {
            continue;
        }
        if !dry_run {
            workflow.save()?;
        }
        changed.push(workflow.path().to_path_buf());
    }
    Ok(changed)
}

pub fn run(ctx: &CliContext, args: &PythonArgs) -> Result<()> {
    let mut manifest = match &args.manifest {
        Some(path) => {
            let path = ctx.path(path);
            match ManifestFile::open(&path)
                .with_context(|| format!("cannot open {}", path.display()))?
            {
                ManifestFile::Poetry(file) => Some(file),
                ManifestFile::Text(_) => {
                    bail!("{} is not a pyproject.toml", path.display())
                }
            }
        }
        None => None,
    };

    let previous = match &manifest {
        Some(file) => file
            .requirements(None)?
            .get(PYTHON)
            .map(|r| r.specifier().clone()),
        None => None,
    };
    let previous = ctx.python_specifier(previous.as_ref())?;
    // Consider every release from the old lower bound on, newer ones included.
    let search = get_bounds(&previous)?.lower_specifier_set(false)?;
    let cr = ctx.compreq(search)?;

    let range = python_range(&cr, args.min_age_years)?;
    let supported = python_releases(&cr, &range)?;
    let classifiers = python_classifiers(&supported);

    output::header(&format!("{} {}", output::package(PYTHON), output::version(&range.to_string())));
    println!("{range}");
    for classifier in &classifiers {
        output::info(classifier);
    }

    if let Some(dir) = &args.github_workflows {
        let dir = ctx.path(dir);
        for path in update_workflows(&dir, &supported, args.dry_run)? {
            if args.dry_run {
                output::info(&format!("would update {}", path.display()));
            } else {
                output::success(&format!("updated {}", path.display()));
            }
        }
    }

    let Some(file) = manifest.as_mut() else {
        return Ok(());
    };
    let oldest = get_bounds(&range)?.lower;
    let mut requirements = file.requirements(None)?;
    requirements.insert(Requirement::new(PYTHON, BTreeSet::new(), range, None, None)?);
    file.set_requirements(&requirements, None)?;
    file.set_python_classifiers(&supported)?;
    if args.tool_configs {
        if let Some(oldest) = &oldest {
            for tool in file.set_tool_python_versions(oldest)? {
                output::info(&format!("{tool} targets {oldest}"));
            }
        }
    }

    if args.dry_run {
        print!("{file}");
        output::info("dry run, nothing written");
    } else {
        file.save()?;
        output::success(&format!("updated {}", file.path().display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use compreq_core::MemorySource;
    use compreq_lazy::DefaultContext;
    use std::sync::Arc;
    use test_case::test_case;

    fn compreq() -> CompReq {
        let at = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();
        let source = [
            ("3.8.0", at(2019, 10, 14)),
            ("3.9.0", at(2020, 10, 5)),
            ("3.10.0", at(2021, 10, 4)),
            ("3.11.0", at(2022, 10, 24)),
            ("3.12.0b1", at(2022, 12, 1)),
        ]
        .into_iter()
        .fold(MemorySource::new(), |source, (version, time)| {
            source.with_release(PYTHON, version, time).unwrap()
        });
        let context = DefaultContext::new(">=3.8".parse().unwrap(), Arc::new(source))
            .unwrap()
            .with_now(at(2023, 1, 1));
        CompReq::new(context)
    }

    #[test_case(1, "<4,>=3.10" ; "one year")]
    #[test_case(3, "<4,>=3.8" ; "three years")]
    #[test_case(10, "<4,>=3.8" ; "older than everything")]
    fn computes_range(years: u32, expected: &str) {
        assert_eq!(python_range(&compreq(), years).unwrap().to_string(), expected);
    }

    #[test]
    fn updates_workflows_in_place() {
        let cr = compreq();
        let range = python_range(&cr, 1).unwrap();
        let supported = python_releases(&cr, &range).unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let workflow = tmp.path().join("ci.yml");
        let untouched = tmp.path().join("release.yml");
        std::fs::write(&workflow, "    steps:\n      - with:\n          python-version: \"3.8\"\n").unwrap();
        std::fs::write(&untouched, "on: push\n").unwrap();

        let planned = update_workflows(tmp.path(), &supported, true).unwrap();
        assert_eq!(planned, [workflow.clone()]);
        assert!(std::fs::read_to_string(&workflow).unwrap().contains("\"3.8\""));

        let changed = update_workflows(tmp.path(), &supported, false).unwrap();
        assert_eq!(changed, [workflow.clone()]);
        assert!(std::fs::read_to_string(&workflow)
            .unwrap()
            .contains("python-version: \"3.10\""));
        assert!(update_workflows(tmp.path(), &supported, false).unwrap().is_empty());
    }

    #[test]
    fn releases_inside_range() {
        let cr = compreq();
        let range = python_range(&cr, 1).unwrap();
        let supported = python_releases(&cr, &range).unwrap();
        let versions: Vec<String> = supported.iter().map(|r| r.version.to_string()).collect();
        assert_eq!(versions, ["3.10.0", "3.11.0"]);
    }
}
