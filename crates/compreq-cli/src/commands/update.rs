//! Recompute the requirements of a manifest.

use crate::context::CliContext;
use crate::output::{self, Table};
use crate::policy::{apply_policy, Policy};
use anyhow::{Context as _, Result};
use clap::Args;
use compreq_core::{Requirement, RequirementSet, PYTHON};
use compreq_lazy::operators::consistent_lower_bounds;
use compreq_manifest::ManifestFile;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// `pyproject.toml` or a requirements file
    #[arg(default_value = "pyproject.toml")]
    pub file: PathBuf,

    /// Policy used to compute the versions
    #[arg(long, value_enum, default_value_t)]
    pub policy: Policy,

    /// Dependency group to update (Poetry only)
    #[arg(long, short = 'G')]
    pub group: Option<String>,

    /// Raise lower bounds until they can be installed together
    #[arg(long)]
    pub consistent_lower_bounds: bool,

    /// Print the result instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

/// A requirement whose rendering changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub package: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Requirements that differ between `before` and `after`, by package name.
pub fn changes(before: &RequirementSet, after: &RequirementSet) -> Vec<Change> {
    let mut packages: Vec<&Requirement> = before.iter().chain(after.iter()).collect();
    packages.sort_by(|a, b| a.package_name().cmp(b.package_name()));
    packages.dedup_by(|a, b| a.package_name() == b.package_name());
    packages
        .into_iter()
        .map(Requirement::name)
        .filter_map(|name| {
            let old = before.get(name).map(ToString::to_string);
            let new = after.get(name).map(ToString::to_string);
            (old != new).then(|| Change {
                package: name.to_string(),
                before: old,
                after: new,
            })
        })
        .collect()
}

fn print_changes(changes: &[Change]) {
    let mut table = Table::new();
    table.headers(["Package", "Before", "After"]);
    for change in changes {
        table.row([
            comfy_table::Cell::new(&change.package),
            comfy_table::Cell::new(change.before.as_deref().unwrap_or("-")),
            output::changed(change.after.as_deref().unwrap_or("-")),
        ]);
    }
    table.print();
}

pub fn run(ctx: &CliContext, args: &UpdateArgs) -> Result<()> {
    let path = ctx.path(&args.file);
    let mut manifest =
        ManifestFile::open(&path).with_context(|| format!("cannot open {}", path.display()))?;
    let group = args.group.as_deref();

    let main = manifest.requirements(None)?;
    let python = ctx.python_specifier(main.get(PYTHON).map(|r| r.specifier()))?;
    info!(%python, "computing requirements");
    let cr = ctx.compreq(python)?;

    let before = manifest.requirements(group)?;
    let mut updated = apply_policy(&cr, &before, args.policy, false)?;
    if args.consistent_lower_bounds {
        updated = cr.resolve_requirement_set(consistent_lower_bounds(updated)?)?;
    }

    let changes = changes(&before, &updated);
    if changes.is_empty() {
        output::success(&format!("{} is up to date", path.display()));
        return Ok(());
    }
    print_changes(&changes);

    manifest.set_requirements(updated, group)?;
    if args.dry_run {
        print!("{manifest}");
        output::info("dry run, nothing written");
    } else {
        manifest.save()?;
        output::success(&format!("updated {} requirements in {}", changes.len(), path.display()));
    }
    Ok(())
}
