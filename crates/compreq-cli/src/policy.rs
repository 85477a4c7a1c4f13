//! Named requirement policies.

use clap::ValueEnum;
use compreq_core::{Age, Requirement, RequirementSet, Result, MINOR, PYTHON, REL_MAJOR, REL_MINOR};
use compreq_lazy::operators::{
    ceil_ver, count, floor_ver, max_ver, min_age, min_ver, minimum_ver, releases, VERSION,
};
use compreq_lazy::{CompReq, Context, LazyRequirement, LazySpecifierSet};
use tracing::debug;

/// How the version range of a requirement is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Policy {
    /// From the older of "newest release at least a year old" and "oldest
    /// of the three latest minor series", below the next major version.
    #[default]
    Default,
    /// The latest minor series only.
    Dev,
    /// Exactly the latest release.
    Pin,
}

impl Policy {
    /// The specifiers of this policy, for the package they are resolved in.
    pub fn specifiers(self) -> Result<LazySpecifierSet> {
        let specifiers = match self {
            Self::Default => {
                let lower = floor_ver(
                    REL_MINOR,
                    minimum_ver([
                        max_ver(min_age(releases(), Age::years(1))?)?,
                        min_ver(count(MINOR, 3, releases())?)?,
                    ])?,
                    false,
                )?;
                let upper = ceil_ver(REL_MAJOR, max_ver(releases())?, false)?;
                vec![VERSION.ge(lower)?, VERSION.lt(upper)?]
            }
            Self::Dev => {
                let lower = floor_ver(REL_MINOR, max_ver(releases())?, false)?;
                let upper = ceil_ver(REL_MINOR, max_ver(releases())?, false)?;
                vec![VERSION.ge(lower)?, VERSION.lt(upper)?]
            }
            Self::Pin => vec![VERSION.eq(max_ver(releases())?)?],
        };
        Ok(specifiers.into_iter().collect())
    }

    /// `requirement` with its specifiers replaced by this policy. Extras and
    /// markers are kept.
    pub fn apply(self, requirement: &Requirement) -> Result<LazyRequirement> {
        LazyRequirement::new(
            Some(requirement.name().to_string()),
            None,
            requirement.extras().clone(),
            self.specifiers()?,
            requirement.marker().cloned(),
        )
    }
}

/// Recompute `requirements` with `policy`.
///
/// Requirements on Python and URL requirements are kept as they are. With
/// `only_bare`, so is every requirement that already has specifiers.
pub fn apply_policy<C: Context>(
    cr: &CompReq<C>,
    requirements: &RequirementSet,
    policy: Policy,
    only_bare: bool,
) -> Result<RequirementSet> {
    requirements
        .iter()
        .map(|requirement| -> Result<Requirement> {
            let keep = requirement.name() == PYTHON
                || requirement.url().is_some()
                || (only_bare && !requirement.specifier().is_empty());
            if keep {
                debug!(%requirement, "keeping requirement");
                return Ok(requirement.clone());
            }
            let resolved = cr.resolve_requirement(policy.apply(requirement)?)?;
            debug!(%resolved, ?policy, "computed requirement");
            Ok(resolved)
        })
        .collect()
}
