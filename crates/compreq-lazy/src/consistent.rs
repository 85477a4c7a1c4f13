//! Introspection-backed requirement sets.
//!
//! Lower bounds are usually computed per package, so nothing guarantees
//! that the lowest allowed versions of two packages can be installed
//! together. [`resolve_consistent_lower_bounds`] installs those versions and
//! raises every lower bound that the installed distributions contradict.

use crate::context::Context;
use compreq_core::{
    get_bounds, make_specifier, DistMetadata, Error, Requirement, RequirementSet, Result,
    SpecifierOperator, SpecifierSet, Version, PYTHON,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Raise lower bounds until the lowest allowed versions are consistent.
///
/// Each round pins every package with an inclusive lower bound to its lowest
/// allowed release and installs the pins without dependencies. A package's
/// new lower bound is the highest of the version that got installed and
/// every inclusive lower bound the other installed distributions declare on
/// it. Rounds repeat until no bound moves.
pub(crate) fn resolve_consistent_lower_bounds(
    requirements: RequirementSet,
    context: &dyn Context,
) -> Result<RequirementSet> {
    let inspector = context.inspector().ok_or(Error::NoInspector)?;
    let python = context.default_python().clone();
    let rounds = requirements.len() + 1;
    let mut current = requirements;
    for round in 0..rounds {
        let pins = lowest_pins(&current, context)?;
        if pins.is_empty() {
            break;
        }
        let installed = inspector.inspect(&python, &pins, false)?;
        let (next, raised) = raise_lower_bounds(&current, &installed)?;
        debug!(round, pins = pins.len(), raised, "consistent lower bounds round");
        current = next;
        if raised == 0 {
            break;
        }
    }
    Ok(current)
}

/// `==` pins on the lowest release each requirement allows.
fn lowest_pins(requirements: &RequirementSet, context: &dyn Context) -> Result<RequirementSet> {
    let mut pins = RequirementSet::new();
    for requirement in requirements.iter() {
        if requirement.name() == PYTHON || requirement.url().is_some() {
            continue;
        }
        let bounds = get_bounds(requirement.specifier())?;
        if bounds.lower.is_none() || !bounds.lower_inclusive {
            continue;
        }
        let releases = context.releases(requirement.name())?;
        let Some(lowest) = releases
            .iter()
            .find(|r| requirement.specifier().contains(&r.version))
        else {
            continue;
        };
        let pin = make_specifier(SpecifierOperator::Equal, lowest.version.clone())?;
        pins.insert(Requirement::new(
            requirement.name(),
            requirement.extras().clone(),
            SpecifierSet::from(pin),
            None,
            None,
        )?);
    }
    Ok(pins)
}

/// Apply what got installed to `requirements`, counting raised bounds.
fn raise_lower_bounds(
    requirements: &RequirementSet,
    installed: &BTreeMap<String, DistMetadata>,
) -> Result<(RequirementSet, usize)> {
    let mut raised = 0;
    let mut next = RequirementSet::new();
    for requirement in requirements.iter() {
        let name = requirement.name();
        let Some(dist) = installed.get(name) else {
            next.insert(requirement.clone());
            continue;
        };
        let bounds = get_bounds(requirement.specifier())?;
        let mut wanted = dist.version.clone();
        for declared in declared_lower_bounds(name, installed)? {
            wanted = wanted.max(declared);
        }
        let moved = bounds.lower.as_ref().is_some_and(|lower| wanted > *lower);
        if !moved {
            next.insert(requirement.clone());
            continue;
        }
        info!(package = name, from = ?bounds.lower.as_ref().map(ToString::to_string), to = %wanted, "raising lower bound");
        let specifier = bounds.with_lower(wanted, true)?.minimal_specifier_set(true)?;
        next.insert(requirement.clone().with_specifier(specifier)?);
        raised += 1;
    }
    Ok((next, raised))
}

/// Inclusive lower bounds that other installed distributions put on
/// `package`. Requirements behind markers are ignored.
fn declared_lower_bounds(
    package: &str,
    installed: &BTreeMap<String, DistMetadata>,
) -> Result<Vec<Version>> {
    let mut result = Vec::new();
    for dist in installed.values().filter(|d| d.package != package) {
        let Some(requirement) = dist.requires.get(package) else {
            continue;
        };
        if requirement.marker().is_some() {
            continue;
        }
        let bounds = get_bounds(requirement.specifier())?;
        if let (Some(lower), true) = (bounds.lower, bounds.lower_inclusive) {
            result.push(lower);
        }
    }
    Ok(result)
}

/// The requirements declared by the distribution `requirement` selects,
/// installed for the default Python version.
pub(crate) fn resolve_dist(requirement: &Requirement, context: &dyn Context) -> Result<RequirementSet> {
    let inspector = context.inspector().ok_or(Error::NoInspector)?;
    let wanted: RequirementSet = std::iter::once(requirement.clone()).collect();
    let mut installed = inspector.inspect(context.default_python(), &wanted, false)?;
    let dist = installed.remove(requirement.name()).ok_or_else(|| {
        Error::Introspection(format!("{} was not installed", requirement.name()))
    })?;
    debug!(package = %dist.package, version = %dist.version, requires = dist.requires.len(), "inspected distribution");
    Ok(dist.requires)
}

#[cfg(test)]
mod tests {
    use crate::operators::{consistent_lower_bounds, dist};
    use crate::testing::context;
    use compreq_core::{Error, MemoryInspector, RequirementSet};
    use std::sync::Arc;

    fn inspector() -> MemoryInspector {
        MemoryInspector::new()
            .with_dist("foo", "1.2.0", "bar>=0.2")
            .unwrap()
            .with_dist("foo", "1.3.0", "bar>=0.3")
            .unwrap()
            .with_dist("bar", "0.1.0", "")
            .unwrap()
            .with_dist("bar", "0.2.0", "")
            .unwrap()
            .with_dist("bar", "0.3.0", "")
            .unwrap()
    }

    #[test]
    fn raises_lower_bound_declared_by_dependent() {
        let inspector = Arc::new(inspector());
        let context = context().with_inspector(inspector.clone());
        let set = consistent_lower_bounds("foo<2,>=1.2\nbar<1,>=0.1").unwrap();
        let resolved = set.resolve(&context).unwrap();
        assert_eq!(resolved.to_string(), "bar<1,>=0.2\nfoo<2,>=1.2\n");

        let (first, deps) = &inspector.calls()[0];
        assert!(!deps);
        assert_eq!(first.to_string(), "bar==0.1.0\nfoo==1.2.0\n");
    }

    #[test]
    fn raising_past_upper_bound_fails() {
        let context = context().with_inspector(Arc::new(inspector()));
        let err = consistent_lower_bounds("foo<2,>=1.2\nbar<0.2,>=0.1")
            .unwrap()
            .resolve(&context)
            .unwrap_err();
        assert!(matches!(err, Error::EmptySpecifierSet(_)));
    }

    #[test]
    fn raises_to_lowest_existing_release() {
        let context = context().with_inspector(Arc::new(inspector()));
        let set = consistent_lower_bounds("foo>=1.1.5").unwrap();
        let resolved = set.resolve(&context).unwrap();
        assert_eq!(resolved.to_string(), "foo>=1.2.0\n");
    }

    #[test]
    fn consistent_bounds_are_untouched() {
        let inspector = Arc::new(inspector());
        let context = context().with_inspector(inspector.clone());
        let input: RequirementSet = "foo>=1.3\nbar>=0.3,!=0.3.1".parse().unwrap();
        let resolved = consistent_lower_bounds(input.clone())
            .unwrap()
            .resolve(&context)
            .unwrap();
        assert_eq!(resolved, input);
        assert_eq!(inspector.calls().len(), 1);
    }

    #[test]
    fn python_and_unbounded_requirements_are_skipped() {
        let inspector = Arc::new(inspector());
        let context = context().with_inspector(inspector.clone());
        let resolved = consistent_lower_bounds("python>=3.9\nbar<1")
            .unwrap()
            .resolve(&context)
            .unwrap();
        assert_eq!(resolved.len(), 2);
        assert!(inspector.calls().is_empty());
    }

    #[test]
    fn requires_an_inspector() {
        let err = consistent_lower_bounds("foo>=1")
            .unwrap()
            .resolve(&context())
            .unwrap_err();
        assert!(matches!(err, Error::NoInspector));
        assert!(matches!(dist("foo").unwrap().resolve(&context()), Err(Error::NoInspector)));
    }

    #[test]
    fn dist_returns_declared_requirements() {
        let inspector = Arc::new(inspector());
        let context = context().with_inspector(inspector.clone());
        let requires = dist("foo<1.3").unwrap().resolve(&context).unwrap();
        assert_eq!(requires.to_string(), "bar>=0.2\n");
        assert_eq!(inspector.calls()[0].0.to_string(), "foo<1.3\n");
    }
}
