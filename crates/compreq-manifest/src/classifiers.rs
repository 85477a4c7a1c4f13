//! Python trove classifiers.

use compreq_core::ReleaseSet;

/// Prefix shared by every Python version classifier.
pub const PYTHON_CLASSIFIER_PREFIX: &str = "Programming Language :: Python :: ";

/// Version classifiers for a set of Python releases.
///
/// Each major version is listed before its first minor version, in
/// ascending order, without duplicates.
#[must_use]
pub fn python_classifiers(python_releases: &ReleaseSet) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for release in python_releases {
        let segments = release.version.release();
        let major = segments.first().copied().unwrap_or(0);
        let minor = segments.get(1).copied().unwrap_or(0);
        for label in [major.to_string(), format!("{major}.{minor}")] {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    labels
        .into_iter()
        .map(|label| format!("{PYTHON_CLASSIFIER_PREFIX}{label}"))
        .collect()
}

/// Replace the Python version classifiers in `classifiers`.
///
/// Other classifiers keep their order; the new version classifiers go last.
#[must_use]
pub fn set_python_classifiers(classifiers: &[String], python_releases: &ReleaseSet) -> Vec<String> {
    classifiers
        .iter()
        .filter(|c| !c.starts_with(PYTHON_CLASSIFIER_PREFIX))
        .cloned()
        .chain(python_classifiers(python_releases))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use compreq_core::{parse_version, Release, PYTHON};

    fn pythons(versions: &[&str]) -> ReleaseSet {
        let time = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        ReleaseSet::new(
            PYTHON,
            versions
                .iter()
                .map(|v| Release::new(PYTHON, parse_version(v).unwrap(), time)),
        )
        .unwrap()
    }

    #[test]
    fn lists_majors_and_minors() {
        let classifiers = python_classifiers(&pythons(&["3.10.1", "3.9.0", "3.9.5", "4.0.0"]));
        let labels: Vec<&str> = classifiers
            .iter()
            .map(|c| c.trim_start_matches(PYTHON_CLASSIFIER_PREFIX))
            .collect();
        assert_eq!(labels, ["3", "3.9", "3.10", "4", "4.0"]);
    }

    #[test]
    fn replaces_only_python_versions() {
        let existing = vec![
            "Development Status :: 4 - Beta".to_string(),
            format!("{PYTHON_CLASSIFIER_PREFIX}3"),
            format!("{PYTHON_CLASSIFIER_PREFIX}3.7"),
            "Typing :: Typed".to_string(),
        ];
        let updated = set_python_classifiers(&existing, &pythons(&["3.11.0"]));
        assert_eq!(
            updated,
            [
                "Development Status :: 4 - Beta".to_string(),
                "Typing :: Typed".to_string(),
                format!("{PYTHON_CLASSIFIER_PREFIX}3"),
                format!("{PYTHON_CLASSIFIER_PREFIX}3.11"),
            ]
        );
    }
}
