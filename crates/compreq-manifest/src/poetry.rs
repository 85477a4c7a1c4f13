//! Poetry `pyproject.toml` files.
//!
//! Dependencies live in `[tool.poetry.dependencies]` or, for a named group,
//! in `[tool.poetry.group.<group>.dependencies]`. Entries are either a
//! version string or an inline table with `version`, `extras`, `markers`
//! and one of `url`, `path` or `git`.
//!
//! Poetry's own operators are translated on read: `^X` becomes
//! `>=X,<ceil(REL_MAJOR, X)` and `~X` becomes `~=X`. On write `~=X` is
//! rendered back as `~X`.

use crate::classifiers::set_python_classifiers;
use crate::error::{ManifestError, Result};
use compreq_core::{
    ceil, parse_specifier, parse_version, Marker, Operator, ReleaseSet, Requirement,
    RequirementSet, SpecifierSet, Version, REL_MAJOR,
};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use toml_edit::{value, Array, DocumentMut, InlineTable, Item, Table, TableLike, Value};
use tracing::debug;

/// A `pyproject.toml` managed by Poetry, edited in place.
///
/// Formatting and comments outside the rewritten tables are preserved.
#[derive(Debug, Clone)]
pub struct PoetryPyprojectFile {
    path: PathBuf,
    doc: DocumentMut,
}

impl PoetryPyprojectFile {
    /// Open an existing file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid TOML.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ManifestError::io(&path, e))?;
        let doc = content.parse::<DocumentMut>().map_err(|e| ManifestError::Toml {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { path, doc })
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Requirements of the main dependencies, or of `group`.
    ///
    /// # Errors
    /// Returns error if the table is missing or an entry is malformed.
    pub fn requirements(&self, group: Option<&str>) -> Result<RequirementSet> {
        let dependencies = self.dependencies(group)?;
        dependencies
            .iter()
            .map(|(package, item)| parse_requirement(package, item))
            .collect()
    }

    /// Replace every requirement of the main dependencies, or of `group`.
    ///
    /// Missing group tables are created.
    ///
    /// # Errors
    /// Returns error if an intermediate key is not a table.
    pub fn set_requirements(
        &mut self,
        requirements: &RequirementSet,
        group: Option<&str>,
    ) -> Result<()> {
        let dependencies = self.dependencies_mut(group)?;
        dependencies.clear();
        for requirement in requirements.iter() {
            dependencies.insert(requirement.name(), format_requirement(requirement));
        }
        debug!(path = %self.path.display(), ?group, count = requirements.len(), "set requirements");
        Ok(())
    }

    /// Entries of `tool.poetry.classifiers`; empty when absent.
    ///
    /// # Errors
    /// Returns error if `[tool.poetry]` is missing or `classifiers` is not
    /// an array of strings.
    pub fn classifiers(&self) -> Result<Vec<String>> {
        let poetry = self.poetry()?;
        let Some(item) = poetry.get("classifiers") else {
            return Ok(Vec::new());
        };
        let array = item
            .as_array()
            .ok_or_else(|| ManifestError::UnexpectedType("tool.poetry.classifiers".into()))?;
        array
            .iter()
            .map(|value| {
                value.as_str().map(ToString::to_string).ok_or_else(|| {
                    ManifestError::UnexpectedType("tool.poetry.classifiers".into())
                })
            })
            .collect()
    }

    /// Replace `tool.poetry.classifiers`, one entry per line.
    ///
    /// # Errors
    /// Returns error if `[tool.poetry]` is missing.
    pub fn set_classifiers(&mut self, classifiers: &[String]) -> Result<()> {
        let mut array: Array = classifiers.iter().map(String::as_str).collect();
        for value in array.iter_mut() {
            value.decor_mut().set_prefix("\n    ");
        }
        array.set_trailing_comma(true);
        array.set_trailing("\n");
        self.poetry_mut()?
            .insert("classifiers", Item::Value(Value::Array(array)));
        Ok(())
    }

    /// Replace the Python version classifiers with ones for `python_releases`.
    ///
    /// # Errors
    /// Returns error if the classifiers cannot be read or written.
    pub fn set_python_classifiers(&mut self, python_releases: &ReleaseSet) -> Result<()> {
        let classifiers = set_python_classifiers(&self.classifiers()?, python_releases);
        self.set_classifiers(&classifiers)
    }

    /// Point the `isort`, `black` and `mypy` settings under `[tool]` at the
    /// minor series of `python`. Only tools that already have a table are
    /// touched; their names are returned.
    ///
    /// # Errors
    /// Returns error if `python` has no release segments.
    pub fn set_tool_python_versions(&mut self, python: &Version) -> Result<Vec<&'static str>> {
        let (major, minor) = match python.release() {
            [major, minor, ..] => (*major, *minor),
            [major] => (*major, 0),
            [] => return Err(ManifestError::UnexpectedType(format!("python version {python}"))),
        };
        let py_version: i64 = format!("{major}{minor}")
            .parse()
            .map_err(|_| ManifestError::UnexpectedType(format!("python version {python}")))?;
        let mut target_version = Array::new();
        target_version.push(format!("py{major}{minor}"));
        let settings = [
            ("isort", "py_version", value(py_version)),
            ("black", "target-version", value(target_version)),
            ("mypy", "python_version", value(format!("{major}.{minor}"))),
        ];

        let mut updated = Vec::new();
        let Some(tool) = self.doc.get_mut("tool").and_then(Item::as_table_like_mut) else {
            return Ok(updated);
        };
        for (name, key, setting) in settings {
            if let Some(table) = tool.get_mut(name).and_then(Item::as_table_like_mut) {
                table.insert(key, setting);
                updated.push(name);
            }
        }
        debug!(path = %self.path.display(), ?updated, "set tool python versions");
        Ok(updated)
    }

    /// Write the document back to its file.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, self.doc.to_string())
            .map_err(|e| ManifestError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "wrote pyproject");
        Ok(())
    }

    fn poetry(&self) -> Result<&dyn TableLike> {
        let tool = child(self.doc.as_table(), "tool", "tool")?;
        child(tool, "poetry", "tool.poetry")
    }

    fn poetry_mut(&mut self) -> Result<&mut dyn TableLike> {
        let tool = existing_child_mut(self.doc.as_table_mut(), "tool", "tool")?;
        existing_child_mut(tool, "poetry", "tool.poetry")
    }

    fn dependencies(&self, group: Option<&str>) -> Result<&dyn TableLike> {
        let poetry = self.poetry()?;
        match group {
            None => child(poetry, "dependencies", "tool.poetry.dependencies"),
            Some(group) => {
                let groups = child(poetry, "group", "tool.poetry.group")?;
                let path = format!("tool.poetry.group.{group}");
                let table = child(groups, group, &path)?;
                child(table, "dependencies", &format!("{path}.dependencies"))
            }
        }
    }

    fn dependencies_mut(&mut self, group: Option<&str>) -> Result<&mut dyn TableLike> {
        let poetry = self.poetry_mut()?;
        match group {
            None => child_mut(poetry, "dependencies", "tool.poetry.dependencies", false),
            Some(group) => {
                let groups = child_mut(poetry, "group", "tool.poetry.group", true)?;
                let path = format!("tool.poetry.group.{group}");
                let table = child_mut(groups, group, &path, true)?;
                child_mut(table, "dependencies", &format!("{path}.dependencies"), false)
            }
        }
    }
}

impl fmt::Display for PoetryPyprojectFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.doc)
    }
}

fn child<'a>(parent: &'a dyn TableLike, key: &str, path: &str) -> Result<&'a dyn TableLike> {
    let item = parent
        .get(key)
        .ok_or_else(|| ManifestError::MissingTable(path.to_string()))?;
    item.as_table_like()
        .ok_or_else(|| ManifestError::UnexpectedType(path.to_string()))
}

fn existing_child_mut<'a>(
    parent: &'a mut dyn TableLike,
    key: &str,
    path: &str,
) -> Result<&'a mut dyn TableLike> {
    let item = parent
        .get_mut(key)
        .ok_or_else(|| ManifestError::MissingTable(path.to_string()))?;
    item.as_table_like_mut()
        .ok_or_else(|| ManifestError::UnexpectedType(path.to_string()))
}

/// Like [`existing_child_mut`], creating the table first when missing.
fn child_mut<'a>(
    parent: &'a mut dyn TableLike,
    key: &str,
    path: &str,
    implicit: bool,
) -> Result<&'a mut dyn TableLike> {
    if !parent.contains_key(key) {
        let mut table = Table::new();
        table.set_implicit(implicit);
        parent.insert(key, Item::Table(table));
    }
    existing_child_mut(parent, key, path)
}

fn parse_requirement(package: &str, item: &Item) -> Result<Requirement> {
    let invalid = |message: &str| ManifestError::invalid_dependency(package, message);

    if let Some(version) = item.as_str() {
        let specifier = parse_specifier_set(version)?;
        return Ok(Requirement::new(package, BTreeSet::new(), specifier, None, None)?);
    }

    let table = item
        .as_table_like()
        .ok_or_else(|| invalid("expected a string or a table"))?;
    let text = |key: &str| -> Result<Option<&str>> {
        table
            .get(key)
            .map(|v| v.as_str().ok_or_else(|| invalid(&format!("'{key}' must be a string"))))
            .transpose()
    };

    let mut url = None;
    if let Some(u) = text("url")? {
        url = Some(u.to_string());
    }
    if let Some(path) = text("path")? {
        url = Some(format!("file://{path}"));
    }
    if let Some(git) = text("git")? {
        url = Some(format!("git+{git}"));
    }

    let extras = match table.get("extras") {
        None => BTreeSet::new(),
        Some(extras) => extras
            .as_array()
            .ok_or_else(|| invalid("'extras' must be an array"))?
            .iter()
            .map(|e| {
                e.as_str()
                    .map(ToString::to_string)
                    .ok_or_else(|| invalid("extras must be strings"))
            })
            .collect::<Result<_>>()?,
    };
    let specifier = match text("version")? {
        Some(version) => parse_specifier_set(version)?,
        None => SpecifierSet::new(),
    };
    let marker = text("markers")?.map(str::parse::<Marker>).transpose()?;

    Ok(Requirement::new(package, extras, specifier, url, marker)?)
}

/// Parse a Poetry version constraint, translating `^`, `~`, `*` and bare
/// versions.
///
/// # Errors
/// Returns error if a part is not a valid specifier.
pub fn parse_specifier_set(input: &str) -> Result<SpecifierSet> {
    let mut result = SpecifierSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part == "*" {
            continue;
        }
        if let Some(version) = part.strip_prefix('^') {
            let version = parse_version(version.trim())?;
            let upper = ceil(REL_MAJOR, &version, true)?;
            result.insert(parse_specifier(&format!(">={version}"))?);
            result.insert(parse_specifier(&format!("<{upper}"))?);
        } else if let Some(version) = part.strip_prefix('~').filter(|v| !v.starts_with('=')) {
            result.insert(parse_specifier(&format!("~={}", version.trim()))?);
        } else if part.starts_with(|c: char| c.is_ascii_digit()) {
            result.insert(parse_specifier(&format!("=={part}"))?);
        } else {
            result.insert(parse_specifier(part)?);
        }
    }
    Ok(result)
}

/// Render a specifier set in Poetry syntax: `~=X` becomes `~X`, parts are
/// sorted.
#[must_use]
pub fn format_specifier_set(specifier: &SpecifierSet) -> String {
    let mut parts: Vec<String> = specifier
        .iter()
        .map(|s| match s.operator() {
            Operator::TildeEqual => format!("~{}", s.version()),
            _ => s.to_string(),
        })
        .collect();
    parts.sort();
    parts.join(",")
}

fn format_requirement(requirement: &Requirement) -> Item {
    let version = (!requirement.specifier().is_empty())
        .then(|| format_specifier_set(requirement.specifier()));

    if requirement.url().is_none() && requirement.extras().is_empty() && requirement.marker().is_none() {
        return toml_edit::value(version.unwrap_or_else(|| "*".to_string()));
    }

    let mut table = InlineTable::new();
    if let Some(url) = requirement.url() {
        if let Some(path) = url.strip_prefix("file://") {
            table.insert("path", path.into());
        } else if let Some(git) = url.strip_prefix("git+") {
            table.insert("git", git.into());
        } else {
            table.insert("url", url.into());
        }
    }
    if !requirement.extras().is_empty() {
        let extras: Array = requirement.extras().iter().map(String::as_str).collect();
        table.insert("extras", Value::Array(extras));
    }
    if let Some(version) = version {
        table.insert("version", version.into());
    }
    if let Some(marker) = requirement.marker() {
        table.insert("markers", marker.as_str().into());
    }
    Item::Value(Value::InlineTable(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const PYPROJECT: &str = r#"
[tool.poetry]
name = "compreq"
version = "0.1.0"

[tool.poetry.dependencies]
python = "^3.9"
pack1 = "!=1.2.5,<2.0.0,>=1.2.3"
pack4 = "~1.2"
pack5 = "^1.2.3"
pack6 = "^0.1.0"
packextra = {extras = ["extra1", "extra2"], version = "^1.2.3"}
packgit = {git = "https://github.com/pack6/pack6"}
packmarker = {version = ">=1.2.3", markers = "platform_system != 'Darwin'"}
packpath = {path = "/home/compreq"}
packurl = {url = "http://www.test.com/test/pack7-1.2.3.tar.gz"}

[tool.poetry.group.dev.dependencies]
pack-dev1 = "<2.0.0,>=1.2.3"
"#;

    fn file(content: &str) -> (tempfile::TempDir, PoetryPyprojectFile) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pyproject.toml");
        std::fs::write(&path, content).unwrap();
        let file = PoetryPyprojectFile::open(&path).unwrap();
        (tmp, file)
    }

    #[test]
    fn reads_main_and_group_requirements() {
        let (_tmp, pyproject) = file(PYPROJECT);
        let main = pyproject.requirements(None).unwrap();
        let expected: RequirementSet = "python<4.0,>=3.9
pack1!=1.2.5,<2.0.0,>=1.2.3
pack4~=1.2
pack5<2.0.0,>=1.2.3
pack6<0.2.0,>=0.1.0
packextra[extra1,extra2]<2.0.0,>=1.2.3
packgit@ git+https://github.com/pack6/pack6
packmarker>=1.2.3; platform_system != 'Darwin'
packpath@ file:///home/compreq
packurl@ http://www.test.com/test/pack7-1.2.3.tar.gz"
            .parse()
            .unwrap();
        assert_eq!(main, expected);

        let dev = pyproject.requirements(Some("dev")).unwrap();
        assert_eq!(dev.to_string(), "pack-dev1<2.0.0,>=1.2.3\n");

        assert!(matches!(
            pyproject.requirements(Some("docs")),
            Err(ManifestError::MissingTable(ref t)) if t == "tool.poetry.group.docs"
        ));
    }

    #[test]
    fn writes_and_reads_back() {
        let (_tmp, mut pyproject) = file(
            "[tool.poetry]\nname = \"compreq\"\n\n[tool.poetry.dependencies]\nold = \"*\"\n",
        );
        let (_other, source) = file(PYPROJECT);
        let main = source.requirements(None).unwrap();
        let dev = source.requirements(Some("dev")).unwrap();

        pyproject.set_requirements(&main, None).unwrap();
        pyproject.set_requirements(&dev, Some("dev")).unwrap();
        pyproject.save().unwrap();

        let text = std::fs::read_to_string(pyproject.path()).unwrap();
        assert!(text.contains("pack1 = \"!=1.2.5,<2.0.0,>=1.2.3\""));
        assert!(text.contains("pack4 = \"~1.2\""));
        assert!(text.contains("[tool.poetry.group.dev.dependencies]"));
        assert!(!text.contains("old"));

        let reopened = PoetryPyprojectFile::open(pyproject.path()).unwrap();
        assert_eq!(reopened.requirements(None).unwrap(), main);
        assert_eq!(reopened.requirements(Some("dev")).unwrap(), dev);
    }

    #[test]
    fn sets_tool_python_versions() {
        let (_tmp, mut pyproject) = file(
            "[tool.poetry]\nname = \"compreq\"\n\n[tool.isort]\nprofile = \"black\"\npy_version = 38\n\n[tool.black]\ntarget-version = [\"py38\"]\n\n[tool.mypy]\npython_version = \"3.8\"\n",
        );
        let updated = pyproject
            .set_tool_python_versions(&parse_version("3.10").unwrap())
            .unwrap();
        assert_eq!(updated, ["isort", "black", "mypy"]);
        let text = pyproject.to_string();
        assert!(text.contains("py_version = 310"));
        assert!(text.contains("target-version = [\"py310\"]"));
        assert!(text.contains("python_version = \"3.10\""));
        assert!(text.contains("profile = \"black\""));
    }

    #[test]
    fn unconfigured_tools_are_skipped() {
        let (_tmp, mut pyproject) = file("[tool.poetry]\nname = \"compreq\"\n\n[tool.mypy]\nstrict = true\n");
        let updated = pyproject
            .set_tool_python_versions(&parse_version("3.9.1").unwrap())
            .unwrap();
        assert_eq!(updated, ["mypy"]);
        assert!(!pyproject.to_string().contains("isort"));
        assert!(pyproject.to_string().contains("python_version = \"3.9\""));
    }

    #[test]
    fn classifiers_round_trip() {
        let (_tmp, mut pyproject) = file(
            "[tool.poetry]\nname = \"compreq\"\nclassifiers = [\n    \"chaff1\",\n    \"chaff2\",\n]\n",
        );
        assert_eq!(pyproject.classifiers().unwrap(), ["chaff1", "chaff2"]);

        let new = vec!["test1".to_string(), "test2".to_string()];
        pyproject.set_classifiers(&new).unwrap();
        assert_eq!(pyproject.classifiers().unwrap(), new);
        assert!(pyproject
            .to_string()
            .contains("classifiers = [\n    \"test1\",\n    \"test2\",\n]"));
    }

    #[test]
    fn missing_poetry_table() {
        let (_tmp, pyproject) = file("[project]\nname = \"x\"\n");
        assert!(matches!(
            pyproject.classifiers(),
            Err(ManifestError::MissingTable(ref t)) if t == "tool"
        ));
    }

    #[test_case("^1.2.3", "<2.0.0,>=1.2.3" ; "caret")]
    #[test_case("^0.1.0", "<0.2.0,>=0.1.0" ; "caret below one")]
    #[test_case("~1.2", "~=1.2" ; "tilde")]
    #[test_case("~=1.2", "~=1.2" ; "compatible")]
    #[test_case("1.2.3", "==1.2.3" ; "bare")]
    #[test_case("*", "" ; "any")]
    #[test_case(">=1, <3", "<3,>=1" ; "plain")]
    fn poetry_constraints(input: &str, expected: &str) {
        assert_eq!(parse_specifier_set(input).unwrap().to_string(), expected);
    }

    #[test]
    fn formats_compatible_as_tilde() {
        let set: SpecifierSet = "~=1.2,!=1.2.5".parse().unwrap();
        assert_eq!(format_specifier_set(&set), "!=1.2.5,~1.2");
    }

    #[test]
    fn rejects_malformed_entries() {
        let (_tmp, pyproject) = file(
            "[tool.poetry]\nname = \"x\"\n[tool.poetry.dependencies]\nfoo = 3\n",
        );
        assert!(matches!(
            pyproject.requirements(None),
            Err(ManifestError::InvalidDependency { ref package, .. }) if package == "foo"
        ));
    }
}
