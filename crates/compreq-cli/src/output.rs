//! Terminal output helpers.
//!
//! Results go to stdout; progress and diagnostics go to stderr.

use comfy_table::{presets, Cell, ContentArrangement, Row};
use console::style;

/// Apply the color preference.
pub fn init(no_ansi: bool) {
    if no_ansi {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
}

/// Print a section header.
pub fn header(message: &str) {
    eprintln!("{}", style(message).cyan().bold());
}

/// Print an informational message.
pub fn info(message: &str) {
    eprintln!("{} {message}", style("info:").blue());
}

/// Print a success message.
pub fn success(message: &str) {
    eprintln!("{} {message}", style("done:").green().bold());
}

/// Print a warning.
pub fn warning(message: &str) {
    eprintln!("{} {message}", style("warning:").yellow().bold());
}

/// Print an error.
pub fn error(message: &str) {
    eprintln!("{} {message}", style("error:").red().bold());
}

/// Text styled as a package name.
pub fn package(name: &str) -> String {
    style(name).green().to_string()
}

/// Text styled as a version or specifier.
pub fn version(text: &str) -> String {
    style(text).yellow().to_string()
}

/// Cell highlighted as changed.
pub fn changed(text: &str) -> Cell {
    Cell::new(text).fg(comfy_table::Color::Yellow)
}

/// A table printed to stdout.
#[derive(Debug)]
pub struct Table {
    inner: comfy_table::Table,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    pub fn new() -> Self {
        let mut inner = comfy_table::Table::new();
        inner
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic);
        Self { inner }
    }

    pub fn headers<I, T>(&mut self, headers: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Cell>,
    {
        self.inner
            .set_header(headers.into_iter().map(Into::into).collect::<Vec<Cell>>());
    }

    pub fn row<I, T>(&mut self, cells: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Cell>,
    {
        self.inner
            .add_row(Row::from(cells.into_iter().map(Into::into).collect::<Vec<Cell>>()));
    }

    pub fn print(&self) {
        println!("{}", self.inner);
    }
}
