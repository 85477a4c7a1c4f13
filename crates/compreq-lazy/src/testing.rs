//! Shared fixtures for unit tests.

use crate::context::DefaultContext;
use chrono::{DateTime, TimeZone, Utc};
use compreq_core::{MemorySource, PYTHON};
use std::sync::Arc;

pub(crate) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

const RELEASES: &[(&str, &str, (i32, u32, u32))] = &[
    ("foo", "1.0.0", (2020, 1, 1)),
    ("foo", "1.1.0", (2020, 6, 1)),
    ("foo", "1.2.0", (2021, 1, 1)),
    ("foo", "1.3.0", (2021, 6, 1)),
    ("foo", "1.4.0", (2022, 1, 1)),
    ("foo", "2.0.0a1", (2022, 3, 1)),
    ("foo", "2.0.0", (2022, 6, 1)),
    ("foo", "2.1.0.dev1", (2022, 9, 1)),
    ("bar", "0.1.0", (2021, 1, 1)),
    ("bar", "0.2.0", (2022, 1, 1)),
    ("bar", "0.3.0", (2022, 12, 1)),
    (PYTHON, "3.8.0", (2019, 10, 14)),
    (PYTHON, "3.9.0", (2020, 10, 5)),
    (PYTHON, "3.10.0", (2021, 10, 4)),
    (PYTHON, "3.11.0", (2022, 10, 24)),
];

pub(crate) fn source() -> MemorySource {
    RELEASES
        .iter()
        .fold(MemorySource::new(), |source, (package, version, (y, m, d))| {
            source.with_release(package, version, at(*y, *m, *d)).unwrap()
        })
}

/// Python `>=3.9,<4` at 2023-01-01.
pub(crate) fn context() -> DefaultContext {
    DefaultContext::new(">=3.9,<4".parse().unwrap(), Arc::new(source()))
        .unwrap()
        .with_now(at(2023, 1, 1))
}
