//! pageperf-report library
//!
//! Reads a recorded page set run from JSON and prints it with one of the
//! result formatters from `pageperf_common::output`.

pub mod input;
pub mod report;

pub use input::{load_run_file, PageRun, RawValue, RunFile};
pub use report::{run_report, CliOverrides};
