//! # pageperf common library
//!
//! Shared code for recording and reporting page measurements:
//! - Measurement values and their same-page / cross-page merge rules
//! - Grouping helpers that merge whole collections of values
//! - Page measurement results store
//! - Buildbot, CSV and JSON result formatters
//! - Configuration loading

pub mod config;
pub mod error;
pub mod merge_values;
pub mod output;
pub mod page;
pub mod results;
pub mod value;

pub use error::{Error, Result};
pub use page::Page;
pub use results::PageMeasurementResults;
pub use value::{
    HistogramValue, ListOfScalarValues, MeasurementValue, MergePolicy, OutputContext, ScalarValue,
    Value,
};
