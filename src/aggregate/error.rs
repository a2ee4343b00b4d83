use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

/// Identifies the input feature an error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureRef {
    Line(String),
    County(String),
    Waterbody(String),
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureRef::Line(id) => write!(f, "line '{}'", id),
            FeatureRef::County(name) => write!(f, "county '{}'", name),
            FeatureRef::Waterbody(id) => write!(f, "waterbody '{}'", id),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("Invalid geometry for {feature}: {reason}")]
    InvalidGeometry { feature: FeatureRef, reason: String },

    #[error("County name '{0}' appears more than once")]
    DuplicateCountyName(String),
}

impl AggregationError {
    pub(crate) fn invalid(feature: FeatureRef, reason: impl Into<String>) -> Self {
        AggregationError::InvalidGeometry {
            feature,
            reason: reason.into(),
        }
    }
}

/// Run a geometry operation, reporting a panic inside it as `InvalidGeometry`.
///
/// The sweep-line boolean ops panic on some degenerate inputs instead of returning an error.
/// The panic is caught, but the default panic hook has already printed it to stderr.
pub(crate) fn catch_geometry_panic<T>(
    op: impl FnOnce() -> T,
    feature: impl FnOnce() -> FeatureRef,
    reason: impl FnOnce() -> String,
) -> Result<T, AggregationError> {
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(|_| {
        let error = AggregationError::invalid(feature(), reason());
        log::warn!("{}", error);
        error
    })
}

/// All values, or the error of the earliest failed item.
pub(crate) fn first_error_in_order<T>(
    results: Vec<Result<T, AggregationError>>,
) -> Result<Vec<T>, AggregationError> {
    results.into_iter().collect()
}
