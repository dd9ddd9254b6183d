// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("malformed input: required column {column} is missing from the variant table")]
    MissingColumn { column: String },
    #[error("malformed input: invalid value '{value}' in column {column} (line {line})")]
    InvalidValue {
        column: String,
        line: usize,
        value: String,
    },
    #[error("malformed input: no allele fraction column (prefix '{prefix}') found in the variant table")]
    NoAlleleFractionColumns { prefix: String },
    #[error("consequence filter was requested but the given list of consequences is empty")]
    EmptyFilterList,
    #[error("invalid allele fraction range [{min}, {max}]: bounds must satisfy 0 <= min <= max <= 1")]
    InvalidAlleleFractionRange { min: f64, max: f64 },
    #[error("invalid panel interval {chrom}:{start}-{end}: start has to be smaller than end")]
    InvalidPanelInterval { chrom: String, start: u64, end: u64 },
    #[error("TMB estimation failed for the following samples: {samples}")]
    SampleRunsFailed { samples: String },
}

pub(crate) fn invalid_value(column: &str, line: usize, value: &str) -> Error {
    Error::InvalidValue {
        column: column.to_owned(),
        line,
        value: value.to_owned(),
    }
}

pub(crate) fn missing_column(column: &str) -> Error {
    Error::MissingColumn {
        column: column.to_owned(),
    }
}
