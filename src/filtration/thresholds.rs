//! Numeric filters on sample observations and population frequencies.

use crate::filtration::StageResult;
use crate::variants::{SampleObservations, VariantSet};

/// Keep variants with a read depth of at least `min_coverage`.
pub fn coverage<'a>(
    variants: &VariantSet<'a>,
    observations: &SampleObservations,
    min_coverage: u64,
) -> StageResult<'a> {
    StageResult::new(variants.select(|record| observations.read_depth(record) >= min_coverage))
}

/// Keep variants with an allele fraction in `[min_af, max_af]`.
pub fn allele_fraction<'a>(
    variants: &VariantSet<'a>,
    observations: &SampleObservations,
    min_af: f64,
    max_af: f64,
) -> StageResult<'a> {
    StageResult::new(variants.select(|record| {
        let af = observations.allele_fraction(record);
        // NaN fails both comparisons
        af >= min_af && af <= max_af
    }))
}

/// Keep variants that are rare in the population database, or unknown to it.
///
/// Variants without a population frequency are kept: novel variants are the
/// most relevant ones and cannot be judged by this filter.
pub fn population_frequency<'a>(variants: &VariantSet<'a>, max_frequency: f64) -> StageResult<'a> {
    StageResult::new(variants.select(|record| {
        record
            .population_frequency()
            .map_or(true, |frequency| frequency <= max_frequency)
    }))
}
