//! Filter stages of the TMB pipeline. Each stage consumes a [`VariantSet`] and
//! yields a new one, together with the number of unique mutations surviving it.

pub mod consequence;
pub mod deduplication;
pub mod mutation_class;
pub mod regions;
pub mod thresholds;

pub use consequence::ConsequenceAllowList;
pub use mutation_class::MutationClassPolicy;
pub use regions::RegionFilterResult;

use crate::variants::VariantSet;

/// Surviving set of a filter stage and its unique mutation count.
#[derive(Debug, Clone)]
pub struct StageResult<'a> {
    pub set: VariantSet<'a>,
    pub count: usize,
}

impl<'a> StageResult<'a> {
    pub fn new(set: VariantSet<'a>) -> Self {
        let count = set.unique_count();
        StageResult { set, count }
    }
}
