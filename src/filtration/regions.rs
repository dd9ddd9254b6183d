use crate::filtration::StageResult;
use crate::panel::IntervalSet;
use crate::variants::VariantSet;

/// Result of restricting variants to the panel regions.
#[derive(Debug, Clone)]
pub struct RegionFilterResult<'a> {
    pub result: StageResult<'a>,
    /// False if no variant was located in the panel and the input was passed on unfiltered.
    pub region_filter_was_effective: bool,
}

/// Keep variants located within the panel regions.
///
/// If not a single variant falls into the panel, the input is returned
/// unchanged: this almost always means mismatching chromosome names or
/// coordinate systems between panel and variants, and counting zero mutations
/// would silently report a TMB of zero.
pub fn intersect<'a>(variants: &VariantSet<'a>, panel: &IntervalSet) -> RegionFilterResult<'a> {
    let set = variants.select(|record| panel.contains(record.chrom(), record.pos()));
    if set.is_empty() && !variants.is_empty() {
        warn!(
            "None of the {} variants is located within the panel regions. Check chromosome \
             naming and coordinates of the BED file. Continuing without region filter.",
            variants.len()
        );
        RegionFilterResult {
            result: StageResult::new(variants.clone()),
            region_filter_was_effective: false,
        }
    } else {
        RegionFilterResult {
            result: StageResult::new(set),
            region_filter_was_effective: true,
        }
    }
}
