/// Panels below this size (in bp) still yield a TMB, but it may be biased.
pub const LARGE_PANEL_MIN_SIZE: u64 = 1_000_000;

/// TMB is reported as mutations per megabase.
pub const BASES_PER_MEGABASE: f64 = 1_000_000.0;

pub const ALLELE_FRACTION_PREFIX: &str = "allele_fraction";
pub const READ_DEPTH_PREFIX: &str = "read_depth";

/// Separator of the multi-valued consequence annotation (VEP CSQ).
pub const CONSEQUENCE_SEPARATOR: char = '&';

/// Values that denote an absent annotation in the variant table.
pub const MISSING_VALUES: &[&str] = &["", "NA", "NaN", "nan", "None", "."];
