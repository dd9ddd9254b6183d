use crate::constants::BASES_PER_MEGABASE;

/// Tumor mutational burden: number of qualifying mutations per megabase of panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct TumorMutationalBurden {
    mutations: usize,
    panel_size: u64,
    /// Mutations per megabase, rounded to two decimals.
    value: f64,
}

impl TumorMutationalBurden {
    /// Panel size has to be positive, which the panel eligibility gate ensures.
    pub fn estimate(mutations: usize, panel_size: u64) -> Self {
        assert!(panel_size > 0, "bug: TMB requested for an empty panel");
        let value = round_decimals(
            (mutations as f64 / panel_size as f64) * BASES_PER_MEGABASE,
            2,
        );
        TumorMutationalBurden {
            mutations,
            panel_size,
            value,
        }
    }
}

/// Round to the given number of decimals, based on the exact decimal expansion
/// of the value (ties to even), not on a scaled multiplication.
pub(crate) fn round_decimals(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value)
        .parse()
        .expect("bug: formatted float has to be parseable")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmb_per_megabase() {
        let tmb = TumorMutationalBurden::estimate(5, 1_000_000);
        assert_relative_eq!(tmb.value(), 5.0);
        assert_eq!(tmb.mutations(), 5);
        assert_eq!(tmb.panel_size(), 1_000_000);
    }

    #[test]
    fn test_tmb_small_panel() {
        // 7 / 1.5 Mbp = 4.666..
        assert_relative_eq!(TumorMutationalBurden::estimate(7, 1_500_000).value(), 4.67);
        // 1 / 300 kbp = 3.333..
        assert_relative_eq!(TumorMutationalBurden::estimate(1, 300_000).value(), 3.33);
        assert_relative_eq!(TumorMutationalBurden::estimate(0, 300_000).value(), 0.0);
    }

    #[test]
    fn test_tmb_deterministic() {
        let a = TumorMutationalBurden::estimate(123, 33_456_789);
        let b = TumorMutationalBurden::estimate(123, 33_456_789);
        assert_eq!(a.value().to_bits(), b.value().to_bits());
    }

    #[test]
    fn test_round_decimals() {
        assert_eq!(round_decimals(3.14159, 2), 3.14);
        assert_eq!(round_decimals(2.675, 2), 2.67); // 2.675 is slightly below in binary
        assert_eq!(round_decimals(10.0, 2), 10.0);
    }

    #[test]
    #[should_panic]
    fn test_empty_panel() {
        TumorMutationalBurden::estimate(1, 0);
    }
}
