use itertools::Itertools;

use crate::filtration::StageResult;
use crate::variants::VariantSet;

/// Keep the first record of each mutation id, in input order.
///
/// The table contains one row per annotated transcript, hence a mutation can
/// occur multiple times. This has to run after the consequence filter, such
/// that the surviving row is the first one matching the consequence criteria.
pub fn deduplicate<'a>(variants: &VariantSet<'a>) -> StageResult<'a> {
    let set: VariantSet<'a> = variants
        .iter()
        .unique_by(|record| record.mutation_id())
        .collect();
    StageResult {
        count: set.len(),
        set,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtration::consequence;
    use crate::variants::testing::snv;

    #[test]
    fn test_first_occurrence_wins() {
        let a = snv(0, 10, "synonymous_variant");
        let b = snv(1, 20, "missense_variant");
        let c = snv(2, 10, "missense_variant");
        let set = VariantSet::new(vec![&a, &b, &c]);

        let result = deduplicate(&set);
        assert_eq!(result.count, 2);
        assert_eq!(
            result.set.iter().map(|rec| rec.index()).collect_vec(),
            vec![0, 1]
        );
    }

    #[test]
    fn test_idempotent() {
        let a = snv(0, 10, "synonymous_variant");
        let b = snv(1, 10, "missense_variant");
        let c = snv(2, 30, "missense_variant");
        let set = VariantSet::new(vec![&a, &b, &c]);

        let once = deduplicate(&set);
        let twice = deduplicate(&once.set);
        assert_eq!(once.count, twice.count);
        assert_eq!(
            once.set.iter().map(|rec| rec.index()).collect_vec(),
            twice.set.iter().map(|rec| rec.index()).collect_vec()
        );
    }

    #[test]
    fn test_consequence_filter_before_deduplication() {
        // two transcripts of the same mutation, only the second one is coding
        let a = snv(0, 10, "intron_variant");
        let b = snv(1, 10, "missense_variant");
        let set = VariantSet::new(vec![&a, &b]);
        let allow_list = "missense_variant".parse().unwrap();

        let filtered = consequence::filter(&set, &allow_list);
        let result = deduplicate(&filtered.set);
        assert_eq!(result.count, 1);
        assert_eq!(result.set.records()[0].index(), 1);

        // the reverse order loses the mutation
        let deduplicated = deduplicate(&set);
        let reversed = consequence::filter(&deduplicated.set, &allow_list);
        assert_eq!(reversed.count, 0);
    }
}
