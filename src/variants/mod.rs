use std::fmt;
use std::iter::FromIterator;

use itertools::Itertools;

use crate::constants::CONSEQUENCE_SEPARATOR;

pub mod table;

pub use table::{ColumnNames, SampleContext, SampleLayout, SampleObservations, VariantTable};

/// Canonical identity of a variant: `CHROM:POS:REF:ALT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(String);

impl MutationId {
    pub fn new(chrom: &str, pos: u64, ref_allele: &str, alt_allele: &str) -> Self {
        MutationId(format!("{}:{}:{}:{}", chrom, pos, ref_allele, alt_allele))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Variant class as annotated by VEP (`VARIANT_CLASS`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantClass {
    Snv,
    Insertion,
    Deletion,
    Substitution,
    Other(String),
}

impl From<&str> for VariantClass {
    fn from(value: &str) -> Self {
        match value {
            "SNV" => VariantClass::Snv,
            "insertion" => VariantClass::Insertion,
            "deletion" => VariantClass::Deletion,
            "substitution" => VariantClass::Substitution,
            other => VariantClass::Other(other.to_owned()),
        }
    }
}

fn is_single_base(allele: &str) -> bool {
    matches!(allele, "A" | "C" | "G" | "T")
}

/// A single row of the annotated variant table.
///
/// Sample specific values (allele fraction, read depth) are not part of the
/// record, see [`SampleObservations`].
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct VariantRecord {
    /// Position of the record in the table (0-based, input order).
    #[getset(get_copy = "pub")]
    index: usize,
    #[getset(get = "pub")]
    mutation_id: MutationId,
    #[getset(get = "pub")]
    chrom: String,
    /// 1-based position.
    #[getset(get_copy = "pub")]
    pos: u64,
    #[getset(get = "pub")]
    ref_allele: String,
    #[getset(get = "pub")]
    alt_allele: String,
    #[getset(get = "pub")]
    filter: Option<String>,
    #[getset(get = "pub")]
    variant_class: Option<VariantClass>,
    #[getset(get = "pub")]
    consequence: Option<String>,
    #[getset(get_copy = "pub")]
    population_frequency: Option<f64>,
    /// All original fields of the row, retained for output.
    #[getset(get = "pub")]
    fields: Vec<String>,
}

impl VariantRecord {
    /// Individual consequence terms, e.g. `missense_variant&splice_region_variant`
    /// yields two terms.
    pub fn consequences(&self) -> impl Iterator<Item = &str> {
        self.consequence
            .as_deref()
            .into_iter()
            .flat_map(|consequence| consequence.split(CONSEQUENCE_SEPARATOR))
            .filter(|term| !term.is_empty())
    }

    /// The leading consequence term, used to group variants in plots.
    pub fn primary_consequence(&self) -> Option<&str> {
        self.consequences().next()
    }

    /// Single base substitution, required both by alleles and annotation since
    /// upstream annotation is not always consistent.
    pub fn is_snv(&self) -> bool {
        is_single_base(&self.ref_allele)
            && is_single_base(&self.alt_allele)
            && self.variant_class == Some(VariantClass::Snv)
    }

    pub fn is_substitution(&self) -> bool {
        self.variant_class == Some(VariantClass::Substitution)
    }
}

/// Ordered, immutable selection of records from a [`VariantTable`].
#[derive(Debug, Clone, Default)]
pub struct VariantSet<'a> {
    records: Vec<&'a VariantRecord>,
}

impl<'a> VariantSet<'a> {
    pub fn new(records: Vec<&'a VariantRecord>) -> Self {
        VariantSet { records }
    }

    pub fn records(&self) -> &[&'a VariantRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a VariantRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct mutation ids in the set.
    pub fn unique_count(&self) -> usize {
        self.records
            .iter()
            .map(|record| record.mutation_id())
            .unique()
            .count()
    }

    /// New set with all records fulfilling the given predicate, in order.
    pub fn select<F>(&self, predicate: F) -> VariantSet<'a>
    where
        F: Fn(&VariantRecord) -> bool,
    {
        self.iter().filter(|record| predicate(record)).collect()
    }
}

impl<'a> FromIterator<&'a VariantRecord> for VariantSet<'a> {
    fn from_iter<I: IntoIterator<Item = &'a VariantRecord>>(iter: I) -> Self {
        VariantSet {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Record with the given identity and annotation; sample values are held elsewhere.
    pub(crate) fn record(
        index: usize,
        chrom: &str,
        pos: u64,
        ref_allele: &str,
        alt_allele: &str,
        variant_class: &str,
        consequence: &str,
        population_frequency: Option<f64>,
    ) -> VariantRecord {
        VariantRecord {
            index,
            mutation_id: MutationId::new(chrom, pos, ref_allele, alt_allele),
            chrom: chrom.to_owned(),
            pos,
            ref_allele: ref_allele.to_owned(),
            alt_allele: alt_allele.to_owned(),
            filter: Some("PASS".to_owned()),
            variant_class: Some(VariantClass::from(variant_class)),
            consequence: Some(consequence.to_owned()),
            population_frequency,
            fields: Vec::new(),
        }
    }

    pub(crate) fn snv(index: usize, pos: u64, consequence: &str) -> VariantRecord {
        record(index, "chr1", pos, "C", "T", "SNV", consequence, None)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_mutation_id() {
        let id = MutationId::new("chr7", 140753336, "A", "T");
        assert_eq!(id.as_str(), "chr7:140753336:A:T");
        assert_eq!(id.to_string(), "chr7:140753336:A:T");
    }

    #[test]
    fn test_variant_class_from_str() {
        assert_eq!(VariantClass::from("SNV"), VariantClass::Snv);
        assert_eq!(VariantClass::from("insertion"), VariantClass::Insertion);
        assert_eq!(VariantClass::from("deletion"), VariantClass::Deletion);
        assert_eq!(
            VariantClass::from("substitution"),
            VariantClass::Substitution
        );
        assert_eq!(
            VariantClass::from("sequence_alteration"),
            VariantClass::Other("sequence_alteration".to_owned())
        );
    }

    #[test]
    fn test_consequences() {
        let rec = snv(0, 10, "missense_variant&splice_region_variant");
        assert_eq!(
            rec.consequences().collect_vec(),
            vec!["missense_variant", "splice_region_variant"]
        );
        assert_eq!(rec.primary_consequence(), Some("missense_variant"));
    }

    #[test]
    fn test_is_snv_requires_alleles_and_class() {
        assert!(snv(0, 10, "missense_variant").is_snv());
        // annotation claims SNV, alleles disagree
        let rec = record(0, "chr1", 10, "CA", "TG", "SNV", "missense_variant", None);
        assert!(!rec.is_snv());
        // alleles fine, annotation disagrees
        let rec = record(0, "chr1", 10, "C", "T", "substitution", "missense_variant", None);
        assert!(!rec.is_snv());
        assert!(rec.is_substitution());
        // ambiguous base
        let rec = record(0, "chr1", 10, "N", "T", "SNV", "missense_variant", None);
        assert!(!rec.is_snv());
    }

    #[test]
    fn test_unique_count() {
        let a = snv(0, 10, "missense_variant");
        let b = snv(1, 10, "synonymous_variant");
        let c = snv(2, 20, "missense_variant");
        let set = VariantSet::new(vec![&a, &b, &c]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.unique_count(), 2);
    }
}
