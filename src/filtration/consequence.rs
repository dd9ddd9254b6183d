use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::errors::Error;
use crate::filtration::StageResult;
use crate::variants::VariantSet;

/// Consequence terms (e.g. `missense_variant`) a variant has to carry at least
/// one of in order to be counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsequenceAllowList {
    terms: BTreeSet<String>,
}

impl ConsequenceAllowList {
    pub fn new<I, S>(terms: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: BTreeSet<String> = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_owned())
            .filter(|term| !term.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(Error::EmptyFilterList);
        }
        Ok(ConsequenceAllowList { terms })
    }

    /// Read terms from a file, one per line. Blank lines and `#` comments are ignored.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read consequence list {}", path.display()))?;
        Ok(Self::new(
            content
                .lines()
                .filter(|line| !line.trim_start().starts_with('#')),
        )?)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|term| term.as_str())
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }
}

/// Comma-separated list, e.g. `missense_variant,stop_gained`.
impl FromStr for ConsequenceAllowList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(','))
    }
}

/// Keep variants of which any consequence term is contained in the allow-list.
pub fn filter<'a>(variants: &VariantSet<'a>, allow_list: &ConsequenceAllowList) -> StageResult<'a> {
    let set = variants.select(|record| record.consequences().any(|term| allow_list.contains(term)));
    debug!(
        "Consequence filter ({}) retained {} of {} records.",
        allow_list.terms().join(","),
        set.len(),
        variants.len()
    );
    StageResult::new(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::testing::snv;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_any_match() {
        let a = snv(0, 10, "missense_variant&splice_region_variant");
        let b = snv(1, 20, "synonymous_variant");
        let c = snv(2, 30, "splice_region_variant&intron_variant");
        let set = VariantSet::new(vec![&a, &b, &c]);
        let allow_list: ConsequenceAllowList = "missense_variant,intron_variant".parse().unwrap();

        let result = filter(&set, &allow_list);
        assert_eq!(result.count, 2);
        assert_eq!(
            result.set.iter().map(|rec| rec.index()).collect_vec(),
            vec![0, 2]
        );
    }

    #[test]
    fn test_partial_term_does_not_match() {
        let a = snv(0, 10, "missense_variant_like");
        let set = VariantSet::new(vec![&a]);
        let allow_list: ConsequenceAllowList = "missense_variant".parse().unwrap();
        assert_eq!(filter(&set, &allow_list).count, 0);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(
            "".parse::<ConsequenceAllowList>(),
            Err(Error::EmptyFilterList)
        );
        assert_eq!(
            " , ,".parse::<ConsequenceAllowList>(),
            Err(Error::EmptyFilterList)
        );
    }

    #[test]
    fn test_from_path() {
        let tmp = NamedTempFile::new().unwrap();
        writeln!(tmp.as_file(), "# coding consequences").unwrap();
        writeln!(tmp.as_file(), "missense_variant").unwrap();
        writeln!(tmp.as_file()).unwrap();
        writeln!(tmp.as_file(), "stop_gained ").unwrap();
        let allow_list = ConsequenceAllowList::from_path(tmp.path()).unwrap();
        assert_eq!(
            allow_list.terms().collect_vec(),
            vec!["missense_variant", "stop_gained"]
        );
    }

    #[test]
    fn test_from_empty_file() {
        let tmp = NamedTempFile::new().unwrap();
        writeln!(tmp.as_file(), "# nothing here").unwrap();
        let err = ConsequenceAllowList::from_path(tmp.path()).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::EmptyFilterList));
    }
}
