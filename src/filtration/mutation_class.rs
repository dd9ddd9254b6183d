use crate::filtration::StageResult;
use crate::variants::VariantSet;

/// Which kinds of mutations are counted towards the TMB.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum MutationClassPolicy {
    /// Single nucleotide variants only.
    #[strum(to_string = "snv-only", serialize = "snv", serialize = "snvs")]
    SnvOnly,
    /// SNVs plus multi nucleotide substitutions (e.g. doublet base substitutions,
    /// or non-normalized SNVs next to indels).
    #[strum(to_string = "snv+mnv", serialize = "mnv", serialize = "mnvs")]
    SnvMnv,
    /// Everything, including indels.
    #[strum(to_string = "unrestricted", serialize = "all")]
    Unrestricted,
}

impl Default for MutationClassPolicy {
    fn default() -> Self {
        MutationClassPolicy::Unrestricted
    }
}

impl MutationClassPolicy {
    pub fn is_restrictive(self) -> bool {
        self != MutationClassPolicy::Unrestricted
    }
}

pub fn select<'a>(variants: &VariantSet<'a>, policy: MutationClassPolicy) -> StageResult<'a> {
    let set = match policy {
        MutationClassPolicy::SnvOnly => variants.select(|record| record.is_snv()),
        // single pass, so that a record qualifying twice is kept once
        MutationClassPolicy::SnvMnv => {
            variants.select(|record| record.is_snv() || record.is_substitution())
        }
        MutationClassPolicy::Unrestricted => variants.clone(),
    };
    StageResult::new(set)
}
