// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Ordered filter pipeline of a single sample, from the raw variant table to
//! the TMB estimate.
//!
//! Stage order: consequence filter, deduplication, mutation class selection,
//! panel eligibility gate, region intersection, coverage filter, allele
//! fraction filter, population frequency filter. Reordering changes results
//! (e.g. deduplication before the consequence filter may drop the one
//! duplicate that carries a relevant consequence).

use anyhow::Result;

use crate::audit::{AuditReport, Conclusion, Stage, StageInfo};
use crate::errors::{self, Error};
use crate::estimation::tumor_mutational_burden::TumorMutationalBurden;
use crate::filtration::{
    consequence, deduplication, mutation_class, regions, thresholds, ConsequenceAllowList,
    MutationClassPolicy, StageResult,
};
use crate::panel::{IntervalSet, PanelEligibility};
use crate::variants::{ColumnNames, SampleContext, SampleObservations, VariantSet, VariantTable};

/// Upper bound for the frequency of a variant in a population database column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, CopyGetters)]
pub struct PopulationFilter {
    #[getset(get = "pub")]
    database: String,
    #[getset(get_copy = "pub")]
    max_frequency: f64,
}

impl PopulationFilter {
    pub fn new(database: &str, max_frequency: f64) -> Self {
        PopulationFilter {
            database: database.to_owned(),
            max_frequency,
        }
    }
}

/// Parameters shared by all sample runs.
#[derive(Debug, Clone, PartialEq, Builder, Getters, CopyGetters, Serialize)]
#[builder(pattern = "owned")]
pub struct FilterConfig {
    #[builder(default)]
    #[getset(get_copy = "pub")]
    min_coverage: u64,
    #[builder(private, default = "0.0")]
    #[getset(get_copy = "pub")]
    min_af: f64,
    #[builder(private, default = "1.0")]
    #[getset(get_copy = "pub")]
    max_af: f64,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    panelsize_threshold: u64,
    #[builder(default)]
    #[getset(get = "pub")]
    population_filter: Option<PopulationFilter>,
    #[builder(default)]
    #[getset(get_copy = "pub")]
    mutation_classes: MutationClassPolicy,
    #[builder(default)]
    #[getset(get = "pub")]
    consequences: Option<ConsequenceAllowList>,
    /// Restrict variants to the panel regions.
    #[builder(default)]
    #[getset(get_copy = "pub")]
    prefilter_region: bool,
    #[builder(default)]
    #[getset(get = "pub")]
    columns: ColumnNames,
}

impl FilterConfigBuilder {
    /// Inclusive allele fraction range. Bounds have to satisfy `0 <= min_af <= max_af <= 1`.
    pub fn allele_fraction_range(self, min_af: f64, max_af: f64) -> Result<Self, Error> {
        let unit = 0.0..=1.0;
        if !unit.contains(&min_af) || !unit.contains(&max_af) || min_af > max_af {
            return Err(Error::InvalidAlleleFractionRange {
                min: min_af,
                max: max_af,
            });
        }
        Ok(self.min_af(min_af).max_af(max_af))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HaltReason {
    PanelIneligible { panel_size: u64, threshold: u64 },
}

/// Result of a successful sample run.
#[derive(Debug, Clone)]
pub struct Estimate<'a> {
    pub tmb: TumorMutationalBurden,
    pub eligibility: PanelEligibility,
    pub region_filter_was_effective: bool,
    pub report: AuditReport,
    pub observations: SampleObservations,
    /// Variants after the coverage filter, the basis of the allele fraction distribution.
    pub af_distribution: VariantSet<'a>,
    /// Variants counted towards the TMB.
    pub filtered: VariantSet<'a>,
}

#[derive(Debug, Clone)]
pub enum SampleOutcome<'a> {
    Completed(Estimate<'a>),
    Halted {
        reason: HaltReason,
        report: AuditReport,
    },
}

impl<'a> SampleOutcome<'a> {
    pub fn report(&self) -> &AuditReport {
        match self {
            SampleOutcome::Completed(estimate) => &estimate.report,
            SampleOutcome::Halted { report, .. } => report,
        }
    }

    pub fn tmb(&self) -> Option<TumorMutationalBurden> {
        match self {
            SampleOutcome::Completed(estimate) => Some(estimate.tmb),
            SampleOutcome::Halted { .. } => None,
        }
    }
}

/// Run all filter stages for the given sample and estimate its TMB.
///
/// Malformed sample columns are returned as errors. An ineligible panel is not
/// an error but a halted outcome carrying the audit trail up to the gate.
pub fn run<'a>(
    table: &'a VariantTable,
    panel: &IntervalSet,
    sample: &SampleContext,
    config: &FilterConfig,
) -> Result<SampleOutcome<'a>> {
    if config.consequences.is_some() && !table.has_column(&config.columns.consequence) {
        return Err(errors::missing_column(&config.columns.consequence).into());
    }
    if config.mutation_classes.is_restrictive() && !table.has_column(&config.columns.variant_class)
    {
        return Err(errors::missing_column(&config.columns.variant_class).into());
    }
    let observations = table.observations(sample)?;

    let mut report = AuditReport::new();

    let initial = StageResult::new(table.variants());
    report.push(Stage::Initial, initial.count, StageInfo::Applied);

    let consequence_filtered = match &config.consequences {
        Some(allow_list) => {
            let filtered = consequence::filter(&initial.set, allow_list);
            report.push(Stage::Consequence, filtered.count, StageInfo::Applied);
            filtered
        }
        None => {
            report.push(Stage::Consequence, initial.count, StageInfo::NotApplied);
            initial
        }
    };

    let deduplicated = deduplication::deduplicate(&consequence_filtered.set);
    report.push(Stage::Deduplication, deduplicated.count, StageInfo::Applied);

    let selected = mutation_class::select(&deduplicated.set, config.mutation_classes);
    let info = if config.mutation_classes.is_restrictive() {
        StageInfo::Applied
    } else {
        StageInfo::NotApplied
    };
    report.push(Stage::MutationClass, selected.count, info);

    let eligibility = panel.eligibility(config.panelsize_threshold);
    if !eligibility.is_eligible() {
        warn!(
            "Sample {}: panel is not eligible for TMB calculation, stopping after {} mutations \
             passed the mutation class filter.",
            sample,
            selected.count
        );
        report.conclude(Conclusion::PanelIneligible {
            panel_size: panel.size(),
            threshold: config.panelsize_threshold,
        });
        return Ok(SampleOutcome::Halted {
            reason: HaltReason::PanelIneligible {
                panel_size: panel.size(),
                threshold: config.panelsize_threshold,
            },
            report,
        });
    }

    let (in_regions, region_filter_was_effective) = if config.prefilter_region {
        let intersection = regions::intersect(&selected.set, panel);
        let info = if intersection.region_filter_was_effective {
            StageInfo::Applied
        } else {
            StageInfo::NoMutationsInRegions
        };
        report.push(Stage::Region, intersection.result.count, info);
        (
            intersection.result,
            intersection.region_filter_was_effective,
        )
    } else {
        report.push(Stage::Region, selected.count, StageInfo::NotApplied);
        (selected, true)
    };

    let covered = thresholds::coverage(&in_regions.set, &observations, config.min_coverage);
    report.push(
        Stage::Coverage,
        covered.count,
        StageInfo::MinCoverage(config.min_coverage),
    );

    let af_filtered =
        thresholds::allele_fraction(&covered.set, &observations, config.min_af, config.max_af);
    report.push(
        Stage::AlleleFraction,
        af_filtered.count,
        StageInfo::AlleleFractionRange {
            min: config.min_af,
            max: config.max_af,
        },
    );

    let population_filtered = match &config.population_filter {
        Some(population_filter) => {
            let filtered =
                thresholds::population_frequency(&af_filtered.set, population_filter.max_frequency);
            report.push(
                Stage::PopulationFrequency,
                filtered.count,
                StageInfo::PopulationFrequencyThreshold {
                    database: population_filter.database.clone(),
                    max: population_filter.max_frequency,
                },
            );
            filtered
        }
        None => {
            report.push(
                Stage::PopulationFrequency,
                af_filtered.count,
                StageInfo::NotApplied,
            );
            af_filtered
        }
    };

    let tmb = TumorMutationalBurden::estimate(population_filtered.count, panel.size());
    info!(
        "Sample {}: {} mutations on {} bp, TMB = {}/Mbp",
        sample,
        tmb.mutations(),
        tmb.panel_size(),
        tmb.value()
    );
    report.conclude(Conclusion::Estimated { tmb, eligibility });

    Ok(SampleOutcome::Completed(Estimate {
        tmb,
        eligibility,
        region_filter_was_effective,
        report,
        observations,
        af_distribution: covered.set,
        filtered: population_filtered.set,
    }))
}
