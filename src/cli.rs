// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use crate::filtration::{ConsequenceAllowList, MutationClassPolicy};
use crate::orchestration::{self, OutputPaths};
use crate::panel::IntervalSet;
use crate::pipeline::{FilterConfigBuilder, PopulationFilter};
use crate::variants::{ColumnNames, VariantTable};

#[derive(Debug, StructOpt, Serialize, Deserialize, Clone)]
#[structopt(
    name = "mutburden",
    about = "Estimate tumor mutational burden (TMB) from annotated variant tables."
)]
#[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
pub enum Mutburden {
    #[structopt(
        name = "estimate-tmb",
        about = "Filter the variants of each sample in the given table and estimate the TMB \
                 over the given capture panel."
    )]
    #[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
    EstimateTmb {
        #[structopt(
            long,
            parse(from_os_str),
            help = "Tab-separated variant table with header (one row per variant, e.g. \
                    as obtained from an annotated VCF). Sample specific columns are \
                    expected as allele_fraction<suffix> and read_depth<suffix>."
        )]
        variants: PathBuf,
        #[structopt(
            long,
            parse(from_os_str),
            help = "BED file with the regions of the capture panel."
        )]
        panel: PathBuf,
        #[structopt(
            long,
            parse(from_os_str),
            help = "CSV file that shall contain the per stage mutation counts and the TMB. \
                    With multiple samples, the sample name is appended to the file stem."
        )]
        output: PathBuf,
        #[structopt(
            long,
            parse(from_os_str),
            help = "Write a Vega-Lite plot of the allele fraction distribution to this path."
        )]
        plot: Option<PathBuf>,
        #[structopt(
            long = "filtered-variants",
            parse(from_os_str),
            help = "Write all variants counted towards the TMB to this TSV file."
        )]
        filtered_variants: Option<PathBuf>,
        #[structopt(
            long = "min-coverage",
            default_value = "0",
            help = "Minimum read depth of a variant."
        )]
        min_coverage: u64,
        #[structopt(
            long = "min-af",
            default_value = "0.0",
            help = "Minimum allele fraction of a variant (inclusive)."
        )]
        min_af: f64,
        #[structopt(
            long = "max-af",
            default_value = "1.0",
            help = "Maximum allele fraction of a variant (inclusive)."
        )]
        max_af: f64,
        #[structopt(
            long = "panelsize-threshold",
            default_value = "0",
            help = "Minimum number of bases covered by the panel. Smaller panels do not \
                    yield a TMB."
        )]
        panelsize_threshold: u64,
        #[structopt(
            long = "population-db",
            help = "Column with population allele frequencies (e.g. gnomADg_AF). If omitted, \
                    no population frequency filter is applied."
        )]
        population_db: Option<String>,
        #[structopt(
            long = "popfreq-max",
            default_value = "1.0",
            help = "Maximum population allele frequency of a variant (inclusive). Variants \
                    without population frequency are always kept."
        )]
        popfreq_max: f64,
        #[structopt(
            long = "mutation-types",
            default_value = "unrestricted",
            possible_values = &["snv-only", "snv", "snvs", "snv+mnv", "mnv", "mnvs", "unrestricted", "all"],
            help = "Kinds of mutations to count."
        )]
        mutation_types: MutationClassPolicy,
        #[structopt(
            long,
            conflicts_with = "consequences-file",
            help = "Comma-separated consequence terms (e.g. missense_variant,stop_gained). \
                    Only variants carrying at least one of them are counted."
        )]
        consequences: Option<String>,
        #[structopt(
            long = "consequences-file",
            parse(from_os_str),
            help = "File with consequence terms, one per line."
        )]
        consequences_file: Option<PathBuf>,
        #[structopt(
            long = "prefilter-region",
            help = "Only count variants located within the panel regions."
        )]
        prefilter_region: bool,
        #[structopt(
            long = "consequence-column",
            default_value = "CSQ_Consequence",
            help = "Column holding the &-separated consequence terms."
        )]
        consequence_column: String,
        #[structopt(
            long = "variant-class-column",
            default_value = "CSQ_VARIANT_CLASS",
            help = "Column holding the variant class (SNV, insertion, deletion, substitution)."
        )]
        variant_class_column: String,
        #[structopt(
            long,
            short,
            default_value = "1",
            help = "Number of samples to process in parallel."
        )]
        threads: usize,
        #[structopt(long, short, help = "Print debug information.")]
        verbose: bool,
    },
    #[structopt(
        name = "panel-size",
        about = "Print the number of bases covered by a capture panel and whether it is \
                 eligible for TMB estimation."
    )]
    #[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
    PanelSize {
        #[structopt(parse(from_os_str), help = "BED file with the regions of the capture panel.")]
        panel: PathBuf,
        #[structopt(
            long = "panelsize-threshold",
            default_value = "0",
            help = "Minimum number of bases covered by the panel."
        )]
        panelsize_threshold: u64,
        #[structopt(long, short, help = "Print debug information.")]
        verbose: bool,
    },
}

impl Mutburden {
    pub fn verbose(&self) -> bool {
        match self {
            Mutburden::EstimateTmb { verbose, .. } => *verbose,
            Mutburden::PanelSize { verbose, .. } => *verbose,
        }
    }
}

pub fn run(opt: Mutburden) -> Result<()> {
    match opt {
        Mutburden::EstimateTmb {
            ref variants,
            ref panel,
            ref output,
            ref plot,
            ref filtered_variants,
            min_coverage,
            min_af,
            max_af,
            panelsize_threshold,
            ref population_db,
            popfreq_max,
            mutation_types,
            ref consequences,
            ref consequences_file,
            prefilter_region,
            ref consequence_column,
            ref variant_class_column,
            threads,
            ..
        } => {
            // configuration errors surface before any input is read
            let consequences = match (consequences, consequences_file) {
                (Some(consequences), _) => Some(consequences.parse::<ConsequenceAllowList>()?),
                (None, Some(path)) => Some(ConsequenceAllowList::from_path(path)?),
                (None, None) => None,
            };
            let columns = ColumnNames {
                consequence: consequence_column.to_owned(),
                variant_class: variant_class_column.to_owned(),
                ..Default::default()
            };
            let config = FilterConfigBuilder::default()
                .min_coverage(min_coverage)
                .allele_fraction_range(min_af, max_af)?
                .panelsize_threshold(panelsize_threshold)
                .population_filter(
                    population_db
                        .as_ref()
                        .map(|database| PopulationFilter::new(database, popfreq_max)),
                )
                .mutation_classes(mutation_types)
                .consequences(consequences)
                .prefilter_region(prefilter_region)
                .columns(columns)
                .build()?;

            let panel = IntervalSet::from_bed(panel)?;
            let table = VariantTable::from_path(
                variants,
                config.columns(),
                population_db.as_ref().map(|database| database.as_str()),
            )?;

            let outputs = OutputPaths {
                audit: output.to_owned(),
                af_distribution: plot.to_owned(),
                filtered_variants: filtered_variants.to_owned(),
            };
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            let summaries =
                pool.install(|| orchestration::estimate(&table, &panel, &config, &outputs))?;
            for summary in summaries {
                match summary.tmb {
                    Some(tmb) => info!("{}: TMB = {}/Mbp", summary.sample, tmb.value()),
                    None => info!("{}: no TMB, panel is not eligible", summary.sample),
                }
            }
        }
        Mutburden::PanelSize {
            ref panel,
            panelsize_threshold,
            ..
        } => {
            let panel = IntervalSet::from_bed(panel)?;
            write_panel_size(io::stdout(), &panel, panelsize_threshold)?;
        }
    }
    Ok(())
}

/// Write panel size and eligibility class as one tab-separated line.
pub fn write_panel_size<W: io::Write>(
    mut writer: W,
    panel: &IntervalSet,
    panelsize_threshold: u64,
) -> Result<()> {
    let eligibility = panel.eligibility(panelsize_threshold);
    writeln!(writer, "{}\t{}", panel.size(), eligibility)?;
    Ok(())
}
