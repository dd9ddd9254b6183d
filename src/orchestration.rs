//! Dispatch of independent pipeline runs, one per sample of the variant table,
//! and writing of their outputs.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;
use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::errors::Error;
use crate::estimation::af_distribution;
use crate::estimation::tumor_mutational_burden::TumorMutationalBurden;
use crate::panel::IntervalSet;
use crate::pipeline::{self, FilterConfig, SampleOutcome};
use crate::variants::{SampleContext, VariantSet, VariantTable};

/// Output paths of a run. In multi-sample mode, each path is specialized per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub audit: PathBuf,
    pub af_distribution: Option<PathBuf>,
    pub filtered_variants: Option<PathBuf>,
}

impl OutputPaths {
    pub fn for_sample(&self, sample: &SampleContext) -> Self {
        OutputPaths {
            audit: sample_path(&self.audit, sample.name()),
            af_distribution: self
                .af_distribution
                .as_ref()
                .map(|path| sample_path(path, sample.name())),
            filtered_variants: self
                .filtered_variants
                .as_ref()
                .map(|path| sample_path(path, sample.name())),
        }
    }
}

/// Insert the sample name before the extension, e.g. `tmb.csv` becomes `tmb_T.csv`.
pub fn sample_path(path: &Path, sample_name: &str) -> PathBuf {
    if sample_name.is_empty() {
        return path.to_owned();
    }
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(extension) => format!("{}_{}.{}", stem, sample_name, extension.to_string_lossy()),
        None => format!("{}_{}", stem, sample_name),
    };
    path.with_file_name(file_name)
}

/// TMB of a sample, `None` if the panel was not eligible.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSummary {
    pub sample: String,
    pub tmb: Option<TumorMutationalBurden>,
}

/// Estimate the TMB of all samples in the table, in parallel on the current
/// rayon thread pool.
///
/// A failing sample does not abort the others; after all samples finished,
/// failures are reported together.
pub fn estimate(
    table: &VariantTable,
    panel: &IntervalSet,
    config: &FilterConfig,
    outputs: &OutputPaths,
) -> Result<Vec<SampleSummary>> {
    let layout = table.sample_layout()?;
    let samples = layout.samples();
    if layout.is_multi_sample() {
        info!(
            "Detected {} samples: {}",
            samples.len(),
            samples.iter().join(", ")
        );
    }

    let results: Vec<_> = samples
        .par_iter()
        .map(|sample| {
            let outputs = if layout.is_multi_sample() {
                outputs.for_sample(sample)
            } else {
                outputs.clone()
            };
            let result = estimate_sample(table, panel, sample, config, &outputs);
            (sample, result)
        })
        .collect();

    let mut summaries = Vec::new();
    let mut failed = Vec::new();
    for (sample, result) in results {
        match result {
            Ok(tmb) => summaries.push(SampleSummary {
                sample: sample.to_string(),
                tmb,
            }),
            Err(err) => {
                error!("Sample {} failed: {:#}", sample, err);
                failed.push(sample.to_string());
            }
        }
    }
    if !failed.is_empty() {
        return Err(Error::SampleRunsFailed {
            samples: failed.join(", "),
        }
        .into());
    }

    Ok(summaries)
}

fn estimate_sample(
    table: &VariantTable,
    panel: &IntervalSet,
    sample: &SampleContext,
    config: &FilterConfig,
    outputs: &OutputPaths,
) -> Result<Option<TumorMutationalBurden>> {
    let outcome = pipeline::run(table, panel, sample, config)
        .with_context(|| format!("Failed to estimate TMB for sample {}", sample))?;

    if let SampleOutcome::Completed(estimate) = &outcome {
        if let Some(path) = &outputs.af_distribution {
            persist(path, |file| {
                af_distribution::write(
                    file,
                    &estimate.af_distribution,
                    &estimate.observations,
                    config.min_af(),
                    config.max_af(),
                )
            })?;
        }
        if let Some(path) = &outputs.filtered_variants {
            persist(path, |file| {
                write_variants(file, table.header(), &estimate.filtered)
            })?;
        }
    }
    // The audit file is written last, so that it only exists for samples whose
    // outputs are all in place.
    persist(&outputs.audit, |file| outcome.report().write(file))?;

    Ok(outcome.tmb())
}

/// Write to a temporary file next to the target, and move it into place once complete.
fn persist<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    write(tmp.as_file_mut())?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the given variants as TSV, with all columns of the original table.
pub fn write_variants<W: std::io::Write>(
    writer: W,
    header: &[String],
    variants: &VariantSet,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    writer.write_record(header)?;
    for record in variants.iter() {
        writer.write_record(record.fields())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::Interval;
    use crate::pipeline::FilterConfigBuilder;
    use crate::variants::ColumnNames;
    use std::fs;

    const TABLE: &str = "CHROM\tPOS\tREF\tALT\tallele_fraction_N\tread_depth_N\tallele_fraction_T\tread_depth_T
chr1\t100\tC\tT\t0.0\t30\t0.3\t30
chr1\t200\tG\tA\t0.1\tNA\t0.5\t40
";

    fn panel() -> IntervalSet {
        IntervalSet::new(vec![Interval::new("chr1", 0, 1_000_000).unwrap()])
    }

    #[test]
    fn test_sample_path() {
        assert_eq!(
            sample_path(Path::new("out/tmb.csv"), "T"),
            PathBuf::from("out/tmb_T.csv")
        );
        assert_eq!(sample_path(Path::new("tmb"), "T"), PathBuf::from("tmb_T"));
        assert_eq!(
            sample_path(Path::new("out/tmb.csv"), ""),
            PathBuf::from("out/tmb.csv")
        );
        let sample = SampleContext::new("_tumor");
        let outputs = OutputPaths {
            audit: PathBuf::from("tmb.csv"),
            af_distribution: Some(PathBuf::from("af.json")),
            filtered_variants: None,
        };
        let specialized = outputs.for_sample(&sample);
        assert_eq!(specialized.audit, PathBuf::from("tmb_tumor.csv"));
        assert_eq!(specialized.af_distribution, Some(PathBuf::from("af_tumor.json")));
        assert_eq!(specialized.filtered_variants, None);
    }

    #[test]
    fn test_failed_sample_does_not_abort_others() {
        let dir = tempfile::tempdir().unwrap();
        let table =
            VariantTable::from_reader(TABLE.as_bytes(), &ColumnNames::default(), None).unwrap();
        let config = FilterConfigBuilder::default().build().unwrap();
        let outputs = OutputPaths {
            audit: dir.path().join("tmb.csv"),
            af_distribution: Some(dir.path().join("af.json")),
            filtered_variants: Some(dir.path().join("filtered.tsv")),
        };

        let err = estimate(&table, &panel(), &config, &outputs).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::SampleRunsFailed {
                samples: "N".to_owned()
            })
        );
        // the malformed normal sample writes nothing
        assert!(!dir.path().join("tmb_N.csv").exists());
        assert!(!dir.path().join("af_N.json").exists());

        let audit = fs::read_to_string(dir.path().join("tmb_T.csv")).unwrap();
        assert_eq!(
            audit.lines().last().unwrap(),
            "TMB value,2.0/Mbp,PANELSIZE_1000000"
        );
        assert!(dir.path().join("af_T.json").exists());
        let filtered = fs::read_to_string(dir.path().join("filtered_T.tsv")).unwrap();
        assert_eq!(filtered.lines().count(), 3);
        assert!(filtered.starts_with("CHROM\tPOS\tREF\tALT\tallele_fraction_N"));
    }

    #[test]
    fn test_single_sample_uses_given_paths() {
        let dir = tempfile::tempdir().unwrap();
        let data = "CHROM\tPOS\tREF\tALT\tallele_fraction\tread_depth\nchr1\t10\tA\tC\t0.1\t10\n";
        let table =
            VariantTable::from_reader(data.as_bytes(), &ColumnNames::default(), None).unwrap();
        let config = FilterConfigBuilder::default().build().unwrap();
        let outputs = OutputPaths {
            audit: dir.path().join("tmb.csv"),
            af_distribution: None,
            filtered_variants: None,
        };

        let summaries = estimate(&table, &panel(), &config, &outputs).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_relative_eq!(summaries[0].tmb.unwrap().value(), 1.0);
        assert!(dir.path().join("tmb.csv").exists());
    }

    #[test]
    fn test_failed_plot_leaves_no_audit_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = "CHROM\tPOS\tREF\tALT\tallele_fraction\tread_depth\nchr1\t10\tA\tC\t0.1\t10\n";
        let table =
            VariantTable::from_reader(data.as_bytes(), &ColumnNames::default(), None).unwrap();
        let config = FilterConfigBuilder::default().build().unwrap();
        let outputs = OutputPaths {
            audit: dir.path().join("tmb.csv"),
            af_distribution: Some(dir.path().join("missing").join("af.json")),
            filtered_variants: Some(dir.path().join("filtered.tsv")),
        };

        let err = estimate(&table, &panel(), &config, &outputs).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::SampleRunsFailed {
                samples: "allele_fraction".to_owned()
            })
        );
        assert!(!dir.path().join("tmb.csv").exists());
        assert!(!dir.path().join("filtered.tsv").exists());
    }
}
