//! Ingestion of the tab-separated variant table (e.g. as written by a
//! vembrane table conversion of a VEP annotated VCF).

use std::fmt;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;

use crate::constants::{ALLELE_FRACTION_PREFIX, MISSING_VALUES, READ_DEPTH_PREFIX};
use crate::errors::{self, Error};
use crate::variants::{MutationId, VariantClass, VariantRecord, VariantSet};

/// Names of the columns the table is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub chrom: String,
    pub pos: String,
    pub ref_allele: String,
    pub alt_allele: String,
    pub filter: String,
    pub consequence: String,
    pub variant_class: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            chrom: "CHROM".to_owned(),
            pos: "POS".to_owned(),
            ref_allele: "REF".to_owned(),
            alt_allele: "ALT".to_owned(),
            filter: "FILTER".to_owned(),
            consequence: "CSQ_Consequence".to_owned(),
            variant_class: "CSQ_VARIANT_CLASS".to_owned(),
        }
    }
}

fn is_missing(value: &str) -> bool {
    MISSING_VALUES.contains(&value.trim())
}

fn optional_field(fields: &[String], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|idx| fields.get(idx))
        .map(|value| value.as_str())
        .filter(|value| !is_missing(value))
}

/// Arena of all records of the variant table, in input order.
#[derive(Debug, Clone)]
pub struct VariantTable {
    header: Vec<String>,
    records: Vec<VariantRecord>,
}

impl VariantTable {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        columns: &ColumnNames,
        population_db: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading variant table from {}", path.display());
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .with_context(|| format!("Failed to open variant table {}", path.display()))?;
        Self::from_csv(reader, columns, population_db)
    }

    pub fn from_reader<R: io::Read>(
        reader: R,
        columns: &ColumnNames,
        population_db: Option<&str>,
    ) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(reader);
        Self::from_csv(reader, columns, population_db)
    }

    fn from_csv<R: io::Read>(
        mut reader: csv::Reader<R>,
        columns: &ColumnNames,
        population_db: Option<&str>,
    ) -> Result<Self> {
        let header = reader
            .headers()?
            .iter()
            .map(|name| name.to_owned())
            .collect_vec();
        let required = |name: &str| {
            header
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| errors::missing_column(name))
        };
        let optional = |name: &str| header.iter().position(|column| column == name);

        let chrom_idx = required(&columns.chrom)?;
        let pos_idx = required(&columns.pos)?;
        let ref_idx = required(&columns.ref_allele)?;
        let alt_idx = required(&columns.alt_allele)?;
        let popfreq_idx = population_db.map(|name| required(name)).transpose()?;
        let filter_idx = optional(&columns.filter);
        let consequence_idx = optional(&columns.consequence);
        let variant_class_idx = optional(&columns.variant_class);

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            // header is line 1
            let line = index + 2;
            let row = row.with_context(|| format!("Failed to read line {} of variant table", line))?;
            let fields = row.iter().map(|value| value.to_owned()).collect_vec();

            let chrom = fields[chrom_idx].clone();
            let pos = fields[pos_idx]
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|pos| *pos > 0)
                .ok_or_else(|| errors::invalid_value(&columns.pos, line, &fields[pos_idx]))?;
            let ref_allele = fields[ref_idx].clone();
            let alt_allele = fields[alt_idx].clone();

            let population_frequency = match (popfreq_idx, population_db) {
                (Some(idx), Some(name)) => parse_frequency(&fields[idx], name, line)?,
                _ => None,
            };

            records.push(VariantRecord {
                index,
                mutation_id: MutationId::new(&chrom, pos, &ref_allele, &alt_allele),
                chrom,
                pos,
                ref_allele,
                alt_allele,
                filter: optional_field(&fields, filter_idx).map(|value| value.to_owned()),
                variant_class: optional_field(&fields, variant_class_idx).map(VariantClass::from),
                consequence: optional_field(&fields, consequence_idx)
                    .map(|value| value.to_owned()),
                population_frequency,
                fields,
            });
        }
        info!(
            "Read {} records ({} unique mutations) from variant table.",
            records.len(),
            records.iter().map(|rec| rec.mutation_id()).unique().count()
        );

        Ok(VariantTable { header, records })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|column| column == name)
    }

    pub fn records(&self) -> &[VariantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in input order.
    pub fn variants(&self) -> VariantSet<'_> {
        self.records.iter().collect()
    }

    pub fn sample_layout(&self) -> Result<SampleLayout> {
        SampleLayout::detect(&self.header)
    }

    /// Extract allele fractions and read depths of the given sample for all records.
    pub fn observations(&self, sample: &SampleContext) -> Result<SampleObservations> {
        let column_idx = |name: &str| {
            self.header
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| errors::missing_column(name))
        };
        let af_idx = column_idx(&sample.allele_fraction_column)?;
        let depth_idx = column_idx(&sample.read_depth_column)?;

        let mut allele_fractions = Vec::with_capacity(self.records.len());
        let mut read_depths = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let line = record.index() + 2;
            let fields = record.fields();
            allele_fractions.push(parse_allele_fraction(
                &fields[af_idx],
                &sample.allele_fraction_column,
                line,
            )?);
            read_depths.push(parse_read_depth(
                &fields[depth_idx],
                &sample.read_depth_column,
                line,
            )?);
        }

        Ok(SampleObservations {
            allele_fractions,
            read_depths,
        })
    }
}

fn parse_frequency(value: &str, column: &str, line: usize) -> Result<Option<f64>> {
    if is_missing(value) {
        return Ok(None);
    }
    let frequency = value
        .trim()
        .parse::<f64>()
        .map_err(|_| errors::invalid_value(column, line, value))?;
    Ok(if frequency.is_nan() {
        None
    } else {
        Some(frequency)
    })
}

fn parse_allele_fraction(value: &str, column: &str, line: usize) -> Result<f64> {
    if is_missing(value) {
        return Ok(f64::NAN);
    }
    Ok(value
        .trim()
        .parse::<f64>()
        .map_err(|_| errors::invalid_value(column, line, value))?)
}

fn parse_read_depth(value: &str, column: &str, line: usize) -> Result<u64> {
    let value_trimmed = value.trim();
    if let Ok(depth) = value_trimmed.parse::<u64>() {
        return Ok(depth);
    }
    // tables written from floating point columns carry a trailing ".0"
    match value_trimmed.parse::<f64>() {
        Ok(depth) if depth.is_finite() && depth >= 0.0 && depth.fract() == 0.0 => Ok(depth as u64),
        _ => Err(errors::invalid_value(column, line, value).into()),
    }
}

/// Allele fractions and read depths of one sample, indexed by record.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleObservations {
    allele_fractions: Vec<f64>,
    read_depths: Vec<u64>,
}

impl SampleObservations {
    pub fn new(allele_fractions: Vec<f64>, read_depths: Vec<u64>) -> Self {
        assert_eq!(
            allele_fractions.len(),
            read_depths.len(),
            "bug: allele fractions and read depths have to be given for the same records"
        );
        SampleObservations {
            allele_fractions,
            read_depths,
        }
    }

    /// Records must stem from the table the observations were extracted from.
    pub fn allele_fraction(&self, record: &VariantRecord) -> f64 {
        self.allele_fractions[record.index()]
    }

    pub fn read_depth(&self, record: &VariantRecord) -> u64 {
        self.read_depths[record.index()]
    }
}

/// Column set of a single sample within the variant table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters)]
#[getset(get = "pub")]
pub struct SampleContext {
    suffix: String,
    allele_fraction_column: String,
    read_depth_column: String,
}

impl SampleContext {
    pub fn new(suffix: &str) -> Self {
        SampleContext {
            suffix: suffix.to_owned(),
            allele_fraction_column: format!("{}{}", ALLELE_FRACTION_PREFIX, suffix),
            read_depth_column: format!("{}{}", READ_DEPTH_PREFIX, suffix),
        }
    }

    /// Suffix without leading separators, e.g. `T` for `allele_fraction_T`.
    pub fn name(&self) -> &str {
        self.suffix.trim_start_matches('_')
    }
}

impl fmt::Display for SampleContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.name().is_empty() {
            write!(f, "{}", self.allele_fraction_column)
        } else {
            write!(f, "{}", self.name())
        }
    }
}

/// Samples contained in the variant table, as given by the allele fraction columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLayout {
    suffixes: Vec<String>,
}

impl SampleLayout {
    /// Each column starting with `allele_fraction` denotes a sample; the remainder
    /// of the column name is the sample suffix.
    pub fn detect(header: &[String]) -> Result<Self> {
        let suffixes = header
            .iter()
            .filter_map(|column| column.strip_prefix(ALLELE_FRACTION_PREFIX))
            .map(|suffix| suffix.to_owned())
            .collect_vec();
        if suffixes.is_empty() {
            return Err(Error::NoAlleleFractionColumns {
                prefix: ALLELE_FRACTION_PREFIX.to_owned(),
            }
            .into());
        }
        Ok(SampleLayout { suffixes })
    }

    pub fn is_multi_sample(&self) -> bool {
        self.suffixes.len() > 1
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn samples(&self) -> Vec<SampleContext> {
        self.suffixes
            .iter()
            .map(|suffix| SampleContext::new(suffix))
            .collect()
    }
}
