//! Allele frequency distribution of the filtered variants, as a Vega-Lite
//! plot specification. Rendering is left to the consumer.

use std::io::{BufWriter, Write};

use anyhow::Result;
use serde_json::{json, Value};

use crate::variants::{SampleObservations, VariantSet};

#[derive(Debug, Clone, Serialize)]
struct AlleleFractionPoint {
    mutation_id: String,
    allele_fraction: f64,
    consequence: String,
}

/// Fill the plot blueprint with the given variants, stacked by their leading
/// consequence term, and mark the AF bounds of the filter.
pub fn blueprint(
    variants: &VariantSet,
    observations: &SampleObservations,
    min_af: f64,
    max_af: f64,
) -> Result<Value> {
    let plot_data: Vec<_> = variants
        .iter()
        .filter_map(|record| {
            let allele_fraction = observations.allele_fraction(record);
            if allele_fraction.is_nan() {
                return None;
            }
            Some(AlleleFractionPoint {
                mutation_id: record.mutation_id().to_string(),
                allele_fraction,
                consequence: record.primary_consequence().unwrap_or("unknown").to_owned(),
            })
        })
        .collect();

    let mut blueprint: Value =
        serde_json::from_str(include_str!("../../templates/plots/af_distribution.json"))?;
    if let Value::Object(ref mut blueprint) = blueprint {
        blueprint["layer"][0]["data"]["values"] = json!(plot_data);
        blueprint["layer"][1]["data"]["values"] = json!([{ "bound": min_af }, { "bound": max_af }]);
    } else {
        unreachable!();
    }

    Ok(blueprint)
}

pub fn write<W: Write>(
    writer: W,
    variants: &VariantSet,
    observations: &SampleObservations,
    min_af: f64,
    max_af: f64,
) -> Result<()> {
    let blueprint = blueprint(variants, observations, min_af, max_af)?;
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &blueprint)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::testing::snv;

    #[test]
    fn test_blueprint() {
        let a = snv(0, 10, "missense_variant&splice_region_variant");
        let b = snv(1, 20, "synonymous_variant");
        let c = snv(2, 30, "missense_variant");
        let set = VariantSet::new(vec![&a, &b, &c]);
        let obs = SampleObservations::new(vec![0.1, f64::NAN, 0.3], vec![10, 10, 10]);

        let blueprint = blueprint(&set, &obs, 0.05, 0.95).unwrap();
        let values = blueprint["layer"][0]["data"]["values"].as_array().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["mutation_id"], "chr1:10:C:T");
        assert_eq!(values[0]["consequence"], "missense_variant");
        assert_eq!(values[1]["allele_fraction"], 0.3);

        let bounds = blueprint["layer"][1]["data"]["values"].as_array().unwrap();
        assert_eq!(bounds[0]["bound"], 0.05);
        assert_eq!(bounds[1]["bound"], 0.95);
    }
}
