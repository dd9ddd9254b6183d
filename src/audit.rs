//! Audit trail of a TMB estimation: how many unique mutations survive each
//! filter stage, which parameters were used, and the final TMB value (or the
//! reason why none could be given).

use std::fmt;
use std::io;

use anyhow::Result;

use crate::estimation::tumor_mutational_burden::TumorMutationalBurden;
use crate::panel::PanelEligibility;

pub const HEADER: [&str; 3] = ["STEP", "#_MUTATIONS", "INFO"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum Stage {
    #[strum(to_string = "Initial mutations prior filtering")]
    Initial,
    #[strum(to_string = "Unique mutations after consequence filter")]
    Consequence,
    #[strum(to_string = "Unique mutations after deduplication")]
    Deduplication,
    #[strum(to_string = "Unique mutations after SNV/MNV filter")]
    MutationClass,
    #[strum(to_string = "Unique mutations after ROI-intersection")]
    Region,
    #[strum(to_string = "Unique mutations after coverage filter")]
    Coverage,
    #[strum(to_string = "Unique mutations after AF range filter")]
    AlleleFraction,
    #[strum(to_string = "Unique mutations after population database filter")]
    PopulationFrequency,
}

/// Annotation of a stage in the INFO column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StageInfo {
    Applied,
    NotApplied,
    NoMutationsInRegions,
    MinCoverage(u64),
    AlleleFractionRange { min: f64, max: f64 },
    PopulationFrequencyThreshold { database: String, max: f64 },
}

impl fmt::Display for StageInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StageInfo::Applied => Ok(()),
            StageInfo::NotApplied => write!(f, "NOT_APPLIED"),
            StageInfo::NoMutationsInRegions => write!(f, "WARN_NO_MUTATIONS_IN_ROI"),
            StageInfo::MinCoverage(min) => write!(f, "COV_VAL_{}", min),
            StageInfo::AlleleFractionRange { min, max } => write!(f, "AF_RANGE_{:?}_{:?}", min, max),
            StageInfo::PopulationFrequencyThreshold { database, max } => {
                write!(f, "{}_THRESH_{:?}", database, max)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters, Serialize)]
pub struct AuditEntry {
    #[getset(get_copy = "pub")]
    stage: Stage,
    #[getset(get_copy = "pub")]
    count: usize,
    #[getset(get = "pub")]
    info: StageInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Conclusion {
    Estimated {
        tmb: TumorMutationalBurden,
        eligibility: PanelEligibility,
    },
    PanelIneligible {
        panel_size: u64,
        threshold: u64,
    },
}

impl Conclusion {
    fn value(&self) -> String {
        match self {
            Conclusion::Estimated { tmb, .. } => format!("{:?}/Mbp", tmb.value()),
            Conclusion::PanelIneligible { .. } => "NA".to_owned(),
        }
    }

    fn info(&self) -> String {
        match self {
            Conclusion::Estimated { tmb, eligibility } => {
                let mut info = format!("PANELSIZE_{}", tmb.panel_size());
                if *eligibility == PanelEligibility::SmallPanel {
                    info.push_str(";WARN_SMALL_PANEL");
                }
                info
            }
            Conclusion::PanelIneligible {
                panel_size,
                threshold,
            } => format!(
                "PANEL_INELIGIBLE_SIZE_{}_THRESH_{}",
                panel_size, threshold
            ),
        }
    }
}

/// Ordered audit trail of one sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditReport {
    entries: Vec<AuditEntry>,
    conclusion: Option<Conclusion>,
}

impl AuditReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Stage, count: usize, info: StageInfo) {
        debug!("{}: {} {}", stage, count, info);
        self.entries.push(AuditEntry { stage, count, info });
    }

    pub fn conclude(&mut self, conclusion: Conclusion) {
        assert!(
            self.conclusion.is_none(),
            "bug: audit report may only be concluded once"
        );
        self.conclusion = Some(conclusion);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn conclusion(&self) -> Option<&Conclusion> {
        self.conclusion.as_ref()
    }

    /// Count of the given stage, if it has been reached.
    pub fn count(&self, stage: Stage) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.stage == stage)
            .map(|entry| entry.count)
    }

    /// Write the report as CSV.
    pub fn write<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().from_writer(writer);
        writer.write_record(&HEADER)?;
        for entry in &self.entries {
            writer.write_record(&[
                entry.stage.to_string(),
                entry.count.to_string(),
                entry.info.to_string(),
            ])?;
        }
        if let Some(conclusion) = &self.conclusion {
            writer.write_record(&[
                "TMB value".to_owned(),
                conclusion.value(),
                conclusion.info(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(report: &AuditReport) -> String {
        let mut buf = Vec::new();
        report.write(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_stage_info() {
        assert_eq!(StageInfo::Applied.to_string(), "");
        assert_eq!(StageInfo::MinCoverage(20).to_string(), "COV_VAL_20");
        assert_eq!(
            StageInfo::AlleleFractionRange { min: 0.0, max: 1.0 }.to_string(),
            "AF_RANGE_0.0_1.0"
        );
        assert_eq!(
            StageInfo::AlleleFractionRange {
                min: 0.05,
                max: 0.95
            }
            .to_string(),
            "AF_RANGE_0.05_0.95"
        );
        assert_eq!(
            StageInfo::PopulationFrequencyThreshold {
                database: "gnomADg_AF".to_owned(),
                max: 0.001
            }
            .to_string(),
            "gnomADg_AF_THRESH_0.001"
        );
    }

    #[test]
    fn test_completed_report() {
        let mut report = AuditReport::new();
        report.push(Stage::Initial, 10, StageInfo::Applied);
        report.push(Stage::Consequence, 10, StageInfo::NotApplied);
        report.push(Stage::Region, 4, StageInfo::NoMutationsInRegions);
        report.conclude(Conclusion::Estimated {
            tmb: TumorMutationalBurden::estimate(4, 800_000),
            eligibility: PanelEligibility::SmallPanel,
        });

        assert_eq!(
            write(&report),
            "STEP,#_MUTATIONS,INFO\n\
             Initial mutations prior filtering,10,\n\
             Unique mutations after consequence filter,10,NOT_APPLIED\n\
             Unique mutations after ROI-intersection,4,WARN_NO_MUTATIONS_IN_ROI\n\
             TMB value,5.0/Mbp,PANELSIZE_800000;WARN_SMALL_PANEL\n"
        );
        assert_eq!(report.count(Stage::Region), Some(4));
        assert_eq!(report.count(Stage::Coverage), None);
    }

    #[test]
    fn test_halted_report() {
        let mut report = AuditReport::new();
        report.push(Stage::Initial, 3, StageInfo::Applied);
        report.conclude(Conclusion::PanelIneligible {
            panel_size: 500,
            threshold: 1000,
        });
        let lines: Vec<_> = write(&report).lines().map(|l| l.to_owned()).collect();
        assert_eq!(
            lines.last().unwrap(),
            "TMB value,NA,PANEL_INELIGIBLE_SIZE_500_THRESH_1000"
        );
    }

    #[test]
    #[should_panic]
    fn test_conclude_twice() {
        let mut report = AuditReport::new();
        let conclusion = Conclusion::PanelIneligible {
            panel_size: 0,
            threshold: 0,
        };
        report.conclude(conclusion.clone());
        report.conclude(conclusion);
    }
}
