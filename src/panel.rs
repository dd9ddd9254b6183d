// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! panel.rs
//!
//! Capture panel handling: BED parsing, panel size and the eligibility gate
//! that decides whether a TMB can be reported for a panel at all.
//!
//! Expected BED format: chrom, start, end (0-based, half-open, no header).
//! Additional columns are ignored.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use bio::data_structures::interval_tree::ArrayBackedIntervalTree;
use bio::io::bed;

use crate::constants::LARGE_PANEL_MIN_SIZE;
use crate::errors::Error;

/// Target region of the capture panel.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Interval {
    chrom: String,
    start: u64,
    end: u64,
}

impl Interval {
    pub fn new(chrom: &str, start: u64, end: u64) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidPanelInterval {
                chrom: chrom.to_owned(),
                start,
                end,
            }
            .into());
        }
        Ok(Interval {
            chrom: chrom.to_owned(),
            start,
            end,
        })
    }

    /// Number of bases covered by the interval.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// The set of intervals targeted by the capture panel, indexed per chromosome
/// for point queries.
pub struct IntervalSet {
    intervals: Vec<Interval>,
    trees: HashMap<String, ArrayBackedIntervalTree<u64, ()>>,
    size: u64,
}

impl IntervalSet {
    pub fn new(intervals: Vec<Interval>) -> Self {
        let mut trees: HashMap<String, ArrayBackedIntervalTree<u64, ()>> = HashMap::new();
        for interval in &intervals {
            trees
                .entry(interval.chrom.clone())
                .or_insert_with(ArrayBackedIntervalTree::new)
                .insert(interval.start..interval.end, ());
        }
        for tree in trees.values_mut() {
            tree.index();
        }
        // Overlapping intervals are counted repeatedly, like a plain sum over the BED file.
        let size = intervals.iter().map(|interval| interval.len()).sum();

        IntervalSet {
            intervals,
            trees,
            size,
        }
    }

    pub fn from_bed<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading panel regions from {}", path.display());
        let reader = bed::Reader::from_file(path)
            .with_context(|| format!("Failed to open BED file {}", path.display()))?;
        Self::from_bed_reader(reader)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        Self::from_bed_reader(bed::Reader::new(reader))
    }

    fn from_bed_reader<R: io::Read>(mut reader: bed::Reader<R>) -> Result<Self> {
        let mut intervals = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to read BED record")?;
            intervals.push(Interval::new(record.chrom(), record.start(), record.end())?);
        }
        Ok(Self::new(intervals))
    }

    /// Total number of targeted bases.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Whether the given 1-based position lies within any panel interval.
    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        if pos == 0 {
            return false;
        }
        let pos = pos - 1;
        self.trees
            .get(chrom)
            .map_or(false, |tree| !tree.find(pos..pos + 1).is_empty())
    }

    /// Classify the panel against the given minimum size and log the result.
    pub fn eligibility(&self, threshold: u64) -> PanelEligibility {
        let eligibility = PanelEligibility::classify(self.size, threshold);
        match eligibility {
            PanelEligibility::Eligible => info!(
                "The provided BED file covers {} basepairs. It covers more than 1 Mbp. \
                 TMB calculation can be performed.",
                self.size
            ),
            PanelEligibility::SmallPanel => warn!(
                "The provided BED file covers {} basepairs. It covers less than 1 Mbp, but is \
                 above the threshold of {}. TMB calculation can be performed, but could be biased.",
                self.size, threshold
            ),
            PanelEligibility::Ineligible => warn!(
                "The provided BED file covers {} basepairs, but does not reach the threshold of {} \
                 for TMB calculation. Reconsider the threshold or provide an updated BED file.",
                self.size, threshold
            ),
        }
        eligibility
    }
}

/// Outcome of comparing the panel size against the configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab_case")]
pub enum PanelEligibility {
    Ineligible,
    SmallPanel,
    Eligible,
}

impl PanelEligibility {
    /// An empty panel is never eligible, whatever the threshold.
    pub fn classify(panel_size: u64, threshold: u64) -> Self {
        if panel_size == 0 || panel_size < threshold {
            PanelEligibility::Ineligible
        } else if panel_size < LARGE_PANEL_MIN_SIZE {
            PanelEligibility::SmallPanel
        } else {
            PanelEligibility::Eligible
        }
    }

    pub fn is_eligible(self) -> bool {
        self != PanelEligibility::Ineligible
    }
}
