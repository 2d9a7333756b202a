//! Stage classification from the primary joint angle

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Discrete movement phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Stage1,
    Stage2,
    Stage3,
}

impl Stage {
    /// Classification priority order
    pub const ALL: [Stage; 3] = [Stage::Stage1, Stage::Stage2, Stage::Stage3];

    pub fn ordinal(self) -> u8 {
        match self {
            Stage::Stage1 => 1,
            Stage::Stage2 => 2,
            Stage::Stage3 => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STAGE{}", self.ordinal())
    }
}

/// Angle interval with explicit boundary semantics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
    #[serde(default = "inclusive")]
    pub min_inclusive: bool,
    #[serde(default)]
    pub max_inclusive: bool,
}

fn inclusive() -> bool {
    true
}

impl AngleRange {
    /// `[min, max]`
    pub fn closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// `[min, max)`
    pub fn closed_open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: true,
            max_inclusive: false,
        }
    }

    /// `(min, max]`
    pub fn open_closed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: false,
            max_inclusive: true,
        }
    }

    /// `(min, max)`
    pub fn open(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            min_inclusive: false,
            max_inclusive: false,
        }
    }

    pub fn contains(&self, angle: f64) -> bool {
        let above_min = if self.min_inclusive { angle >= self.min } else { angle > self.min };
        let below_max = if self.max_inclusive { angle <= self.max } else { angle < self.max };
        above_min && below_max
    }

    fn is_well_formed(&self) -> bool {
        let bounded = self.min.is_finite()
            && self.max.is_finite()
            && self.min >= 0.0
            && self.max <= 180.0;
        let ordered = self.min < self.max
            || (self.min == self.max && self.min_inclusive && self.max_inclusive);
        bounded && ordered
    }
}

impl fmt::Display for AngleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        write!(f, "{}{}, {}{}", open, self.min, self.max, close)
    }
}

/// Angle band assigned to one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageBand {
    pub stage: Stage,
    pub range: AngleRange,
}

impl StageBand {
    pub fn new(stage: Stage, range: AngleRange) -> Self {
        Self { stage, range }
    }
}

/// Stage threshold table for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageThresholds {
    bands: Vec<StageBand>,
}

impl StageThresholds {
    pub fn new(bands: Vec<StageBand>) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &[StageBand] {
        &self.bands
    }

    pub fn band(&self, stage: Stage) -> Option<&StageBand> {
        self.bands.iter().find(|b| b.stage == stage)
    }

    /// Classify an angle, checking stages in priority order.
    ///
    /// Returns `None` when the angle lies outside every band.
    pub fn classify(&self, angle: f64) -> Option<Stage> {
        Stage::ALL.into_iter().find(|&stage| {
            self.band(stage)
                .is_some_and(|band| band.range.contains(angle))
        })
    }

    /// Check that bands are well formed and tile their span with no gap or overlap
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands.is_empty() {
            return Err(ConfigError::EmptyThresholds);
        }

        for (i, band) in self.bands.iter().enumerate() {
            if !band.range.is_well_formed() {
                return Err(ConfigError::InvalidRange {
                    stage: band.stage,
                    min: band.range.min,
                    max: band.range.max,
                });
            }
            if self.bands[..i].iter().any(|b| b.stage == band.stage) {
                return Err(ConfigError::DuplicateStage(band.stage));
            }
        }

        let mut sorted: Vec<&StageBand> = self.bands.iter().collect();
        sorted.sort_by(|a, b| a.range.min.total_cmp(&b.range.min).then(a.range.max.total_cmp(&b.range.max)));

        for pair in sorted.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            let (a, b) = (&lower.range, &upper.range);

            if a.max > b.min || (a.max == b.min && a.max_inclusive && b.min_inclusive) {
                return Err(ConfigError::Overlap {
                    lower: lower.stage,
                    upper: upper.stage,
                    at: b.min,
                });
            }
            if a.max < b.min || (!a.max_inclusive && !b.min_inclusive) {
                return Err(ConfigError::Gap {
                    lower: lower.stage,
                    upper: upper.stage,
                    from: a.max,
                    to: b.min,
                });
            }
        }

        Ok(())
    }
}

/// Classify `angle` against `thresholds`
pub fn classify(angle: f64, thresholds: &StageThresholds) -> Option<Stage> {
    thresholds.classify(angle)
}
