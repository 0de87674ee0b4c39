use std::fmt;

/// Errors raised while validating a simulation configuration.
///
/// All variants are detected before the first year is simulated; the
/// simulation loop itself cannot fail. Portfolio exhaustion is a result
/// state (`SimulationResult::exhausted`), never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `end_year` precedes `start_year`
    EmptyHorizon { start_year: i32, end_year: i32 },
    /// A phase segment has an inverted year range
    EmptySegment { start_year: i32, end_year: i32 },
    /// Segments leave a gap in the horizon
    SegmentGap { expected: i32, found: i32 },
    /// Segments overlap
    SegmentOverlap { expected: i32, found: i32 },
    /// The first segment does not start at the horizon start, or the last
    /// does not end at the horizon end
    SegmentOutOfRange { start_year: i32, end_year: i32 },
    /// No segments were supplied in an explicitly segmented configuration
    NoSegments,
    /// Partial exemption quota outside [0, 1]
    QuotaOutOfRange { quota: f64 },
    /// A tax or strategy rate is negative or non-finite
    InvalidRate { field: &'static str, value: f64 },
    /// Distribution parameters that cannot construct a sampler
    InvalidDistribution {
        mean: f64,
        std_dev: f64,
        reason: &'static str,
    },
    /// A variable-return map is missing an entry for a simulated year
    MissingReturnForYear { year: i32 },
    /// Multi-asset return mode with no asset classes
    EmptyAssetMix,
    /// Multi-asset weights do not sum to 1
    UnnormalizedAssetMix { weight_sum: f64 },
    /// Withdrawal start year outside the simulation horizon
    WithdrawalStartOutOfRange { year: i32 },
    /// A custom life-expectancy divisor must be at least 1
    InvalidLifeExpectancyDivisor { divisor: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyHorizon {
                start_year,
                end_year,
            } => {
                write!(f, "end year {end_year} precedes start year {start_year}")
            }
            ConfigError::EmptySegment {
                start_year,
                end_year,
            } => {
                write!(
                    f,
                    "segment end year {end_year} precedes its start year {start_year}"
                )
            }
            ConfigError::SegmentGap { expected, found } => {
                write!(
                    f,
                    "segment gap: expected a segment starting in {expected}, found {found}"
                )
            }
            ConfigError::SegmentOverlap { expected, found } => {
                write!(
                    f,
                    "segment overlap: expected a segment starting in {expected}, found {found}"
                )
            }
            ConfigError::SegmentOutOfRange {
                start_year,
                end_year,
            } => {
                write!(
                    f,
                    "segments must cover the horizon exactly ({start_year}..={end_year})"
                )
            }
            ConfigError::NoSegments => write!(f, "segment list is empty"),
            ConfigError::QuotaOutOfRange { quota } => {
                write!(f, "partial exemption quota {quota} outside [0, 1]")
            }
            ConfigError::InvalidRate { field, value } => {
                write!(f, "{field} must be finite and non-negative, got {value}")
            }
            ConfigError::InvalidDistribution {
                mean,
                std_dev,
                reason,
            } => {
                write!(
                    f,
                    "invalid return distribution (mean={mean}, std_dev={std_dev}): {reason}"
                )
            }
            ConfigError::MissingReturnForYear { year } => {
                write!(f, "variable return mode has no rate for year {year}")
            }
            ConfigError::EmptyAssetMix => write!(f, "multi-asset return mode has no asset classes"),
            ConfigError::UnnormalizedAssetMix { weight_sum } => {
                write!(f, "multi-asset weights sum to {weight_sum}, expected 1")
            }
            ConfigError::WithdrawalStartOutOfRange { year } => {
                write!(f, "withdrawal start year {year} outside simulation horizon")
            }
            ConfigError::InvalidLifeExpectancyDivisor { divisor } => {
                write!(f, "custom life-expectancy divisor {divisor} must be >= 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub type Result<T> = std::result::Result<T, ConfigError>;
