use rust_decimal::Decimal;

/// Errors rejected at interval construction time.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidIntervalError {
    #[error("rate for \"{name}\" must not be negative, got {rate}%")]
    NegativeRate { name: String, rate: Decimal },
    #[error("\"{name}\" begins at {begin} but ends earlier at {end}")]
    ThresholdsOutOfOrder { name: String, begin: u64, end: u64 },
}

/// Upper income threshold of a rate interval.
///
/// An explicit `Unbounded` variant replaces the usual max-integer sentinel:
/// unbounded intervals are simply never scheduled for phase-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpperBound {
    /// The rate stops applying once income reaches this level.
    Finite(u64),
    /// The rate applies to all income above the begin threshold.
    Unbounded,
}

/// One tax's applicable income range and marginal rate.
///
/// A bracket, payroll tax or surtax is a single interval; a full filing
/// scenario is a collection of them, possibly overlapping. Intervals are
/// immutable configuration data assembled before a sweep begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateInterval {
    name: String,
    rate_percent: Decimal,
    begin: u64,
    end: UpperBound,
}

impl RateInterval {
    /// Create an interval that phases out at `end`.
    ///
    /// `rate_percent` is given in percentage points (15.0 means 15%).
    /// A zero-width interval (`begin == end`) is degenerate but legal; it
    /// contributes to no segment of the schedule.
    pub fn new(
        name: impl Into<String>,
        rate_percent: Decimal,
        begin: u64,
        end: u64,
    ) -> Result<Self, InvalidIntervalError> {
        let name = name.into();
        if begin > end {
            return Err(InvalidIntervalError::ThresholdsOutOfOrder { name, begin, end });
        }
        Self::validated(name, rate_percent, begin, UpperBound::Finite(end))
    }

    /// Create an interval with no upper threshold.
    pub fn unbounded(
        name: impl Into<String>,
        rate_percent: Decimal,
        begin: u64,
    ) -> Result<Self, InvalidIntervalError> {
        Self::validated(name.into(), rate_percent, begin, UpperBound::Unbounded)
    }

    fn validated(
        name: String,
        rate_percent: Decimal,
        begin: u64,
        end: UpperBound,
    ) -> Result<Self, InvalidIntervalError> {
        if rate_percent < Decimal::ZERO {
            return Err(InvalidIntervalError::NegativeRate {
                name,
                rate: rate_percent,
            });
        }
        Ok(RateInterval {
            name,
            rate_percent,
            begin,
            end,
        })
    }

    /// Label used for narration and diagnostics only.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marginal rate in percentage points.
    pub fn rate_percent(&self) -> Decimal {
        self.rate_percent
    }

    /// Inclusive income level at which the rate starts applying.
    pub fn begin(&self) -> u64 {
        self.begin
    }

    /// Income level at which the rate stops applying, if any.
    pub fn end(&self) -> UpperBound {
        self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.end == UpperBound::Unbounded
    }
}
