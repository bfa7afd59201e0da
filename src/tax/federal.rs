//! 2014 US federal tax tables, assembled as plain interval collections.
//!
//! The standard deduction is modelled as a 0% interval so that the bracket
//! thresholds can be stated in taxable-income terms and shifted wholesale.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::tax::interval::RateInterval;

/// Maximum wages subject to Social Security tax (2014 wage base).
pub const SS_WAGE_BASE: u64 = 117_000;

/// Filing status selecting a bracket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedJointly,
}

impl FilingStatus {
    /// Standard deduction for this filing status.
    pub fn standard_deduction(&self) -> u64 {
        match self {
            FilingStatus::Single => 6_200,
            FilingStatus::MarriedJointly => 12_400,
        }
    }

    /// Upper thresholds of the six bounded ordinary brackets, in
    /// taxable-income terms (not including the standard deduction).
    pub fn bracket_thresholds(&self) -> [u64; 6] {
        match self {
            FilingStatus::Single => [9_075, 36_900, 89_350, 186_350, 405_100, 406_750],
            FilingStatus::MarriedJointly => [18_150, 73_800, 148_850, 226_850, 405_100, 457_600],
        }
    }

    /// Wage threshold before Additional Medicare tax applies.
    pub fn additional_medicare_threshold(&self) -> u64 {
        match self {
            FilingStatus::Single => 200_000,
            FilingStatus::MarriedJointly => 250_000,
        }
    }

    /// Display as "single" / "married filing jointly".
    pub fn display(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedJointly => "married filing jointly",
        }
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Rates and labels of the bounded ordinary brackets, lowest first.
const BOUNDED_BRACKETS: [(Decimal, &str); 6] = [
    (dec!(10), "10% Bracket"),
    (dec!(15), "15% Bracket"),
    (dec!(25), "25% Bracket"),
    (dec!(28), "28% Bracket"),
    (dec!(33), "33% Bracket"),
    (dec!(35), "35% Bracket"),
];

/// Full 2014 federal table for one filing status: standard deduction,
/// ordinary brackets and payroll taxes, as overlapping rate intervals.
pub fn federal_2014(status: FilingStatus) -> Vec<RateInterval> {
    let sd = status.standard_deduction();

    let mut taxes = vec![tax("Standard Deduction", dec!(0), 0, sd)];
    let mut lower = sd;
    for ((rate, name), threshold) in BOUNDED_BRACKETS.iter().zip(status.bracket_thresholds()) {
        taxes.push(tax(name, *rate, lower, threshold + sd));
        lower = threshold + sd;
    }
    taxes.push(open_tax("39.6% Bracket", dec!(39.6), lower));

    taxes.push(tax("Social Security Tax", dec!(6.2), 0, SS_WAGE_BASE));
    taxes.push(open_tax("Medicare Tax", dec!(1.45), 0));
    taxes.push(open_tax(
        "Addit'l Medicare Tax",
        dec!(0.9),
        status.additional_medicare_threshold(),
    ));

    taxes
}

fn tax(name: &str, rate: Decimal, begin: u64, end: u64) -> RateInterval {
    RateInterval::new(name, rate, begin, end).unwrap()
}

fn open_tax(name: &str, rate: Decimal, begin: u64) -> RateInterval {
    RateInterval::unbounded(name, rate, begin).unwrap()
}
