pub mod owed;
pub mod schedule;
pub mod schema;

use clap::ValueEnum;
use rust_decimal::Decimal;

use crate::tax::FilingStatus;

/// Filing status argument shared by the schedule and owed commands.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FilingStatusArg {
    #[default]
    Single,
    MarriedJointly,
}

impl From<FilingStatusArg> for FilingStatus {
    fn from(arg: FilingStatusArg) -> Self {
        match arg {
            FilingStatusArg::Single => FilingStatus::Single,
            FilingStatusArg::MarriedJointly => FilingStatus::MarriedJointly,
        }
    }
}

pub(crate) fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

pub(crate) fn format_pct(rate: Decimal) -> String {
    format!("{:.2}%", rate.round_dp(2))
}
