//! Owed command - total tax and rates at a single income level

use clap::Args;
use schemars::JsonSchema;
use serde::Serialize;

use crate::cmd::{format_pct, format_usd, FilingStatusArg};
use crate::tax::{build_schedule, federal_2014, FilingStatus};

#[derive(Args, Debug)]
pub struct OwedCommand {
    /// Income level to evaluate
    #[arg(short, long)]
    income: u64,

    /// Filing status selecting the bracket table
    #[arg(short, long, value_enum, default_value_t = FilingStatusArg::Single)]
    status: FilingStatusArg,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// Owed data for JSON output
#[derive(Debug, Serialize, JsonSchema)]
pub struct OwedData {
    pub filing_status: String,
    pub income: u64,
    pub total_tax: String,
    /// Rate on the next dollar of income, in percentage points.
    pub marginal_rate_pct: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rate_pct: Option<String>,
}

impl OwedCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let status: FilingStatus = self.status.into();
        let schedule = build_schedule(&federal_2014(status));

        let total = schedule.tax_at(self.income);
        let marginal = schedule.marginal_rate_at(self.income);
        let average = schedule.average_rate_at(self.income);

        if self.json {
            let data = OwedData {
                filing_status: status.to_string(),
                income: self.income,
                total_tax: format!("{:.2}", total.round_dp(2)),
                marginal_rate_pct: format!("{:.2}", marginal.round_dp(2)),
                average_rate_pct: average.map(|avg| format!("{:.2}", avg.round_dp(2))),
            };
            println!("{}", serde_json::to_string_pretty(&data)?);
            return Ok(());
        }

        println!();
        println!("TAX OWED ({}, 2014)", status);
        println!();
        println!("  Income: ${}", self.income);
        println!("  Total tax: {}", format_usd(total));
        println!("  Marginal rate: {}", format_pct(marginal));
        if let Some(avg) = average {
            println!("  Average rate: {}", format_pct(avg));
        }
        println!();
        Ok(())
    }
}
