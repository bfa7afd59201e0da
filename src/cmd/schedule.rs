//! Schedule command - the full breakpoint table for a filing status

use clap::Args;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;
use std::io;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::cmd::{format_pct, format_usd, FilingStatusArg};
use crate::tax::{build_schedule_traced, federal_2014, FilingStatus};
use crate::utils::write_csv;

#[derive(Args, Debug)]
pub struct ScheduleCommand {
    /// Filing status selecting the bracket table
    #[arg(short, long, value_enum, default_value_t = FilingStatusArg::Single)]
    status: FilingStatusArg,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,

    /// Narrate the taxes in effect at each breakpoint
    #[arg(long)]
    explain: bool,
}

/// One breakpoint observation collected during the sweep.
struct Observation {
    income_level: u64,
    cumulative_tax: Decimal,
    marginal_rate_percent: Decimal,
    average_rate_percent: Option<Decimal>,
    active: Vec<(String, Decimal)>,
}

/// Row for the schedule table output
#[derive(Debug, Clone, Tabled, Serialize)]
struct ScheduleRow {
    #[tabled(rename = "Income Level")]
    #[serde(rename = "income_level")]
    income_level: u64,

    #[tabled(rename = "Marginal Rate")]
    #[serde(rename = "marginal_rate_pct")]
    marginal_rate: String,

    #[tabled(rename = "Total Tax")]
    #[serde(rename = "cumulative_tax")]
    cumulative_tax: String,

    #[tabled(rename = "Average Rate")]
    #[serde(rename = "average_rate_pct")]
    average_rate: String,
}

/// Schedule data for JSON output
#[derive(Debug, Serialize, JsonSchema)]
pub struct ScheduleData {
    pub filing_status: String,
    pub breakpoints: Vec<BreakpointData>,
    /// Marginal rate beyond the last breakpoint, in percentage points.
    pub terminal_marginal_rate_pct: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BreakpointData {
    pub income_level: u64,
    pub marginal_rate_pct: String,
    pub cumulative_tax: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rate_pct: Option<String>,
    /// Taxes in effect over the segment ending at this breakpoint.
    pub active_taxes: Vec<String>,
}

impl ScheduleCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let status: FilingStatus = self.status.into();
        let taxes = federal_2014(status);

        let mut observations: Vec<Observation> = Vec::new();
        let schedule = build_schedule_traced(&taxes, |step| {
            observations.push(Observation {
                income_level: step.income_level,
                cumulative_tax: step.cumulative_tax,
                marginal_rate_percent: step.marginal_rate_percent,
                average_rate_percent: step.average_rate_percent,
                active: step
                    .active
                    .iter()
                    .map(|iv| (iv.name().to_string(), iv.rate_percent()))
                    .collect(),
            });
        });
        let terminal_rate = schedule.terminal_rate_percent();

        if self.json {
            self.print_json(status, &observations, terminal_rate)
        } else if self.csv {
            write_csv(observations.iter().map(build_row), io::stdout())
        } else if self.explain {
            self.print_narration(status, &observations, terminal_rate);
            Ok(())
        } else {
            self.print_table(status, &observations, terminal_rate);
            Ok(())
        }
    }

    fn print_table(&self, status: FilingStatus, observations: &[Observation], terminal: Decimal) {
        if observations.is_empty() {
            println!("No breakpoints for {}", status);
            return;
        }

        println!();
        println!("MARGINAL RATE SCHEDULE ({}, 2014)", status);
        println!();

        let rows: Vec<ScheduleRow> = observations.iter().map(build_row).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();
        println!(
            "Beyond ${} the marginal rate is {}",
            observations[observations.len() - 1].income_level,
            format_pct(terminal)
        );
        println!();
    }

    fn print_narration(
        &self,
        status: FilingStatus,
        observations: &[Observation],
        terminal: Decimal,
    ) {
        println!("Filing status: {}", status);
        for obs in observations {
            println!();
            println!("At income level of ${}", obs.income_level);
            println!("  Taxes in effect up to this point:");
            for (name, rate) in &obs.active {
                println!("    {} ({})", name, format_pct(*rate));
            }
            println!(
                "  Marginal rate is {} up to this point",
                format_pct(obs.marginal_rate_percent)
            );
            println!(
                "  Total tax is {} up to this point",
                format_usd(obs.cumulative_tax)
            );
            if let Some(avg) = obs.average_rate_percent {
                println!("  Average tax rate is {} up to this point", format_pct(avg));
            }
        }
        println!();
        println!("All further income is taxed at {}", format_pct(terminal));
    }

    fn print_json(
        &self,
        status: FilingStatus,
        observations: &[Observation],
        terminal: Decimal,
    ) -> anyhow::Result<()> {
        let data = ScheduleData {
            filing_status: status.to_string(),
            breakpoints: observations
                .iter()
                .map(|obs| BreakpointData {
                    income_level: obs.income_level,
                    marginal_rate_pct: format!("{:.2}", obs.marginal_rate_percent.round_dp(2)),
                    cumulative_tax: format!("{:.2}", obs.cumulative_tax.round_dp(2)),
                    average_rate_pct: obs
                        .average_rate_percent
                        .map(|avg| format!("{:.2}", avg.round_dp(2))),
                    active_taxes: obs.active.iter().map(|(name, _)| name.clone()).collect(),
                })
                .collect(),
            terminal_marginal_rate_pct: format!("{:.2}", terminal.round_dp(2)),
        };

        println!("{}", serde_json::to_string_pretty(&data)?);
        Ok(())
    }
}

fn build_row(obs: &Observation) -> ScheduleRow {
    ScheduleRow {
        income_level: obs.income_level,
        marginal_rate: format_pct(obs.marginal_rate_percent),
        cumulative_tax: format_usd(obs.cumulative_tax),
        average_rate: obs
            .average_rate_percent
            .map(format_pct)
            .unwrap_or_default(),
    }
}
