//! Schema command - print the JSON output formats

use clap::Args;
use schemars::schema_for;

use crate::cmd::owed::OwedData;
use crate::cmd::schedule::ScheduleData;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Which JSON output to describe
    #[arg(value_enum, default_value = "schedule")]
    output: SchemaOutput,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaOutput {
    /// JSON Schema of `schedule --json`
    Schedule,
    /// JSON Schema of `owed --json`
    Owed,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = match self.output {
            SchemaOutput::Schedule => schema_for!(ScheduleData),
            SchemaOutput::Owed => schema_for!(OwedData),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
