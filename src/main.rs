use clap::{Parser, Subcommand};

mod cmd;
mod tax;
mod utils;

#[derive(Parser, Debug)]
#[command(name = "taxsweep", version, about = "Marginal tax rate schedule calculator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the full breakpoint schedule for a filing status
    Schedule(cmd::schedule::ScheduleCommand),
    /// Tax owed at a single income level
    Owed(cmd::owed::OwedCommand),
    /// Print JSON Schema for the JSON output formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Schedule(c) => c.exec(),
        Command::Owed(c) => c.exec(),
        Command::Schema(c) => c.exec(),
    }
}
