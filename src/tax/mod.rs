pub mod federal;
pub mod interval;
pub mod sweep;

pub use federal::{federal_2014, FilingStatus};
pub use interval::{InvalidIntervalError, RateInterval, UpperBound};
pub use sweep::{build_schedule, build_schedule_traced, Breakpoint, SweepStep, TaxSchedule};
