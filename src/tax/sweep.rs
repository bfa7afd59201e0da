//! Event-driven merge of overlapping rate intervals into a cumulative
//! tax schedule.
//!
//! Two ordered working sets drive the sweep: intervals waiting to phase in,
//! keyed by begin threshold, and intervals currently in effect, keyed by end
//! threshold. The next income level where the aggregate marginal rate
//! changes is always the smaller of the two front keys.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::tax::interval::{RateInterval, UpperBound};

/// An income level at which the set of active marginal rates changes,
/// together with the cumulative tax owed up to that level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Income threshold where the aggregate rate changes.
    pub income_level: u64,
    /// Total tax owed on income up to `income_level`. Unrounded; rounding
    /// is a presentation concern.
    pub cumulative_tax: Decimal,
    /// Aggregate marginal rate in force over the segment ending here,
    /// in percentage points.
    pub marginal_rate_percent: Decimal,
}

/// The piecewise-linear cumulative tax function produced by a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaxSchedule {
    breakpoints: Vec<Breakpoint>,
    terminal_rate_percent: Decimal,
}

/// Observation passed to the trace callback once per emitted breakpoint.
///
/// Purely an observability side-channel; correctness never depends on it.
#[derive(Debug)]
pub struct SweepStep<'a> {
    pub income_level: u64,
    pub cumulative_tax: Decimal,
    /// Sum of the rates of `active`, in percentage points.
    pub marginal_rate_percent: Decimal,
    /// Cumulative tax as a percentage of income. `None` at income 0,
    /// where the average is undefined.
    pub average_rate_percent: Option<Decimal>,
    /// Intervals in effect over the segment ending at this breakpoint,
    /// in input order. Includes intervals phasing out exactly here.
    pub active: Vec<&'a RateInterval>,
}

impl TaxSchedule {
    /// Breakpoints in strictly increasing order of income level.
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Aggregate marginal rate beyond the last finite threshold: the summed
    /// rates of the unbounded intervals, which never phase out.
    pub fn terminal_rate_percent(&self) -> Decimal {
        self.terminal_rate_percent
    }

    /// Total tax owed on income up to `income`, interpolating linearly
    /// within a segment and extending past the last breakpoint at the
    /// terminal rate.
    pub fn tax_at(&self, income: u64) -> Decimal {
        let mut last_level = 0u64;
        let mut last_tax = Decimal::ZERO;
        for bp in &self.breakpoints {
            if income >= bp.income_level {
                last_level = bp.income_level;
                last_tax = bp.cumulative_tax;
            } else {
                return last_tax
                    + Decimal::from(income - last_level) * bp.marginal_rate_percent / dec!(100);
            }
        }
        last_tax + Decimal::from(income - last_level) * self.terminal_rate_percent / dec!(100)
    }

    /// Marginal rate applying to the next unit of income at `income`,
    /// in percentage points.
    pub fn marginal_rate_at(&self, income: u64) -> Decimal {
        for bp in &self.breakpoints {
            if income < bp.income_level {
                return bp.marginal_rate_percent;
            }
        }
        self.terminal_rate_percent
    }

    /// Cumulative tax at `income` as a percentage of income.
    /// `None` at income 0, where the average is undefined.
    pub fn average_rate_at(&self, income: u64) -> Option<Decimal> {
        if income == 0 {
            return None;
        }
        Some(self.tax_at(income) / Decimal::from(income) * dec!(100))
    }
}

/// Merge `intervals` into the ordered breakpoint sequence of the cumulative
/// tax function.
///
/// Input order is irrelevant; duplicates are treated as independent rates
/// applying simultaneously. An empty input yields an empty schedule.
pub fn build_schedule(intervals: &[RateInterval]) -> TaxSchedule {
    build_schedule_traced(intervals, |_| {})
}

/// Like [`build_schedule`], invoking `trace` once per emitted breakpoint
/// with the active interval set and the marginal and average rates.
pub fn build_schedule_traced<'a, F>(intervals: &'a [RateInterval], mut trace: F) -> TaxSchedule
where
    F: FnMut(&SweepStep<'a>),
{
    // Heap entries are (threshold, input index); the index makes ties
    // deterministic and lets the heaps stay Copy while the intervals are
    // borrowed read-only.
    let mut pending: BinaryHeap<Reverse<(u64, usize)>> = intervals
        .iter()
        .enumerate()
        .map(|(ix, iv)| Reverse((iv.begin(), ix)))
        .collect();
    let mut in_effect: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
    // Unbounded intervals never phase out, so they live outside the
    // deactivation heap; only their indices are tracked.
    let mut in_effect_unbounded: Vec<usize> = Vec::new();

    let mut rate = Decimal::ZERO;
    let mut cumulative_tax = Decimal::ZERO;
    let mut last_level = 0u64;
    let mut breakpoints = Vec::new();

    while !pending.is_empty() || !in_effect.is_empty() {
        let next_activation = pending.peek().map(|Reverse((begin, _))| *begin);
        let next_deactivation = in_effect.peek().map(|Reverse((end, _))| *end);
        let Some(level) = [next_activation, next_deactivation]
            .into_iter()
            .flatten()
            .min()
        else {
            break;
        };

        // The rate in force over [last_level, level) is summed before any
        // phase change at this level: an interval ending exactly here still
        // counts for the segment that ends here.
        if level > last_level {
            cumulative_tax += Decimal::from(level - last_level) * rate / dec!(100);
            trace(&SweepStep {
                income_level: level,
                cumulative_tax,
                marginal_rate_percent: rate,
                average_rate_percent: if level > 0 {
                    Some(cumulative_tax / Decimal::from(level) * dec!(100))
                } else {
                    None
                },
                active: active_intervals(intervals, &in_effect, &in_effect_unbounded),
            });
            breakpoints.push(Breakpoint {
                income_level: level,
                cumulative_tax,
                marginal_rate_percent: rate,
            });
            last_level = level;
        }

        // Phase out everything ending exactly here, then phase in everything
        // beginning here. The order matters only for the next segment's
        // rate; this breakpoint was computed before either mutation.
        if next_deactivation == Some(level) {
            while let Some(&Reverse((end, ix))) = in_effect.peek() {
                if end != level {
                    break;
                }
                in_effect.pop();
                rate -= intervals[ix].rate_percent();
                log::debug!("phase out {} at {}", intervals[ix].name(), level);
            }
        }
        if next_activation == Some(level) {
            while let Some(&Reverse((begin, ix))) = pending.peek() {
                if begin != level {
                    break;
                }
                pending.pop();
                let iv = &intervals[ix];
                rate += iv.rate_percent();
                log::debug!("phase in {} at {}", iv.name(), level);
                match iv.end() {
                    UpperBound::Finite(end) => in_effect.push(Reverse((end, ix))),
                    UpperBound::Unbounded => in_effect_unbounded.push(ix),
                }
            }
        }
    }

    let terminal_rate_percent = in_effect_unbounded
        .iter()
        .map(|&ix| intervals[ix].rate_percent())
        .sum();

    TaxSchedule {
        breakpoints,
        terminal_rate_percent,
    }
}

fn active_intervals<'a>(
    intervals: &'a [RateInterval],
    in_effect: &BinaryHeap<Reverse<(u64, usize)>>,
    in_effect_unbounded: &[usize],
) -> Vec<&'a RateInterval> {
    let mut indices: Vec<usize> = in_effect
        .iter()
        .map(|&Reverse((_, ix))| ix)
        .chain(in_effect_unbounded.iter().copied())
        .collect();
    indices.sort_unstable();
    indices.into_iter().map(|ix| &intervals[ix]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tax(name: &str, rate: Decimal, begin: u64, end: u64) -> RateInterval {
        RateInterval::new(name, rate, begin, end).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_schedule() {
        let schedule = build_schedule(&[]);
        assert!(schedule.breakpoints().is_empty());
        assert_eq!(schedule.terminal_rate_percent(), Decimal::ZERO);
    }

    #[test]
    fn single_interval_identity() {
        let schedule = build_schedule(&[tax("flat", dec!(10), 0, 1000)]);
        assert_eq!(
            schedule.breakpoints(),
            &[Breakpoint {
                income_level: 1000,
                cumulative_tax: dec!(100.00),
                marginal_rate_percent: dec!(10),
            }]
        );
        assert_eq!(schedule.terminal_rate_percent(), Decimal::ZERO);
    }

    #[test]
    fn two_non_overlapping_brackets() {
        let schedule = build_schedule(&[
            tax("lower", dec!(10), 0, 100),
            tax("upper", dec!(20), 100, 200),
        ]);
        let levels_and_tax: Vec<(u64, Decimal)> = schedule
            .breakpoints()
            .iter()
            .map(|bp| (bp.income_level, bp.cumulative_tax))
            .collect();
        assert_eq!(levels_and_tax, vec![(100, dec!(10.00)), (200, dec!(30.00))]);
    }

    #[test]
    fn overlapping_intervals() {
        // 10% over [0, 100), 5% over [50, 150): 15% in force over [50, 100)
        let schedule = build_schedule(&[
            tax("base", dec!(10), 0, 100),
            tax("surtax", dec!(5), 50, 150),
        ]);
        let levels_and_tax: Vec<(u64, Decimal)> = schedule
            .breakpoints()
            .iter()
            .map(|bp| (bp.income_level, bp.cumulative_tax))
            .collect();
        assert_eq!(
            levels_and_tax,
            vec![
                (50, dec!(5.00)),
                (100, dec!(12.50)),
                (150, dec!(15.00)),
            ]
        );
    }

    #[test]
    fn expiring_rate_counts_for_the_segment_ending_at_its_threshold() {
        // One bracket hands over to the next at 100; the outgoing 10% must
        // cover [0, 100) and the incoming 20% must not start until 100.
        let schedule = build_schedule(&[
            tax("out", dec!(10), 0, 100),
            tax("in", dec!(20), 100, 200),
        ]);
        assert_eq!(schedule.breakpoints()[0].marginal_rate_percent, dec!(10));
        assert_eq!(schedule.breakpoints()[1].marginal_rate_percent, dec!(20));
        // no double-counting at the shared threshold
        assert_eq!(schedule.breakpoints()[1].cumulative_tax, dec!(30.00));
    }

    #[test]
    fn unbounded_plus_finite_terminates() {
        let intervals = vec![
            RateInterval::unbounded("medicare", dec!(1.45), 0).unwrap(),
            tax("bracket", dec!(10), 0, 1000),
        ];
        let schedule = build_schedule(&intervals);
        assert_eq!(schedule.breakpoints().len(), 1);
        assert_eq!(schedule.breakpoints()[0].income_level, 1000);
        assert_eq!(schedule.breakpoints()[0].cumulative_tax, dec!(114.50));
        assert_eq!(schedule.terminal_rate_percent(), dec!(1.45));
    }

    #[test]
    fn multiple_unbounded_rates_sum_into_terminal_rate() {
        let intervals = vec![
            RateInterval::unbounded("top bracket", dec!(39.6), 500).unwrap(),
            RateInterval::unbounded("medicare", dec!(1.45), 0).unwrap(),
            tax("bracket", dec!(10), 0, 500),
        ];
        let schedule = build_schedule(&intervals);
        // the top bracket phasing in at 500 coincides with the 10% bracket
        // phasing out, so 500 is the only breakpoint
        assert_eq!(schedule.breakpoints().len(), 1);
        assert_eq!(schedule.terminal_rate_percent(), dec!(41.05));
    }

    #[test]
    fn zero_width_interval_contributes_nothing() {
        let schedule = build_schedule(&[
            tax("real", dec!(10), 0, 200),
            tax("degenerate", dec!(99), 100, 100),
        ]);
        let levels_and_tax: Vec<(u64, Decimal)> = schedule
            .breakpoints()
            .iter()
            .map(|bp| (bp.income_level, bp.cumulative_tax))
            .collect();
        // the degenerate interval still marks 100 as an event level, but
        // its 99% never applies to any income
        assert_eq!(
            levels_and_tax,
            vec![(100, dec!(10.00)), (200, dec!(20.00))]
        );
    }

    #[test]
    fn duplicate_intervals_stack() {
        let schedule = build_schedule(&[
            tax("a", dec!(10), 0, 100),
            tax("a", dec!(10), 0, 100),
        ]);
        assert_eq!(schedule.breakpoints().len(), 1);
        assert_eq!(schedule.breakpoints()[0].cumulative_tax, dec!(20.00));
    }

    #[test]
    fn levels_strictly_increase_and_tax_never_decreases() {
        let schedule = build_schedule(&[
            tax("a", dec!(10), 0, 300),
            tax("b", dec!(5), 100, 200),
            tax("c", dec!(0), 50, 250),
            tax("d", dec!(7.5), 200, 400),
        ]);
        for pair in schedule.breakpoints().windows(2) {
            assert!(pair[0].income_level < pair[1].income_level);
            assert!(pair[0].cumulative_tax <= pair[1].cumulative_tax);
        }
        assert!(schedule
            .breakpoints()
            .iter()
            .all(|bp| bp.cumulative_tax >= Decimal::ZERO));
    }

    #[test]
    fn consecutive_breakpoints_are_additive() {
        let schedule = build_schedule(&[
            tax("a", dec!(12.4), 0, 117000),
            tax("b", dec!(10), 6200, 15275),
            tax("c", dec!(15), 15275, 43100),
        ]);
        let mut last_level = 0u64;
        let mut last_tax = Decimal::ZERO;
        for bp in schedule.breakpoints() {
            let width = Decimal::from(bp.income_level - last_level);
            assert_eq!(
                bp.cumulative_tax - last_tax,
                width * bp.marginal_rate_percent / dec!(100)
            );
            last_level = bp.income_level;
            last_tax = bp.cumulative_tax;
        }
    }

    #[test]
    fn input_order_is_irrelevant() {
        let a = vec![
            tax("a", dec!(10), 0, 100),
            tax("b", dec!(20), 100, 200),
            RateInterval::unbounded("c", dec!(2), 50).unwrap(),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(build_schedule(&a), build_schedule(&b));
    }

    #[test]
    fn trace_sees_active_set_and_rates() {
        let intervals = vec![
            tax("base", dec!(10), 0, 100),
            tax("surtax", dec!(5), 50, 150),
        ];
        let mut steps: Vec<(u64, Vec<String>, Decimal, Option<Decimal>)> = Vec::new();
        build_schedule_traced(&intervals, |step| {
            steps.push((
                step.income_level,
                step.active.iter().map(|iv| iv.name().to_string()).collect(),
                step.marginal_rate_percent,
                step.average_rate_percent,
            ));
        });

        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].0, 50);
        assert_eq!(steps[0].1, vec!["base"]);
        assert_eq!(steps[0].2, dec!(10));
        assert_eq!(steps[0].3, Some(dec!(10)));

        // at 100 the base rate is still in effect for the segment ending here
        assert_eq!(steps[1].0, 100);
        assert_eq!(steps[1].1, vec!["base", "surtax"]);
        assert_eq!(steps[1].2, dec!(15));

        assert_eq!(steps[2].0, 150);
        assert_eq!(steps[2].1, vec!["surtax"]);
        assert_eq!(steps[2].2, dec!(5));
    }

    #[test]
    fn tax_at_interpolates_within_a_segment() {
        let schedule = build_schedule(&[
            tax("lower", dec!(10), 0, 100),
            tax("upper", dec!(20), 100, 200),
        ]);
        assert_eq!(schedule.tax_at(0), Decimal::ZERO);
        assert_eq!(schedule.tax_at(50), dec!(5.00));
        assert_eq!(schedule.tax_at(100), dec!(10.00));
        assert_eq!(schedule.tax_at(150), dec!(20.00));
        assert_eq!(schedule.tax_at(200), dec!(30.00));
        // beyond the last breakpoint no rate applies
        assert_eq!(schedule.tax_at(1000), dec!(30.00));
    }

    #[test]
    fn tax_at_extends_past_the_table_at_the_terminal_rate() {
        let intervals = vec![
            tax("bracket", dec!(10), 0, 100),
            RateInterval::unbounded("medicare", dec!(1.45), 0).unwrap(),
        ];
        let schedule = build_schedule(&intervals);
        assert_eq!(schedule.tax_at(100), dec!(11.45));
        assert_eq!(schedule.tax_at(300), dec!(11.45) + dec!(200) * dec!(1.45) / dec!(100));
    }

    #[test]
    fn marginal_rate_at_switches_exactly_on_the_threshold() {
        let schedule = build_schedule(&[
            tax("lower", dec!(10), 0, 100),
            tax("upper", dec!(20), 100, 200),
        ]);
        assert_eq!(schedule.marginal_rate_at(0), dec!(10));
        assert_eq!(schedule.marginal_rate_at(99), dec!(10));
        // the next unit of income above 100 is taxed in the upper bracket
        assert_eq!(schedule.marginal_rate_at(100), dec!(20));
        assert_eq!(schedule.marginal_rate_at(250), Decimal::ZERO);
    }

    #[test]
    fn average_rate_undefined_at_zero_income() {
        let schedule = build_schedule(&[tax("flat", dec!(10), 0, 100)]);
        assert_eq!(schedule.average_rate_at(0), None);
        assert_eq!(schedule.average_rate_at(100), Some(dec!(10)));
    }
}
