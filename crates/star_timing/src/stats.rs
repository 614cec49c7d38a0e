//! Slack reductions: WNS, TNS, and failing-endpoint count.
//!
//! Two conventions are load-bearing for downstream consumers:
//! - the WNS of an empty set is the integer `0`, represented as `wns: None`
//!   and serialized without a decimal point;
//! - TNS sums every slack in the set, positive ones included, so passing paths
//!   offset failing ones in the total.

use crate::path::TimingPathRecord;

/// WNS / TNS / FEP of a set of paths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlackStats {
    /// Number of paths in the set.
    pub fep: usize,
    /// Smallest slack, or `None` for an empty set.
    pub wns: Option<f64>,
    /// Sum of all slacks.
    pub tns: f64,
}

impl SlackStats {
    /// Statistics of an empty set: `{wns: 0, tns: 0.0, fep: 0}`.
    pub const EMPTY: SlackStats = SlackStats {
        fep: 0,
        wns: None,
        tns: 0.0,
    };

    /// Reduces a sequence of slack values.
    pub fn from_slacks<I: IntoIterator<Item = f64>>(slacks: I) -> Self {
        let mut stats = Self::EMPTY;
        for slack in slacks {
            stats.push(slack);
        }
        stats
    }

    /// Reduces a set of path records.
    pub fn of_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a TimingPathRecord>,
    {
        Self::from_slacks(paths.into_iter().map(|p| p.slack))
    }

    /// Adds one slack value.
    pub fn push(&mut self, slack: f64) {
        self.fep += 1;
        self.tns += slack;
        self.wns = Some(match self.wns {
            Some(w) => w.min(slack),
            None => slack,
        });
    }

    /// Folds another set's statistics into this one.
    pub fn merge(&mut self, other: &SlackStats) {
        self.fep += other.fep;
        self.tns += other.tns;
        self.wns = match (self.wns, other.wns) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    /// Returns WNS as a number, `0.0` for an empty set.
    pub fn wns_value(&self) -> f64 {
        self.wns.unwrap_or(0.0)
    }

    /// Returns `true` if the set was empty.
    pub fn is_empty(&self) -> bool {
        self.fep == 0
    }
}
