// 📊 Chart Projector - aggregated groups → renderer-ready series
//
// The renderer owns formatting (percent signs, decimals, colors). This
// module only hands over raw labels and normalized numbers.

use crate::ledger::AggregatedGroup;
use crate::numeric::percent_of;
use serde::{Deserialize, Serialize};

/// Parallel, index-aligned labels and values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate `(label, value)` pairs
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Each group's share of the grand total, in percent (pie views)
///
/// All shares are zero when the groups sum to zero.
pub fn to_percentages(groups: &[AggregatedGroup]) -> ChartSeries {
    let grand_total: f64 = groups.iter().map(|g| g.total).sum();

    ChartSeries {
        labels: groups.iter().map(|g| g.key.clone()).collect(),
        values: groups
            .iter()
            .map(|g| percent_of(g.total, grand_total))
            .collect(),
    }
}

/// Totals unchanged (bar views)
pub fn to_absolute(groups: &[AggregatedGroup]) -> ChartSeries {
    ChartSeries {
        labels: groups.iter().map(|g| g.key.clone()).collect(),
        values: groups.iter().map(|g| g.total).collect(),
    }
}
