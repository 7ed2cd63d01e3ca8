// 📒 Aggregator - sum a numeric ledger field per known category
//
// Charts and legends need a stable layout, so the caller supplies the
// ordered list of expected keys (the four port locations, the equipment
// types, ...). Every key gets a group, even with no rows; rows for keys
// nobody asked about are dropped.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// LEDGER ROW
// ============================================================================

/// A categorical key plus a quantity (tons, hours, volume)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub group_key: String,
    pub amount: f64,
}

impl LedgerRow {
    /// Validated construction: NaN and infinities are rejected here so they
    /// can never reach a sum
    pub fn new(group_key: impl Into<String>, amount: f64) -> CoreResult<Self> {
        if !amount.is_finite() {
            return Err(CoreError::invalid_input(
                "amount",
                format!("non-finite value {}", amount),
            ));
        }

        Ok(LedgerRow {
            group_key: group_key.into(),
            amount,
        })
    }
}

/// Build validated ledger rows out of any record slice
pub fn ledger_rows<T, K, A>(items: &[T], key: K, amount: A) -> CoreResult<Vec<LedgerRow>>
where
    K: Fn(&T) -> CoreResult<String>,
    A: Fn(&T) -> CoreResult<f64>,
{
    items
        .iter()
        .map(|item| LedgerRow::new(key(item)?, amount(item)?))
        .collect()
}

// ============================================================================
// AGGREGATED GROUP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedGroup {
    pub key: String,
    pub total: f64,
}

/// One group per entry of `keys`, in the same order
///
/// Example:
/// ```
/// use port_ops::{group_sum, LedgerRow};
///
/// let rows = vec![
///     LedgerRow::new("Berth 2", 40.0).unwrap(),
///     LedgerRow::new("Berth 1", 10.0).unwrap(),
///     LedgerRow::new("Anchorage", 99.0).unwrap(),
/// ];
/// let groups = group_sum(&rows, &["Berth 1", "Berth 2", "Yard"]);
///
/// assert_eq!(groups[0].total, 10.0);
/// assert_eq!(groups[1].total, 40.0);
/// assert_eq!(groups[2].total, 0.0);
/// ```
pub fn group_sum<S: AsRef<str>>(rows: &[LedgerRow], keys: &[S]) -> Vec<AggregatedGroup> {
    let mut totals: HashMap<&str, f64> = keys.iter().map(|k| (k.as_ref(), 0.0)).collect();

    for row in rows {
        if let Some(total) = totals.get_mut(row.group_key.as_str()) {
            *total += row.amount;
        }
    }

    keys.iter()
        .map(|k| AggregatedGroup {
            key: k.as_ref().to_string(),
            total: totals.get(k.as_ref()).copied().unwrap_or(0.0),
        })
        .collect()
}

// ============================================================================
// KEY EXTRACTION
// ============================================================================

/// Equipment type from an equipment tag: the leading letters, uppercased
///
/// `"EMP-03"` → `"EMP"`, `"gui12"` → `"GUI"`, `"PC 7"` → `"PC"`
pub fn equipment_type(tag: &str) -> CoreResult<String> {
    let prefix: String = tag
        .trim()
        .chars()
        .take_while(|c| c.is_alphabetic())
        .flat_map(|c| c.to_uppercase())
        .collect();

    if prefix.is_empty() {
        return Err(CoreError::invalid_input(
            "equipment_tag",
            format!("no type prefix in {:?}", tag),
        ));
    }

    Ok(prefix)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, amount: f64) -> LedgerRow {
        LedgerRow::new(key, amount).unwrap()
    }

    #[test]
    fn test_group_sum_preserves_key_order() {
        let rows = vec![row("C", 1.0), row("A", 2.0), row("C", 3.0)];
        let groups = group_sum(&rows, &["C", "B", "A"]);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["C", "B", "A"]);
        assert_eq!(groups[0].total, 4.0);
        assert_eq!(groups[1].total, 0.0);
        assert_eq!(groups[2].total, 2.0);
    }

    #[test]
    fn test_group_sum_excludes_unknown_keys() {
        let rows = vec![row("Berth 1", 10.0), row("Somewhere else", 500.0)];
        let groups = group_sum(&rows, &["Berth 1"]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total, 10.0);
    }

    #[test]
    fn test_group_sum_empty_rows() {
        let groups = group_sum(&[], &["A", "B"]);
        assert_eq!(
            groups,
            vec![
                AggregatedGroup { key: "A".to_string(), total: 0.0 },
                AggregatedGroup { key: "B".to_string(), total: 0.0 },
            ]
        );
    }

    #[test]
    fn test_group_sum_accepts_owned_keys() {
        let keys = vec!["A".to_string()];
        let groups = group_sum(&[row("A", 1.5)], &keys);
        assert_eq!(groups[0].total, 1.5);
    }

    #[test]
    fn test_negative_amounts_pass_through() {
        let groups = group_sum(&[row("A", 5.0), row("A", -2.0)], &["A"]);
        assert_eq!(groups[0].total, 3.0);
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        assert!(LedgerRow::new("A", f64::NAN).is_err());
        assert!(LedgerRow::new("A", f64::INFINITY).is_err());
        assert!(matches!(
            LedgerRow::new("A", f64::NEG_INFINITY),
            Err(CoreError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_ledger_rows_stops_at_first_bad_item() {
        let items = vec![("A", 1.0), ("B", f64::NAN)];
        let result = ledger_rows(&items, |i| Ok(i.0.to_string()), |i| Ok(i.1));
        assert!(result.is_err());

        let items = vec![("A", 1.0), ("B", 2.0)];
        let rows = ledger_rows(&items, |i| Ok(i.0.to_string()), |i| Ok(i.1)).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_equipment_type_prefix() {
        assert_eq!(equipment_type("EMP-03").unwrap(), "EMP");
        assert_eq!(equipment_type("gui12").unwrap(), "GUI");
        assert_eq!(equipment_type(" PC 7").unwrap(), "PC");
        assert!(equipment_type("42").is_err());
        assert!(equipment_type("").is_err());
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![row("A", 0.1), row("B", 0.2), row("A", 0.3)];
        assert_eq!(group_sum(&rows, &["A", "B"]), group_sum(&rows, &["A", "B"]));
    }
}
