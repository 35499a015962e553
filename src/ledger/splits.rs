//! The in-progress split buffer of the new-transaction form and the balance check that guards it.

use crate::model::{Amount, Split};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Splits balance when they differ from the parent amount by strictly less than one cent.
pub const SPLIT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// A transient handle to one entry of the `SplitBuffer`. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SplitId(u32);

impl Display for SplitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The outcome of `validate_splits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SplitBalance {
    /// Submission is allowed. `difference` is the absolute gap, always below one cent.
    Balanced { difference: Amount },
    /// Submission is blocked. `remaining` is `total - sum(splits)`: positive when more still needs
    /// to be allocated, negative when the splits over-allocate.
    Unbalanced { remaining: Amount },
}

impl SplitBalance {
    pub fn is_balanced(&self) -> bool {
        matches!(self, SplitBalance::Balanced { .. })
    }
}

impl Display for SplitBalance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitBalance::Balanced { .. } => f.write_str("splits are balanced"),
            SplitBalance::Unbalanced { remaining } if remaining.is_negative() => {
                write!(f, "splits exceed the total by {}", remaining.abs())
            }
            SplitBalance::Unbalanced { remaining } => {
                write!(f, "{remaining} remains to be allocated")
            }
        }
    }
}

/// Compares the sum of `splits` against `total`.
pub fn validate_splits<'a>(
    total: Amount,
    splits: impl IntoIterator<Item = &'a Split>,
) -> SplitBalance {
    let allocated: Amount = splits.into_iter().map(Split::amount).sum();
    let remaining = total.saturating_sub(allocated);
    if remaining.value().abs() < SPLIT_TOLERANCE {
        SplitBalance::Balanced {
            difference: remaining.abs(),
        }
    } else {
        SplitBalance::Unbalanced { remaining }
    }
}

/// The ordered splits being assembled for a transaction that has not been submitted yet.
#[derive(Debug, Default, Clone)]
pub struct SplitBuffer {
    next_id: u32,
    entries: Vec<(SplitId, Split)>,
}

impl SplitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `split` and returns the handle used to remove it again.
    pub fn add(&mut self, split: Split) -> SplitId {
        let id = SplitId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, split));
        id
    }

    /// Removes the entry with `id`. Returns false if there was no such entry.
    pub fn remove(&mut self, id: SplitId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn splits(&self) -> impl Iterator<Item = &Split> {
        self.entries.iter().map(|(_, split)| split)
    }

    pub fn validate(&self, total: Amount) -> SplitBalance {
        validate_splits(total, self.splits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn splits(amounts: &[&str]) -> Vec<Split> {
        amounts.iter().map(|a| Split::new("misc", amt(a))).collect()
    }

    #[test]
    fn test_even_three_way_split_is_balanced() {
        let balance = validate_splits(amt("90"), &splits(&["30", "30", "30"]));
        assert_eq!(
            balance,
            SplitBalance::Balanced {
                difference: Amount::ZERO
            }
        );
    }

    #[test]
    fn test_short_split_reports_remaining() {
        let balance = validate_splits(amt("90"), &splits(&["30", "30", "29"]));
        assert_eq!(
            balance,
            SplitBalance::Unbalanced {
                remaining: amt("1.00")
            }
        );
        assert_eq!(balance.to_string(), "$1.00 remains to be allocated");
    }

    #[test]
    fn test_exactly_one_cent_is_unbalanced() {
        let balance = validate_splits(amt("100.00"), &splits(&["40.00", "59.99"]));
        assert_eq!(
            balance,
            SplitBalance::Unbalanced {
                remaining: amt("0.01")
            }
        );
    }

    #[test]
    fn test_under_one_cent_is_balanced() {
        let balance = validate_splits(amt("100.00"), &splits(&["40.00", "59.995"]));
        assert!(balance.is_balanced());
    }

    #[test]
    fn test_over_allocation_is_negative() {
        let balance = validate_splits(amt("50"), &splits(&["30", "30"]));
        assert_eq!(
            balance,
            SplitBalance::Unbalanced {
                remaining: amt("-10")
            }
        );
        assert_eq!(balance.to_string(), "splits exceed the total by $10.00");
    }

    #[test]
    fn test_buffer_remove_by_id() {
        let mut buffer = SplitBuffer::new();
        let a = buffer.add(Split::new("a", 1));
        let b = buffer.add(Split::new("b", 2));
        let c = buffer.add(Split::new("c", 3));
        assert!(buffer.remove(b));
        assert!(!buffer.remove(b));
        let left: Vec<&str> = buffer.splits().map(Split::category).collect();
        assert_eq!(left, vec!["a", "c"]);
        assert!(buffer.remove(a));
        assert!(buffer.remove(c));
        assert!(buffer.is_empty());

        // ids are not reused after removal
        let d = buffer.add(Split::new("d", 4));
        assert_ne!(d, b);
        assert_ne!(d, c);
        assert_eq!(buffer.len(), 1);
    }
}
