use crate::model::Amount;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The tag that marks a transaction as income. Every other tag is an expense tag.
pub const INCOME: &str = "income";

/// The stable identity of a transaction. Derived from a millisecond timestamp when the transaction
/// is created, and never reused within a month.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionId(i64);

impl TransactionId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for TransactionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A transaction's tag: `income`, or the name of an expense category such as `groceries`.
///
/// Tags are trimmed and lowercased on construction so that exact matching behaves the way a person
/// picking from a dropdown expects.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_lowercase())
    }

    pub fn is_income(&self) -> bool {
        self.0.eq_ignore_ascii_case(INCOME)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::new(value)
    }
}

/// A sub-allocation of a transaction's amount to a category and, optionally, a person.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Split {
    pub(crate) category: String,
    #[serde(default)]
    pub(crate) amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) person: Option<String>,
}

impl Split {
    pub fn new(category: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Self {
            category: category.into(),
            amount: amount.into(),
            person: None,
        }
    }

    pub fn with_person(mut self, person: impl Into<String>) -> Self {
        self.person = non_empty(person.into());
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn person(&self) -> Option<&str> {
        self.person.as_deref()
    }
}

/// Parses `CATEGORY:AMOUNT` or `CATEGORY:AMOUNT:PERSON`, as typed on the command line.
impl FromStr for Split {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let category = parts.next().unwrap_or_default().trim();
        let amount = parts
            .next()
            .with_context(|| format!("Split '{s}' is missing an amount, expected CATEGORY:AMOUNT"))?;
        if category.is_empty() {
            bail!("Split '{s}' is missing a category");
        }
        let amount = Amount::from_str(amount)
            .map_err(anyhow::Error::new)
            .with_context(|| format!("Split '{s}' has an invalid amount"))?;
        let split = Split::new(category, amount);
        Ok(match parts.next() {
            Some(person) => split.with_person(person),
            None => split,
        })
    }
}

/// A single income or expense entry within a month bucket.
///
/// Transactions are never edited in place. A correction is a delete followed by a new add.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) id: TransactionId,
    #[serde(default)]
    pub(crate) merchant: String,
    #[serde(default)]
    pub(crate) amount: Amount,
    #[serde(default)]
    pub(crate) account: String,
    pub(crate) day: u8,
    #[serde(default)]
    pub(crate) tag: Tag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) person: Option<String>,
    #[serde(default)]
    pub(crate) recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) splits: Option<Vec<Split>>,
}

impl Transaction {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn merchant(&self) -> &str {
        &self.merchant
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn is_income(&self) -> bool {
        self.tag.is_income()
    }

    pub fn person(&self) -> Option<&str> {
        self.person.as_deref()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring
    }

    /// The splits, or an empty slice if the transaction was not split.
    pub fn splits(&self) -> &[Split] {
        self.splits.as_deref().unwrap_or_default()
    }

    /// Every non-empty person name on this transaction: its own, then each split's.
    pub fn people(&self) -> impl Iterator<Item = &str> {
        self.person()
            .into_iter()
            .chain(self.splits().iter().filter_map(|s| s.person()))
            .filter(|p| !p.trim().is_empty())
    }
}

/// The fields of the new-transaction form before it is committed to the ledger.
///
/// Splits are not part of the draft; they live in the ledger's split buffer and are attached at
/// commit time when `split` is true.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub merchant: String,
    pub amount: Amount,
    pub account: String,
    pub day: u8,
    pub tag: Tag,
    pub person: Option<String>,
    pub recurring: bool,
    pub split: bool,
}

impl TransactionDraft {
    pub fn new(
        merchant: impl Into<String>,
        amount: impl Into<Amount>,
        account: impl Into<String>,
        day: u8,
        tag: impl Into<Tag>,
    ) -> Self {
        Self {
            merchant: merchant.into(),
            amount: amount.into(),
            account: account.into(),
            day,
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn person(mut self, person: impl Into<String>) -> Self {
        self.person = non_empty(person.into());
        self
    }

    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    pub fn split(mut self, split: bool) -> Self {
        self.split = split;
        self
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
