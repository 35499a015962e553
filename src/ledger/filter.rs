use crate::model::{Tag, Transaction};
use serde::{Deserialize, Serialize};

/// Criteria for narrowing the visible transactions. Every criterion that is set must match; an
/// unset or blank criterion matches everything.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Filter {
    /// Case-insensitive substring of the merchant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Exact tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Exact account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Exact person, matched against the transaction's own person or any split's person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
}

fn given(criterion: &Option<String>) -> Option<&str> {
    criterion.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        given(&self.search).is_none()
            && given(&self.tag).is_none()
            && given(&self.account).is_none()
            && given(&self.person).is_none()
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(search) = given(&self.search) {
            if !txn
                .merchant()
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if let Some(tag) = given(&self.tag) {
            if *txn.tag() != Tag::new(tag) {
                return false;
            }
        }
        if let Some(account) = given(&self.account) {
            if txn.account() != account {
                return false;
            }
        }
        if let Some(person) = given(&self.person) {
            if !txn.people().any(|p| p == person) {
                return false;
            }
        }
        true
    }
}
