use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, normalize_optional};
use crate::error::AppError;

/// Largest amount a single IOU may record.
pub const MAX_IOU_AMOUNT: f64 = 1_000_000_000.0;

/// One debt: `debtor_id` owes `owner_id` the given amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IouEntry {
    pub id: String,
    pub trip_id: String,
    pub owner_id: String,
    pub debtor_id: String,
    pub amount: f64,
    pub note: Option<String>,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IouDraft {
    /// Present when editing an existing entry.
    #[serde(default)]
    pub id: Option<String>,
    pub owner_id: String,
    pub debtor_id: String,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl IouDraft {
    pub fn validate(&self, member_ids: &[String]) -> Result<(), AppError> {
        let rounded = round_cents(self.amount);
        if !rounded.is_finite() || rounded <= 0.0 {
            return Err(AppError::bad_request("Amount must be greater than zero"));
        }
        if rounded > MAX_IOU_AMOUNT {
            return Err(AppError::bad_request(format!(
                "Amount cannot exceed {MAX_IOU_AMOUNT:.0}"
            )));
        }
        if self.owner_id == self.debtor_id {
            return Err(AppError::bad_request("A member cannot owe themselves"));
        }
        for id in [&self.owner_id, &self.debtor_id] {
            if !member_ids.contains(id) {
                return Err(AppError::bad_request(format!(
                    "{id} is not a member of this trip"
                )));
            }
        }
        Ok(())
    }
}

impl IouEntry {
    pub fn new(trip_id: &str, draft: IouDraft) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("iou"),
            trip_id: trip_id.to_string(),
            owner_id: draft.owner_id,
            debtor_id: draft.debtor_id,
            amount: round_cents(draft.amount),
            note: normalize_optional(draft.note),
            created_date: now,
            last_modified_date: now,
        }
    }

    pub fn apply(&mut self, draft: IouDraft) {
        self.owner_id = draft.owner_id;
        self.debtor_id = draft.debtor_id;
        self.amount = round_cents(draft.amount);
        self.note = normalize_optional(draft.note);
        self.last_modified_date = Utc::now();
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Total owed to each member, counting only positive amounts.
pub fn totals_by_owner(entries: &[IouEntry]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .filter(|entry| entry.amount > 0.0)
        .fold(BTreeMap::new(), |mut totals, entry| {
            *totals.entry(entry.owner_id.clone()).or_insert(0.0) += entry.amount;
            totals
        })
}

pub fn sort_ious(entries: &mut [IouEntry]) {
    entries.sort_by(|a, b| b.last_modified_date.cmp(&a.last_modified_date));
}
