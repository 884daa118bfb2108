//! Pure validation and normalization of transaction payloads.
//!
//! [`normalize`] turns a caller-supplied [`TransactionDraft`] into a
//! well-formed [`Transaction`] or fails with every violated field at once
//! (no short-circuit on the first failure). It touches no database, so the
//! rules are testable in isolation.
//!
//! Normalization always re-derives the transaction kind from the sign of
//! the amount, whatever the caller claimed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    EngineError, FieldViolation, ResultEngine, SplitParticipant, Transaction, ValidationErrors,
    transactions::{RecurringInterval, SplitDetails, TransactionKind},
};

pub(crate) const TITLE_MAX: usize = 100;
pub(crate) const CATEGORY_MAX: usize = 50;
pub(crate) const DESCRIPTION_MAX: usize = 500;
pub(crate) const TAG_MAX: usize = 20;
pub(crate) const LOCATION_MAX: usize = 100;
pub(crate) const PAYMENT_METHOD_MAX: usize = 50;

/// Candidate transaction as submitted by a caller.
///
/// `kind` is accepted for symmetry with the stored record but is always
/// overridden by the sign of `amount_minor`.
#[derive(Clone, Debug, Default)]
pub struct TransactionDraft {
    pub title: String,
    pub amount_minor: i64,
    pub kind: Option<TransactionKind>,
    pub category: String,
    pub description: Option<String>,
    /// Effective date; defaults to "now" when absent.
    pub occurred_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub split: Option<SplitDraft>,
    pub location: Option<String>,
    pub payment_method: Option<String>,
    pub receipt: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct SplitDraft {
    pub total_minor: i64,
    pub participants: Vec<ParticipantDraft>,
}

#[derive(Clone, Debug, Default)]
pub struct ParticipantDraft {
    pub name: String,
    pub amount_minor: i64,
    pub paid: bool,
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn check_len(
    violations: &mut Vec<FieldViolation>,
    field: &str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value
        && value.chars().count() > max
    {
        violations.push(FieldViolation::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
}

/// Validates and normalizes a draft into a persistable [`Transaction`].
///
/// Field violations are collected and returned together as
/// [`EngineError::Validation`]. A split whose participant amounts do not
/// sum to its total is rejected with [`EngineError::Conflict`] after the
/// field checks pass.
pub fn normalize(
    owner_id: &str,
    draft: &TransactionDraft,
    now: DateTime<Utc>,
) -> ResultEngine<Transaction> {
    let mut violations: Vec<FieldViolation> = Vec::new();

    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        violations.push(FieldViolation::new("owner_id", "must not be empty"));
    }

    let title = draft.title.trim();
    if title.is_empty() {
        violations.push(FieldViolation::new("title", "must not be empty"));
    }
    check_len(&mut violations, "title", Some(title), TITLE_MAX);

    if draft.amount_minor == 0 {
        violations.push(FieldViolation::new("amount_minor", "must not be zero"));
    }

    let category = draft.category.trim();
    if category.is_empty() {
        violations.push(FieldViolation::new("category", "must not be empty"));
    }
    check_len(&mut violations, "category", Some(category), CATEGORY_MAX);

    let description = normalize_optional_text(draft.description.as_deref());
    check_len(
        &mut violations,
        "description",
        description.as_deref(),
        DESCRIPTION_MAX,
    );

    let location = normalize_optional_text(draft.location.as_deref());
    check_len(&mut violations, "location", location.as_deref(), LOCATION_MAX);

    let payment_method = normalize_optional_text(draft.payment_method.as_deref());
    check_len(
        &mut violations,
        "payment_method",
        payment_method.as_deref(),
        PAYMENT_METHOD_MAX,
    );

    let receipt = normalize_optional_text(draft.receipt.as_deref());

    // Tags are trimmed and empty entries dropped; order is preserved.
    let mut tags: Vec<String> = Vec::with_capacity(draft.tags.len());
    for (i, tag) in draft.tags.iter().enumerate() {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > TAG_MAX {
            violations.push(FieldViolation::new(
                format!("tags[{i}]"),
                format!("must be at most {TAG_MAX} characters"),
            ));
        }
        tags.push(tag.to_string());
    }

    let split = match &draft.split {
        None => None,
        Some(split_draft) => {
            validate_split(&mut violations, split_draft);
            Some(SplitDetails {
                total_minor: split_draft.total_minor,
                participants: split_draft
                    .participants
                    .iter()
                    .map(|p| SplitParticipant {
                        id: Uuid::new_v4(),
                        name: p.name.trim().to_string(),
                        amount_minor: p.amount_minor,
                        paid: p.paid,
                    })
                    .collect(),
            })
        }
    };

    if !violations.is_empty() {
        return Err(EngineError::Validation(ValidationErrors(violations)));
    }

    // Field checks passed; enforce the split-sum invariant strictly.
    if let Some(split) = &split {
        let sum: i64 = split.participants.iter().map(|p| p.amount_minor).sum();
        if sum != split.total_minor {
            return Err(EngineError::Conflict(format!(
                "split participant amounts sum to {sum}, expected {}",
                split.total_minor
            )));
        }
    }

    Ok(Transaction {
        id: Uuid::new_v4(),
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        amount_minor: draft.amount_minor,
        kind: TransactionKind::from_amount(draft.amount_minor),
        category: category.to_string(),
        description,
        occurred_at: draft.occurred_at.unwrap_or(now),
        tags,
        is_recurring: draft.is_recurring,
        recurring_interval: draft.recurring_interval,
        split,
        location,
        payment_method,
        receipt,
        created_at: now,
        updated_at: now,
    })
}

fn validate_split(violations: &mut Vec<FieldViolation>, split: &SplitDraft) {
    if split.participants.is_empty() {
        violations.push(FieldViolation::new(
            "split.participants",
            "must not be empty",
        ));
    }
    if split.total_minor < 0 {
        violations.push(FieldViolation::new(
            "split.total_minor",
            "must not be negative",
        ));
    }

    let mut seen: Vec<&str> = Vec::with_capacity(split.participants.len());
    for (i, participant) in split.participants.iter().enumerate() {
        let name = participant.name.trim();
        if name.is_empty() {
            violations.push(FieldViolation::new(
                format!("split.participants[{i}].name"),
                "must not be empty",
            ));
        } else if seen.contains(&name) {
            violations.push(FieldViolation::new(
                format!("split.participants[{i}].name"),
                "duplicate participant name",
            ));
        } else {
            seen.push(name);
        }

        if participant.amount_minor < 0 {
            violations.push(FieldViolation::new(
                format!("split.participants[{i}].amount_minor"),
                "must not be negative",
            ));
        }
    }
}
