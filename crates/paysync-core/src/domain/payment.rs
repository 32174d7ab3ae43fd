//! Payment domain entity
//!
//! This module defines the `Payment` entity, the record synchronized between
//! the on-device store and the remote backend, together with its
//! per-record `SyncStatus`.
//!
//! ## State Machine
//!
//! ```text
//!     ┌─────────┐   upload confirmed   ┌──────────┐    local edit    ┌──────────┐
//!     │  Local  │ ───────────────────► │  Synced  │ ───────────────► │ Modified │
//!     │(offline)│                      │          │ ◄─────────────── │ (dirty)  │
//!     └─────────┘                      └──────────┘ upload confirmed └──────────┘
//!          │                                │                             │
//!          │ delete (removed at once)       │ delete                      │ delete
//!          ▼                                ▼                             ▼
//!       (gone)                         ┌──────────────────────────────────────┐
//!                                      │ Deleted (tombstone, awaiting remote) │
//!                                      └──────────────────────────────────────┘
//! ```
//!
//! `Deleted` is terminal: the record leaves the local store once the remote
//! delete is confirmed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::DomainError;
use super::newtypes::{CurrencyCode, EventRef, GroupId, PaymentId};

// ============================================================================
// SyncStatus enum
// ============================================================================

/// Synchronization status of a single payment record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Created offline, never sent to the remote store
    #[default]
    Local,
    /// Matches the remote copy
    Synced,
    /// Changed locally after the last successful sync
    Modified,
    /// Tombstoned locally, pending remote deletion
    Deleted,
}

impl SyncStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [SyncStatus; 4] = [
        SyncStatus::Local,
        SyncStatus::Synced,
        SyncStatus::Modified,
        SyncStatus::Deleted,
    ];

    /// Returns true if the record still has to reach the remote store
    pub fn is_pending(&self) -> bool {
        !matches!(self, SyncStatus::Synced)
    }

    /// Returns true if the record must be (re-)uploaded
    pub fn needs_upload(&self) -> bool {
        matches!(self, SyncStatus::Local | SyncStatus::Modified)
    }

    /// Returns true if the local copy carries an uncommitted change
    ///
    /// Dirty records win over remote data during download.
    pub fn is_dirty(&self) -> bool {
        matches!(
            self,
            SyncStatus::Local | SyncStatus::Modified | SyncStatus::Deleted
        )
    }

    /// Returns the storage name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Local => "local",
            SyncStatus::Synced => "synced",
            SyncStatus::Modified => "modified",
            SyncStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(SyncStatus::Local),
            "synced" => Ok(SyncStatus::Synced),
            "modified" => Ok(SyncStatus::Modified),
            "deleted" => Ok(SyncStatus::Deleted),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

// ============================================================================
// Category enum
// ============================================================================

/// Spending category tag of a payment
///
/// Unknown names (e.g. written by a newer client) read back as `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Category {
    Housing,
    Utilities,
    Subscriptions,
    Insurance,
    Loans,
    Transport,
    Health,
    Education,
    Entertainment,
    #[default]
    Other,
}

impl Category {
    /// Returns the wire name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Housing => "housing",
            Category::Utilities => "utilities",
            Category::Subscriptions => "subscriptions",
            Category::Insurance => "insurance",
            Category::Loans => "loans",
            Category::Transport => "transport",
            Category::Health => "health",
            Category::Education => "education",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
        }
    }

    /// Parses a wire name, mapping unknown names to `Other`
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "housing" => Ok(Category::Housing),
            "utilities" => Ok(Category::Utilities),
            "subscriptions" => Ok(Category::Subscriptions),
            "insurance" => Ok(Category::Insurance),
            "loans" => Ok(Category::Loans),
            "transport" => Ok(Category::Transport),
            "health" => Ok(Category::Health),
            "education" => Ok(Category::Education),
            "entertainment" => Ok(Category::Entertainment),
            "other" => Ok(Category::Other),
            other => Err(DomainError::ValidationFailed(format!(
                "Unknown category: {other}"
            ))),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Category::from_name_lossy(&name))
    }
}

// ============================================================================
// PaymentRecord - wire/storage shape
// ============================================================================

/// Flat wire/storage representation of a payment
///
/// ```json
/// {"id": "…", "name": "Rent", "amount": "950.00", "currency": "EUR",
///  "dueDate": "2026-11-01T00:00:00Z", "isPaid": false, "category": "housing",
///  "eventRef": null, "groupId": null, "syncStatus": "local", "lastSyncedAt": null}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub due_date: DateTime<Utc>,
    pub is_paid: bool,
    pub category: Category,
    pub event_ref: Option<EventRef>,
    pub group_id: Option<GroupId>,
    pub sync_status: SyncStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
}

// ============================================================================
// PaymentDraft and PaymentEdit
// ============================================================================

/// Input for creating a new payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub name: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub due_date: DateTime<Utc>,
    pub category: Category,
    pub is_paid: bool,
    pub event_ref: Option<EventRef>,
    pub group_id: Option<GroupId>,
}

impl PaymentDraft {
    /// Creates an unpaid draft without calendar or group links
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        currency: CurrencyCode,
        due_date: DateTime<Utc>,
        category: Category,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            currency,
            due_date,
            category,
            is_paid: false,
            event_ref: None,
            group_id: None,
        }
    }

    /// Links the draft to a payment group
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Links the draft to an external calendar event
    pub fn with_event_ref(mut self, event_ref: EventRef) -> Self {
        self.event_ref = Some(event_ref);
        self
    }
}

/// A partial update of a payment's user-editable fields
///
/// `None` leaves a field untouched. For the optional links, `Some(None)`
/// clears the link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentEdit {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_paid: Option<bool>,
    pub category: Option<Category>,
    pub event_ref: Option<Option<EventRef>>,
    pub group_id: Option<Option<GroupId>>,
}

impl PaymentEdit {
    /// Returns true if the edit changes nothing
    pub fn is_empty(&self) -> bool {
        *self == PaymentEdit::default()
    }
}

// ============================================================================
// Payment struct
// ============================================================================

/// A payment tracked by the user, synchronized with the remote store
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    id: PaymentId,
    name: String,
    amount: Decimal,
    currency: CurrencyCode,
    due_date: DateTime<Utc>,
    is_paid: bool,
    category: Category,
    event_ref: Option<EventRef>,
    group_id: Option<GroupId>,
    sync_status: SyncStatus,
    last_synced_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Creates a new locally-owned payment with `Local` status
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationFailed` if the name is blank, or
    /// `DomainError::InvalidAmount` if the amount is negative.
    pub fn new(draft: PaymentDraft) -> Result<Self, DomainError> {
        let name = validate_name(&draft.name)?;
        validate_amount(draft.amount)?;

        Ok(Self {
            id: PaymentId::new(),
            name,
            amount: draft.amount,
            currency: draft.currency,
            due_date: draft.due_date,
            is_paid: draft.is_paid,
            category: draft.category,
            event_ref: draft.event_ref,
            group_id: draft.group_id,
            sync_status: SyncStatus::Local,
            last_synced_at: None,
        })
    }

    // --- Getters ---

    /// Returns the payment's unique identifier
    pub fn id(&self) -> &PaymentId {
        &self.id
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the exact monetary amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency code
    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    /// Returns the due date
    pub fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    /// Returns true if the payment has been paid
    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    /// Returns the category tag
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns the linked calendar event, if any
    pub fn event_ref(&self) -> Option<&EventRef> {
        self.event_ref.as_ref()
    }

    /// Returns the payment group, if any
    pub fn group_id(&self) -> Option<&GroupId> {
        self.group_id.as_ref()
    }

    /// Returns the current sync status
    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    /// Returns when the remote store last confirmed this record
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    /// Returns true if the record is tombstoned
    pub fn is_deleted(&self) -> bool {
        matches!(self.sync_status, SyncStatus::Deleted)
    }

    /// Returns true if both records carry the same user-visible content
    ///
    /// Sync bookkeeping (`sync_status`, `last_synced_at`) is ignored.
    pub fn same_content(&self, other: &Payment) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.amount == other.amount
            && self.currency == other.currency
            && self.due_date == other.due_date
            && self.is_paid == other.is_paid
            && self.category == other.category
            && self.event_ref == other.event_ref
            && self.group_id == other.group_id
    }

    // --- Local edits ---

    /// Applies a user edit, flipping the status to reflect the local change
    ///
    /// A `Synced` record becomes `Modified`; `Local` and `Modified` keep their
    /// status. All fields are validated before anything is changed.
    ///
    /// # Returns
    /// `true` if any field changed
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` for tombstoned records and a
    /// validation error for invalid field values.
    pub fn apply_edit(&mut self, edit: PaymentEdit) -> Result<bool, DomainError> {
        if self.is_deleted() {
            return Err(DomainError::InvalidState {
                from: self.sync_status.to_string(),
                to: SyncStatus::Modified.to_string(),
            });
        }

        let name = edit.name.as_deref().map(validate_name).transpose()?;
        if let Some(amount) = edit.amount {
            validate_amount(amount)?;
        }

        let before = self.clone();

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(amount) = edit.amount {
            self.amount = amount;
        }
        if let Some(currency) = edit.currency {
            self.currency = currency;
        }
        if let Some(due_date) = edit.due_date {
            self.due_date = due_date;
        }
        if let Some(is_paid) = edit.is_paid {
            self.is_paid = is_paid;
        }
        if let Some(category) = edit.category {
            self.category = category;
        }
        if let Some(event_ref) = edit.event_ref {
            self.event_ref = event_ref;
        }
        if let Some(group_id) = edit.group_id {
            self.group_id = group_id;
        }

        let changed = !self.same_content(&before);
        if changed && self.sync_status == SyncStatus::Synced {
            self.transition_to(SyncStatus::Modified)?;
        }
        Ok(changed)
    }
}

// ============================================================================
// State transition methods
// ============================================================================

impl Payment {
    /// Checks if a status transition is valid
    ///
    /// Valid transitions:
    /// - Local -> Synced (upload confirmed), Deleted
    /// - Synced -> Synced (refreshed from remote), Modified, Deleted
    /// - Modified -> Modified, Synced (upload confirmed), Deleted
    /// - Deleted -> (terminal state, no transitions)
    pub fn can_transition_to(&self, target: SyncStatus) -> bool {
        match (self.sync_status, target) {
            (SyncStatus::Local, SyncStatus::Synced) => true,
            (SyncStatus::Local, SyncStatus::Deleted) => true,

            (SyncStatus::Synced, SyncStatus::Synced) => true,
            (SyncStatus::Synced, SyncStatus::Modified) => true,
            (SyncStatus::Synced, SyncStatus::Deleted) => true,

            (SyncStatus::Modified, SyncStatus::Modified) => true,
            (SyncStatus::Modified, SyncStatus::Synced) => true,
            (SyncStatus::Modified, SyncStatus::Deleted) => true,

            _ => false,
        }
    }

    fn transition_to(&mut self, target: SyncStatus) -> Result<(), DomainError> {
        if !self.can_transition_to(target) {
            return Err(DomainError::InvalidState {
                from: self.sync_status.to_string(),
                to: target.to_string(),
            });
        }
        self.sync_status = target;
        Ok(())
    }

    /// Records a remote confirmation of this record
    ///
    /// Sets the status to `Synced` and stamps `last_synced_at`.
    pub fn confirm_synced(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition_to(SyncStatus::Synced)?;
        self.last_synced_at = Some(at);
        Ok(())
    }

    /// Tombstones the record until the remote delete is confirmed
    pub fn mark_deleted(&mut self) -> Result<(), DomainError> {
        self.transition_to(SyncStatus::Deleted)
    }
}

// ============================================================================
// Record conversion
// ============================================================================

impl From<&Payment> for PaymentRecord {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            name: payment.name.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
            due_date: payment.due_date,
            is_paid: payment.is_paid,
            category: payment.category,
            event_ref: payment.event_ref,
            group_id: payment.group_id,
            sync_status: payment.sync_status,
            last_synced_at: payment.last_synced_at,
        }
    }
}

impl TryFrom<PaymentRecord> for Payment {
    type Error = DomainError;

    /// Rebuilds a payment from its stored shape, re-checking invariants
    fn try_from(record: PaymentRecord) -> Result<Self, Self::Error> {
        let name = validate_name(&record.name)?;
        validate_amount(record.amount)?;

        if record.sync_status == SyncStatus::Synced && record.last_synced_at.is_none() {
            return Err(DomainError::ValidationFailed(format!(
                "synced payment {} has no last_synced_at",
                record.id
            )));
        }

        Ok(Self {
            id: record.id,
            name,
            amount: record.amount,
            currency: record.currency,
            due_date: record.due_date,
            is_paid: record.is_paid,
            category: record.category,
            event_ref: record.event_ref,
            group_id: record.group_id,
            sync_status: record.sync_status,
            last_synced_at: record.last_synced_at,
        })
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::ValidationFailed(
            "payment name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_amount(amount: Decimal) -> Result<(), DomainError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::InvalidAmount(format!(
            "amount cannot be negative: {amount}"
        )));
    }
    Ok(())
}
