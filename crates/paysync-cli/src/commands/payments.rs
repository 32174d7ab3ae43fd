//! Payment commands - add, list, edit and rm
//!
//! All writes go through the `PaymentLedger`, so new payments start as
//! `local`, edits of synced payments become `modified` and deletions of
//! synced payments are tombstoned until the next `paysync sync`.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use rust_decimal::Decimal;

use paysync_core::domain::{
    Category, CurrencyCode, EventRef, GroupId, Payment, PaymentDraft, PaymentEdit, PaymentId,
    PaymentRecord,
};

use super::App;
use crate::output::{get_formatter, plural, OutputFormat};

// ============================================================================
// add
// ============================================================================

#[derive(Debug, Args)]
pub struct AddCommand {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Amount as a decimal number, e.g. 84.50
    #[arg(long)]
    pub amount: String,

    /// ISO-4217 currency code
    #[arg(long, default_value = "EUR")]
    pub currency: String,

    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: String,

    /// Category: housing, utilities, subscriptions, insurance, loans,
    /// transport, health, education, entertainment or other
    #[arg(long, default_value = "other")]
    pub category: String,

    /// Group identifier shared by a recurring series
    #[arg(long)]
    pub group: Option<String>,

    /// Linked calendar event identifier
    #[arg(long)]
    pub event: Option<String>,

    /// Record the payment as already paid
    #[arg(long)]
    pub paid: bool,
}

impl AddCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let mut draft = PaymentDraft::new(
            self.name.clone(),
            parse_amount(&self.amount)?,
            CurrencyCode::new(self.currency.as_str())?,
            parse_due(&self.due)?,
            Category::from_str(&self.category)?,
        );
        draft.is_paid = self.paid;
        if let Some(group) = &self.group {
            draft = draft.with_group(GroupId::from_str(group)?);
        }
        if let Some(event) = &self.event {
            draft = draft.with_event_ref(EventRef::from_str(event)?);
        }

        let payment = app
            .ledger
            .create(draft)
            .await
            .context("Failed to add payment")?;

        if format.is_json() {
            formatter.print_json(&payment_json(&payment)?);
        } else {
            formatter.success(&format!("Added {} ({})", payment.name(), payment.id()));
            formatter.info("It will be uploaded on the next sync.");
        }
        Ok(())
    }
}

// ============================================================================
// list
// ============================================================================

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show unpaid payments
    #[arg(long)]
    pub unpaid: bool,
}

impl ListCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let payments: Vec<Payment> = app
            .ledger
            .list()
            .await
            .context("Failed to list payments")?
            .into_iter()
            .filter(|p| !self.unpaid || !p.is_paid())
            .collect();

        if format.is_json() {
            let rows = payments
                .iter()
                .map(payment_json)
                .collect::<Result<Vec<_>>>()?;
            formatter.print_json(&serde_json::Value::Array(rows));
            return Ok(());
        }

        if payments.is_empty() {
            formatter.info("No payments");
            return Ok(());
        }
        for payment in &payments {
            println!(
                "{}  {}  {:>12} {}  {:<14} {:<8} {}{}",
                payment.id(),
                payment.due_date().format("%Y-%m-%d"),
                payment.amount(),
                payment.currency(),
                payment.category().as_str(),
                payment.sync_status().as_str(),
                payment.name(),
                if payment.is_paid() { " (paid)" } else { "" },
            );
        }
        formatter.info(&plural(payments.len(), "payment"));
        Ok(())
    }
}

// ============================================================================
// edit
// ============================================================================

#[derive(Debug, Args)]
pub struct EditCommand {
    /// Payment identifier
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub amount: Option<String>,

    #[arg(long)]
    pub currency: Option<String>,

    /// Due date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub due: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Mark as paid
    #[arg(long, conflicts_with = "unpaid")]
    pub paid: bool,

    /// Mark as unpaid
    #[arg(long)]
    pub unpaid: bool,
}

impl EditCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let id = PaymentId::from_str(&self.id)?;
        let edit = self.to_edit()?;

        if edit.is_empty() {
            formatter.warn("Nothing to change");
            return Ok(());
        }

        let payment = app
            .ledger
            .update(&id, edit)
            .await
            .context("Failed to edit payment")?;

        if format.is_json() {
            formatter.print_json(&payment_json(&payment)?);
        } else {
            formatter.success(&format!(
                "Updated {} (now {})",
                payment.name(),
                payment.sync_status()
            ));
        }
        Ok(())
    }

    fn to_edit(&self) -> Result<PaymentEdit> {
        let is_paid = match (self.paid, self.unpaid) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Ok(PaymentEdit {
            name: self.name.clone(),
            amount: self.amount.as_deref().map(parse_amount).transpose()?,
            currency: self
                .currency
                .as_deref()
                .map(CurrencyCode::new)
                .transpose()?,
            due_date: self.due.as_deref().map(parse_due).transpose()?,
            is_paid,
            category: self
                .category
                .as_deref()
                .map(Category::from_str)
                .transpose()?,
            ..Default::default()
        })
    }
}

// ============================================================================
// rm
// ============================================================================

#[derive(Debug, Args)]
pub struct RmCommand {
    /// Payment identifier
    pub id: String,
}

impl RmCommand {
    pub async fn execute(&self, app: &App, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let id = PaymentId::from_str(&self.id)?;

        app.ledger
            .delete(&id)
            .await
            .context("Failed to delete payment")?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({"deleted": id}));
        } else {
            formatter.success(&format!("Deleted {id}"));
        }
        Ok(())
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

fn parse_amount(input: &str) -> Result<Decimal> {
    Decimal::from_str(input.trim()).with_context(|| format!("Invalid amount '{input}'"))
}

/// Accepts a plain date (midnight UTC) or a full RFC 3339 timestamp
fn parse_due(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid due date '{input}' (expected YYYY-MM-DD or RFC 3339)"))
}

fn payment_json(payment: &Payment) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(PaymentRecord::from(payment))?)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_due_plain_date() {
        assert_eq!(
            parse_due("2026-11-05").unwrap(),
            Utc.with_ymd_and_hms(2026, 11, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_due_rfc3339() {
        assert_eq!(
            parse_due("2026-11-05T10:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2026, 11, 5, 8, 30, 0).unwrap()
        );
        assert!(parse_due("next tuesday").is_err());
    }

    #[test]
    fn test_parse_amount_is_exact() {
        assert_eq!(parse_amount(" 84.50 ").unwrap(), Decimal::new(8450, 2));
        assert!(parse_amount("84,50").is_err());
    }

    #[test]
    fn test_edit_flags() {
        let cmd = EditCommand {
            id: PaymentId::new().to_string(),
            name: None,
            amount: Some("12.00".to_string()),
            currency: None,
            due: None,
            category: Some("health".to_string()),
            paid: false,
            unpaid: true,
        };
        let edit = cmd.to_edit().unwrap();
        assert_eq!(edit.amount, Some(Decimal::new(1200, 2)));
        assert_eq!(edit.category, Some(Category::Health));
        assert_eq!(edit.is_paid, Some(false));
        assert_eq!(edit.name, None);
    }
}
