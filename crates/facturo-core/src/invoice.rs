//! # Invoice Module
//!
//! Totals, numbering, status rules and the printable rendering of invoices.
//!
//! ## Totals Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Invoice Totals                                       │
//! │                                                                         │
//! │  items: [{qty 2, price 100}]                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal   = Σ qty × price                          = 200             │
//! │  tax_amount = round_half_up(subtotal × 1900 / 10000) = 38              │
//! │  total      = subtotal + tax_amount − discount(10)   = 228             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ensure_non_negative() before anything is persisted                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`compute_totals`] never fails: a discount larger than subtotal + tax
//! yields a negative total. Callers that persist go through
//! [`validate_discount`] or [`build_invoice`].

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::types::{
    Customer, Invoice, InvoiceItem, InvoiceStatus, NewInvoice, PaymentMethod,
};
use crate::validation::validate_new_invoice;
use crate::INVOICE_NUMBER_PREFIX;

// =============================================================================
// Totals
// =============================================================================

/// Quantity and unit price of one line; the only inputs totals depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineAmount {
    pub const fn new(quantity: i64, unit_price: Money) -> Self {
        LineAmount {
            quantity,
            unit_price,
        }
    }
}

impl From<&InvoiceItem> for LineAmount {
    fn from(item: &InvoiceItem) -> Self {
        LineAmount::new(item.quantity, item.unit_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub total: Money,
}

impl InvoiceTotals {
    /// Fails when the discount pushed the total below zero.
    pub fn ensure_non_negative(&self, discount: Money) -> CoreResult<()> {
        if self.total.is_negative() {
            return Err(CoreError::DiscountTooLarge {
                discount: discount.cents(),
                available: (self.subtotal + self.tax_amount).cents(),
            });
        }
        Ok(())
    }
}

/// Computes subtotal, tax and grand total.
///
/// Tax is rounded half-up once, on the subtotal, not per line. Arithmetic is
/// unchecked; persisted invoices have passed [`validate_discount`].
pub fn compute_totals(lines: &[LineAmount], tax_rate: TaxRate, discount: Money) -> InvoiceTotals {
    let subtotal: Money = lines
        .iter()
        .map(|l| l.unit_price.multiply_quantity(l.quantity))
        .sum();
    let tax_amount = subtotal.calculate_tax(tax_rate);

    InvoiceTotals {
        subtotal,
        tax_amount,
        total: subtotal + tax_amount - discount,
    }
}

/// [`compute_totals`] with every step checked for overflow.
pub fn try_compute_totals(
    lines: &[LineAmount],
    tax_rate: TaxRate,
    discount: Money,
) -> CoreResult<InvoiceTotals> {
    let overflow = |context: &str| CoreError::AmountOverflow {
        context: context.to_string(),
    };

    let mut subtotal = Money::zero();
    for line in lines {
        let line_total = line
            .unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| overflow("line total"))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| overflow("subtotal"))?;
    }

    let tax_amount = subtotal.calculate_tax(tax_rate);
    let total = subtotal
        .checked_add(tax_amount)
        .and_then(|gross| gross.checked_sub(discount))
        .ok_or_else(|| overflow("total"))?;

    Ok(InvoiceTotals {
        subtotal,
        tax_amount,
        total,
    })
}

/// [`try_compute_totals`] plus the `discount <= subtotal + tax` check.
pub fn validate_discount(
    lines: &[LineAmount],
    tax_rate: TaxRate,
    discount: Money,
) -> CoreResult<InvoiceTotals> {
    let totals = try_compute_totals(lines, tax_rate, discount)?;
    totals.ensure_non_negative(discount)?;
    Ok(totals)
}

// =============================================================================
// Invoice Rules
// =============================================================================

impl Invoice {
    pub fn line_amounts(&self) -> Vec<LineAmount> {
        self.items.iter().map(LineAmount::from).collect()
    }

    pub fn totals(&self) -> InvoiceTotals {
        compute_totals(&self.line_amounts(), self.tax_rate, self.discount)
    }

    /// Status as shown to users: a Pending invoice past its due date reads
    /// as Overdue.
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        match self.status {
            InvoiceStatus::Pending if self.due_date < today => InvoiceStatus::Overdue,
            other => other,
        }
    }

    /// Returns `false` if it was already paid.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == InvoiceStatus::Paid {
            return false;
        }
        self.status = InvoiceStatus::Paid;
        self.updated_at = now;
        true
    }
}

/// `FAC-YYYYMMDD-NNNN`. `sequence` is 1-based within the day.
pub fn invoice_number_for(date: NaiveDate, sequence: u32) -> String {
    format!(
        "{}-{}-{:04}",
        INVOICE_NUMBER_PREFIX,
        date.format("%Y%m%d"),
        sequence
    )
}

/// Server-side defaults for fields a request may omit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceDefaults {
    pub tax_rate: TaxRate,
    pub due_days: u32,
}

impl Default for InvoiceDefaults {
    fn default() -> Self {
        InvoiceDefaults {
            tax_rate: TaxRate::from_bps(1900),
            due_days: 30,
        }
    }
}

/// Builds a Pending invoice from an admin or user request.
pub fn build_invoice(
    req: NewInvoice,
    defaults: InvoiceDefaults,
    invoice_number: String,
    now: DateTime<Utc>,
) -> CoreResult<Invoice> {
    validate_new_invoice(&req)?;
    if req.items.is_empty() {
        return Err(CoreError::EmptyInvoice);
    }

    let tax_rate = req.tax_rate.unwrap_or(defaults.tax_rate);
    let items: Vec<InvoiceItem> = req
        .items
        .into_iter()
        .map(|i| InvoiceItem {
            id: Uuid::new_v4().to_string(),
            description: i.description.trim().to_string(),
            quantity: i.quantity,
            unit_price: i.unit_price,
        })
        .collect();

    let lines: Vec<LineAmount> = items.iter().map(LineAmount::from).collect();
    validate_discount(&lines, tax_rate, req.discount)?;

    let issue_date = req.issue_date.unwrap_or_else(|| now.date_naive());
    let due_date = req
        .due_date
        .unwrap_or_else(|| issue_date + Duration::days(defaults.due_days as i64));

    Ok(Invoice {
        id: Uuid::new_v4().to_string(),
        invoice_number,
        customer_id: req.customer_id,
        issue_date,
        due_date,
        items,
        tax_rate,
        discount: req.discount,
        status: InvoiceStatus::Pending,
        payment_method: req.payment_method,
        created_at: now,
        updated_at: now,
    })
}

/// Builds the Paid invoice produced by checkout. Each cart line becomes an
/// invoice line described by the product name.
///
/// The amount charged is the cart total the customer saw, so the invoice
/// carries no tax and no discount. `defaults` only supplies the due date.
pub fn invoice_from_cart(
    cart: &Cart,
    customer_id: &str,
    payment_method: PaymentMethod,
    defaults: InvoiceDefaults,
    invoice_number: String,
    now: DateTime<Utc>,
) -> CoreResult<Invoice> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let items: Vec<InvoiceItem> = cart
        .items()
        .iter()
        .map(|line| InvoiceItem {
            id: Uuid::new_v4().to_string(),
            description: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect();

    let lines: Vec<LineAmount> = items.iter().map(LineAmount::from).collect();
    try_compute_totals(&lines, TaxRate::zero(), Money::zero())?;

    let issue_date = now.date_naive();
    Ok(Invoice {
        id: Uuid::new_v4().to_string(),
        invoice_number,
        customer_id: customer_id.to_string(),
        issue_date,
        due_date: issue_date + Duration::days(defaults.due_days as i64),
        items,
        tax_rate: TaxRate::zero(),
        discount: Money::zero(),
        status: InvoiceStatus::Paid,
        payment_method: Some(payment_method),
        created_at: now,
        updated_at: now,
    })
}

// =============================================================================
// Printable Rendering
// =============================================================================

const RULE_WIDTH: usize = 64;

/// Plain-text rendering for the print endpoint.
pub fn render_invoice_text(invoice: &Invoice, customer: &Customer, today: NaiveDate) -> String {
    PrintedInvoice {
        invoice,
        customer,
        today,
    }
    .to_string()
}

struct PrintedInvoice<'a> {
    invoice: &'a Invoice,
    customer: &'a Customer,
    today: NaiveDate,
}

impl fmt::Display for PrintedInvoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let PrintedInvoice {
            invoice,
            customer,
            today,
        } = self;
        let totals = invoice.totals();
        let rule = "-".repeat(RULE_WIDTH);

        writeln!(f, "INVOICE {}", invoice.invoice_number)?;
        writeln!(f, "Status: {}", invoice.effective_status(*today).label())?;
        writeln!(f, "Issue date: {}", invoice.issue_date.format("%Y-%m-%d"))?;
        writeln!(f, "Due date:   {}", invoice.due_date.format("%Y-%m-%d"))?;
        if let Some(method) = invoice.payment_method {
            writeln!(f, "Payment method: {}", method.label())?;
        }
        writeln!(f, "{rule}")?;

        writeln!(f, "Bill to:")?;
        writeln!(f, "  {}", customer.name)?;
        if let Some(addr) = &customer.address {
            writeln!(f, "  {}", addr.street)?;
            writeln!(f, "  {}, {}", addr.city, addr.country)?;
        }
        writeln!(f, "  {}", customer.email)?;
        writeln!(f, "  {}", customer.phone)?;
        writeln!(f, "{rule}")?;

        writeln!(
            f,
            "{:<30} {:>6} {:>12} {:>12}",
            "Description", "Qty", "Unit price", "Total"
        )?;
        for item in &invoice.items {
            writeln!(
                f,
                "{:<30} {:>6} {:>12} {:>12}",
                truncate(&item.description, 30),
                item.quantity,
                item.unit_price.to_string(),
                item.line_total().to_string()
            )?;
        }
        writeln!(f, "{rule}")?;

        let label_width = RULE_WIDTH - 13;
        writeln!(f, "{:>label_width$} {:>12}", "Subtotal", totals.subtotal.to_string())?;
        writeln!(
            f,
            "{:>label_width$} {:>12}",
            format!("Tax ({}%)", invoice.tax_rate.percentage()),
            totals.tax_amount.to_string()
        )?;
        if !invoice.discount.is_zero() {
            writeln!(
                f,
                "{:>label_width$} {:>12}",
                "Discount",
                format!("-{}", invoice.discount)
            )?;
        }
        writeln!(f, "{:>label_width$} {:>12}", "TOTAL", totals.total.to_string())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
