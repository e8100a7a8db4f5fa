//! # Domain Types
//!
//! Core domain types used throughout Officine POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Lot        │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  cip (business) │   │  lot_number     │   │  kind (payer)   │       │
//! │  │  price_ht/ttc   │   │  remaining_qty  │   │  debt / caution │       │
//! │  │  category ref   │   │  expiry_date    │   │  credit ceiling │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   CartLine      │   │ TransactionTot. │   │  Sale/SaleLine  │       │
//! │  │  price snapshot │   │ produced fresh  │   │  frozen history │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (cip, lot_number, receipt_number) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate, SaleCoefficient};

// =============================================================================
// Pricing Category
// =============================================================================

/// A pricing category groups the fiscal parameters of a product family:
/// TVA rate, additional-centime rate, and the coefficient applied to a
/// purchase cost to obtain the HT shelf price.
///
/// Categories are owned by product families and referenced (never copied)
/// by products, so a rate change propagates to the whole family at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PricingCategory {
    pub id: String,

    /// Display name, e.g. "Spécialités 18%".
    pub name: String,

    /// TVA rate in basis points (1800 = 18%).
    pub vat_rate_bps: u32,

    /// Additional centime rate in basis points (500 = 5%).
    pub centime_rate_bps: u32,

    /// Purchase-cost multiplier in basis points of unity (12500 = ×1.25).
    pub sale_coefficient_bps: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PricingCategory {
    #[inline]
    pub fn vat_rate(&self) -> Rate {
        Rate::from_bps(self.vat_rate_bps)
    }

    #[inline]
    pub fn centime_rate(&self) -> Rate {
        Rate::from_bps(self.centime_rate_bps)
    }

    #[inline]
    pub fn sale_coefficient(&self) -> SaleCoefficient {
        SaleCoefficient::from_bps(self.sale_coefficient_bps)
    }
}

// =============================================================================
// Product Family
// =============================================================================

/// A product family (antibiotiques, antalgiques, parapharmacie, ...).
/// Owns the pricing category its products share.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductFamily {
    pub id: String,
    pub name: String,
    pub pricing_category_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the pharmacy catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: String,

    /// CIP product identification code - business identifier.
    pub cip: String,

    /// DCI (international non-proprietary name), when known.
    pub dci: Option<String>,

    /// Display name shown to the cashier and on the ticket.
    pub name: String,

    /// Shelf price excluding taxes, in minor units.
    pub price_ht_cents: i64,

    /// Shelf price including TVA and centime additionnel, in minor units.
    /// Must stay coherent with `price_ht_cents` under the category's rates.
    pub price_ttc_cents: i64,

    /// Pricing category reference (rates + coefficient).
    pub pricing_category_id: String,

    /// Family reference.
    pub family_id: String,

    /// Per-product stock threshold overrides. An unset field falls through
    /// to the tenant setting, then to the built-in default.
    pub alert_threshold: Option<i64>,
    pub limit_threshold: Option<i64>,
    pub maximum_threshold: Option<i64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price_ht(&self) -> Money {
        Money::from_cents(self.price_ht_cents)
    }

    #[inline]
    pub fn price_ttc(&self) -> Money {
        Money::from_cents(self.price_ttc_cents)
    }

    /// Builds a cart line from this product with prices and rates frozen
    /// at the moment of adding.
    pub fn to_cart_line(&self, category: &PricingCategory, quantity: i64) -> CartLine {
        CartLine {
            product_id: self.id.clone(),
            quantity,
            unit_price_ht_cents: self.price_ht_cents,
            unit_price_ttc_cents: self.price_ttc_cents,
            vat_rate_bps: category.vat_rate_bps,
            centime_rate_bps: category.centime_rate_bps,
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a checkout cart.
///
/// Prices and rates are snapshots frozen when the line was built; a later
/// catalog change never alters a cart already being priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,

    /// Units sold. Strictly positive.
    pub quantity: i64,

    /// Unit price excluding taxes.
    pub unit_price_ht_cents: i64,

    /// Unit price including taxes.
    pub unit_price_ttc_cents: i64,

    /// TVA rate in basis points.
    pub vat_rate_bps: u32,

    /// Additional centime rate in basis points.
    pub centime_rate_bps: u32,
}

impl CartLine {
    #[inline]
    pub fn unit_price_ht(&self) -> Money {
        Money::from_cents(self.unit_price_ht_cents)
    }

    #[inline]
    pub fn unit_price_ttc(&self) -> Money {
        Money::from_cents(self.unit_price_ttc_cents)
    }

    /// Line total excluding taxes (unit HT × quantity).
    pub fn line_total_ht(&self) -> Money {
        self.unit_price_ht().multiply_quantity(self.quantity)
    }

    /// TVA amount for the whole line.
    pub fn vat_amount(&self) -> Money {
        self.line_total_ht().apply_rate(Rate::from_bps(self.vat_rate_bps))
    }

    /// Additional centime amount for the whole line.
    pub fn centime_amount(&self) -> Money {
        self.line_total_ht().apply_rate(Rate::from_bps(self.centime_rate_bps))
    }

    /// Line total including taxes, derived from the HT side.
    pub fn line_total_ttc(&self) -> Money {
        self.line_total_ht() + self.vat_amount() + self.centime_amount()
    }

    /// Checks the frozen unit TTC matches the unit HT under the frozen
    /// rates, within one minor unit of rounding.
    pub fn is_ttc_coherent(&self) -> bool {
        let ht = self.unit_price_ht();
        let derived = ht
            + ht.apply_rate(Rate::from_bps(self.vat_rate_bps))
            + ht.apply_rate(Rate::from_bps(self.centime_rate_bps));
        (derived.cents() - self.unit_price_ttc_cents).abs() <= 1
    }
}

// =============================================================================
// Payer Profile
// =============================================================================

/// The payer category, as a tagged variant.
///
/// ## Why an enum?
/// Insurance coverage applies only to insured payers and the automatic
/// discount only to special payers; the two can never combine. Carrying
/// the rate inside the variant makes that mutual exclusivity a property
/// of the type instead of a convention over optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayerKind {
    /// Walk-in customer, pays the full TTC.
    Ordinary,

    /// Insured customer; the organism covers `coverage_bps` of the TTC.
    Insured { coverage_bps: u32 },

    /// Conventioned customer with an automatic discount on their share.
    Special { discount_bps: u32 },
}

impl PayerKind {
    #[inline]
    pub const fn is_insured(&self) -> bool {
        matches!(self, PayerKind::Insured { .. })
    }
}

impl Default for PayerKind {
    fn default() -> Self {
        PayerKind::Ordinary
    }
}

/// Everything the pricing calculator and the credit guard need to know
/// about who is paying. A snapshot: the engine never reads the customer
/// record directly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PayerProfile {
    pub kind: PayerKind,

    /// Ticket modérateur rate in basis points. Applies only to non-insured
    /// payers, and only when strictly positive.
    pub ticket_moderateur_bps: u32,

    /// Credit ceiling in minor units. Zero means "no credit allowed".
    pub credit_ceiling_cents: i64,

    /// Outstanding debt in minor units.
    pub current_debt_cents: i64,

    /// Prepaid caution wallet balance in minor units.
    pub caution_balance_cents: i64,

    /// Whether the payer may defer payment to their credit account.
    pub may_use_credit: bool,
}

impl PayerProfile {
    /// Anonymous walk-in payer: full TTC, no deferral of any kind.
    pub fn ordinary() -> Self {
        PayerProfile::default()
    }

    #[inline]
    pub fn credit_ceiling(&self) -> Money {
        Money::from_cents(self.credit_ceiling_cents)
    }

    #[inline]
    pub fn current_debt(&self) -> Money {
        Money::from_cents(self.current_debt_cents)
    }

    #[inline]
    pub fn caution_balance(&self) -> Money {
        Money::from_cents(self.caution_balance_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record, source of the payer snapshot used at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub full_name: String,
    pub kind: PayerKind,
    pub ticket_moderateur_bps: u32,
    pub credit_ceiling_cents: i64,
    pub current_debt_cents: i64,
    pub caution_balance_cents: i64,
    pub may_use_credit: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Freezes the payer-relevant fields into a profile snapshot.
    pub fn profile(&self) -> PayerProfile {
        PayerProfile {
            kind: self.kind,
            ticket_moderateur_bps: self.ticket_moderateur_bps,
            credit_ceiling_cents: self.credit_ceiling_cents,
            current_debt_cents: self.current_debt_cents,
            caution_balance_cents: self.caution_balance_cents,
            may_use_credit: self.may_use_credit,
        }
    }
}

// =============================================================================
// Lot
// =============================================================================

/// A physical stock lot of a product.
///
/// Lots of the same product are totally ordered by expiry date ascending,
/// ties broken by receipt order. Created on reception, decremented on each
/// sale, never negative, no longer eligible once empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lot {
    pub id: String,
    pub product_id: String,

    /// Manufacturer lot number printed on the box.
    pub lot_number: String,

    /// Quantity received.
    pub initial_quantity: i64,

    /// Quantity still on the shelf. Never negative.
    pub remaining_quantity: i64,

    /// Purchase cost per unit, in minor units.
    pub unit_cost_cents: i64,

    /// Expiry date printed on the box.
    pub expiry_date: NaiveDate,

    /// When the lot entered stock. Tie-breaker for equal expiry dates.
    pub received_at: DateTime<Utc>,
}

impl Lot {
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    /// True when the expiry date is strictly before the given day.
    #[inline]
    pub fn is_expired(&self, on: NaiveDate) -> bool {
        self.expiry_date < on
    }

    /// True when the lot expires within `horizon_days` of the given day
    /// (and is not already expired).
    pub fn expires_within(&self, on: NaiveDate, horizon_days: i64) -> bool {
        !self.is_expired(on) && (self.expiry_date - on).num_days() <= horizon_days
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is in progress (lines being added).
    Draft,
    /// Sale has been paid and stock consumed.
    Completed,
    /// Sale was cancelled; stock and ledgers were restored.
    Voided,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Draft
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Remainder charged to the customer's credit account.
    Credit,
    /// Remainder deducted from the customer's prepaid caution wallet.
    Caution,
}

impl PaymentMethod {
    /// Deferred methods leave a remainder to be authorized by the credit
    /// guard; immediate methods must tender the full amount due.
    #[inline]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, PaymentMethod::Credit | PaymentMethod::Caution)
    }
}

// =============================================================================
// Transaction Totals
// =============================================================================

/// The complete monetary outcome of pricing one cart for one payer.
///
/// Produced fresh by every computation and never mutated in place: any
/// input change replaces the whole structure. This keeps the calculator
/// referentially transparent and the totals trivially comparable in tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTotals {
    /// Σ(unit HT × quantity) over all lines.
    pub total_ht_cents: i64,

    /// Σ line TVA amounts.
    pub vat_cents: i64,

    /// Σ line centime additionnel amounts.
    pub centime_cents: i64,

    /// total HT + TVA + centime.
    pub subtotal_ttc_cents: i64,

    /// Part of the TTC covered by the insurance organism (insured payers
    /// only; zero otherwise).
    pub insurance_cents: i64,

    /// Ticket modérateur billed to the complementary organism (non-insured
    /// payers with a positive rate only; zero otherwise).
    pub ticket_moderateur_cents: i64,

    /// Automatic discount granted to special payers.
    pub discount_cents: i64,

    /// What the payer owes before settlement.
    pub payer_share_cents: i64,

    /// Final amount due at the till.
    pub amount_due_cents: i64,

    /// Change returned on cash tender. Zero until settlement.
    pub change_cents: i64,
}

impl TransactionTotals {
    #[inline]
    pub fn subtotal_ttc(&self) -> Money {
        Money::from_cents(self.subtotal_ttc_cents)
    }

    #[inline]
    pub fn amount_due(&self) -> Money {
        Money::from_cents(self.amount_due_cents)
    }

    #[inline]
    pub fn change_due(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed or in-progress sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub receipt_number: String,
    /// Customer reference; None for anonymous walk-in sales.
    pub customer_id: Option<String>,
    pub status: SaleStatus,
    pub total_ht_cents: i64,
    pub vat_cents: i64,
    pub centime_cents: i64,
    pub subtotal_ttc_cents: i64,
    pub insurance_cents: i64,
    pub ticket_moderateur_cents: i64,
    pub discount_cents: i64,
    pub payer_share_cents: i64,
    pub amount_due_cents: i64,
    pub change_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Rebuilds the totals structure from the persisted columns.
    pub fn totals(&self) -> TransactionTotals {
        TransactionTotals {
            total_ht_cents: self.total_ht_cents,
            vat_cents: self.vat_cents,
            centime_cents: self.centime_cents,
            subtotal_ttc_cents: self.subtotal_ttc_cents,
            insurance_cents: self.insurance_cents,
            ticket_moderateur_cents: self.ticket_moderateur_cents,
            discount_cents: self.discount_cents,
            payer_share_cents: self.payer_share_cents,
            amount_due_cents: self.amount_due_cents,
            change_cents: self.change_cents,
        }
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// CIP at time of sale (frozen).
    pub cip_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub unit_price_ht_cents: i64,
    pub unit_price_ttc_cents: i64,
    pub vat_rate_bps: u32,
    pub centime_rate_bps: u32,
    pub quantity: i64,
    pub line_total_ht_cents: i64,
    pub line_total_ttc_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a sale.
/// A sale can have several payments for split tender scenarios
/// (e.g. part cash, remainder on credit).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    /// Amount settled by this payment, in minor units.
    pub amount_cents: i64,
    /// For cash: amount the customer handed over.
    pub tendered_cents: Option<i64>,
    /// For cash: change returned.
    pub change_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
