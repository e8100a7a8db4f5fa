//! # officine-core: Pure Business Logic for Officine POS
//!
//! This crate is the **heart** of Officine POS, a pharmacy point-of-sale.
//! It contains the whole checkout engine as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Officine POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Checkout screen / Stock dashboards (UI)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              officine-checkout (orchestration)                  │   │
//! │  │    cart state, tender flow, allocation retries, alerts          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ officine-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │  │ pricing │ │ reverse │ │  stock  │ │allocation│ │ credit  │ │   │
//! │  │  │ totals, │ │ TTC →   │ │ seuils, │ │ FIFO lot │ │ crédit/ │ │   │
//! │  │  │ splits  │ │ cost    │ │ statut  │ │ plans    │ │ caution │ │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 officine-db (persistence layer)                 │   │
//! │  │        SQLite, repositories, conditional lot decrements         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Lot, Customer, Sale, ...)
//! - [`money`] - Money/Rate/SaleCoefficient integer arithmetic
//! - [`pricing`] - Taxed totals, payer splits, tender settlement
//! - [`reverse`] - Desired TTC price → cost components
//! - [`stock`] - Threshold cascade and status classification
//! - [`allocation`] - FIFO lot consumption planning
//! - [`credit`] - Credit/caution deferral guard
//! - [`error`] - Typed error taxonomy
//! - [`validation`] - Field-level validation helpers
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input,
//!    same totals. Even "today" is a parameter, never a clock read.
//! 2. **No I/O**: database, network and file system access are FORBIDDEN
//!    here; the crate is safe to call from any thread without coordination.
//! 3. **Integer Money**: all monetary values are minor units (i64);
//!    rates are basis points (u32). No floating point in computation.
//! 4. **Explicit Errors**: all errors are typed enum variants, never
//!    strings or panics; every failure is local to one transaction attempt.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod credit;
pub mod error;
pub mod money;
pub mod pricing;
pub mod reverse;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to write `use officine_core::Money` instead of
// `use officine_core::money::Money`.

pub use allocation::{allocate, ConsumptionPlan, PlanEntry, DEFAULT_EXPIRY_HORIZON_DAYS};
pub use credit::{authorize_deferral, DeferralApproval, DeferralMethod};
pub use error::{CoreError, CoreResult, CreditError, PricingError, StockError, ValidationError};
pub use money::{Money, Rate, SaleCoefficient};
pub use pricing::{compute_totals, deferred_remainder, settle};
pub use reverse::{reverse_price, shelf_price, ReversePricing, ShelfPrice};
pub use stock::{
    classify, resolve_product_thresholds, resolve_thresholds, ResolvedThresholds, StockStatus,
    StockThresholds, ThresholdOrigins, ThresholdOverride, ThresholdSource,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID for v0.1 (single-pharmacy runtime with multi-tenant
/// schema).
///
/// The database schema carries tenant_id everywhere so a future multi-site
/// deployment does not need a migration; until then every record belongs
/// to this tenant.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Catches fat-finger entries (1000 boxes instead of 10) before they reach
/// pricing or allocation.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Bounded retry budget for allocation commits that hit a concurrent
/// decrement. Each retry re-reads lot state and recomputes the plan.
pub const MAX_ALLOCATION_RETRIES: u32 = 3;
