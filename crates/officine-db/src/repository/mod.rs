//! # Repository Module
//!
//! Database repository implementations for Officine POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout service                                                       │
//! │       │  db.lots().available_for_product(id)                            │
//! │       ▼                                                                 │
//! │  LotRepository ── SQL ──► SQLite                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated per aggregate                                        │
//! │  • Transaction-scoped helpers compose into the sale commit              │
//! │  • Easy to test against an in-memory database                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog: products, families, categories
//! - [`lot::LotRepository`] - Stock lots and the movement ledger
//! - [`sale::SaleRepository`] - Sales, atomic commit, void
//! - [`customer::CustomerRepository`] - Payer profiles, debt, caution
//! - [`settings::SettingsRepository`] - Tenant-level configuration

pub mod customer;
pub mod lot;
pub mod product;
pub mod sale;
pub mod settings;
