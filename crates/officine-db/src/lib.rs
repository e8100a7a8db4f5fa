//! # officine-db: Database Layer for Officine POS
//!
//! SQLite persistence for the pharmacy: catalog, stock lots, customers,
//! sales. Uses sqlx with embedded migrations and a WAL-mode pool.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  officine-checkout (orchestration)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   officine-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ product, lot, │    │  (embedded)  │  │   │
//! │  │   │   SqlitePool  │    │ sale, client, │    │              │  │   │
//! │  │   │   WAL mode    │    │ settings      │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sale commit is the one place with a concurrency contract: every lot
//! decrement and caution deduction is conditional, the whole sale is one
//! transaction, and a stale snapshot surfaces as [`DbError::Conflict`] for
//! the caller to re-plan against fresh state.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::lot::LotRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{LedgerEffect, SaleCommit, SaleRepository};
pub use repository::settings::{SettingsRepository, TenantSettings};
