//! # officine-checkout: Checkout Orchestration for Officine POS
//!
//! The in-process service layer between the UI and the engine. The
//! checkout screen and the stock dashboards call these services directly;
//! there is no network boundary.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout screen / Stock dashboards (UI, out of scope)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               officine-checkout (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌───────────┐  ┌──────────┐  ┌─────────────┐  │   │
//! │  │   │   cart   │  │ checkout  │  │  stock   │  │   config    │  │   │
//! │  │   │  state   │  │  service  │  │dashboard │  │   state     │  │   │
//! │  │   └──────────┘  └───────────┘  └──────────┘  └─────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │ pure calls                │ SQL                                 │
//! │       ▼                           ▼                                     │
//! │  officine-core               officine-db                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine below is stateless and pure; this crate owns the two pieces
//! of state a till needs (the cart and the configuration) and the retry
//! discipline around the atomic sale commit.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{Cart, CartItem, CartState};
pub use checkout::{
    CheckoutReceipt, CheckoutService, ExpiryWarning, ReceiptLine, ReceiptPayment, StockAlert,
    TenderRequest,
};
pub use config::ConfigState;
pub use error::{ApiError, ErrorCode};
pub use stock::{ExpiringLot, StatusCounts, StockDashboard, StockOverview, StockOverviewRow};
