//! Utility Top-Up Backend
//!
//! Prepaid electricity, water and gas top-up service:
//! - `estimator`: amount → units conversion, recorded in the `ledger`
//! - `locator`: geocoded nearest gas supplier search (haversine, `geo`)
//! - `status`: load-shedding status proxy
//! - `render`: transaction history page
//! - `predictor`: daily usage model and top-up suggestion
//! - `api_server`: Axum router tying the above to HTTP (feature `api`)

pub mod config;
pub mod estimator;
pub mod geo;
pub mod ledger;
pub mod locator;
pub mod predictor;
pub mod render;
pub mod status;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use config::ServerConfig;
pub use estimator::{Estimate, EstimateError, UtilityEstimator, UtilityKind};
pub use geo::{haversine_km, Coordinates};
pub use ledger::{MemoryLog, Transaction, TransactionLog};
pub use locator::{RankedSupplier, Supplier, SupplierLocator};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
