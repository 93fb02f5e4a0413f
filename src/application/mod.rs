// Application layer - ledger operations over the account store.
// Both surfaces (GraphQL API and bot) go through LedgerService; neither
// touches the repository directly.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
