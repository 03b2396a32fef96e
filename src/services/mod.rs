//! Services for fetching account data and deriving observable values

pub mod coordinator;
pub mod normalizer;
pub mod pricing;
pub mod sensors;
pub mod source;
pub mod validation;

pub use coordinator::{Coordinator, CoordinatorData};
pub use pricing::{resolve_current_tier, resolve_next_increase, PricingResolver};
pub use source::{AccountSource, Credentials, SnapshotSource};
