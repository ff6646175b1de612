//! Storage entities (SurrealDB documents)

pub mod branch;
pub mod customer;
pub mod order;
pub mod serde_helpers;

pub use branch::Branch;
pub use customer::Customer;
pub use order::OrderRecord;
