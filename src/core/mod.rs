//! Core traits and types for the conduitweld library.
//!
//! This module contains the error taxonomy, the leaf stage traits and the
//! semantic type tags that conduits are checked against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export core items
pub use error::{Error, IntoError, Result};
pub use traits::{Consume, Produce, ProductStream, Products, Transform};
pub use types::{TypeHierarchy, TypeLattice, TypeTag};
