//! Simulation case tracking for design comparisons.
//!
//! A case couples fixed design parameters with the performance metrics
//! measured once the simulation completed. Cases live in one JSON document
//! that is rewritten atomically after every mutation.

pub mod case;
pub mod error;
pub mod registry;
pub mod summary;

pub use case::{Case, CaseStatus, NewCase};
pub use error::{RegistryError, Result};
pub use registry::CaseRegistry;
pub use summary::{BestCase, CaseSummary};
