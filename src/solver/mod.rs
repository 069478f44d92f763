//! Binary SVM solver
//!
//! Sequential Minimal Optimization over pairs of Lagrange multipliers, with
//! kernel values served from an LRU cache.

pub mod smo;

pub use self::smo::*;
