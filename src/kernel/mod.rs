//! Kernel functions for the SVM

pub mod choice;
pub mod linear;
pub mod rbf;
pub mod traits;

pub use self::choice::*;
pub use self::linear::*;
pub use self::rbf::*;
pub use self::traits::*;
