//! Configuration system for Liftoff

pub mod defaults;
mod loader;
mod resolve;
mod types;
pub mod validation;

pub use defaults::*;
pub use loader::*;
pub use resolve::*;
pub use types::*;
pub use validation::*;
