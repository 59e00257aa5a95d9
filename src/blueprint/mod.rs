//! Blueprints: declarative collection definitions, loaded from disk or the built-in set.

pub mod types;
pub mod loader;
pub mod validator;

pub use types::*;
pub use loader::*;
pub use validator::*;
