//! Safe SQL builder: identifiers from vetted blueprints only, values as parameters.

mod builder;
pub mod ident;
pub mod params;
pub use builder::*;
pub use ident::*;
pub use params::*;
