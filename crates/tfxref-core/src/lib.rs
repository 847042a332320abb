//! tfxref-core: Shared types, traits, and errors for the tfxref cross-reference indexer.

pub mod config;
pub mod error;
pub mod expr;
pub mod module;
pub mod schema;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use expr::*;
pub use module::*;
pub use schema::*;
pub use traits::*;
pub use types::*;
