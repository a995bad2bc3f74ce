//! Data model of a threat model: enumerations, graph entities and risk records.

mod entities;
mod risk;
mod types;

pub use entities::*;
pub use risk::*;
pub use types::*;
