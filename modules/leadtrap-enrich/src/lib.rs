pub mod business;
pub mod chain;
pub mod owner;

pub use business::{is_business, DosRegistry, EntityRegistry};
pub use chain::Enricher;
pub use owner::{ParcelDirectory, SocrataParcelDirectory};
