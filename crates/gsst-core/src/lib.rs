#![deny(missing_docs)]
#![doc = "Shared error types, deterministic seeding and schema descriptors for the GSST tempering engine."]

pub mod errors;
pub mod provenance;
pub mod rng;

pub use errors::{ErrorInfo, GsstError};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};
