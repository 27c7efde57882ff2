//! Domain models for the campaign roster.
//!
//! # Core Concepts
//!
//! ## Raw input
//!
//! - [`RawTable`]: A worksheet as fetched from the data source, header row
//!   consumed, each row a column-name → cell mapping.
//! - [`CharacterRow`] / [`RelationRow`]: Typed records validated at the fetch
//!   boundary. A row that fails validation is reported as a [`RowError`] and
//!   skipped; it never aborts the batch.
//!
//! ## Domain
//!
//! - [`Person`]: One character of the campaign, player or NPC, alive or dead.
//! - [`PersonRegistry`]: All persons keyed by their lower-cased name. Unknown
//!   keys resolve to a placeholder person instead of failing.
//! - [`Relation`]: A directed (or, with the `bi` flag, undirected) connection
//!   between two persons, kept in source order.

mod person;
mod relation;
mod rows;
mod table;

pub use person::*;
pub use relation::*;
pub use rows::*;
pub use table::*;
