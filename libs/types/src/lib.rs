//! # Niche Types
//!
//! Data model shared by every crate in the niche resolution workspace.
//!
//! ## What lives here
//!
//! - [`NicheOption`]: canonical `{text, icon?}` form of a niche tag
//! - [`SelectedNiche`]: a niche chosen on one record, paired with a price string
//! - [`NicheCount`]: an option together with the number of records carrying it
//! - [`FieldDescriptor`] / [`Record`]: the slice of the form schema and form
//!   entries this subsystem reads
//! - [`ChangeEvent`]: opaque notification delivered by the upstream change feed
//!
//! ## What does NOT live here
//!
//! - Parsing of raw wire values (belongs in `niche-codec`)
//! - Caching and invalidation (belongs in `niche-cache` / `invalidation-bus`)
//!
//! Raw values are carried as [`serde_json::Value`]; every shape the record
//! store produces (string, JSON-in-string, array, object) fits in it.

pub mod events;
pub mod niche;
pub mod schema;

pub use events::{ChangeEvent, ChangeKind};
pub use niche::{niche_key, NicheCount, NicheOption, SelectedNiche};
pub use schema::{FieldDescriptor, FieldId, Record, RecordId, NICHE_FIELD_TYPE};

/// Raw value as delivered by the record store
pub type RawValue = serde_json::Value;
