//! # Niche Filter
//!
//! Schema-driven niche extraction over record collections:
//!
//! - [`extract_with_counts`]: niche -> number of records carrying it
//! - [`build_predicate`]: record filter for a set of selected niches
//! - [`search_filter`]: case-insensitive text search over options or counts
//! - [`NicheReport`]: the above, fed from schema and record providers
//!
//! Independent of the option cache; operates directly on caller-supplied
//! records and field metadata.

pub mod counter;
pub mod predicate;
pub mod provider;
pub mod report;

pub use counter::{extract_with_counts, NicheFilter};
pub use predicate::{build_predicate, search_filter, NichePredicate, NicheText};
pub use provider::{ProviderError, RecordProvider, SchemaProvider};
pub use report::NicheReport;
