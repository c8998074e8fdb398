//! # Niche Codec
//!
//! Turns the niche values the record store hands us, in whatever shape they
//! arrive, into canonical [`NicheOption`](niche_types::NicheOption) and
//! [`SelectedNiche`](niche_types::SelectedNiche) lists.
//!
//! ## Contents
//!
//! - [`normalize`]: the single JSON-sniffing step every parser shares
//! - [`option`]: option parser, dedup/merge rule, wire encoder
//! - [`selection`]: selection parser, price normalisation, orphan pruning
//!
//! ## Failure model
//!
//! Parsing never fails. Malformed input is logged at `debug` and degrades to
//! literal text or to an empty result; [`ShapeError`] exists only to describe
//! what was absorbed.

pub mod error;
pub mod normalize;
pub mod option;
pub mod selection;

pub use error::ShapeError;
pub use normalize::MAX_DECODE_DEPTH;
pub use option::{dedup_options, encode_options, parse_niche_str, parse_niche_value};
pub use selection::{
    encode_selection, normalize_price, parse_selection, prune_orphans, selected_texts,
};
