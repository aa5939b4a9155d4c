//! ClinVar annotation lookups.
//!
//! Identifier resolution goes through `esearch` (`db=clinvar&term=<rsID>`), detail
//! retrieval through `esummary` (`db=clinvar&id=<uid>`). Responses are XML.

mod cache;
mod client;
mod summary;

pub use cache::{AnnotationCache, Lookup};
pub use client::ClinVarClient;
pub use summary::{parse_search_result, parse_summary};
