//! Where trail records come from.
//!
//! - [`MetadataStore`]: trail names, official times and geometries exported to a data folder

mod metadata;

pub use metadata::{MetadataError, MetadataStore};
