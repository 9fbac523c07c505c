//! Feed wire formats: page decoding and entry-point resolution.

mod convert;
mod entry;
mod error;
mod types;

pub use convert::{Page, decode_page};
pub use entry::EntryResolver;
pub use error::{DecodeError, ResolutionError};
pub use types::{HydraSearch, IndexDocument, PageDocument, WireConnection, WireLocation};
