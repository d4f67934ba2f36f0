pub mod meta;
pub mod span;

pub use meta::{MetaValue, SpanMetadata, metadata_number, metadata_text};
pub use span::{SpanCategory, StateSpan};
