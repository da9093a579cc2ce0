pub mod document;

pub use document::{decode_content, Document, INVALID_BODY_MESSAGE};
