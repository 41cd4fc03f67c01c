//! Lexical retrieval used to associate free-text comments with transcript
//! windows and with each other.

mod index;
mod tokenize;

pub use index::{Index, SearchHit};
pub use tokenize::tokenize;
