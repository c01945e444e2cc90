//! Valve key/value (VDF) codec.
//!
//! The format is plain repeated `"key" "value"` pairs where a value is
//! either a quoted/unquoted scalar or a `{ ... }` table. Steam encodes
//! lists by repeating a key, so the backing store is a multi-valued map
//! that keeps insertion order; see [`Document`].

mod multimap;
mod parser;
mod tokenizer;
mod writer;

pub use multimap::{Document, FlatDocument, FlatValue, Store, Value};
pub use parser::{load, loads, loads_flat};
pub use tokenizer::{TokenStream, Token, Tokenizer};
pub use writer::{dump, dumps};
