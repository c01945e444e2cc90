//! Recursive-descent parser over the token stream.

use std::io::Read;

use crate::error::{Error, ParseErrorKind, Result};
use crate::vdf::multimap::{Document, FlatDocument, Store};
use crate::vdf::tokenizer::{Token, TokenStream};

/// Parse a string into any [`Store`].
pub fn parse_str<S: Store>(src: &str) -> Result<S> {
    let mut tokens = TokenStream::new(src);
    parse_table(&mut tokens, 0)
}

/// Parse a string into the multi-valued document.
pub fn loads(src: &str) -> Result<Document> {
    parse_str(src)
}

/// Parse a string into a plain last-write-wins map.
pub fn loads_flat(src: &str) -> Result<FlatDocument> {
    parse_str(src)
}

/// Parse an entire stream into the multi-valued document.
pub fn load<R: Read>(mut reader: R) -> Result<Document> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let src = String::from_utf8(raw)
        .map_err(|err| Error::Lex { position: err.utf8_error().valid_up_to() })?;
    loads(&src)
}

fn parse_table<S: Store>(tokens: &mut TokenStream<'_>, depth: usize) -> Result<S> {
    let mut table = S::default();

    loop {
        // Key position: scalar token, or '}' ending this table.
        let key = loop {
            match tokens.next() {
                Token::Quoted(text) | Token::Unquoted(text) => break text,
                Token::Denest if depth > 0 => return Ok(table),
                Token::Denest => return Err(Error::Parse(ParseErrorKind::StrayClose)),
                Token::End if depth == 0 => return Ok(table),
                Token::End => return Err(Error::Parse(ParseErrorKind::UnbalancedNesting)),
                Token::Comment(_) | Token::Nest => {},
            }
        };

        // Value position: scalar, or '{' opening a nested table.
        loop {
            match tokens.next() {
                Token::Quoted(text) | Token::Unquoted(text) => {
                    table.insert_scalar(key, text);
                    break;
                },
                Token::Nest => {
                    let nested = parse_table(tokens, depth + 1)?;
                    table.insert_table(key, nested);
                    break;
                },
                Token::Denest | Token::End => {
                    return Err(Error::Parse(ParseErrorKind::UnpairedKey));
                },
                Token::Comment(_) => {},
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdf::multimap::Value;

    #[test]
    fn scalar_pairs() {
        let doc = loads("\"a\" \"1\"\n\"b\" \"2\"\n").unwrap();
        assert_eq!(doc.get("a").and_then(Value::as_str), Some("1"));
        assert_eq!(doc.get("b").and_then(Value::as_str), Some("2"));
    }

    #[test]
    fn nested_tables() {
        let doc = loads("outer { inner { k v } }").unwrap();
        let outer = doc.get("outer").and_then(Value::as_table).unwrap();
        let inner = outer.get("inner").and_then(Value::as_table).unwrap();
        assert_eq!(inner.get("k").and_then(Value::as_str), Some("v"));
    }

    #[test]
    fn repeated_keys_accumulate() {
        let doc = loads("k a k b k c").unwrap();
        let all: Vec<&str> =
            doc.get_all("k").unwrap().iter().filter_map(Value::as_str).collect();
        assert_eq!(all, vec!["a", "b", "c"]);
        assert_eq!(doc.get("k").and_then(Value::as_str), Some("c"));
    }

    #[test]
    fn comments_are_skipped() {
        let doc = loads("// heading\nk v // trailing\n").unwrap();
        assert_eq!(doc.get("k").and_then(Value::as_str), Some("v"));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn unpaired_key_fails() {
        match loads("lonely") {
            Err(Error::Parse(ParseErrorKind::UnpairedKey)) => {},
            other => panic!("expected unpaired key error, got {:?}", other),
        }
    }

    #[test]
    fn stray_close_fails() {
        match loads("}") {
            Err(Error::Parse(ParseErrorKind::StrayClose)) => {},
            other => panic!("expected stray close error, got {:?}", other),
        }
    }

    #[test]
    fn eof_inside_table_fails() {
        match loads("a { b c") {
            Err(Error::Parse(ParseErrorKind::UnbalancedNesting)) => {},
            other => panic!("expected unbalanced nesting error, got {:?}", other),
        }
    }

    #[test]
    fn flat_store_takes_last_value() {
        let flat = loads_flat("k a k b").unwrap();
        match flat.get("k") {
            Some(crate::vdf::FlatValue::Scalar(s)) => assert_eq!(s, "b"),
            other => panic!("unexpected value {:?}", other),
        }
    }
}
