//! VDF serializer.
//!
//! One physical `"key"\t\t"value"` line per assignment, tab indentation,
//! nested tables wrapped in `{`/`}` on their own lines. The output of
//! `dumps` parses back to an equal document, byte for byte on files this
//! writer produced.

use std::io::{self, Write};

use crate::vdf::multimap::{Document, Value};

pub fn dumps(doc: &Document) -> String {
    let mut out = String::new();
    write_table(&mut out, doc, 0);
    out
}

pub fn dump<W: Write>(doc: &Document, writer: &mut W) -> io::Result<()> {
    writer.write_all(dumps(doc).as_bytes())
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        if ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_table(out: &mut String, doc: &Document, depth: usize) {
    for (key, value) in doc.iter() {
        push_indent(out, depth);
        push_quoted(out, key);
        match value {
            Value::Scalar(text) => {
                out.push_str("\t\t");
                push_quoted(out, text);
            },
            Value::Table(nested) => {
                out.push('\n');
                push_indent(out, depth);
                out.push_str("{\n");
                write_table(out, nested, depth + 1);
                push_indent(out, depth);
                out.push('}');
            },
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdf::parser::loads;

    #[test]
    fn scalar_layout() {
        let mut doc = Document::new();
        doc.insert("key", "value");
        assert_eq!(dumps(&doc), "\"key\"\t\t\"value\"\n");
    }

    #[test]
    fn nested_layout() {
        let mut inner = Document::new();
        inner.insert("k", "v");
        let mut doc = Document::new();
        doc.insert("outer", inner);
        assert_eq!(dumps(&doc), "\"outer\"\n{\n\t\"k\"\t\t\"v\"\n}\n");
    }

    #[test]
    fn quotes_are_escaped() {
        let mut doc = Document::new();
        doc.insert("key", "say \"hi\"");
        let text = dumps(&doc);
        assert_eq!(text, "\"key\"\t\t\"say \\\"hi\\\"\"\n");
        assert_eq!(loads(&text).unwrap(), doc);
    }

    #[test]
    fn multivalued_keys_emit_one_line_each() {
        let mut doc = Document::new();
        doc.insert("group", "a");
        doc.insert("group", "b");
        assert_eq!(dumps(&doc), "\"group\"\t\t\"a\"\n\"group\"\t\t\"b\"\n");
    }

    #[test]
    fn round_trip_is_byte_exact() {
        let source = "\"controller_mappings\"\n{\n\t\"version\"\t\t\"3\"\n\t\"group\"\n\t{\n\t\t\"id\"\t\t\"0\"\n\t\t\"mode\"\t\t\"dpad\"\n\t}\n\t\"group\"\n\t{\n\t\t\"id\"\t\t\"1\"\n\t\t\"mode\"\t\t\"four_buttons\"\n\t}\n}\n";
        let doc = loads(source).unwrap();
        assert_eq!(dumps(&doc), source);
    }
}
