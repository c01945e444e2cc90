//! Accessors over the structured source tree.
//!
//! Input documents are trees of maps, sequences, and scalars; YAML is the
//! native reader and JSON input is re-valued into the same tree type. The
//! helpers here mirror how the front ends walk the tree: fetch an
//! attribute, fetch text, iterate a child that may be a single node or a
//! sequence of nodes.

use std::io::Read;

use crate::config::settings::Scalar;
use crate::error::Result;

pub use serde_yaml::Value as Node;

pub fn load_yaml<R: Read>(reader: R) -> Result<Node> {
    Ok(serde_yaml::from_reader(reader)?)
}

pub fn load_json<R: Read>(reader: R) -> Result<Node> {
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    Ok(serde_yaml::to_value(json)?)
}

/// Named child of a mapping node.
pub fn attr<'a>(node: &'a Node, name: &str) -> Option<&'a Node> {
    if node.is_mapping() {
        node.get(name)
    } else {
        None
    }
}

/// Scalar rendered as text, the way it would appear in VDF.
pub fn scalar_text(node: &Node) -> Option<String> {
    match node {
        Node::String(s) => Some(s.clone()),
        Node::Number(n) => Some(n.to_string()),
        Node::Bool(b) => Some(if *b { "1".to_owned() } else { "0".to_owned() }),
        _ => None,
    }
}

/// Text of a named child.
pub fn text(node: &Node, name: &str) -> Option<String> {
    attr(node, name).and_then(scalar_text)
}

pub fn as_i64(node: &Node) -> Option<i64> {
    match node {
        Node::Number(n) => n.as_i64(),
        Node::String(s) => s.trim().parse().ok(),
        Node::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub fn int(node: &Node, name: &str) -> Option<i64> {
    attr(node, name).and_then(as_i64)
}

/// Settings scalar from a tree node; integer-looking strings coerce to
/// integers so constraint checks see numbers either way.
pub fn scalar(node: &Node) -> Option<Scalar> {
    match node {
        Node::Bool(b) => Some(Scalar::Bool(*b)),
        Node::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .or_else(|| n.as_f64().map(|f| Scalar::Str(f.to_string()))),
        Node::String(s) => match s.trim().parse::<i64>() {
            Ok(n) => Some(Scalar::Int(n)),
            Err(_) => Some(Scalar::Str(s.clone())),
        },
        _ => None,
    }
}

/// All instances of a named child: absent yields nothing, a sequence
/// yields its elements, anything else yields the single node.
pub fn children<'a>(node: &'a Node, name: &str) -> Vec<&'a Node> {
    match attr(node, name) {
        None => Vec::new(),
        Some(Node::Sequence(seq)) => seq.iter().collect(),
        Some(single) => vec![single],
    }
}

/// Mapping entries as `(key text, value)` pairs, in document order.
pub fn entries(node: &Node) -> Vec<(String, &Node)> {
    let mut out = Vec::new();
    if let Node::Mapping(map) = node {
        for (key, value) in map {
            if let Some(key) = scalar_text(key) {
                out.push((key, value));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Node {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn children_accepts_scalar_or_sequence() {
        let node = parse("action: solo");
        assert_eq!(children(&node, "action").len(), 1);

        let node = parse("action: [one, two]");
        assert_eq!(children(&node, "action").len(), 2);

        let node = parse("other: 1");
        assert!(children(&node, "action").is_empty());
    }

    #[test]
    fn entries_preserve_document_order() {
        let node = parse("b: 1\na: 2\nc: 3");
        let keys: Vec<String> = entries(&node).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn scalar_coercions() {
        let node = parse("x: \"42\"");
        assert_eq!(scalar(attr(&node, "x").unwrap()), Some(Scalar::Int(42)));
        let node = parse("x: true");
        assert_eq!(scalar(attr(&node, "x").unwrap()), Some(Scalar::Bool(true)));
        let node = parse("x: word");
        assert_eq!(scalar(attr(&node, "x").unwrap()), Some(Scalar::Str("word".into())));
    }

    #[test]
    fn json_loads_into_same_tree() {
        let node = load_json("{\"a\": [1, 2]}".as_bytes()).unwrap();
        assert_eq!(children(&node, "a").len(), 2);
    }
}
