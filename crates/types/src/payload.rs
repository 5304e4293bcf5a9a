//! Decoding of node and index payloads.
//!
//! Nodes arrive either in object form
//! `{"label": "Files", "target": null, "children": [...]}` or in the
//! generator's tuple form `["Files", null, [...]]`. In both forms the
//! children slot holds an array of nodes, a subtree token, or `null` for a leaf.

use crate::index::IndexEntry;
use crate::node::{Node, NodeChildren};
use crate::script;
use serde_json::Value;
use thiserror::Error;

static NULL: Value = Value::Null;

/// A payload that violates the expected node or index shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid JSON payload: {0}")]
    Json(String),

    #[error("Expected an array of {expected}, found {found}")]
    NotAnArray { expected: &'static str, found: &'static str },

    #[error("Node at position {position} has no string label")]
    MissingLabel { position: usize },

    #[error("Node '{label}' has an invalid target (expected string or null)")]
    InvalidTarget { label: String },

    #[error("Node '{label}' has invalid children (expected array, subtree token or null)")]
    InvalidChildren { label: String },

    #[error("Node at position {position} is a tuple of {arity} elements (expected 2 or 3)")]
    InvalidArity { position: usize, arity: usize },

    #[error("Index entry at position {position} is invalid: {message}")]
    InvalidIndexEntry { position: usize, message: String },

    #[error("Assignment 'var {0}' not found in script")]
    MissingAssignment(String),

    #[error("Invalid string literal: {0}")]
    InvalidLiteral(String),
}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        PayloadError::Json(err.to_string())
    }
}

/// Decodes the body of a fetched subtree.
///
/// Accepts a bare JSON array or a generated script of the form
/// `var token = [ ... ];`.
pub fn decode_subtree(text: &str) -> Result<Vec<Node>, PayloadError> {
    let value: Value = serde_json::from_str(script::strip_assignment(text))?;
    decode_nodes(&value)
}

/// Decodes an ordered array of nodes.
pub fn decode_nodes(value: &Value) -> Result<Vec<Node>, PayloadError> {
    node_array(value)?
        .iter()
        .enumerate()
        .map(|(position, item)| decode_positioned(item, position))
        .collect()
}

/// Decodes an ordered array of nodes, recovering from malformed entries.
///
/// An entry without a usable label is dropped. An entry with a label but a bad
/// target or bad children is kept as a leaf. Every problem is returned
/// alongside the nodes; only a non-array `value` is an error.
pub fn decode_nodes_lossy(value: &Value) -> Result<(Vec<Node>, Vec<PayloadError>), PayloadError> {
    let mut issues = Vec::new();
    let nodes = recover_nodes(node_array(value)?, &mut issues);
    Ok((nodes, issues))
}

/// Decodes a single node in object or tuple form.
pub fn decode_node(value: &Value) -> Result<Node, PayloadError> {
    decode_positioned(value, 0)
}

fn node_array(value: &Value) -> Result<&[Value], PayloadError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or(PayloadError::NotAnArray {
            expected: "nodes",
            found: kind_of(value),
        })
}

fn decode_positioned(value: &Value, position: usize) -> Result<Node, PayloadError> {
    let (label, target, children) = node_parts(value, position)?;
    let target = decode_target(label, target)?;
    let children = match children {
        Value::Array(_) => NodeChildren::Nodes(decode_nodes(children)?),
        other => decode_reference(label, other)?,
    };
    Ok(Node {
        label: label.to_string(),
        target,
        children,
    })
}

fn recover_nodes(items: &[Value], issues: &mut Vec<PayloadError>) -> Vec<Node> {
    items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| recover_node(item, position, issues))
        .collect()
}

fn recover_node(value: &Value, position: usize, issues: &mut Vec<PayloadError>) -> Option<Node> {
    let (label, target, children) = match node_parts(value, position) {
        Ok(parts) => parts,
        Err(e) => {
            issues.push(e);
            return None;
        }
    };
    let target = decode_target(label, target).unwrap_or_else(|e| {
        issues.push(e);
        None
    });
    let children = match children {
        Value::Array(items) => NodeChildren::Nodes(recover_nodes(items, issues)),
        other => decode_reference(label, other).unwrap_or_else(|e| {
            issues.push(e);
            NodeChildren::default()
        }),
    };
    Some(Node {
        label: label.to_string(),
        target,
        children,
    })
}

/// Splits a node into label, target and children values.
fn node_parts(value: &Value, position: usize) -> Result<(&str, &Value, &Value), PayloadError> {
    match value {
        Value::Array(parts) => {
            if !(2..=3).contains(&parts.len()) {
                return Err(PayloadError::InvalidArity {
                    position,
                    arity: parts.len(),
                });
            }
            let label = parts[0]
                .as_str()
                .ok_or(PayloadError::MissingLabel { position })?;
            Ok((label, &parts[1], parts.get(2).unwrap_or(&NULL)))
        }
        Value::Object(fields) => {
            let label = fields
                .get("label")
                .and_then(Value::as_str)
                .ok_or(PayloadError::MissingLabel { position })?;
            Ok((
                label,
                fields.get("target").unwrap_or(&NULL),
                fields.get("children").unwrap_or(&NULL),
            ))
        }
        _ => Err(PayloadError::MissingLabel { position }),
    }
}

fn decode_target(label: &str, target: &Value) -> Result<Option<String>, PayloadError> {
    match target {
        Value::Null => Ok(None),
        Value::String(url) => Ok(Some(url.clone())),
        _ => Err(PayloadError::InvalidTarget {
            label: label.to_string(),
        }),
    }
}

/// Children that are not an inline array: `null` or a subtree token.
fn decode_reference(label: &str, children: &Value) -> Result<NodeChildren, PayloadError> {
    match children {
        Value::Null => Ok(NodeChildren::default()),
        Value::String(token) if !token.is_empty() => Ok(NodeChildren::Reference(token.clone())),
        _ => Err(PayloadError::InvalidChildren {
            label: label.to_string(),
        }),
    }
}

/// Decodes an index payload.
///
/// Each element is either a bare fragment string (its slot is its position,
/// as in the generator's `NAVTREEINDEX` array), a `[slot, fragment]` pair, or
/// a `{"slot": .., "fragment": ..}` object. Slot ordering is not checked here.
pub fn decode_index(value: &Value) -> Result<Vec<IndexEntry>, PayloadError> {
    let items = value.as_array().ok_or(PayloadError::NotAnArray {
        expected: "index entries",
        found: kind_of(value),
    })?;
    items
        .iter()
        .enumerate()
        .map(|(position, item)| decode_index_entry(item, position))
        .collect()
}

fn decode_index_entry(value: &Value, position: usize) -> Result<IndexEntry, PayloadError> {
    let invalid = |message: &str| PayloadError::InvalidIndexEntry {
        position,
        message: message.to_string(),
    };
    let (slot, fragment) = match value {
        Value::String(fragment) => {
            let slot = u32::try_from(position).map_err(|_| invalid("slot out of range"))?;
            return Ok(IndexEntry::new(slot, fragment.clone()));
        }
        Value::Array(pair) if pair.len() == 2 => (&pair[0], &pair[1]),
        Value::Object(fields) => (
            fields.get("slot").unwrap_or(&NULL),
            fields.get("fragment").unwrap_or(&NULL),
        ),
        _ => return Err(invalid("expected string, [slot, fragment] or object")),
    };
    let slot = slot
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid("slot must be a non-negative integer"))?;
    let fragment = fragment
        .as_str()
        .ok_or_else(|| invalid("fragment must be a string"))?;
    Ok(IndexEntry::new(slot, fragment))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
