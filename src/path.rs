//! Path resolution against a metadata tree node and its ancestors.
//!
//! Paths are dotted segment strings attached to rules, resolved relative to
//! the node the rule applies to:
//!
//! - `parent` — hop one level up the ancestor chain;
//! - `pluginMetadata[]` — enter this node's metadata block for the
//!   configured plugin owner;
//! - anything else — a literal property lookup.
//!
//! `parent.parent.pluginMetadata[].collisionBoxType` reads the grandparent
//! node's plugin block. Absence at any step resolves to `None`; that is
//! data, not an error, and feeds the `IS_UNDEFINED`/`EQUALS` operators.
//! Only malformed syntax is a [`SchemaError`]; hops above the root are a
//! [`PathError`], which the lenient resolver also folds into `None`.

use serde_json::Value;

use crate::error::{PathError, SchemaError};

/// Marker segment for "this node's metadata block for the rule owner".
pub const OWNER_SEGMENT: &str = "pluginMetadata[]";

/// Segment for walking one level up the tree.
pub const PARENT_SEGMENT: &str = "parent";

/// Resolution context: the node a rule is attached to, its ancestor chain
/// (nearest first), and the plugin owner id selecting the metadata block.
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    pub node: &'a Value,
    pub ancestors: &'a [Value],
    pub plugin_id: &'a str,
}

impl<'a> PathContext<'a> {
    pub fn new(node: &'a Value, ancestors: &'a [Value], plugin_id: &'a str) -> Self {
        Self {
            node,
            ancestors,
            plugin_id,
        }
    }

    /// Context for a root node with no ancestors.
    pub fn root(node: &'a Value, plugin_id: &'a str) -> Self {
        Self::new(node, &[], plugin_id)
    }
}

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Walk to the next ancestor.
    Parent,
    /// Enter the node's plugin-metadata block for the rule owner.
    OwnerBlock,
    /// Literal property lookup.
    Key(String),
}

/// Parse a path into segments, validating syntax.
///
/// # Errors
///
/// Returns [`SchemaError::MalformedPath`] for empty paths, empty segments,
/// a `parent` hop after a property descent, or a repeated owner-block
/// marker.
pub fn parse(path: &str) -> Result<Vec<Segment>, SchemaError> {
    if path.is_empty() {
        return Err(malformed(path, "path is empty"));
    }

    let mut segments = Vec::new();
    // Tracks whether we already descended into properties; `parent` is only
    // meaningful while the cursor is still a tree node.
    let mut descended = false;

    for raw in path.split('.') {
        match raw {
            "" => return Err(malformed(path, "empty segment")),
            PARENT_SEGMENT => {
                if descended {
                    return Err(malformed(path, "parent hop after property access"));
                }
                segments.push(Segment::Parent);
            }
            OWNER_SEGMENT => {
                if descended {
                    return Err(malformed(path, "owner block marker after property access"));
                }
                descended = true;
                segments.push(Segment::OwnerBlock);
            }
            key => {
                descended = true;
                segments.push(Segment::Key(key.to_string()));
            }
        }
    }

    Ok(segments)
}

/// Resolve a path leniently: absence and above-root hops are both `None`.
///
/// # Errors
///
/// Returns [`SchemaError::MalformedPath`] for invalid path syntax.
pub fn resolve(path: &str, ctx: &PathContext) -> Result<Option<Value>, SchemaError> {
    let segments = parse(path)?;
    Ok(try_resolve(&segments, ctx, path).unwrap_or(None))
}

/// Resolve parsed segments, keeping above-root hops distinct as [`PathError`].
///
/// Absence of any property along the way is `Ok(None)`.
pub fn try_resolve(
    segments: &[Segment],
    ctx: &PathContext,
    path: &str,
) -> Result<Option<Value>, PathError> {
    let mut cursor = ctx.node;
    let mut depth = 0usize;

    for segment in segments {
        match segment {
            Segment::Parent => {
                let Some(ancestor) = ctx.ancestors.get(depth) else {
                    return Err(PathError {
                        path: path.to_string(),
                    });
                };
                cursor = ancestor;
                depth += 1;
            }
            Segment::OwnerBlock => {
                let block = cursor
                    .get("pluginMetadata")
                    .and_then(|m| m.get(ctx.plugin_id));
                match block {
                    Some(value) => cursor = value,
                    None => return Ok(None),
                }
            }
            Segment::Key(key) => match cursor.get(key) {
                Some(value) => cursor = value,
                None => return Ok(None),
            },
        }
    }

    Ok(Some(cursor.clone()))
}

fn malformed(path: &str, message: &str) -> SchemaError {
    SchemaError::MalformedPath {
        path: path.to_string(),
        message: message.to_string(),
    }
}
