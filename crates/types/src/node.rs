use serde::Serialize;

/// Child indices leading from the root list to a node. `[2]` is the third root item.
pub type NodePath = Vec<usize>;

/// A single entry in the navigation hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Text shown in the tree widget.
    pub label: String,
    /// Page (optionally with `#anchor`) this entry links to. `None` for pure grouping nodes.
    pub target: Option<String>,
    /// Ordered children, or the token of a subtree that has not been fetched yet.
    pub children: NodeChildren,
}

/// The children of a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeChildren {
    /// Materialized children in display order.
    Nodes(Vec<Node>),
    /// Opaque token naming a subtree that is fetched on first expansion.
    Reference(String),
}

impl Default for NodeChildren {
    fn default() -> Self {
        NodeChildren::Nodes(Vec::new())
    }
}

impl Node {
    /// A node without children.
    pub fn leaf(label: impl Into<String>, target: Option<&str>) -> Self {
        Self {
            label: label.into(),
            target: target.map(str::to_string),
            children: NodeChildren::default(),
        }
    }

    /// A node with inline children.
    pub fn with_children(label: impl Into<String>, target: Option<&str>, children: Vec<Node>) -> Self {
        Self {
            label: label.into(),
            target: target.map(str::to_string),
            children: NodeChildren::Nodes(children),
        }
    }

    /// A node whose children live behind a subtree reference.
    pub fn deferred(label: impl Into<String>, target: Option<&str>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.map(str::to_string),
            children: NodeChildren::Reference(token.into()),
        }
    }

    /// The subtree token, if the children have not been resolved yet.
    pub fn reference(&self) -> Option<&str> {
        match &self.children {
            NodeChildren::Reference(token) => Some(token),
            NodeChildren::Nodes(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.children, NodeChildren::Nodes(_))
    }

    /// Number of children, or `None` while the subtree is unresolved.
    pub fn child_count(&self) -> Option<usize> {
        match &self.children {
            NodeChildren::Nodes(children) => Some(children.len()),
            NodeChildren::Reference(_) => None,
        }
    }
}

/// Render-facing projection of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub label: String,
    pub target: Option<String>,
    pub expanded: bool,
    /// `None` until the node's subtree has been fetched.
    pub child_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_node_has_no_child_count() {
        let node = Node::deferred("Modules", Some("modules.html"), "modules");
        assert_eq!(node.reference(), Some("modules"));
        assert!(!node.is_resolved());
        assert_eq!(node.child_count(), None);
    }

    #[test]
    fn test_leaf_is_resolved_and_empty() {
        let node = Node::leaf("Overview", Some("index.html"));
        assert!(node.is_resolved());
        assert_eq!(node.child_count(), Some(0));
        assert_eq!(node.reference(), None);
    }

    #[test]
    fn test_grouping_node_serializes_null_target() {
        let node = Node::with_children("Files", None, vec![Node::leaf("File List", Some("files.html"))]);
        let json = serde_json::to_value(&node).unwrap();
        assert!(json["target"].is_null());
        assert_eq!(json["children"][0]["label"], "File List");
    }
}
