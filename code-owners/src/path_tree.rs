use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeId(pub(crate) usize);

pub(crate) struct Node {
    pub(crate) children: HashMap<String, NodeId>,
    pub(crate) paths: Vec<String>,
}

impl Node {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            paths: Vec::new(),
        }
    }
}

/// A trie of `/`-separated paths, one node per path segment.
pub(crate) struct PathTree {
    nodes: Vec<Node>,
}

impl PathTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
        }
    }

    pub(crate) fn root_id() -> NodeId {
        NodeId(0)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn insert(&mut self, path: &str) {
        let mut current_node = Self::root_id();
        for segment in path.split('/') {
            current_node = match self.nodes[current_node.0].children.get(segment) {
                Some(&node_id) => node_id,
                None => {
                    let node_id = NodeId(self.nodes.len());
                    self.nodes.push(Node::new());
                    self.nodes[current_node.0]
                        .children
                        .insert(segment.to_owned(), node_id);
                    node_id
                }
            };
        }
        self.nodes[current_node.0].paths.push(path.to_owned());
    }
}
