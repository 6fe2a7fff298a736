use std::collections::HashMap;

use crate::db::TrieDB;
use crate::error::TrieError;
use crate::node::Node;
use crate::node_hash::NodeHash;

/// Content-addressed node store: a cache of not-yet-committed nodes on top
/// of the backend DB. The DB maps node hashes to canonically encoded nodes
/// and no node is ever removed from it.
pub struct TrieState {
    db: Box<dyn TrieDB>,
    cache: HashMap<NodeHash, Node>,
}

impl TrieState {
    /// Creates a TrieState referring to a db.
    pub fn new(db: Box<dyn TrieDB>) -> TrieState {
        TrieState {
            db,
            cache: Default::default(),
        }
    }

    /// Retrieves a node based on its hash.
    /// Inline references decode directly from their own bytes and never touch the DB.
    pub fn get_node(&self, hash: NodeHash) -> Result<Node, TrieError> {
        if let Some(node) = self.cache.get(&hash) {
            return Ok(node.clone());
        };
        match hash {
            NodeHash::Inline(ref encoded) => Ok(Node::decode_raw(encoded)?),
            NodeHash::Hashed(hashed) => {
                let rlp = self
                    .db
                    .get(hashed.as_bytes().to_vec())?
                    .ok_or(TrieError::MissingNode(hashed))?;
                Ok(Node::decode_raw(&rlp)?)
            }
        }
    }

    /// Inserts a node into the cache under its hash.
    /// Inline nodes travel embedded in their parent's encoding, so only hashed nodes are kept.
    pub fn insert_node(&mut self, node: Node, hash: NodeHash) {
        if matches!(hash, NodeHash::Hashed(_)) {
            self.cache.insert(hash, node);
        }
    }

    /// Commits cache changes to the DB and clears the cache.
    /// Only writes nodes that follow the root's canonical trie.
    pub fn commit(&mut self, root: &NodeHash) -> Result<(), TrieError> {
        self.commit_node(root)?;
        self.cache.clear();
        Ok(())
    }

    // Writes a node and its children into the DB
    fn commit_node(&mut self, node_hash: &NodeHash) -> Result<(), TrieError> {
        let Some(node) = self.cache.remove(node_hash) else {
            // The node is already stored in the DB or inlined in its parent
            return Ok(());
        };
        // Commit children (if any)
        match &node {
            Node::Branch(n) => {
                for child in n.choices.iter() {
                    if child.is_valid() {
                        self.commit_node(child)?;
                    }
                }
            }
            Node::Extension(n) => self.commit_node(&n.child)?,
            Node::Leaf(_) => {}
        }
        // Commit self
        self.db.put(node_hash.into(), node.encode_raw())
    }
}
