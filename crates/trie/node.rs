mod branch;
mod extension;
mod leaf;

pub use branch::BranchNode;
pub use extension::ExtensionNode;
pub use leaf::LeafNode;

use ethereum_types::H256;
use hexary_rlp::{decode::decode_bytes, error::RLPDecodeError, structs::Decoder};

use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use crate::ValueRLP;

/// A Node in an Ethereum Compatible Patricia Merkle Trie
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Branch(BranchNode),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

impl From<BranchNode> for Node {
    fn from(val: BranchNode) -> Self {
        Node::Branch(val)
    }
}

impl From<ExtensionNode> for Node {
    fn from(val: ExtensionNode) -> Self {
        Node::Extension(val)
    }
}

impl From<LeafNode> for Node {
    fn from(val: LeafNode) -> Self {
        Node::Leaf(val)
    }
}

impl Node {
    /// Retrieves a value from the subtrie originating from this node given its path
    pub fn get(&self, state: &TrieState, path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        match self {
            Node::Branch(n) => n.get(state, path),
            Node::Extension(n) => n.get(state, path),
            Node::Leaf(n) => n.get(path),
        }
    }

    /// Inserts a value into the subtrie originating from this node and returns the new root of the subtrie
    pub fn insert(
        self,
        state: &mut TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        match self {
            Node::Branch(n) => n.insert(state, path, value),
            Node::Extension(n) => n.insert(state, path, value),
            Node::Leaf(n) => n.insert(state, path, value),
        }
    }

    /// Removes a value from the subtrie originating from this node given its path
    /// Returns the new root of the subtrie (if any) and the removed value if it existed in the subtrie
    pub fn remove(
        self,
        state: &mut TrieState,
        path: Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        match self {
            Node::Branch(n) => n.remove(state, path),
            Node::Extension(n) => n.remove(state, path),
            Node::Leaf(n) => n.remove(path),
        }
    }

    /// Computes the node's hash
    pub fn compute_hash(&self) -> NodeHash {
        match self {
            Node::Branch(n) => n.compute_hash(),
            Node::Extension(n) => n.compute_hash(),
            Node::Leaf(n) => n.compute_hash(),
        }
    }

    /// Encodes the node into its canonical form
    pub fn encode_raw(&self) -> Vec<u8> {
        match self {
            Node::Branch(n) => n.encode_raw(),
            Node::Extension(n) => n.encode_raw(),
            Node::Leaf(n) => n.encode_raw(),
        }
    }

    /// Decodes a node from its canonical encoding: a 2-item list for leaves
    /// and extensions (distinguished by the path's terminator flag) or a
    /// 17-item list for branches
    pub fn decode_raw(rlp: &[u8]) -> Result<Node, RLPDecodeError> {
        let mut decoder = Decoder::new(rlp)?;
        let mut rlp_items = vec![];
        while !decoder.is_done() {
            let item;
            (item, decoder) = decoder.get_encoded_item()?;
            rlp_items.push(item);
            // a node has at most the 17 items of a branch
            if rlp_items.len() > 17 {
                return Err(invalid_arity(rlp_items.len()));
            }
        }
        Ok(match rlp_items.len() {
            2 => {
                let (path, _) = decode_bytes(&rlp_items[0])?;
                let path = Nibbles::decode_compact(path);
                if path.is_leaf() {
                    let (value, _) = decode_bytes(&rlp_items[1])?;
                    LeafNode::new(path, value.to_vec()).into()
                } else {
                    if path.is_empty() {
                        return Err(RLPDecodeError::Custom(
                            "Decoded an extension node with an empty prefix".to_string(),
                        ));
                    }
                    ExtensionNode::new(path, decode_child(&rlp_items[1])).into()
                }
            }
            17 => {
                let mut choices = BranchNode::EMPTY_CHOICES;
                for (choice, item) in choices.iter_mut().zip(rlp_items.iter()) {
                    *choice = decode_child(item);
                }
                let (value, _) = decode_bytes(&rlp_items[16])?;
                BranchNode::new_with_value(Box::new(choices), value.to_vec()).into()
            }
            n => return Err(invalid_arity(n)),
        })
    }

    /// Inserts the node into the state and returns its hash
    pub fn insert_self(self, state: &mut TrieState) -> Result<NodeHash, TrieError> {
        match self {
            Node::Branch(n) => n.insert_self(state),
            Node::Extension(n) => n.insert_self(state),
            Node::Leaf(n) => n.insert_self(state),
        }
    }
}

// A child is either the empty string, a 32-byte hash, or an inlined node kept verbatim
fn decode_child(rlp: &[u8]) -> NodeHash {
    match decode_bytes(rlp) {
        Ok((hash, &[])) if hash.len() == 32 => NodeHash::Hashed(H256::from_slice(hash)),
        Ok((&[], &[])) => NodeHash::default(),
        _ => NodeHash::Inline(rlp.to_vec()),
    }
}

fn invalid_arity(items: usize) -> RLPDecodeError {
    RLPDecodeError::Custom(format!(
        "Invalid arity for a trie node, expected 2 or 17 items, got {items}"
    ))
}
