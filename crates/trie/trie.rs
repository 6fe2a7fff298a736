mod db;
mod error;
mod nibbles;
mod node;
mod node_hash;
mod state;

#[cfg(test)]
mod test_utils;

use ethereum_types::H256;
use lazy_static::lazy_static;
use sha3::{Digest, Keccak256};

use hexary_rlp::constants::RLP_NULL;

pub use self::db::{in_memory::InMemoryTrieDB, TrieDB};
pub use self::error::TrieError;
pub use self::nibbles::Nibbles;
pub use self::node_hash::NodeHash;

use self::node::{LeafNode, Node};
use self::state::TrieState;

lazy_static! {
    /// Hash of an empty trie, equal to keccak(RLP_NULL)
    pub static ref EMPTY_TRIE_HASH: H256 = H256::from_slice(
        Keccak256::new()
            .chain_update([RLP_NULL])
            .finalize()
            .as_slice(),
    );
}

/// RLP-encoded trie path
pub type PathRLP = Vec<u8>;
/// RLP-encoded trie value
pub type ValueRLP = Vec<u8>;

/// Ethereum-compatible hexary Merkle Patricia Trie over a pluggable key-value backend.
/// Paths and values are opaque byte strings; the root hash is a commitment to the
/// whole content, independent of insertion order.
pub struct Trie {
    /// Reference to the current root node
    root: Option<NodeHash>,
    /// Contains the trie's nodes
    pub(crate) state: TrieState,
}

impl Trie {
    /// Creates a new Trie from a clean DB
    pub fn new(db: Box<dyn TrieDB>) -> Self {
        Self {
            state: TrieState::new(db),
            root: None,
        }
    }

    /// Creates a trie from an already-initialized DB, with `root` as the root node of the trie
    pub fn open(db: Box<dyn TrieDB>, root: H256) -> Self {
        let root = (root != *EMPTY_TRIE_HASH).then_some(root.into());
        Self {
            state: TrieState::new(db),
            root,
        }
    }

    /// Retrieves a value from the trie given its path.
    pub fn get(&self, path: &PathRLP) -> Result<Option<ValueRLP>, TrieError> {
        if path.is_empty() {
            return Err(TrieError::InvalidInput("empty path"));
        }
        match &self.root {
            Some(root) => {
                let root_node = self.state.get_node(root.clone())?;
                root_node.get(&self.state, Nibbles::from_bytes(path))
            }
            None => Ok(None),
        }
    }

    /// Inserts a value into the trie given its path.
    /// Empty paths are rejected, as are empty values: an empty value has no
    /// representation in the wire format, `remove` is the way to clear a path.
    pub fn insert(&mut self, path: PathRLP, value: ValueRLP) -> Result<(), TrieError> {
        if path.is_empty() {
            return Err(TrieError::InvalidInput("empty path"));
        }
        if value.is_empty() {
            return Err(TrieError::InvalidInput("empty value"));
        }
        let new_root = match self.root.clone() {
            // If the trie is not empty, call the root node's insertion logic
            Some(root) => {
                let root_node = self.state.get_node(root)?;
                root_node
                    .insert(&mut self.state, Nibbles::from_bytes(&path), value)?
                    .insert_self(&mut self.state)?
            }
            // If the trie is empty, just add a leaf.
            None => Node::from(LeafNode::new(Nibbles::from_bytes(&path), value))
                .insert_self(&mut self.state)?,
        };
        self.root = Some(new_root);
        Ok(())
    }

    /// Removes a value from the trie given its path.
    /// Returns the removed value, or None if the path wasn't part of the trie.
    pub fn remove(&mut self, path: PathRLP) -> Result<Option<ValueRLP>, TrieError> {
        if path.is_empty() {
            return Err(TrieError::InvalidInput("empty path"));
        }
        let Some(root) = self.root.clone() else {
            return Ok(None);
        };
        let root_node = self.state.get_node(root)?;
        let (root_node, old_value) =
            root_node.remove(&mut self.state, Nibbles::from_bytes(&path))?;
        self.root = match root_node {
            Some(root_node) => Some(root_node.insert_self(&mut self.state)?),
            None => None,
        };
        Ok(old_value)
    }

    /// Returns the hash of the trie's root node, or keccak(RLP_NULL) if the trie is empty.
    /// Also commits all pending changes to the DB.
    pub fn hash(&mut self) -> Result<H256, TrieError> {
        if let Some(ref root) = self.root {
            self.state.commit(root)?;
        }
        Ok(self
            .root
            .as_ref()
            .map(|root| root.clone().finalize())
            .unwrap_or(*EMPTY_TRIE_HASH))
    }

    #[cfg(test)]
    /// Creates a new Trie based on a temporary in-memory DB
    fn new_temp() -> Self {
        Trie::new(Box::new(InMemoryTrieDB::new(Default::default())))
    }
}
