use hexary_rlp::structs::Encoder;

use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use crate::ValueRLP;

use super::{BranchNode, ExtensionNode, Node};

/// Leaf Node of an an Ethereum Compatible Patricia Merkle Trie
/// Contains the node's partial path (the path below its parent, terminator included) and its value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafNode {
    pub partial: Nibbles,
    pub value: ValueRLP,
}

impl LeafNode {
    /// Creates a new leaf node and stores the given (partial, value) pair
    pub fn new(partial: Nibbles, value: ValueRLP) -> Self {
        Self { partial, value }
    }

    /// Returns the stored value if the given path matches the stored partial path
    pub fn get(&self, path: Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        if self.partial == path {
            Ok(Some(self.value.clone()))
        } else {
            Ok(None)
        }
    }

    /// Stores the received value and returns the new root of the subtrie previously consisting of self
    pub fn insert(
        mut self,
        state: &mut TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        /* Possible flow paths:
            Leaf { SelfValue } -> Leaf { Value }
            Leaf { SelfValue } -> Branch { [ Leaf { Value }, Self, ... ], None }
            Leaf { SelfValue } -> Extension { Branch { [ Leaf { Value }, ... ], SelfValue } }
            Leaf { SelfValue } -> Extension { Branch { [ Self, ... ], Value } }
        */
        // If the path matches the stored path, update the value
        if self.partial == path {
            self.value = value;
            return Ok(self.into());
        }
        // Both paths end with the terminator and differ, so they diverge
        // before either one runs out of nibbles
        let match_index = path.count_prefix(&self.partial);
        let self_choice_idx = self.partial.at(match_index);
        let new_leaf_choice_idx = path.at(match_index);
        let mut choices = BranchNode::EMPTY_CHOICES;
        let branch_node = if self_choice_idx == 16 {
            // Self's path ends at the new branch, its value is stored in the branch itself
            let new_leaf = LeafNode::new(path.offset(match_index + 1), value);
            choices[new_leaf_choice_idx] = new_leaf.insert_self(state)?;
            BranchNode::new_with_value(Box::new(choices), self.value)
        } else if new_leaf_choice_idx == 16 {
            // The new path ends at the new branch, the new value is stored in the branch itself
            let previous_leaf = LeafNode::new(self.partial.offset(match_index + 1), self.value);
            choices[self_choice_idx] = previous_leaf.insert_self(state)?;
            BranchNode::new_with_value(Box::new(choices), value)
        } else {
            // Both paths continue below the new branch
            let new_leaf = LeafNode::new(path.offset(match_index + 1), value);
            let previous_leaf = LeafNode::new(self.partial.offset(match_index + 1), self.value);
            choices[new_leaf_choice_idx] = new_leaf.insert_self(state)?;
            choices[self_choice_idx] = previous_leaf.insert_self(state)?;
            BranchNode::new(Box::new(choices))
        };
        let final_node = if match_index == 0 {
            branch_node.into()
        } else {
            // Keep the shared prefix as an extension node leading to the new branch
            let branch_hash = branch_node.insert_self(state)?;
            ExtensionNode::new(path.slice(0, match_index), branch_hash).into()
        };

        Ok(final_node)
    }

    /// Removes own value if the path matches own partial path, returning the value if it was removed
    pub fn remove(self, path: Nibbles) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        Ok(if self.partial == path {
            (None, Some(self.value))
        } else {
            (Some(self.into()), None)
        })
    }

    /// Computes the node's hash
    pub fn compute_hash(&self) -> NodeHash {
        NodeHash::from_encoded_raw(self.encode_raw())
    }

    /// Encodes the node into its canonical form: [ compact(partial), value ]
    pub fn encode_raw(&self) -> Vec<u8> {
        let mut buf = vec![];
        Encoder::new(&mut buf)
            .encode_bytes(&self.partial.encode_compact())
            .encode_bytes(&self.value)
            .finish();
        buf
    }

    /// Inserts the node into the state and returns its hash
    pub fn insert_self(self, state: &mut TrieState) -> Result<NodeHash, TrieError> {
        let hash = self.compute_hash();
        state.insert_node(self.into(), hash.clone());
        Ok(hash)
    }
}
