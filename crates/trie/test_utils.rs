#[macro_export]
/// Creates a trie node, storing its children (if any) in the given trie's state.
/// Paths are given as hex-encoded nibbles, terminator flag included.
macro_rules! pmt_node {
    (
        @( $trie:expr )
        branch { $( $choice:expr => $child_type:ident { $( $child_tokens:tt )* } ),+ $(,)? }
    ) => {
        $crate::node::BranchNode::new({
            let mut choices = $crate::node::BranchNode::EMPTY_CHOICES;
            $(
                let child_node: $crate::node::Node = pmt_node! { @($trie)
                    $child_type { $( $child_tokens )* }
                }.into();
                choices[$choice as usize] = child_node.insert_self(&mut $trie.state).unwrap();
            )*
            Box::new(choices)
        })
    };
    (
        @( $trie:expr )
        branch { $( $choice:expr => $child_type:ident { $( $child_tokens:tt )* } ),+ $(,)? }
        with_value { $value:expr }
    ) => {
        $crate::node::BranchNode::new_with_value({
            let mut choices = $crate::node::BranchNode::EMPTY_CHOICES;
            $(
                let child_node: $crate::node::Node = pmt_node! { @($trie)
                    $child_type { $( $child_tokens )* }
                }.into();
                choices[$choice as usize] = child_node.insert_self(&mut $trie.state).unwrap();
            )*
            Box::new(choices)
        }, $value)
    };

    (
        @( $trie:expr )
        extension { $prefix:expr , $child_type:ident { $( $child_tokens:tt )* } }
    ) => {{
        let child_node: $crate::node::Node = pmt_node! { @($trie)
            $child_type { $( $child_tokens )* }
        }.into();
        let child_hash = child_node.insert_self(&mut $trie.state).unwrap();
        $crate::node::ExtensionNode::new(
            $crate::Nibbles::from_hex($prefix.to_vec()),
            child_hash,
        )
    }};

    (
        @( $trie:expr )
        leaf { $path:expr => $value:expr }
    ) => {
        $crate::node::LeafNode::new($crate::Nibbles::from_hex($path), $value)
    };
}
