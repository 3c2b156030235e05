mod arena;
mod handle;
mod node;
mod raw_two_four_tree;

pub(crate) use handle::Handle;
pub(crate) use node::Element;
pub(crate) use raw_two_four_tree::RawTwoFourTree;
