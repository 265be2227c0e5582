pub mod binding;
pub mod error;
pub mod node;
pub mod result;
pub mod tree;
pub mod visitor;

pub use binding::*;
pub use error::*;
pub use node::*;
pub use result::*;
pub use tree::*;
pub use visitor::*;
