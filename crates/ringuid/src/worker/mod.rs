mod assigner;
mod cache;
mod node;
mod reuse;

pub use assigner::*;
pub use cache::*;
pub use node::*;
pub use reuse::*;
