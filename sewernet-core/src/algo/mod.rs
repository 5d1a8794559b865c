pub mod simplify;

pub use simplify::{essential_nodes, simplify_graph};
