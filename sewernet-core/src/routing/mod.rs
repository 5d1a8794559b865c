pub mod dijkstra;
pub mod rsph;
mod state;

pub use dijkstra::{ShortestPaths, dijkstra_paths};
pub use rsph::rsph_tree;
