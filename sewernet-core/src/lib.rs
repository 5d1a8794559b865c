//! Sewer network planning on top of a road network
//!
//! The pipeline runs in four stages:
//! 1. [`preprocessing`] builds a road graph, attaches buildings and sinks,
//!    and derives a directed [`model::ConnectionGraph`] with terrain
//!    profiles and pump-aware routing weights.
//! 2. [`routing::rsph_tree`] grows a sewer tree from the sinks to every
//!    building.
//! 3. [`optimization`] estimates peak flows and sets trench depths, pumps
//!    and pipe diameters along the tree.
//! 4. [`export`] summarises the result and writes it to GeoJSON or CSV.

pub mod algo;
pub mod config;
pub mod elevation;
mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod optimization;
pub mod prelude;
pub mod preprocessing;
pub mod routing;

pub use error::{Error, Result};
