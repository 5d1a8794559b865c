//! Summaries and file output of the sewer network

mod info;
mod table;
mod to_geojson;

use std::fs::{self, File};
use std::path::Path;

use log::info;

pub use info::{SewerInfo, sewer_info};
pub use table::write_edges_csv;
pub use to_geojson::{EdgeProperties, nodes_to_geojson, profile_string, to_geojson, to_geojson_string};

use crate::model::SewerGraph;
use crate::{Error, Result};

/// Writes the edges of `graph` to `path` as `"geojson"` or `"csv"`.
pub fn export_sewer_network(graph: &SewerGraph, path: impl AsRef<Path>, format: &str) -> Result<()> {
    let path = path.as_ref();
    match format.to_ascii_lowercase().as_str() {
        "geojson" => fs::write(path, to_geojson_string(graph)?)?,
        "csv" => write_edges_csv(graph, File::create(path)?)?,
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    }
    info!(
        "Exported {} sewer edges to {}",
        graph.edge_count(),
        path.display()
    );
    Ok(())
}
