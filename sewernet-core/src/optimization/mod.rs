//! Hydraulic design of the routed sewer tree

pub mod calculate;
pub mod hydraulics;
pub mod peak_flow;
pub mod reverse_bfs;
pub mod trench;

pub use calculate::calculate_hydraulic_parameters;
pub use hydraulics::{mannings_equation, select_diameter};
pub use peak_flow::{estimate_peakflow, peak_flow};
pub use reverse_bfs::reverse_bfs;
pub use trench::{TrenchCheck, TrenchLimits, mean_trench_depth, needs_pump};
