//! Data model — values, sockets, nodes, graphs, and scenes.

pub mod graph;
pub mod graph_analysis;
pub mod node;
pub mod scene;
pub mod socket;
pub mod value;
