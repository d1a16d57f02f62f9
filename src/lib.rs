// narrative-graph: coordinated-behavior detection and narrative risk scoring
//
// This is the library root. Each module corresponds to a stage of the
// analysis pipeline. The coordination and risk modules are pure batch
// computations; storage, ingestion and output live at the edges.

pub mod config;
pub mod coordination;
pub mod db;
pub mod embeddings;
pub mod explain;
pub mod ingest;
pub mod models;
pub mod narratives;
pub mod output;
pub mod pipeline;
pub mod risk;
pub mod status;
