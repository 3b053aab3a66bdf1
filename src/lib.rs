pub mod cli;
pub mod columns;
pub mod dataset;
pub mod matrices;
pub mod network;
pub mod retrieval;
pub mod symbolic;
