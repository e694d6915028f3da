pub mod export_flow;

pub use export_flow::{ExportBundle, ExportFlow};
