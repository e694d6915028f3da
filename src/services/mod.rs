pub mod csv_serializer;
pub mod export_log;
pub mod image_extractor;
pub mod normalizer;
pub mod preview;
pub mod rich_content;

pub use csv_serializer::{serialize_snapshot, ExportPayload, CSV_HEADERS};
pub use export_log::ExportLogWriter;
pub use image_extractor::{AssetPackage, ExtractedImage, ImageExtractor};
pub use normalizer::{normalize, Heuristic, NormalizeOptions, Normalizer};
