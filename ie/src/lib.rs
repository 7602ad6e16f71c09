//! Image extraction for the item-panel recognition pipeline.
//!
//! The crate owns everything between a decoded screenshot and raw OCR text:
//! the normalized region model, pixel preprocessing, the engine seam, and
//! the sequential recognition loop with progress reporting.

mod image;
pub use image::*;
mod ocr;
pub use ocr::*;
mod preprocess;
pub use preprocess::*;
mod recognize;
pub use recognize::*;
mod region;
pub use region::*;
