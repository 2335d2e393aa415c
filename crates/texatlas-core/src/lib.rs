//! Core library for packing sprites into texture atlases.
//!
//! - Preprocess: transparent-border trimming (trim/crop) and content-hash deduplication
//! - Packer: MaxRects with BSSF/BLSF/BAF/BL/CP plus smart/square growth variants, or an
//!   optimal portfolio over all of them
//! - Compositor: rotation-aware blits, edge extrusion, page filter and scale
//! - Assembler/exporters: one [`Frame`] per input name, JSON hash/array metadata, page files
//!
//! Quick example:
//! ```ignore
//! use texatlas_core::{EncodedImage, ExportConfig, PackerConfig, pack_files, render_files};
//! # fn main() -> anyhow::Result<()> {
//! let files = vec![
//!   EncodedImage { key: "a.png".into(), bytes: std::fs::read("a.png")? },
//!   EncodedImage { key: "b.png".into(), bytes: std::fs::read("b.png")? },
//! ];
//! let cfg = PackerConfig { max_width: 1024, max_height: 1024, ..Default::default() };
//! let out = pack_files(files, cfg)?;
//! for file in render_files(&out, &ExportConfig::default())? {
//!     std::fs::write(&file.name, &file.bytes)?;
//! }
//! # Ok(()) }
//! ```

pub mod assemble;
pub mod codec;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod output;
pub mod packer;
pub mod pipeline;
pub mod preprocess;

pub use assemble::*;
pub use codec::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use output::*;
pub use packer::*;
pub use pipeline::*;
pub use preprocess::*;

/// Convenience prelude for common types and functions.
/// Importing `texatlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        ExportConfig, ExporterKind, FilterKind, Heuristic, PackerConfig, PackerConfigBuilder,
        PackerKind, ScaleMethod, SortOrder, TextureFormat, TransparentPolicy, TrimMode,
    };
    pub use crate::model::{Atlas, Frame, Meta, PackStats, Page, Rect};
    pub use crate::pipeline::{LayoutItem, LayoutOutput};
    pub use crate::{
        EncodedImage, OutputFile, OutputPage, PackOutput, SourceImage, layout_files,
        layout_images, pack_files, pack_images, pack_layout, render_files,
    };
}
