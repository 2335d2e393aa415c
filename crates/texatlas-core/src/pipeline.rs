use image::RgbaImage;
use tracing::{debug, instrument};

use crate::assemble::assemble_pages;
use crate::codec::{DecodeFailure, DecodeReport, EncodedImage, decode_all};
use crate::compositing::composite_bin;
use crate::config::PackerConfig;
use crate::error::{AtlasError, Result};
use crate::model::{Atlas, Meta, Page, Rect};
use crate::packer::{Bin, Packing, PlacementRequest, pack_bins, sort_requests};
use crate::preprocess::{SourceImage, TrimmedFrame, preprocess};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Output RGBA page and its logical page record.
pub struct OutputPage {
    pub page: Page,
    /// Final pixels, after filter and scale.
    pub rgba: RgbaImage,
}

/// Output of a packing run: atlas metadata and RGBA pages.
pub struct PackOutput {
    pub atlas: Atlas,
    pub pages: Vec<OutputPage>,
    /// Inputs dropped because they could not be decoded (only filled by [`pack_files`]).
    pub failures: Vec<DecodeFailure>,
}

impl PackOutput {
    /// Computes packing statistics for this output.
    /// This is a convenience method that delegates to `atlas.stats()`.
    pub fn stats(&self) -> crate::model::PackStats {
        self.atlas.stats()
    }
}

/// Decodes `files`, then packs whatever decoded.
///
/// Decoding finishes for every file before preprocessing starts. Undecodable files are
/// skipped and listed in [`PackOutput::failures`]. Returns [`AtlasError::Empty`] when
/// `files` is empty and [`AtlasError::NoDecodableImages`] when none of them decoded.
#[instrument(skip_all, fields(files = files.len()))]
pub fn pack_files(files: Vec<EncodedImage>, cfg: PackerConfig) -> Result<PackOutput> {
    let report = decode_inputs(files, &cfg)?;
    let mut out = pack_images(report.images, cfg)?;
    out.failures = report.failures;
    Ok(out)
}

fn decode_inputs(files: Vec<EncodedImage>, cfg: &PackerConfig) -> Result<DecodeReport> {
    cfg.validate()?;
    if files.is_empty() {
        return Err(AtlasError::Empty);
    }
    let report = decode_all(files, cfg.parallel);
    if report.images.is_empty() {
        return Err(AtlasError::NoDecodableImages {
            failed: report.failures.len(),
        });
    }
    Ok(report)
}

/// Packs decoded `images` into atlas pages using configuration `cfg` and returns
/// metadata and RGBA pages.
///
/// Requests are ordered by `cfg.sort_order` (stable, ties by key), so equal inputs
/// always produce identical output.
#[instrument(skip_all, fields(images = images.len()))]
pub fn pack_images(images: Vec<SourceImage>, cfg: PackerConfig) -> Result<PackOutput> {
    cfg.validate()?;
    if images.is_empty() {
        return Err(AtlasError::Empty);
    }

    let frames = preprocess(&images, &cfg);
    let packing = pack_frames(&frames, &cfg)?;
    let rasters = render_bins(&packing.bins, &frames, &images, &cfg);
    let pages = assemble_pages(&packing.bins, &frames);

    let atlas = Atlas {
        pages: pages.clone(),
        meta: build_meta(&cfg, &packing),
    };
    let pages = pages
        .into_iter()
        .zip(rasters)
        .map(|(page, rgba)| OutputPage { page, rgba })
        .collect();
    Ok(PackOutput {
        atlas,
        pages,
        failures: Vec::new(),
    })
}

/// Builds, sorts and packs the placement requests for `frames`.
pub fn pack_frames(frames: &[TrimmedFrame], cfg: &PackerConfig) -> Result<Packing> {
    let mut requests: Vec<PlacementRequest> = frames
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let (w, h) = f.size();
            PlacementRequest {
                key: f.key.clone(),
                frame: i,
                w,
                h,
            }
        })
        .collect();
    sort_requests(&mut requests, cfg.sort_order);
    pack_bins(&requests, cfg)
}

/// Composites every bin. Bins own their buffers, so with the `parallel` feature they
/// are rendered concurrently.
fn render_bins(
    bins: &[Bin],
    frames: &[TrimmedFrame],
    sources: &[SourceImage],
    cfg: &PackerConfig,
) -> Vec<RgbaImage> {
    let render = |bin: &Bin| {
        debug!(bin = bin.index, w = bin.width, h = bin.height, frames = bin.rects.len(), "compositing");
        composite_bin(bin, frames, sources, cfg)
    };
    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            return bins.par_iter().map(render).collect();
        }
    }
    bins.iter().map(render).collect()
}

fn build_meta(cfg: &PackerConfig, packing: &Packing) -> Meta {
    Meta {
        app: "texatlas".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        format: "RGBA8888".into(),
        scale: cfg.scale,
        scale_method: cfg.scale_method.name().into(),
        filter: cfg.filter.name().into(),
        power_of_two: cfg.power_of_two,
        fixed_size: cfg.fixed_size,
        max_dim: (cfg.max_width, cfg.max_height),
        padding: cfg.padding,
        extrude: cfg.extrude,
        allow_rotation: cfg.allow_rotation,
        trim_mode: if cfg.trim { cfg.trim_mode.name() } else { "none" }.into(),
        packer: cfg.packer.name().into(),
        heuristic: packing.heuristic.name().into(),
    }
}

// ---------------- Layout-only API ----------------

/// Placement metadata for a batch of files, without rendered pages.
pub struct LayoutOutput {
    pub atlas: Atlas,
    /// Inputs dropped because they could not be decoded.
    pub failures: Vec<DecodeFailure>,
}

/// Like [`pack_files`] but stops after assembling frames; no page is composited.
#[instrument(skip_all, fields(files = files.len()))]
pub fn layout_files(files: Vec<EncodedImage>, cfg: PackerConfig) -> Result<LayoutOutput> {
    let report = decode_inputs(files, &cfg)?;
    let atlas = layout_images(report.images, cfg)?;
    Ok(LayoutOutput {
        atlas,
        failures: report.failures,
    })
}

/// Trims, deduplicates and packs `images` exactly as [`pack_images`] does, returning only
/// the atlas record.
#[instrument(skip_all, fields(images = images.len()))]
pub fn layout_images(images: Vec<SourceImage>, cfg: PackerConfig) -> Result<Atlas> {
    cfg.validate()?;
    if images.is_empty() {
        return Err(AtlasError::Empty);
    }
    let frames = preprocess(&images, &cfg);
    let packing = pack_frames(&frames, &cfg)?;
    Ok(Atlas {
        pages: assemble_pages(&packing.bins, &frames),
        meta: build_meta(&cfg, &packing),
    })
}

/// Layout-only item with optional source/source_size to propagate trimming metadata.
#[derive(Debug, Clone)]
pub struct LayoutItem {
    pub key: String,
    pub w: u32,
    pub h: u32,
    pub source: Option<Rect>,
    pub source_size: Option<(u32, u32)>,
}

/// Packs sizes into pages without any pixel data. No trimming or deduplication happens;
/// each item is placed as given.
#[instrument(skip_all, fields(items = items.len()))]
pub fn pack_layout(items: Vec<LayoutItem>, cfg: PackerConfig) -> Result<Atlas> {
    cfg.validate()?;
    if items.is_empty() {
        return Err(AtlasError::Empty);
    }
    let frames: Vec<TrimmedFrame> = items
        .into_iter()
        .map(|it| {
            let content = Rect::new(0, 0, it.w, it.h);
            let source = it.source.unwrap_or(content);
            let source_size = it.source_size.unwrap_or((it.w, it.h));
            TrimmedFrame {
                trimmed: source != Rect::new(0, 0, source_size.0, source_size.1),
                key: it.key,
                image: 0,
                content,
                source,
                source_size,
                aliases: Vec::new(),
            }
        })
        .collect();
    let packing = pack_frames(&frames, &cfg)?;
    Ok(Atlas {
        pages: assemble_pages(&packing.bins, &frames),
        meta: build_meta(&cfg, &packing),
    })
}
