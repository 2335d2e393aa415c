//! Trimming and duplicate detection.
//!
//! Every input becomes a [`TrimmedFrame`] (or an alias of an earlier one) before packing.
//! Duplicates are found by an XXH3-128 fingerprint of the trimmed pixel bytes and
//! confirmed byte-for-byte, so a hash collision can never alias two different sprites.

use std::collections::HashMap;

use image::RgbaImage;
use tracing::{debug, instrument};
use twox_hash::XxHash3_128;

use crate::config::{PackerConfig, TransparentPolicy, TrimMode};
use crate::model::Rect;

/// Decoded input image. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub key: String,
    pub rgba: RgbaImage,
    fingerprint: u128,
}

impl SourceImage {
    pub fn new(key: impl Into<String>, rgba: RgbaImage) -> Self {
        let fingerprint = XxHash3_128::oneshot(rgba.as_raw());
        Self {
            key: key.into(),
            rgba,
            fingerprint,
        }
    }

    /// Content hash of the full, untrimmed pixel buffer.
    pub fn fingerprint(&self) -> u128 {
        self.fingerprint
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.rgba.width(), self.rgba.height())
    }
}

/// Another input name whose trimmed pixels match a [`TrimmedFrame`] exactly.
///
/// Aliases share the placement but keep their own trim metadata, since two sprites with
/// the same content can sit at different offsets within their original canvases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub key: String,
    pub source: Rect,
    pub source_size: (u32, u32),
    pub trimmed: bool,
}

/// One unique sprite to place.
#[derive(Debug, Clone)]
pub struct TrimmedFrame {
    pub key: String,
    /// Index of the [`SourceImage`] the pixels come from.
    pub image: usize,
    /// Region of the source image that gets packed and blitted.
    pub content: Rect,
    /// Sprite source rect within `source_size`.
    pub source: Rect,
    pub source_size: (u32, u32),
    pub trimmed: bool,
    pub aliases: Vec<Alias>,
}

impl TrimmedFrame {
    /// Unrotated size submitted to the packer.
    pub fn size(&self) -> (u32, u32) {
        (self.content.w, self.content.h)
    }
}

/// Minimal bounding box of pixels with alpha above `threshold`, or `None` if there are none.
///
/// Scans whole columns from the left and right, then rows from the top and bottom
/// within the remaining columns.
pub fn trim_bounds(rgba: &RgbaImage, threshold: u8) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    let solid = |x: u32, y: u32| rgba.get_pixel(x, y)[3] > threshold;

    let x1 = (0..w).find(|&x| (0..h).any(|y| solid(x, y)))?;
    let x2 = (x1..w)
        .rev()
        .find(|&x| (0..h).any(|y| solid(x, y)))
        .unwrap_or(x1);
    let y1 = (0..h)
        .find(|&y| (x1..=x2).any(|x| solid(x, y)))
        .unwrap_or(0);
    let y2 = (y1..h)
        .rev()
        .find(|&y| (x1..=x2).any(|x| solid(x, y)))
        .unwrap_or(y1);
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Pixel region that gets packed for `img`, before the trim mode is applied.
///
/// Never empty: a zero-sized image still occupies one (transparent) pixel.
fn content_rect(img: &SourceImage, cfg: &PackerConfig) -> Rect {
    let r = if !cfg.trim {
        img.bounds()
    } else {
        match trim_bounds(&img.rgba, cfg.alpha_threshold) {
            Some(r) => r,
            None => match cfg.transparent_policy {
                TransparentPolicy::OneByOne => Rect::new(0, 0, 1, 1),
                TransparentPolicy::Keep => img.bounds(),
            },
        }
    };
    if r.w == 0 || r.h == 0 {
        Rect::new(0, 0, 1, 1)
    } else {
        r
    }
}

fn region_bytes(rgba: &RgbaImage, r: Rect) -> Vec<u8> {
    let stride = rgba.width() as usize * 4;
    let raw = rgba.as_raw();
    let mut out = Vec::with_capacity(r.w as usize * r.h as usize * 4);
    for y in r.y..r.bottom() {
        let start = y as usize * stride + r.x as usize * 4;
        let end = start + r.w as usize * 4;
        // The 1x1 region of an empty image has no backing pixel; it reads as transparent.
        match raw.get(start..end) {
            Some(row) => out.extend_from_slice(row),
            None => out.resize(out.len() + r.w as usize * 4, 0),
        }
    }
    out
}

/// Computes the trimmed frame of every image and merges identical ones.
///
/// Output order is the order of first occurrence in `images`.
#[instrument(skip_all, fields(inputs = images.len()))]
pub fn preprocess(images: &[SourceImage], cfg: &PackerConfig) -> Vec<TrimmedFrame> {
    let mut frames: Vec<TrimmedFrame> = Vec::with_capacity(images.len());
    // (fingerprint, w, h) -> candidate frame indices
    let mut by_content: HashMap<(u128, u32, u32), Vec<usize>> = HashMap::new();
    let mut alias_count = 0usize;

    for (index, img) in images.iter().enumerate() {
        let content = content_rect(img, cfg);
        // An empty image is reported as the 1x1 pixel it is packed as.
        let (iw, ih) = img.rgba.dimensions();
        let (iw, ih) = (iw.max(content.right()), ih.max(content.bottom()));
        let trimmed = content != Rect::new(0, 0, iw, ih);
        let cut = content != img.bounds();
        let (source, source_size) = match cfg.trim_mode {
            TrimMode::Trim => (content, (iw, ih)),
            TrimMode::Crop => (Rect::new(0, 0, content.w, content.h), (content.w, content.h)),
        };

        if cfg.detect_identical {
            let bytes = if cut {
                Some(region_bytes(&img.rgba, content))
            } else {
                None
            };
            let fingerprint = match &bytes {
                Some(b) => XxHash3_128::oneshot(b),
                None => img.fingerprint(),
            };
            let slot = by_content
                .entry((fingerprint, content.w, content.h))
                .or_default();
            let existing = slot.iter().copied().find(|&fi| {
                let other = &frames[fi];
                let theirs = region_bytes(&images[other.image].rgba, other.content);
                match &bytes {
                    Some(b) => *b == theirs,
                    None => region_bytes(&img.rgba, content) == theirs,
                }
            });
            if let Some(fi) = existing {
                debug!(key = %img.key, canonical = %frames[fi].key, "identical image aliased");
                frames[fi].aliases.push(Alias {
                    key: img.key.clone(),
                    source,
                    source_size,
                    trimmed,
                });
                alias_count += 1;
                continue;
            }
            slot.push(frames.len());
        }

        frames.push(TrimmedFrame {
            key: img.key.clone(),
            image: index,
            content,
            source,
            source_size,
            trimmed,
            aliases: Vec::new(),
        });
    }

    debug!(unique = frames.len(), aliases = alias_count, "preprocessed inputs");
    frames
}
