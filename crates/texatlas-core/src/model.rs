use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// Final placement record for one input name.
///
/// `frame` is in page pixels and already has post-rotation width/height. `source` is
/// the sprite source rect inside `source_size`. Coordinates are never scaled; the run's
/// scale factor lives in [`Meta::scale`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame {
    /// Input name (e.g. relative file path).
    pub key: String,
    /// Placed rectangle within the page.
    pub frame: Rect,
    /// True if the frame was rotated 90° clockwise when placed.
    pub rotated: bool,
    /// True if the sprite source rect is smaller than the source size.
    pub trimmed: bool,
    /// Sprite source rect within `source_size`.
    pub source: Rect,
    /// Logical sprite size (original size in trim mode, trimmed size in crop mode).
    pub source_size: (u32, u32),
    /// Index of the page holding this frame.
    pub page: usize,
}

/// A single atlas page (logical record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    /// One entry per input name, aliases included, in packing order.
    pub frames: Vec<Frame>,
}

/// Atlas-level metadata (common fields used by exporters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub app: String,
    pub version: String,
    pub format: String,
    pub scale: f32,
    pub scale_method: String,
    pub filter: String,
    pub power_of_two: bool,
    pub fixed_size: bool,
    pub max_dim: (u32, u32),
    pub padding: u32,
    pub extrude: u32,
    pub allow_rotation: bool,
    pub trim_mode: String,
    pub packer: String,
    pub heuristic: String,
}

/// Atlas of pages and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atlas {
    pub pages: Vec<Page>,
    pub meta: Meta,
}

impl Atlas {
    /// Every frame keyed by input name.
    pub fn frames(&self) -> BTreeMap<&str, &Frame> {
        self.pages
            .iter()
            .flat_map(|p| p.frames.iter())
            .map(|f| (f.key.as_str(), f))
            .collect()
    }

    /// Looks up the frame for one input name.
    pub fn frame(&self, key: &str) -> Option<&Frame> {
        self.pages
            .iter()
            .flat_map(|p| p.frames.iter())
            .find(|f| f.key == key)
    }

    /// Computes packing statistics for this atlas.
    ///
    /// Aliased frames share one placement, so the used area counts each distinct
    /// `(page, frame)` rectangle once.
    pub fn stats(&self) -> PackStats {
        let num_pages = self.pages.len();
        let mut num_frames = 0;
        let mut total_page_area = 0u64;
        let mut used_frame_area = 0u64;
        let mut max_page_width = 0u32;
        let mut max_page_height = 0u32;
        let mut num_rotated = 0;
        let mut num_trimmed = 0;
        let mut num_aliases = 0;

        for page in &self.pages {
            total_page_area += page.width as u64 * page.height as u64;
            max_page_width = max_page_width.max(page.width);
            max_page_height = max_page_height.max(page.height);

            let mut seen: Vec<Rect> = Vec::with_capacity(page.frames.len());
            for frame in &page.frames {
                num_frames += 1;
                if seen.contains(&frame.frame) {
                    num_aliases += 1;
                    continue;
                }
                seen.push(frame.frame);
                used_frame_area += frame.frame.area();
                if frame.rotated {
                    num_rotated += 1;
                }
                if frame.trimmed {
                    num_trimmed += 1;
                }
            }
        }

        let occupancy = if total_page_area > 0 {
            used_frame_area as f64 / total_page_area as f64
        } else {
            0.0
        };

        PackStats {
            num_pages,
            num_frames,
            num_aliases,
            total_page_area,
            used_frame_area,
            occupancy,
            max_page_width,
            max_page_height,
            num_rotated,
            num_trimmed,
        }
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Total number of pages in the atlas.
    pub num_pages: usize,
    /// Total number of named frames, aliases included.
    pub num_frames: usize,
    /// Frames that reuse another frame's placement.
    pub num_aliases: usize,
    /// Sum of width * height over all pages.
    pub total_page_area: u64,
    /// Sum of distinct placed frame areas.
    pub used_frame_area: u64,
    /// used_frame_area / total_page_area (0.0 to 1.0).
    pub occupancy: f64,
    pub max_page_width: u32,
    pub max_page_height: u32,
    pub num_rotated: usize,
    pub num_trimmed: usize,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Frames: {} ({} aliased), Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px², Rotated: {}, Trimmed: {}",
            self.num_pages,
            self.num_frames,
            self.num_aliases,
            self.occupancy * 100.0,
            self.total_page_area,
            self.used_frame_area,
            self.num_rotated,
            self.num_trimmed,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_page_area.saturating_sub(self.used_frame_area)
    }
}
