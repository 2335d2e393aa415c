use tracing::{debug, instrument};

use crate::config::{Heuristic, PackerConfig, PackerKind, SortOrder};
use crate::error::{AtlasError, Result};
use crate::model::Rect;

pub mod maxrects;

use maxrects::MaxRectsPacker;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A packer places slot rectangles into a single bin.
///
/// Implementations must ensure no overlaps and keep every slot inside the bin.
/// `pack` returns the placed slot (post-rotation size) and whether it was rotated,
/// or `None` if the slot does not fit in the remaining space.
pub trait Packer {
    fn can_pack(&self, w: u32, h: u32) -> bool;
    fn pack(&mut self, w: u32, h: u32) -> Option<(Rect, bool)>;
}

/// Rectangle submitted to the packer: the post-trim size of one unique sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest {
    pub key: String,
    /// Index of the trimmed frame this request stands for.
    pub frame: usize,
    pub w: u32,
    pub h: u32,
}

/// Packer output for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRect {
    pub frame: usize,
    pub bin: usize,
    /// Content rectangle in bin pixels with post-rotation width/height.
    /// Padding and extrusion sit outside it.
    pub rect: Rect,
    pub rotated: bool,
}

/// A finished bin and the rectangles assigned to it, in placement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bin {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub rects: Vec<PackedRect>,
}

/// Result of a packing run.
#[derive(Debug, Clone)]
pub struct Packing {
    /// Heuristic that produced `bins` (the winner when the optimal packer ran).
    pub heuristic: Heuristic,
    pub bins: Vec<Bin>,
}

impl Packing {
    pub fn total_area(&self) -> u64 {
        self.bins
            .iter()
            .map(|b| b.width as u64 * b.height as u64)
            .sum()
    }
}

/// Stable sort of requests; ties fall back to key ascending.
pub fn sort_requests(requests: &mut [PlacementRequest], order: SortOrder) {
    let area = |r: &PlacementRequest| r.w as u64 * r.h as u64;
    match order {
        SortOrder::None => {}
        SortOrder::NameAsc => requests.sort_by(|a, b| a.key.cmp(&b.key)),
        SortOrder::AreaDesc => {
            requests.sort_by(|a, b| area(b).cmp(&area(a)).then_with(|| a.key.cmp(&b.key)))
        }
        SortOrder::MaxSideDesc => requests.sort_by(|a, b| {
            b.w.max(b.h)
                .cmp(&a.w.max(a.h))
                .then_with(|| a.key.cmp(&b.key))
        }),
        SortOrder::HeightDesc => {
            requests.sort_by(|a, b| b.h.cmp(&a.h).then_with(|| a.key.cmp(&b.key)))
        }
        SortOrder::WidthDesc => {
            requests.sort_by(|a, b| b.w.cmp(&a.w).then_with(|| a.key.cmp(&b.key)))
        }
    }
}

/// Packs `requests` in the given order according to `cfg.packer`.
#[instrument(skip_all, fields(requests = requests.len()))]
pub fn pack_bins(requests: &[PlacementRequest], cfg: &PackerConfig) -> Result<Packing> {
    match cfg.packer {
        PackerKind::MaxRects => pack_with_heuristic(requests, cfg, cfg.heuristic),
        PackerKind::Optimal => pack_optimal(requests, cfg),
    }
}

/// Packs `requests` in order into as many bins as needed using one heuristic.
///
/// Each bin is filled until a request does not fit; that bin is then closed and the
/// request starts a fresh one. Closed bins never receive more rectangles.
pub fn pack_with_heuristic(
    requests: &[PlacementRequest],
    cfg: &PackerConfig,
    heuristic: Heuristic,
) -> Result<Packing> {
    let (bw, bh) = (cfg.max_width, cfg.max_height);
    let margin = cfg.slot_margin();
    let offset = cfg.extrude + cfg.padding / 2;

    for r in requests {
        let (sw, sh) = (r.w.saturating_add(margin), r.h.saturating_add(margin));
        let fits = (sw <= bw && sh <= bh) || (cfg.allow_rotation && sh <= bw && sw <= bh);
        if !fits {
            return Err(oversized(r, sw, sh, cfg));
        }
    }

    let new_bin = || MaxRectsPacker::new(bw, bh, cfg.allow_rotation, heuristic);
    let mut bins: Vec<Bin> = Vec::new();
    let mut packer = new_bin();
    let mut current: Vec<PackedRect> = Vec::new();

    for r in requests {
        let (sw, sh) = (r.w + margin, r.h + margin);
        let (slot, rotated) = match packer.pack(sw, sh) {
            Some(placed) => placed,
            None => {
                bins.push(close_bin(bins.len(), std::mem::take(&mut current), cfg));
                packer = new_bin();
                packer
                    .pack(sw, sh)
                    .ok_or_else(|| oversized(r, sw, sh, cfg))?
            }
        };
        let (fw, fh) = if rotated { (r.h, r.w) } else { (r.w, r.h) };
        current.push(PackedRect {
            frame: r.frame,
            bin: bins.len(),
            rect: Rect::new(slot.x + offset, slot.y + offset, fw, fh),
            rotated,
        });
    }
    if !current.is_empty() {
        bins.push(close_bin(bins.len(), current, cfg));
    }

    debug!(heuristic = heuristic.name(), bins = bins.len(), "packed");
    Ok(Packing { heuristic, bins })
}

fn oversized(r: &PlacementRequest, sw: u32, sh: u32, cfg: &PackerConfig) -> AtlasError {
    AtlasError::OversizedItem {
        key: r.key.clone(),
        width: sw,
        height: sh,
        bin_width: cfg.max_width,
        bin_height: cfg.max_height,
    }
}

fn close_bin(index: usize, rects: Vec<PackedRect>, cfg: &PackerConfig) -> Bin {
    let (width, height) = page_size(&rects, cfg);
    Bin {
        index,
        width,
        height,
        rects,
    }
}

/// Runs every heuristic and keeps the result with the fewest bins, then the smallest
/// total bin area, then the earliest heuristic in [`Heuristic::ALL`].
fn pack_optimal(requests: &[PlacementRequest], cfg: &PackerConfig) -> Result<Packing> {
    let run = |h: &Heuristic| pack_with_heuristic(requests, cfg, *h);

    #[cfg(feature = "parallel")]
    let results: Vec<Result<Packing>> = if cfg.parallel {
        Heuristic::ALL.par_iter().map(run).collect()
    } else {
        Heuristic::ALL.iter().map(run).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<Packing>> = Heuristic::ALL.iter().map(run).collect();

    let mut best: Option<Packing> = None;
    let mut first_err: Option<AtlasError> = None;
    for res in results {
        match res {
            Ok(p) => {
                let better = best.as_ref().is_none_or(|b| {
                    (p.bins.len(), p.total_area()) < (b.bins.len(), b.total_area())
                });
                if better {
                    best = Some(p);
                }
            }
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    match (best, first_err) {
        (Some(p), _) => {
            debug!(winner = p.heuristic.name(), bins = p.bins.len(), "optimal packer");
            Ok(p)
        }
        (None, Some(e)) => Err(e),
        (None, None) => Err(AtlasError::Empty),
    }
}

/// Final page dimensions for the rectangles of one bin.
///
/// Non-fixed pages shrink to the furthest slot edge (content + extrude + trailing padding).
/// Power-of-two rounding happens last and only ever rounds up.
pub fn page_size(rects: &[PackedRect], cfg: &PackerConfig) -> (u32, u32) {
    let (mut w, mut h) = if cfg.fixed_size {
        (cfg.max_width, cfg.max_height)
    } else {
        let trailing = cfg.extrude + (cfg.padding - cfg.padding / 2);
        rects.iter().fold((0u32, 0u32), |(w, h), r| {
            (w.max(r.rect.right() + trailing), h.max(r.rect.bottom() + trailing))
        })
    };
    if cfg.power_of_two {
        w = next_pow2(w.max(1));
        h = next_pow2(h.max(1));
    }
    (w, h)
}

pub fn next_pow2(v: u32) -> u32 {
    v.max(1).next_power_of_two()
}
