use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::config::{FilterKind, PackerConfig, ScaleMethod};
use crate::model::Rect;
use crate::packer::Bin;
use crate::preprocess::{SourceImage, TrimmedFrame};

/// Blit the `src_rect` region of `src` into `canvas` at (dx, dy), optionally
/// rotated 90° clockwise, then extrude the blitted area's edge pixels outward.
///
/// Rotation maps destination `(xx, yy)` to source `(sx + yy, sy + sh - 1 - xx)`, so the
/// destination is `sh` wide and `sw` tall. Pixels outside `src` read as transparent
/// and writes outside `canvas` are dropped.
pub fn blit_rgba(
    src: &RgbaImage,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    src_rect: Rect,
    rotated: bool,
    extrude: u32,
) {
    let (cw, ch) = canvas.dimensions();
    let Rect {
        x: sx,
        y: sy,
        w: sw,
        h: sh,
    } = src_rect;
    if sw == 0 || sh == 0 {
        return;
    }
    let (rw, rh) = if rotated { (sh, sw) } else { (sw, sh) };
    let transparent = Rgba([0, 0, 0, 0]);

    for yy in 0..rh {
        for xx in 0..rw {
            let (ix, iy) = if rotated {
                (sx + yy, sy + (sh - 1 - xx))
            } else {
                (sx + xx, sy + yy)
            };
            if dx + xx < cw && dy + yy < ch {
                let px = src.get_pixel_checked(ix, iy).copied().unwrap_or(transparent);
                canvas.put_pixel(dx + xx, dy + yy, px);
            }
        }
    }

    if extrude > 0 {
        extrude_edges(canvas, Rect::new(dx, dy, rw, rh), extrude);
    }
}

/// Replicates the outermost rows/columns of `area` outward by `extrude` pixels and fills
/// the four corner blocks with the matching corner pixel.
fn extrude_edges(canvas: &mut RgbaImage, area: Rect, extrude: u32) {
    let (cw, ch) = canvas.dimensions();
    let Rect { x, y, w, h } = area;
    let (last_x, last_y) = (x + w - 1, y + h - 1);
    if last_x >= cw || last_y >= ch {
        return;
    }
    let put = |canvas: &mut RgbaImage, px: i64, py: i64, color: Rgba<u8>| {
        if px >= 0 && py >= 0 && (px as u32) < cw && (py as u32) < ch {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    };
    let e = extrude as i64;
    let (x, y, last_x, last_y) = (x as i64, y as i64, last_x as i64, last_y as i64);

    for xx in x..=last_x {
        let top = *canvas.get_pixel(xx as u32, y as u32);
        let bottom = *canvas.get_pixel(xx as u32, last_y as u32);
        for k in 1..=e {
            put(canvas, xx, y - k, top);
            put(canvas, xx, last_y + k, bottom);
        }
    }
    for yy in y..=last_y {
        let left = *canvas.get_pixel(x as u32, yy as u32);
        let right = *canvas.get_pixel(last_x as u32, yy as u32);
        for k in 1..=e {
            put(canvas, x - k, yy, left);
            put(canvas, last_x + k, yy, right);
        }
    }

    let corners = [
        (x, y, -1, -1),
        (last_x, y, 1, -1),
        (x, last_y, -1, 1),
        (last_x, last_y, 1, 1),
    ];
    for (cx, cy, sx, sy) in corners {
        let color = *canvas.get_pixel(cx as u32, cy as u32);
        for i in 1..=e {
            for j in 1..=e {
                put(canvas, cx + sx * i, cy + sy * j, color);
            }
        }
    }
}

/// Renders one bin: blits and extrudes every placed frame, then applies the page filter
/// and scale from `cfg`.
pub fn composite_bin(
    bin: &Bin,
    frames: &[TrimmedFrame],
    sources: &[SourceImage],
    cfg: &PackerConfig,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(bin.width, bin.height);
    for packed in &bin.rects {
        let frame = &frames[packed.frame];
        let src = &sources[frame.image].rgba;
        blit_rgba(
            src,
            &mut canvas,
            packed.rect.x,
            packed.rect.y,
            frame.content,
            packed.rotated,
            cfg.extrude,
        );
    }
    apply_filter(&mut canvas, cfg.filter);
    scale_page(canvas, cfg.scale, cfg.scale_method)
}

/// Applies a page-wide filter in place.
///
/// `Grayscale` writes Rec. 709 luma to all three colour channels and keeps alpha.
/// `Mask` writes alpha to the colour channels and makes the pixel opaque.
pub fn apply_filter(canvas: &mut RgbaImage, filter: FilterKind) {
    match filter {
        FilterKind::None => {}
        FilterKind::Grayscale => {
            for p in canvas.pixels_mut() {
                let [r, g, b, a] = p.0;
                let luma = 0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32;
                let l = luma.round().clamp(0.0, 255.0) as u8;
                *p = Rgba([l, l, l, a]);
            }
        }
        FilterKind::Mask => {
            for p in canvas.pixels_mut() {
                let a = p.0[3];
                *p = Rgba([a, a, a, 255]);
            }
        }
    }
}

/// Resizes the page by `scale` (rounded, at least 1px per side). A scale of 1 is a no-op.
pub fn scale_page(canvas: RgbaImage, scale: f32, method: ScaleMethod) -> RgbaImage {
    if scale == 1.0 {
        return canvas;
    }
    let (w, h) = canvas.dimensions();
    let nw = ((w as f32 * scale).round() as u32).max(1);
    let nh = ((h as f32 * scale).round() as u32).max(1);
    imageops::resize(&canvas, nw, nh, filter_type(method))
}

fn filter_type(method: ScaleMethod) -> FilterType {
    match method {
        ScaleMethod::NearestNeighbor => FilterType::Nearest,
        ScaleMethod::Bilinear => FilterType::Triangle,
        ScaleMethod::Bicubic => FilterType::CatmullRom,
        ScaleMethod::Lanczos => FilterType::Lanczos3,
    }
}
