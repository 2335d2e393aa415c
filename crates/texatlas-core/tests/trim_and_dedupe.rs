use image::{Rgba, RgbaImage};
use texatlas_core::config::{PackerConfig, TransparentPolicy, TrimMode};
use texatlas_core::model::Rect;
use texatlas_core::{SourceImage, pack_images, preprocess, trim_bounds};

/// `w`x`h` transparent canvas with an opaque `color` block at `block`.
fn with_block(w: u32, h: u32, block: Rect, color: [u8; 4]) -> RgbaImage {
    let mut img = RgbaImage::new(w, h);
    for y in block.y..block.bottom() {
        for x in block.x..block.right() {
            img.put_pixel(x, y, Rgba(color));
        }
    }
    img
}

#[test]
fn trim_excludes_transparent_border() {
    let img = with_block(32, 32, Rect::new(4, 4, 24, 24), [200, 10, 10, 255]);
    let out = pack_images(vec![SourceImage::new("bordered", img)], PackerConfig::default()).unwrap();
    let f = out.atlas.frame("bordered").unwrap();
    assert!(f.trimmed);
    assert_eq!((f.frame.w, f.frame.h), (24, 24));
    assert_eq!(f.source, Rect::new(4, 4, 24, 24));
    assert_eq!(f.source_size, (32, 32));
    let page = &out.pages[0].rgba;
    assert_eq!(page.dimensions(), (24, 24));
    assert_eq!(*page.get_pixel(f.frame.x, f.frame.y), Rgba([200, 10, 10, 255]));
}

#[test]
fn crop_mode_redefines_source_size() {
    let img = with_block(32, 20, Rect::new(3, 5, 10, 6), [0, 0, 255, 255]);
    let cfg = PackerConfig {
        trim_mode: TrimMode::Crop,
        ..Default::default()
    };
    let out = pack_images(vec![SourceImage::new("c", img)], cfg).unwrap();
    let f = out.atlas.frame("c").unwrap();
    assert!(f.trimmed);
    assert_eq!(f.source, Rect::new(0, 0, 10, 6));
    assert_eq!(f.source_size, (10, 6));
    assert_eq!(out.atlas.meta.trim_mode, "crop");
}

#[test]
fn trim_disabled_keeps_full_bounds() {
    let img = with_block(16, 16, Rect::new(2, 2, 4, 4), [1, 2, 3, 255]);
    let cfg = PackerConfig {
        trim: false,
        ..Default::default()
    };
    let out = pack_images(vec![SourceImage::new("t", img)], cfg).unwrap();
    let f = out.atlas.frame("t").unwrap();
    assert!(!f.trimmed);
    assert_eq!((f.frame.w, f.frame.h), (16, 16));
    assert_eq!(f.source, Rect::new(0, 0, 16, 16));
    assert_eq!(out.atlas.meta.trim_mode, "none");
}

#[test]
fn alpha_threshold_treats_faint_pixels_as_transparent() {
    let mut img = with_block(12, 12, Rect::new(0, 0, 12, 12), [9, 9, 9, 10]);
    for y in 4..8 {
        for x in 5..7 {
            img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }
    assert_eq!(trim_bounds(&img, 0), Some(Rect::new(0, 0, 12, 12)));
    assert_eq!(trim_bounds(&img, 10), Some(Rect::new(5, 4, 2, 4)));
    assert_eq!(trim_bounds(&img, 255), None);
}

#[test]
fn fully_transparent_policies() {
    let blank = RgbaImage::new(16, 16);

    let one = PackerConfig::default();
    let frames = preprocess(&[SourceImage::new("blank", blank.clone())], &one);
    assert_eq!(frames[0].content, Rect::new(0, 0, 1, 1));
    assert!(frames[0].trimmed);

    let keep = PackerConfig {
        transparent_policy: TransparentPolicy::Keep,
        ..Default::default()
    };
    let frames = preprocess(&[SourceImage::new("blank", blank)], &keep);
    assert_eq!(frames[0].content, Rect::new(0, 0, 16, 16));
    assert!(!frames[0].trimmed);
}

#[test]
fn zero_sized_image_packs_as_single_pixel() {
    let out = pack_images(
        vec![SourceImage::new("empty", RgbaImage::new(0, 0))],
        PackerConfig::default(),
    )
    .unwrap();
    let f = out.atlas.frame("empty").unwrap();
    assert_eq!((f.frame.w, f.frame.h), (1, 1));
    assert_eq!(*out.pages[0].rgba.get_pixel(0, 0), Rgba([0, 0, 0, 0]));

    for (trim, mode) in [
        (true, TrimMode::Trim),
        (true, TrimMode::Crop),
        (false, TrimMode::Trim),
    ] {
        let cfg = PackerConfig {
            trim,
            trim_mode: mode,
            ..Default::default()
        };
        let frames = preprocess(&[SourceImage::new("empty", RgbaImage::new(0, 0))], &cfg);
        let f = &frames[0];
        let size = Rect::new(0, 0, f.source_size.0, f.source_size.1);
        assert!(size.contains(&f.source), "{mode:?} trim={trim}: {:?} in {:?}", f.source, f.source_size);
        assert_eq!(f.source, Rect::new(0, 0, 1, 1));
        assert_eq!(f.source_size, (1, 1));
        assert!(!f.trimmed);
    }
}

#[test]
fn empty_and_single_transparent_pixel_images_merge() {
    let frames = preprocess(
        &[
            SourceImage::new("empty", RgbaImage::new(0, 0)),
            SourceImage::new("dot", RgbaImage::new(1, 1)),
        ],
        &PackerConfig::default(),
    );
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].aliases[0].key, "dot");
}

#[test]
fn identical_images_share_one_placement() {
    let red = with_block(20, 20, Rect::new(0, 0, 20, 20), [255, 0, 0, 255]);
    let green = with_block(20, 20, Rect::new(0, 0, 20, 20), [0, 255, 0, 255]);
    let images = vec![
        SourceImage::new("a.png", red.clone()),
        SourceImage::new("b.png", red),
        SourceImage::new("c.png", green),
    ];

    let out = pack_images(images.clone(), PackerConfig::default()).unwrap();
    let a = out.atlas.frame("a.png").unwrap();
    let b = out.atlas.frame("b.png").unwrap();
    let c = out.atlas.frame("c.png").unwrap();
    assert_eq!(a.frame, b.frame);
    assert_eq!(a.page, b.page);
    assert_eq!(a.rotated, b.rotated);
    assert_ne!(a.frame, c.frame);
    assert_eq!(out.stats().num_aliases, 1);
    assert_eq!(out.stats().num_frames, 3);

    let cfg = PackerConfig {
        detect_identical: false,
        ..Default::default()
    };
    let out = pack_images(images, cfg).unwrap();
    let a = out.atlas.frame("a.png").unwrap();
    let b = out.atlas.frame("b.png").unwrap();
    assert_ne!(a.frame, b.frame);
    assert_eq!(out.stats().num_aliases, 0);
}

#[test]
fn aliases_keep_their_own_trim_offsets() {
    let blue = [0, 0, 255, 255];
    let first = with_block(32, 32, Rect::new(2, 2, 8, 8), blue);
    let second = with_block(40, 24, Rect::new(10, 12, 8, 8), blue);
    let images = vec![SourceImage::new("first", first), SourceImage::new("second", second)];

    let frames = preprocess(&images, &PackerConfig::default());
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].key, "first");
    assert_eq!(frames[0].aliases.len(), 1);

    let out = pack_images(images, PackerConfig::default()).unwrap();
    let a = out.atlas.frame("first").unwrap();
    let b = out.atlas.frame("second").unwrap();
    assert_eq!(a.frame, b.frame);
    assert_eq!(a.source, Rect::new(2, 2, 8, 8));
    assert_eq!(a.source_size, (32, 32));
    assert_eq!(b.source, Rect::new(10, 12, 8, 8));
    assert_eq!(b.source_size, (40, 24));
}

#[test]
fn one_differing_pixel_prevents_merging() {
    let base = with_block(8, 8, Rect::new(0, 0, 8, 8), [5, 5, 5, 255]);
    let mut other = base.clone();
    other.put_pixel(7, 7, Rgba([6, 5, 5, 255]));
    let frames = preprocess(
        &[SourceImage::new("x", base), SourceImage::new("y", other)],
        &PackerConfig::default(),
    );
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f.aliases.is_empty()));
}
