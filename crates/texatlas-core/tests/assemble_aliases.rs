use image::{Rgba, RgbaImage};
use texatlas_core::config::PackerConfig;
use texatlas_core::model::Rect;
use texatlas_core::{SourceImage, assemble, pack_frames, preprocess};

/// Transparent `w`x`h` canvas with a 6x4 two-tone block at (`x`, `y`).
fn sprite(w: u32, h: u32, x: u32, y: u32) -> RgbaImage {
    let mut img = RgbaImage::new(w, h);
    for dy in 0..4 {
        for dx in 0..6 {
            let color = if dx < 3 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
            img.put_pixel(x + dx, y + dy, Rgba(color));
        }
    }
    img
}

#[test]
fn every_name_gets_a_frame_and_aliases_share_placement() {
    let images = vec![
        SourceImage::new("walk/0.png", sprite(16, 16, 1, 2)),
        SourceImage::new("walk/1.png", sprite(16, 16, 8, 10)),
        SourceImage::new("idle.png", sprite(10, 6, 4, 2)),
        SourceImage::new("other.png", RgbaImage::from_pixel(5, 7, Rgba([9, 9, 9, 255]))),
    ];
    let cfg = PackerConfig::default();
    let frames = preprocess(&images, &cfg);
    assert_eq!(frames.len(), 2);

    let packing = pack_frames(&frames, &cfg).unwrap();
    let by_name = assemble(&packing.bins, &frames);

    let keys: Vec<&str> = by_name.keys().map(String::as_str).collect();
    assert_eq!(keys, ["idle.png", "other.png", "walk/0.png", "walk/1.png"]);

    let canonical = &by_name["walk/0.png"];
    for alias in ["walk/1.png", "idle.png"] {
        let f = &by_name[alias];
        assert_eq!(f.frame, canonical.frame, "{alias}");
        assert_eq!(f.rotated, canonical.rotated, "{alias}");
        assert_eq!(f.page, canonical.page, "{alias}");
        assert_eq!(f.key, alias);
    }
    assert_ne!(by_name["other.png"].frame, canonical.frame);

    assert_eq!(canonical.source, Rect::new(1, 2, 6, 4));
    assert_eq!(canonical.source_size, (16, 16));
    assert_eq!(by_name["walk/1.png"].source, Rect::new(8, 10, 6, 4));
    assert_eq!(by_name["idle.png"].source, Rect::new(4, 2, 6, 4));
    assert_eq!(by_name["idle.png"].source_size, (10, 6));
}
