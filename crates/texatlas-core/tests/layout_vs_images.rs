use image::{Rgba, RgbaImage};
use texatlas_core::config::{PackerConfig, TextureFormat};
use texatlas_core::model::Rect;
use texatlas_core::{
    AtlasError, EncodedImage, SourceImage, encode, layout_files, layout_images, pack_images,
};

fn png(img: &RgbaImage) -> Vec<u8> {
    encode(img, TextureFormat::Png).unwrap()
}

fn square(side: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(side, side, Rgba(color))
}

#[test]
fn layout_merges_identical_files() {
    let same = png(&square(8, [40, 50, 60, 255]));
    let files = vec![
        EncodedImage {
            key: "a.png".into(),
            bytes: same.clone(),
        },
        EncodedImage {
            key: "b.png".into(),
            bytes: same,
        },
    ];
    let out = layout_files(files, PackerConfig::default()).unwrap();
    let a = out.atlas.frame("a.png").unwrap();
    let b = out.atlas.frame("b.png").unwrap();
    assert_eq!(a.frame, b.frame);
    assert_eq!(a.page, b.page);
    assert_eq!(a.frame, Rect::new(0, 0, 8, 8));
    assert_eq!(out.atlas.stats().num_aliases, 1);
    assert!(out.failures.is_empty());
}

#[test]
fn layout_reports_undecodable_inputs() {
    let files = vec![
        EncodedImage {
            key: "x.png".into(),
            bytes: b"garbage".to_vec(),
        },
        EncodedImage {
            key: "y.png".into(),
            bytes: b"more garbage".to_vec(),
        },
    ];
    assert!(matches!(
        layout_files(files, PackerConfig::default()),
        Err(AtlasError::NoDecodableImages { failed: 2 })
    ));

    let files = vec![
        EncodedImage {
            key: "bad.png".into(),
            bytes: Vec::new(),
        },
        EncodedImage {
            key: "good.png".into(),
            bytes: png(&square(4, [1, 1, 1, 255])),
        },
    ];
    let out = layout_files(files, PackerConfig::default()).unwrap();
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].key, "bad.png");
    assert!(out.atlas.frame("good.png").is_some());

    assert!(matches!(
        layout_files(Vec::new(), PackerConfig::default()),
        Err(AtlasError::Empty)
    ));
}

#[test]
fn layout_matches_full_packing() {
    let mut trimmed = RgbaImage::new(20, 12);
    for y in 3..9 {
        for x in 5..15 {
            trimmed.put_pixel(x, y, Rgba([200, 0, 0, 255]));
        }
    }
    let images = vec![
        SourceImage::new("trimmed", trimmed),
        SourceImage::new("big", square(30, [0, 200, 0, 255])),
        SourceImage::new("big_copy", square(30, [0, 200, 0, 255])),
        SourceImage::new("blank", RgbaImage::new(9, 9)),
    ];
    let cfg = PackerConfig {
        max_width: 64,
        max_height: 64,
        padding: 2,
        ..Default::default()
    };
    let layout = layout_images(images.clone(), cfg.clone()).unwrap();
    let packed = pack_images(images, cfg).unwrap();
    assert_eq!(layout.frames(), packed.atlas.frames());
    let t = layout.frame("trimmed").unwrap();
    assert!(t.trimmed);
    assert_eq!(t.source, Rect::new(5, 3, 10, 6));
    assert_eq!(t.source_size, (20, 12));
}
