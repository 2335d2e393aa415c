use image::{Rgba, RgbaImage};
use serde_json::Value;
use texatlas_core::config::{ExportConfig, ExporterKind, PackerConfig, TextureFormat};
use texatlas_core::{SourceImage, decode, frame_name, pack_images, page_names, render_files};

fn sprites(n: usize, side: u32) -> Vec<SourceImage> {
    (0..n)
        .map(|i| {
            let shade = (i * 20) as u8;
            SourceImage::new(
                format!("img{i:02}.png"),
                RgbaImage::from_pixel(side, side, Rgba([shade, 0, 0, 255])),
            )
        })
        .collect()
}

fn bin(side: u32) -> PackerConfig {
    PackerConfig {
        max_width: side,
        max_height: side,
        ..Default::default()
    }
}

fn names(files: &[texatlas_core::OutputFile]) -> Vec<&str> {
    files.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn single_page_uses_the_bare_texture_name() {
    let out = pack_images(sprites(2, 16), bin(64)).unwrap();
    let files = render_files(&out, &ExportConfig::default()).unwrap();
    assert_eq!(names(&files), ["pack-result.json", "pack-result.png"]);
}

#[test]
fn multiple_pages_get_numbered_suffixes() {
    let out = pack_images(sprites(10, 64), bin(128)).unwrap();
    assert_eq!(out.pages.len(), 3);
    let cfg = ExportConfig {
        texture_name: "atlas".into(),
        suffix: "_".into(),
        suffix_initial_value: 1,
        ..Default::default()
    };
    let files = render_files(&out, &cfg).unwrap();
    assert_eq!(
        names(&files),
        [
            "atlas_1.json",
            "atlas_1.png",
            "atlas_2.json",
            "atlas_2.png",
            "atlas_3.json",
            "atlas_3.png"
        ]
    );
    assert_eq!(page_names(1, &cfg), ["atlas"]);
}

#[test]
fn json_hash_describes_every_frame_on_its_page() {
    let out = pack_images(sprites(3, 16), bin(64)).unwrap();
    let files = render_files(&out, &ExportConfig::default()).unwrap();
    let meta: Value = serde_json::from_slice(&files[0].bytes).unwrap();

    let frames = meta["frames"].as_object().unwrap();
    assert_eq!(frames.len(), 3);
    let f = &frames["img01.png"];
    assert_eq!(f["frame"]["w"], 16);
    assert_eq!(f["sourceSize"]["h"], 16);
    assert_eq!(f["rotated"], false);
    assert_eq!(f["page"], 0);
    assert_eq!(meta["meta"]["image"], "pack-result.png");
    assert_eq!(meta["meta"]["format"], "RGBA8888");
    let (w, h) = out.pages[0].rgba.dimensions();
    assert_eq!(meta["meta"]["size"]["w"], w);
    assert_eq!(meta["meta"]["size"]["h"], h);

    // The texture file decodes back to the page raster.
    let texture = decode(&files[1].bytes).unwrap();
    assert_eq!(texture, out.pages[0].rgba);
}

#[test]
fn json_array_lists_frames_with_filenames() {
    let out = pack_images(sprites(2, 16), bin(64)).unwrap();
    let cfg = ExportConfig {
        exporter: ExporterKind::JsonArray,
        ..Default::default()
    };
    let files = render_files(&out, &cfg).unwrap();
    let meta: Value = serde_json::from_slice(&files[0].bytes).unwrap();
    let frames = meta["frames"].as_array().unwrap();
    let mut filenames: Vec<&str> = frames
        .iter()
        .map(|f| f["filename"].as_str().unwrap())
        .collect();
    filenames.sort();
    assert_eq!(filenames, ["img00.png", "img01.png"]);
}

#[test]
fn base64_export_embeds_the_texture() {
    let out = pack_images(sprites(2, 16), bin(64)).unwrap();
    let cfg = ExportConfig {
        base64_export: true,
        ..Default::default()
    };
    let files = render_files(&out, &cfg).unwrap();
    assert_eq!(names(&files), ["pack-result.json"]);
    let meta: Value = serde_json::from_slice(&files[0].bytes).unwrap();
    let image = meta["meta"]["image"].as_str().unwrap();
    let payload = image.strip_prefix("data:image/png;base64,").unwrap();
    let bytes = base64::decode(payload).unwrap();
    assert_eq!(decode(&bytes).unwrap(), out.pages[0].rgba);
}

#[test]
fn jpg_pages_drop_alpha() {
    let out = pack_images(sprites(1, 8), bin(64)).unwrap();
    let cfg = ExportConfig {
        texture_format: TextureFormat::Jpg,
        ..Default::default()
    };
    let files = render_files(&out, &cfg).unwrap();
    assert_eq!(names(&files), ["pack-result.json", "pack-result.jpg"]);
    let meta: Value = serde_json::from_slice(&files[0].bytes).unwrap();
    assert_eq!(meta["meta"]["format"], "RGB888");
    let texture = decode(&files[1].bytes).unwrap();
    assert_eq!(texture.dimensions(), (8, 8));
}

#[test]
fn frame_names_follow_export_options() {
    let default = ExportConfig::default();
    assert_eq!(frame_name("ui/buttons/ok.png", &default), "ui/buttons/ok.png");
    assert_eq!(frame_name("ui\\buttons\\ok.png", &default), "ui/buttons/ok.png");

    let flat = ExportConfig {
        prepend_folder_name: false,
        ..Default::default()
    };
    assert_eq!(frame_name("ui/buttons/ok.png", &flat), "ok.png");

    let bare = ExportConfig {
        remove_file_extension: true,
        ..Default::default()
    };
    assert_eq!(frame_name("ui/ok.anim.png", &bare), "ui/ok.anim");
    assert_eq!(frame_name(".hidden", &bare), ".hidden");
}
