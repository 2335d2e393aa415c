use serde_json::{Value, json};

use crate::config::ExporterKind;
use crate::model::{Frame, Meta, Page};

/// Texture reference written into a page's metadata.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// File name of the texture, or a `data:` URI when it is embedded.
    pub image: String,
    /// Pixel format string (`RGBA8888` / `RGB888`).
    pub format: String,
    /// Size of the encoded (scaled) texture.
    pub size: (u32, u32),
}

fn frame_fields(fr: &Frame) -> serde_json::Map<String, Value> {
    let mut m = serde_json::Map::new();
    m.insert(
        "frame".into(),
        json!({"x": fr.frame.x, "y": fr.frame.y, "w": fr.frame.w, "h": fr.frame.h}),
    );
    m.insert("rotated".into(), json!(fr.rotated));
    m.insert("trimmed".into(), json!(fr.trimmed));
    m.insert(
        "spriteSourceSize".into(),
        json!({"x": fr.source.x, "y": fr.source.y, "w": fr.source.w, "h": fr.source.h}),
    );
    m.insert(
        "sourceSize".into(),
        json!({"w": fr.source_size.0, "h": fr.source_size.1}),
    );
    m.insert("page".into(), json!(fr.page));
    m
}

fn meta_value(meta: &Meta, image: &PageImage) -> Value {
    json!({
        "app": meta.app,
        "version": meta.version,
        "image": image.image,
        "format": image.format,
        "size": {"w": image.size.0, "h": image.size.1},
        "scale": meta.scale,
        "trimMode": meta.trim_mode,
    })
}

/// Frames keyed by name, TexturePacker "JSON hash" style.
/// Shape: `{ frames: { name: { frame, rotated, trimmed, spriteSourceSize, sourceSize, page } }, meta }`.
pub fn to_json_hash(page: &Page, meta: &Meta, image: &PageImage) -> Value {
    let mut frames = serde_json::Map::new();
    for fr in &page.frames {
        frames.insert(fr.key.clone(), Value::Object(frame_fields(fr)));
    }
    json!({ "frames": frames, "meta": meta_value(meta, image) })
}

/// Frames as an array in packing order, each carrying its name under `filename`.
pub fn to_json_array(page: &Page, meta: &Meta, image: &PageImage) -> Value {
    let frames: Vec<Value> = page
        .frames
        .iter()
        .map(|fr| {
            let mut m = serde_json::Map::new();
            m.insert("filename".into(), json!(fr.key));
            m.extend(frame_fields(fr));
            Value::Object(m)
        })
        .collect();
    json!({ "frames": frames, "meta": meta_value(meta, image) })
}

/// Dispatches to the exporter selected by `kind`.
pub fn export_page(kind: ExporterKind, page: &Page, meta: &Meta, image: &PageImage) -> Value {
    match kind {
        ExporterKind::JsonHash => to_json_hash(page, meta, image),
        ExporterKind::JsonArray => to_json_array(page, meta, image),
    }
}
