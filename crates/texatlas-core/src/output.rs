use tracing::debug;

use crate::codec::encode;
use crate::config::ExportConfig;
use crate::error::{AtlasError, Result};
use crate::export::{PageImage, export_page};
use crate::pipeline::PackOutput;

/// One file produced for the exporter collaborator.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Base names for `count` pages.
///
/// A single page uses `texture_name` as is; otherwise page `i` is
/// `texture_name + suffix + (suffix_initial_value + i)`.
pub fn page_names(count: usize, cfg: &ExportConfig) -> Vec<String> {
    if count == 1 {
        return vec![cfg.texture_name.clone()];
    }
    (0..count)
        .map(|i| {
            format!(
                "{}{}{}",
                cfg.texture_name,
                cfg.suffix,
                cfg.suffix_initial_value as usize + i
            )
        })
        .collect()
}

/// Encodes every page and renders its metadata.
///
/// Per page this yields `<name>.json` and, unless `base64_export` is set, the texture
/// `<name>.<png|jpg>`. With `base64_export` the texture is embedded in the metadata as a
/// data URI and no separate texture file is produced.
pub fn render_files(out: &PackOutput, cfg: &ExportConfig) -> Result<Vec<OutputFile>> {
    let names = page_names(out.pages.len(), cfg);
    let ext = cfg.texture_format.extension();
    let mut files = Vec::with_capacity(out.pages.len() * 2);

    for (page, name) in out.pages.iter().zip(&names) {
        let texture = encode(&page.rgba, cfg.texture_format)?;
        let image = if cfg.base64_export {
            format!(
                "data:{};base64,{}",
                cfg.texture_format.mime(),
                base64::encode(&texture)
            )
        } else {
            format!("{name}.{ext}")
        };
        let page_image = PageImage {
            image,
            format: cfg.texture_format.pixel_format().into(),
            size: page.rgba.dimensions(),
        };
        let meta = export_page(cfg.exporter, &page.page, &out.atlas.meta, &page_image);
        let text = serde_json::to_string_pretty(&meta)
            .map_err(|e| AtlasError::Encode(format!("metadata: {e}")))?;

        files.push(OutputFile {
            name: format!("{name}.{}", cfg.exporter.extension()),
            bytes: text.into_bytes(),
        });
        if !cfg.base64_export {
            files.push(OutputFile {
                name: format!("{name}.{ext}"),
                bytes: texture,
            });
        }
        debug!(page = page.page.id, %name, "rendered output files");
    }
    Ok(files)
}
