//! Boundary with the `image` crate: decoding inputs, encoding pages, naming frames.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, instrument, warn};

use crate::config::{ExportConfig, TextureFormat};
use crate::error::{AtlasError, Result};
use crate::preprocess::SourceImage;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Undecoded input file contents.
pub struct EncodedImage {
    pub key: String,
    pub bytes: Vec<u8>,
}

/// An input that was dropped because it could not be decoded.
#[derive(Debug, Clone)]
pub struct DecodeFailure {
    pub key: String,
    pub error: String,
}

/// Outcome of decoding a batch. `images` keeps the input order of the successes.
#[derive(Debug, Default)]
pub struct DecodeReport {
    pub images: Vec<SourceImage>,
    pub failures: Vec<DecodeFailure>,
}

/// Decodes any format the `image` crate recognises into RGBA8.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Decodes every input, one task per image when `parallel` is set and the feature is on.
/// Failures are logged and reported but never abort the batch.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn decode_all(inputs: Vec<EncodedImage>, parallel: bool) -> DecodeReport {
    let decode_one = |input: EncodedImage| {
        let res = decode(&input.bytes);
        (input.key, res)
    };

    #[cfg(feature = "parallel")]
    let results: Vec<(String, Result<RgbaImage>)> = if parallel {
        inputs.into_par_iter().map(decode_one).collect()
    } else {
        inputs.into_iter().map(decode_one).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<(String, Result<RgbaImage>)> = {
        let _ = parallel;
        inputs.into_iter().map(decode_one).collect()
    };

    let mut report = DecodeReport::default();
    for (key, res) in results {
        match res {
            Ok(rgba) => report.images.push(SourceImage::new(key, rgba)),
            Err(e) => {
                warn!(%key, error = %e, "skipping image that failed to decode");
                report.failures.push(DecodeFailure {
                    key,
                    error: e.to_string(),
                });
            }
        }
    }
    debug!(
        decoded = report.images.len(),
        failed = report.failures.len(),
        "decode finished"
    );
    report
}

/// Encodes a page. JPEG output drops the alpha channel.
pub fn encode(rgba: &RgbaImage, format: TextureFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let written = match format {
        TextureFormat::Png => rgba.write_to(&mut buf, ImageFormat::Png),
        TextureFormat::Jpg => DynamicImage::ImageRgba8(rgba.clone())
            .to_rgb8()
            .write_to(&mut buf, ImageFormat::Jpeg),
    };
    written.map_err(|e| AtlasError::Encode(format!("{}: {e}", format.extension())))?;
    Ok(buf.into_inner())
}

/// Frame name for an input path relative to the scanned root.
///
/// Backslashes become `/`. Without `prepend_folder_name` only the file name is kept;
/// with `remove_file_extension` the last extension is stripped.
pub fn frame_name(relative_path: &str, cfg: &ExportConfig) -> String {
    let normalized = relative_path.replace('\\', "/");
    let (folder, file) = match normalized.rfind('/') {
        Some(i) => (&normalized[..=i], &normalized[i + 1..]),
        None => ("", normalized.as_str()),
    };
    let file = if cfg.remove_file_extension {
        match file.rfind('.') {
            Some(i) if i > 0 => &file[..i],
            _ => file,
        }
    } else {
        file
    };
    if cfg.prepend_folder_name {
        format!("{folder}{file}")
    } else {
        file.to_string()
    }
}
