use std::collections::BTreeMap;

use crate::model::{Frame, Page};
use crate::packer::Bin;
use crate::preprocess::TrimmedFrame;

/// Builds the logical page records for packed bins, expanding aliases so every input
/// name gets its own [`Frame`]. Aliases directly follow their canonical frame.
pub fn assemble_pages(bins: &[Bin], frames: &[TrimmedFrame]) -> Vec<Page> {
    bins.iter()
        .map(|bin| {
            let mut out = Vec::with_capacity(bin.rects.len());
            for packed in &bin.rects {
                let tf = &frames[packed.frame];
                out.push(Frame {
                    key: tf.key.clone(),
                    frame: packed.rect,
                    rotated: packed.rotated,
                    trimmed: tf.trimmed,
                    source: tf.source,
                    source_size: tf.source_size,
                    page: bin.index,
                });
                out.extend(tf.aliases.iter().map(|alias| Frame {
                    key: alias.key.clone(),
                    frame: packed.rect,
                    rotated: packed.rotated,
                    trimmed: alias.trimmed,
                    source: alias.source,
                    source_size: alias.source_size,
                    page: bin.index,
                }));
            }
            Page {
                id: bin.index,
                width: bin.width,
                height: bin.height,
                frames: out,
            }
        })
        .collect()
}

/// Name -> frame mapping handed to exporters.
pub fn assemble(bins: &[Bin], frames: &[TrimmedFrame]) -> BTreeMap<String, Frame> {
    assemble_pages(bins, frames)
        .into_iter()
        .flat_map(|p| p.frames)
        .map(|f| (f.key.clone(), f))
        .collect()
}
