use std::io::{Cursor, Read};

use anyhow::Context;
use rayon::prelude::*;

use crate::assets::decode::{DrawableImage, FrameDecoder};
use crate::foundation::error::{PlayerError, PlayerResult};

/// Extract the entries named by `names`, in that order, by exact entry name.
///
/// The physical entry order inside the archive is irrelevant.
pub fn extract_entries(archive: &[u8], names: &[String]) -> PlayerResult<Vec<Vec<u8>>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| PlayerError::asset(format!("open frame archive: {e}")))?;

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut entry = match zip.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(PlayerError::asset(format!(
                    "frame '{name}' not found in archive"
                )));
            }
            Err(e) => {
                return Err(PlayerError::asset(format!(
                    "read archive entry '{name}': {e}"
                )));
            }
        };
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("inflate archive entry '{name}'"))
            .map_err(|e| PlayerError::asset(format!("{e:#}")))?;
        out.push(bytes);
    }
    Ok(out)
}

/// Extract and decode every frame in manifest order.
///
/// Extraction is sequential; decoding fans out on rayon and is collected back in order.
pub fn decode_archive(
    archive: &[u8],
    names: &[String],
    decoder: &dyn FrameDecoder,
) -> PlayerResult<Vec<DrawableImage>> {
    let entries = extract_entries(archive, names)?;
    entries
        .par_iter()
        .zip(names.par_iter())
        .map(|(bytes, name)| {
            decoder
                .decode(bytes)
                .map_err(|e| PlayerError::asset(format!("decode archive entry '{name}': {e}")))
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/archive.rs"]
mod tests;
