use std::fs;
use std::io;
use std::path::Path;

use merger_core::{media_type_for_filename, RawFileHandle};
use merger_logging::merger_warn;

/// Lists the regular files of `dir` as a raw selection, declaring video types by extension.
pub(crate) fn scan_directory(dir: &Path) -> io::Result<Vec<RawFileHandle>> {
    let mut raw = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
            merger_warn!("Skipping non UTF-8 file name {:?}", entry.file_name());
            continue;
        };
        let media_type = media_type_for_filename(&name);
        raw.push(RawFileHandle::new(name, media_type));
    }
    Ok(raw)
}
