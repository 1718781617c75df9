use super::path_guard::resolve_inside;
use crate::types::context::RequestContext;
use crate::types::errors::{UpdError, UpdResult};
use std::fs;
use std::io::{self, Read, Seek};
use std::path::Path;
use tempfile::TempDir;

/// Extract a ZIP archive into a fresh scratch directory under `scratch_root`.
///
/// Steps:
/// 1. Open the archive (`InvalidArchive` if it is not a readable ZIP)
/// 2. Create `<archive stem>_extract_XXXXXX` under `scratch_root`
/// 3. Stream every entry to disk, rejecting entries that escape the scratch dir
///
/// The returned `TempDir` owns the tree; dropping it deletes everything, so
/// callers get cleanup on every exit path for free. On error the partially
/// extracted tree is dropped here.
pub fn extract_archive(
    ctx: &RequestContext,
    archive_path: &Path,
    scratch_root: &Path,
) -> UpdResult<TempDir> {
    let file = fs::File::open(archive_path)
        .map_err(|e| UpdError::InvalidArchive(format!("не удалось открыть архив: {e}")))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| UpdError::InvalidArchive(format!("поврежденный ZIP: {e}")))?;

    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "upd".to_string());

    fs::create_dir_all(scratch_root)?;
    let scratch = tempfile::Builder::new()
        .prefix(&format!("{stem}_extract_"))
        .tempdir_in(scratch_root)?;

    let files_extracted = unpack_entries(&mut archive, scratch.path())?;

    log::debug!(
        "[{}] Archive extracted to {} ({} files)",
        ctx.id(),
        scratch.path().display(),
        files_extracted
    );
    Ok(scratch)
}

fn unpack_entries<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    dest_path: &Path,
) -> UpdResult<usize> {
    let mut count: usize = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| UpdError::InvalidArchive(format!("не удалось прочитать запись {i}: {e}")))?;

        let raw_name = entry.name().to_string();
        // Windows-built bundles use `\` in entry names, like their meta.xml paths.
        let relative = raw_name.replace('\\', "/");
        if relative.contains('\0') {
            return Err(UpdError::PathTraversal(raw_name));
        }
        let output_path = resolve_inside(dest_path, Path::new(&relative))
            .ok_or_else(|| UpdError::PathTraversal(raw_name.clone()))?;

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = fs::File::create(&output_path)?;
        io::copy(&mut entry, &mut outfile)
            .map_err(|e| UpdError::IoFailure(format!("не удалось записать {raw_name}: {e}")))?;
        count += 1;
    }
    Ok(count)
}
