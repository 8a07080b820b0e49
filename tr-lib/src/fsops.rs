//! Small filesystem helpers shared by the converter and transformer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// True for `.wav`/`.WAV` files. `chapter.wav` is compiled chapter audio,
/// not a take, and is excluded when `takes_only` is set.
fn is_wav(path: &Path, takes_only: bool) -> bool {
    let is_wav_ext = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if !is_wav_ext {
        return false;
    }
    if takes_only {
        path.file_name()
            .map(|name| name != "chapter.wav")
            .unwrap_or(false)
    } else {
        true
    }
}

fn collect_wavs(dir: &Path, takes_only: bool, out: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_wavs(&path, takes_only, out)?;
        } else if is_wav(&path, takes_only) {
            out.push(path);
        }
    }
    Ok(())
}

/// All take files under `dir`, recursively, in a stable order.
pub(crate) fn wav_takes(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_wavs(dir, true, &mut out)?;
    Ok(out)
}

/// All wav files under `dir`, including `chapter.wav`.
pub(crate) fn wav_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_wavs(dir, false, &mut out)?;
    Ok(out)
}

/// Copy a directory tree into `dest`, creating it as needed.
pub(crate) fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        let path = entry.path();
        if path.is_dir() {
            copy_dir_recursive(&path, &target)?;
        } else {
            fs::copy(&path, &target)?;
        }
    }
    Ok(())
}
