/// Images the backend writes to disk
///
/// While `generate` runs, the backend drops numbered PNG snapshots of each
/// pipeline stage into a directory. This module finds the newest one and
/// turns the directory into a stream of previews that the UI consumes
/// until it aborts the stream when generation finishes.
///
/// Views rendered with `draw` end up as numbered frames in a directory
/// too; `load_view_directory` reads them back into a frame cache.
use iced::futures::stream::{self, Stream};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::backend::frames::spin_angles;
use crate::error::Result;
use crate::state::frames::{Frame, FrameCache};

/// Remove stale previews from a previous run
pub fn clear_previews(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Sort paths so that embedded numbers compare numerically
/// (`2.png` before `10.png`).
pub fn natural_sort(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        let (chunk_a, rest_a) = split_chunk(a);
        let (chunk_b, rest_b) = split_chunk(b);
        let ordering = match (is_digits(chunk_a), is_digits(chunk_b)) {
            (true, true) => cmp_digits(chunk_a, chunk_b),
            // numbers sort before text
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => chunk_a.cmp(chunk_b),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
        a = rest_a;
        b = rest_b;
    }
}

fn is_digits(chunk: &str) -> bool {
    chunk.starts_with(|c: char| c.is_ascii_digit())
}

/// Numeric comparison of two digit runs of any length
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Leading run of digits or of non-digits
fn split_chunk(s: &str) -> (&str, &str) {
    let digits = s.starts_with(|c: char| c.is_ascii_digit());
    let end = s
        .find(|c: char| c.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

/// PNG files directly inside `dir`, naturally sorted
pub fn list_pngs(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("png"))
                    .unwrap_or(false)
        })
        .collect();
    natural_sort(&mut paths);
    paths
}

/// Delete the PNG frames left in `dir` by an earlier render
pub fn remove_pngs(dir: &Path) -> std::io::Result<()> {
    for path in list_pngs(dir) {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Decode every frame in `dir` into `cache`. Frame `i` of `n` is keyed at
/// the i-th spin angle, so a directory of 30 renders covers a full turn.
/// Returns how many frames were loaded.
pub fn load_view_directory(dir: &Path, cache: &FrameCache) -> Result<usize> {
    let paths = list_pngs(dir);
    let angles = spin_angles(paths.len() as u32);
    let mut loaded = 0;
    for (path, angle) in paths.iter().zip(angles) {
        let bytes = std::fs::read(path)?;
        match Frame::decode(&bytes) {
            Ok(frame) => {
                cache.insert(angle, frame);
                loaded += 1;
            }
            Err(e) => log::warn!("⚠️  Skipping {}: {}", path.display(), e),
        }
    }
    log::info!("📂 Loaded {} frames from {}", loaded, dir.display());
    Ok(loaded)
}

/// True when the backend hasn't finished writing the file yet: the image
/// is missing/undecodable, or its first pixel is fully transparent black.
pub fn is_empty_image(frame: &Frame) -> bool {
    match frame.pixels() {
        None => true,
        Some(pixels) if pixels.width() == 0 || pixels.height() == 0 => true,
        Some(pixels) => {
            let [r, g, b, a] = pixels.get_pixel(0, 0).0;
            r == 0 && g == 0 && b == 0 && a <= 1
        }
    }
}

fn load_preview(path: &Path) -> Option<Frame> {
    let bytes = std::fs::read(path).ok()?;
    let frame = Frame::decode(&bytes).ok()?;
    (!is_empty_image(&frame)).then_some(frame)
}

/// Outcome of one look at the preview directory
#[derive(Debug)]
pub enum Scan {
    /// Newest file is the one already shown; it was not read again
    Unchanged,
    /// Nothing there yet, or the newest file is still being written
    NotReady,
    Fresh(Preview),
}

/// Newest preview in `dir` that decodes to a usable image. The path is
/// compared with `last_seen` before anything is decoded.
pub fn scan(dir: &Path, last_seen: Option<&Path>) -> Scan {
    let Some(path) = list_pngs(dir).pop() else {
        return Scan::NotReady;
    };
    if last_seen == Some(path.as_path()) {
        return Scan::Unchanged;
    }
    match load_preview(&path) {
        Some(frame) => Scan::Fresh(Preview { path, frame }),
        None => Scan::NotReady,
    }
}

/// A fresh preview found while watching
#[derive(Debug, Clone)]
pub struct Preview {
    pub path: PathBuf,
    pub frame: Frame,
}

/// Poll `dir` every `interval` and yield each new newest preview.
///
/// The stream never ends on its own; the caller drops or aborts it once
/// generation completes.
pub fn watch(dir: PathBuf, interval: Duration) -> impl Stream<Item = Preview> {
    stream::unfold(
        (dir, None::<PathBuf>),
        move |(dir, last_seen)| async move {
            loop {
                let scan_dir = dir.clone();
                let seen = last_seen.clone();
                let found =
                    tokio::task::spawn_blocking(move || scan(&scan_dir, seen.as_deref())).await;
                if let Ok(Scan::Fresh(preview)) = found {
                    log::debug!("pipeline preview {}", preview.path.display());
                    let path = preview.path.clone();
                    return Some((preview, (dir, Some(path))));
                }
                tokio::time::sleep(interval).await;
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::futures::StreamExt;
    use image::{Rgba, RgbaImage};

    fn write_png(path: &Path, colour: [u8; 4]) {
        let img = RgbaImage::from_pixel(3, 3, Rgba(colour));
        img.save(path).unwrap();
    }

    #[test]
    fn test_natural_sort() {
        let mut paths: Vec<PathBuf> = ["10.png", "2.png", "1.png", "a.png", "1b.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        natural_sort(&mut paths);
        let names: Vec<_> = paths.iter().map(|p| p.to_string_lossy().to_string()).collect();
        assert_eq!(names, ["1.png", "1b.png", "2.png", "10.png", "a.png"]);
    }

    #[test]
    fn test_scan_skips_empty_images() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("2.png"), [10, 20, 30, 255]);
        write_png(&dir.path().join("10.png"), [0, 0, 0, 0]);

        // newest file is still blank
        assert!(matches!(scan(dir.path(), None), Scan::NotReady));

        write_png(&dir.path().join("10.png"), [200, 0, 0, 255]);
        let Scan::Fresh(preview) = scan(dir.path(), None) else {
            panic!("expected a preview");
        };
        assert_eq!(preview.path.file_name().unwrap(), "10.png");
        assert_eq!(preview.frame.pixels().unwrap().get_pixel(0, 0).0, [200, 0, 0, 255]);
    }

    #[test]
    fn test_natural_sort_long_digit_runs() {
        let mut paths: Vec<PathBuf> = [
            "123456789012345678901234.png",
            "99.png",
            "007.png",
            "x.png",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        natural_sort(&mut paths);
        let names: Vec<_> = paths.iter().map(|p| p.to_string_lossy().to_string()).collect();
        assert_eq!(
            names,
            ["007.png", "99.png", "123456789012345678901234.png", "x.png"]
        );
        assert_eq!(natural_cmp("07.png", "7.png"), Ordering::Equal);
    }

    #[test]
    fn test_scan_skips_decoding_seen_preview() {
        let dir = tempfile::tempdir().unwrap();
        let newest = dir.path().join("3.png");
        // unreadable as an image, so decoding it would report NotReady
        std::fs::write(&newest, b"half written").unwrap();

        assert!(matches!(scan(dir.path(), Some(&newest)), Scan::Unchanged));
        assert!(matches!(scan(dir.path(), None), Scan::NotReady));

        write_png(&dir.path().join("4.png"), [9, 9, 9, 255]);
        match scan(dir.path(), Some(&newest)) {
            Scan::Fresh(preview) => assert!(preview.path.ends_with("4.png")),
            other => panic!("expected a fresh preview, got {:?}", other),
        }
    }

    #[test]
    fn test_list_pngs_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("1.png"), [1, 1, 1, 255]);
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_png(&dir.path().join("nested").join("2.png"), [1, 1, 1, 255]);

        let pngs = list_pngs(dir.path());
        assert_eq!(pngs.len(), 1);
        assert!(pngs[0].ends_with("1.png"));
    }

    #[test]
    fn test_load_view_directory_spreads_frames_over_a_turn() {
        let dir = tempfile::tempdir().unwrap();
        for (i, shade) in [(0, 10u8), (1, 20), (2, 30), (3, 40)] {
            write_png(&dir.path().join(format!("{}.png", i)), [shade, 0, 0, 255]);
        }
        std::fs::write(dir.path().join("10.png"), b"not a png").unwrap();

        let cache: FrameCache = FrameCache::new();
        // five files, so frames are 72° apart; the broken one is skipped
        assert_eq!(load_view_directory(dir.path(), &cache).unwrap(), 4);
        assert_eq!(cache.angles(), vec![-144.0, 0.0, 72.0, 144.0]);
        // 3.png is the fourth frame: 216° wrapped to -144°
        assert_eq!(cache.nearest(-144.0).pixels().unwrap().get_pixel(0, 0).0[0], 40);
    }

    #[test]
    fn test_remove_pngs_keeps_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("0.png"), [1, 1, 1, 255]);
        std::fs::write(dir.path().join("keep.txt"), "x").unwrap();

        remove_pngs(dir.path()).unwrap();
        assert!(list_pngs(dir.path()).is_empty());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_clear_missing_dir_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        clear_previews(&dir.path().join("pipeline")).unwrap();
    }

    #[tokio::test]
    async fn test_watch_yields_each_new_preview_once() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("0.png"), [5, 5, 5, 255]);

        let mut previews = Box::pin(watch(dir.path().to_path_buf(), Duration::from_millis(10)));
        let first = previews.next().await.unwrap();
        assert!(first.path.ends_with("0.png"));

        write_png(&dir.path().join("1.png"), [6, 6, 6, 255]);
        let second = previews.next().await.unwrap();
        assert!(second.path.ends_with("1.png"));
    }
}
