/// Rotation-indexed frame cache
///
/// A spin view is rendered by the backend as one frame per longitude.
/// Frames arrive out of order (one request per angle), so the viewer asks
/// for the frame *nearest* to the longitude the user is looking at and
/// gets the best available one while the rest are still loading.
use iced::widget::image::Handle;
use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::Arc;

use super::viewer::Region;
use crate::error::Result;

/// A single decoded frame of a view
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Decoded pixels, None for the empty placeholder
    pixels: Option<Arc<RgbaImage>>,
    /// Display handle built once from `pixels`
    handle: Option<Handle>,
}

impl Frame {
    /// Decode a PNG (or any format the image crate detects) into a frame
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::from_rgba(rgba))
    }

    pub fn from_rgba(rgba: RgbaImage) -> Self {
        let handle = Handle::from_rgba(rgba.width(), rgba.height(), rgba.as_raw().clone());
        Self {
            pixels: Some(Arc::new(rgba)),
            handle: Some(handle),
        }
    }

    /// True for the placeholder returned by an empty cache
    pub fn is_empty(&self) -> bool {
        self.pixels.is_none()
    }

    pub fn width(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.width())
    }

    pub fn height(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |p| p.height())
    }

    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_deref()
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    /// The part of the frame inside `region` (clamped to the image)
    pub fn crop(&self, region: Region) -> Frame {
        match self.pixels() {
            Some(pixels) => {
                let view = image::imageops::crop_imm(
                    pixels,
                    region.x,
                    region.y,
                    region.width,
                    region.height,
                );
                Frame::from_rgba(view.to_image())
            }
            None => Frame::default(),
        }
    }
}

/// Frames of one view, sorted by rotation angle (degrees)
///
/// Safe to share between fetch tasks and the display path. The type
/// parameter exists so the lookup logic can be exercised without images.
#[derive(Debug, Default)]
pub struct FrameCache<F = Frame> {
    entries: Mutex<Vec<(f64, F)>>,
}

impl<F: Clone + Default> FrameCache<F> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Store `frame` at `angle`, replacing a frame at exactly that angle.
    pub fn insert(&self, angle: f64, frame: F) {
        if angle.is_nan() {
            log::warn!("ignoring frame with NaN rotation");
            return;
        }
        let mut entries = self.entries.lock();
        let idx = entries.partition_point(|(key, _)| *key < angle);
        match entries.get_mut(idx) {
            Some(entry) if entry.0 == angle => entry.1 = frame,
            _ => entries.insert(idx, (angle, frame)),
        }
    }

    /// Frame whose angle is closest to `query`.
    ///
    /// On an exact tie the lower angle wins. Queries outside the cached
    /// range clamp to the first/last frame. An empty cache yields
    /// `F::default()`.
    pub fn nearest(&self, query: f64) -> F {
        let entries = self.entries.lock();
        if entries.is_empty() {
            return F::default();
        }
        // first key >= query
        let idx = entries.partition_point(|(key, _)| *key < query);
        if idx == 0 {
            return entries[0].1.clone();
        }
        if idx == entries.len() {
            return entries[entries.len() - 1].1.clone();
        }

        let (before, before_frame) = &entries[idx - 1];
        let (after, after_frame) = &entries[idx];
        if (before - query).abs() <= (after - query).abs() {
            before_frame.clone()
        } else {
            after_frame.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Cached angles in ascending order
    pub fn angles(&self) -> Vec<f64> {
        self.entries.lock().iter().map(|(angle, _)| *angle).collect()
    }
}
