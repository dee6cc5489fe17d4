/// Population of a view's frame cache from `get_image` calls.
///
/// One request per rotation angle, each written into the shared cache as
/// soon as it lands. A failed angle is logged and simply never appears;
/// the viewer keeps showing the nearest frame it has.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::client::BackendClient;
use super::types::ViewConfig;
use crate::error::{Error, Result};
use crate::state::frames::{Frame, FrameCache};

/// Longitudes of a spin with `frames` evenly spaced steps, in (-180, 180].
pub fn spin_angles(frames: u32) -> Vec<f64> {
    let frames = frames.max(1);
    (0..frames)
        .map(|i| normalize_longitude(i as f64 * 360.0 / frames as f64))
        .collect()
}

/// Wrap a longitude into (-180, 180].
pub fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = longitude.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Fetch the frame at `angle` and store it in `cache`.
///
/// Returns the angle on success so callers can report progress.
pub async fn fetch_frame(
    client: BackendClient,
    cache: Arc<FrameCache>,
    config: Arc<ViewConfig>,
    angle: f64,
) -> Result<f64> {
    let result = async {
        let bytes = client.get_image(&config.at_longitude(angle)).await?;
        let frame = tokio::task::spawn_blocking(move || Frame::decode(&bytes))
            .await
            .map_err(|e| Error::Task(e.to_string()))??;
        Ok::<Frame, Error>(frame)
    }
    .await;

    match result {
        Ok(frame) => {
            cache.insert(angle, frame);
            log::debug!("frame at {:.1}° ready ({} cached)", angle, cache.len());
            Ok(angle)
        }
        Err(e) => {
            log::warn!("⚠️  frame at {:.1}° failed: {}", angle, e);
            Err(e)
        }
    }
}

/// Launch one independent fetch per spin angle.
///
/// Tasks are not cancellable: they run to completion even if the view is
/// closed, writing into a cache nobody reads any more.
pub fn spawn_spin(
    client: &BackendClient,
    cache: &Arc<FrameCache>,
    config: ViewConfig,
) -> Vec<JoinHandle<Result<f64>>> {
    let config = Arc::new(config);
    spin_angles(config.rotation_frames)
        .into_iter()
        .map(|angle| {
            tokio::spawn(fetch_frame(
                client.clone(),
                Arc::clone(cache),
                Arc::clone(&config),
                angle,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::NewViewForm;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(width, height);
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_spin_angles() {
        assert_eq!(spin_angles(4), vec![0.0, 90.0, 180.0, -90.0]);
        assert_eq!(spin_angles(1), vec![0.0]);
        assert_eq!(spin_angles(0), vec![0.0]);
        assert_eq!(spin_angles(30).len(), 30);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(185.0), -175.0);
        assert_eq!(normalize_longitude(-185.0), 175.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), 180.0);
        assert_eq!(normalize_longitude(360.0), 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_spin_fills_cache_and_skips_failures() {
        let server = MockServer::start().await;
        // The frame at 90° fails, every other one succeeds.
        Mock::given(method("GET"))
            .and(path("/get_image"))
            .and(body_partial_json(json!({ "center": [0.0, 90.0] })))
            .respond_with(ResponseTemplate::new(404))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/get_image"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png(8, 4)))
            .with_priority(2)
            .mount(&server)
            .await;

        let client =
            BackendClient::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
        let cache: Arc<FrameCache> = Arc::new(FrameCache::new());
        let mut form = NewViewForm::default();
        form.rotation_frames = 4;
        let config = form.to_config(Path::new("out"));

        let mut failures = 0;
        for handle in spawn_spin(&client, &cache, config) {
            if handle.await.unwrap().is_err() {
                failures += 1;
            }
        }

        assert_eq!(failures, 1);
        assert_eq!(cache.angles(), vec![-90.0, 0.0, 180.0]);
        // 90° is missing, the lower neighbour wins the tie between 0° and 180°
        let frame = cache.nearest(90.0);
        assert_eq!((frame.width(), frame.height()), (8, 4));
    }
}
