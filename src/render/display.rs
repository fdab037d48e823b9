//! Output surfaces a render session presents frames to

use image::{ImageFormat, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::error::RenderError;

/// Where composed frames go. `present` must never block on the consumer;
/// failures from earlier frames may surface on a later call.
pub trait Display: Send {
    /// Prepare the surface for frames of the given size
    fn open(&mut self, width: u32, height: u32) -> Result<(), RenderError>;
    fn present(&mut self, frame: &RgbImage) -> Result<(), RenderError>;
    fn close(&mut self) {}
}

// =============================================================================
// PNG FILE
// =============================================================================

#[derive(Debug, Default)]
struct WriterSlot {
    /// Newest frame not yet picked up by the writer
    pending: Option<RgbImage>,
    closed: bool,
    /// Last failed write, reported on the next present
    error: Option<String>,
    superseded: u64,
}

#[derive(Debug, Default)]
struct WriterShared {
    slot: Mutex<WriterSlot>,
    ready: Condvar,
}

impl WriterShared {
    fn lock(&self) -> MutexGuard<'_, WriterSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps one PNG on disk current with the latest frame.
///
/// A writer thread owns the file and takes frames from a single slot. A frame
/// presented while a write is in flight replaces the waiting one, so the last
/// presented frame is always the last one written.
pub struct PngDisplay {
    path: PathBuf,
    shared: Option<Arc<WriterShared>>,
    worker: Option<JoinHandle<()>>,
}

impl PngDisplay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            shared: None,
            worker: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames replaced in the slot before the writer got to them
    pub fn superseded_frames(&self) -> u64 {
        self.shared.as_ref().map_or(0, |shared| shared.lock().superseded)
    }
}

impl Display for PngDisplay {
    fn open(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.shared.is_some() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                RenderError::SurfaceUnavailable(format!("{}: {}", parent.display(), e))
            })?;
        }

        let shared = Arc::new(WriterShared::default());
        let writer_shared = Arc::clone(&shared);
        let path = self.path.clone();
        let worker = thread::Builder::new()
            .name("fieldmap-png".to_string())
            .spawn(move || write_frames(&path, &writer_shared))
            .map_err(|e| RenderError::SurfaceUnavailable(format!("writer thread: {}", e)))?;

        self.shared = Some(shared);
        self.worker = Some(worker);
        info!("Presenting {}x{} frames to {}", width, height, self.path.display());
        Ok(())
    }

    fn present(&mut self, frame: &RgbImage) -> Result<(), RenderError> {
        let Some(shared) = &self.shared else {
            return Err(RenderError::SurfaceUnavailable(
                "display is not open".to_string(),
            ));
        };
        if self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            return Err(RenderError::SurfaceUnavailable(
                "PNG writer thread exited".to_string(),
            ));
        }

        let mut slot = shared.lock();
        if let Some(error) = slot.error.take() {
            return Err(RenderError::SurfaceUnavailable(error));
        }
        if slot.pending.replace(frame.clone()).is_some() {
            slot.superseded += 1;
            debug!(superseded = slot.superseded, "PNG writer busy, waiting frame replaced");
        }
        drop(slot);
        shared.ready.notify_one();
        Ok(())
    }

    /// Flush the waiting frame, if any, and stop the writer
    fn close(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.lock().closed = true;
            shared.ready.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for PngDisplay {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_frames(path: &Path, shared: &WriterShared) {
    loop {
        let frame = {
            let mut slot = shared.lock();
            loop {
                if let Some(frame) = slot.pending.take() {
                    break frame;
                }
                if slot.closed {
                    return;
                }
                slot = shared
                    .ready
                    .wait(slot)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        if let Err(e) = write_atomic(path, &frame) {
            let message = format!("failed to write {}: {}", path.display(), e);
            warn!("{}", message);
            shared.lock().error = Some(message);
        }
    }
}

/// Write beside the target then rename, so viewers never see a partial PNG
fn write_atomic(path: &Path, frame: &RgbImage) -> Result<(), String> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    frame
        .save_with_format(&tmp, ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    fs::rename(&tmp, path).map_err(|e| e.to_string())
}

// =============================================================================
// IN MEMORY
// =============================================================================

#[derive(Debug, Default)]
struct TapState {
    opened: Option<(u32, u32)>,
    presents: u64,
    last: Option<RgbImage>,
}

/// Read side of a `MemoryDisplay`
#[derive(Debug, Clone, Default)]
pub struct FrameTap {
    inner: Arc<Mutex<TapState>>,
}

impl FrameTap {
    pub fn presents(&self) -> u64 {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).presents
    }

    pub fn opened_size(&self) -> Option<(u32, u32)> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).opened
    }

    pub fn last_frame(&self) -> Option<RgbImage> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last
            .clone()
    }
}

/// Headless surface that keeps the latest frame in memory
#[derive(Debug, Default)]
pub struct MemoryDisplay {
    tap: FrameTap,
}

impl MemoryDisplay {
    pub fn new() -> (Self, FrameTap) {
        let display = Self::default();
        let tap = display.tap.clone();
        (display, tap)
    }
}

impl Display for MemoryDisplay {
    fn open(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.tap
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .opened = Some((width, height));
        Ok(())
    }

    fn present(&mut self, frame: &RgbImage) -> Result<(), RenderError> {
        let mut state = self.tap.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.presents += 1;
        state.last = Some(frame.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.tap
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .opened = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    #[test]
    fn memory_display_records_frames() {
        let (mut display, tap) = MemoryDisplay::new();
        display.open(4, 2).unwrap();
        assert_eq!(tap.opened_size(), Some((4, 2)));

        let frame = RgbImage::from_pixel(4, 2, Rgb([1, 2, 3]));
        display.present(&frame).unwrap();
        display.present(&frame).unwrap();
        assert_eq!(tap.presents(), 2);
        assert_eq!(tap.last_frame(), Some(frame));

        display.close();
        assert_eq!(tap.opened_size(), None);
    }

    #[test]
    fn png_display_requires_open() {
        let mut display = PngDisplay::new(std::env::temp_dir().join("fieldmap_never.png"));
        let frame = RgbImage::new(2, 2);
        assert!(matches!(
            display.present(&frame),
            Err(RenderError::SurfaceUnavailable(_))
        ));
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("fieldmap_{}_{}", tag, nanos))
    }

    #[test]
    fn png_display_writes_file() {
        let dir = scratch_dir("png");
        let path = dir.join("frame.png");

        let mut display = PngDisplay::new(&path);
        display.open(3, 3).unwrap();
        display
            .present(&RgbImage::from_pixel(3, 3, Rgb([9, 9, 9])))
            .unwrap();
        display.close();

        let img = image::open(&path).expect("frame written").to_rgb8();
        assert_eq!(img.dimensions(), (3, 3));
        assert_eq!(*img.get_pixel(1, 1), Rgb([9, 9, 9]));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn burst_of_frames_ends_with_the_last_one() {
        let dir = scratch_dir("burst");
        let path = dir.join("frame.png");

        let mut display = PngDisplay::new(&path);
        display.open(400, 400).unwrap();
        for level in 0..20u8 {
            display
                .present(&RgbImage::from_pixel(400, 400, Rgb([level, level, level])))
                .unwrap();
        }
        display.close();

        let img = image::open(&path).expect("frame written").to_rgb8();
        assert_eq!(*img.get_pixel(200, 200), Rgb([19, 19, 19]));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_write_is_reported_on_next_present() {
        let dir = scratch_dir("blocked");
        let path = dir.join("frame.png");
        // A directory at the target path makes the final rename fail
        fs::create_dir_all(&path).unwrap();

        let mut display = PngDisplay::new(&path);
        display.open(2, 2).unwrap();
        let frame = RgbImage::new(2, 2);
        display.present(&frame).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut reported = None;
        while reported.is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            if let Err(e) = display.present(&frame) {
                reported = Some(e);
            }
        }
        assert!(
            matches!(reported, Some(RenderError::SurfaceUnavailable(ref m)) if m.contains("failed to write")),
            "{:?}",
            reported
        );

        display.close();
        let _ = fs::remove_dir_all(&dir);
    }
}
