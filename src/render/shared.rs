//! Session handle for multi-threaded front ends

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::session::{RenderSession, RenderTarget, UpdateReport};
use crate::error::RenderError;
use crate::field::FieldFrame;

/// Clonable handle that serializes every update through one lock.
///
/// A panic inside one update poisons the mutex; the next caller takes the
/// guard anyway, so a single failed request never locks out later ones.
#[derive(Clone)]
pub struct SharedRenderSession {
    inner: Arc<Mutex<RenderSession>>,
}

impl SharedRenderSession {
    pub fn new(session: RenderSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, RenderSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update(&self, frames: &[FieldFrame]) -> Result<UpdateReport, RenderError> {
        self.lock().update(frames)
    }
}

impl RenderTarget for SharedRenderSession {
    fn render(&mut self, frames: &[FieldFrame]) -> Result<UpdateReport, RenderError> {
        self.update(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{VectorRules, ZoomLevel};
    use crate::render::display::MemoryDisplay;
    use crate::render::session::RenderOptions;
    use std::thread;

    fn frame() -> FieldFrame {
        let level = ZoomLevel::new(100.0, 2.0).unwrap();
        FieldFrame::compute(&[], &level, 0.1, &VectorRules::default())
    }

    #[test]
    fn concurrent_updates_share_one_figure() {
        let (display, tap) = MemoryDisplay::new();
        let options = RenderOptions {
            panel_size: 20,
            ..RenderOptions::default()
        };
        let shared = SharedRenderSession::new(RenderSession::new(options, Box::new(display)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let handle = shared.clone();
                thread::spawn(move || handle.update(&[frame()]).map(|r| r.constructed))
            })
            .collect();
        let constructed = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .filter(|c| *c)
            .count();

        assert_eq!(constructed, 1);
        assert_eq!(tap.presents(), 4);
        assert_eq!(shared.lock().panel(0).unwrap().updates(), 4);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let (display, _) = MemoryDisplay::new();
        let shared =
            SharedRenderSession::new(RenderSession::new(RenderOptions::default(), Box::new(display)));
        let poisoner = shared.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("request handler crashed");
        })
        .join();

        assert!(!shared.lock().is_active());
    }
}
