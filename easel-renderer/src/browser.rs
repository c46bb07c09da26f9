//! Headless browser snapshot tier.
//!
//! The highest-fidelity renderer: the canvas is assembled as an HTML
//! document, loaded into a headless Chromium instance via a data URL,
//! and screenshotted at exact canvas dimensions. The browser process is
//! launched lazily and reused across renders; any failure drops the
//! handle so the next render relaunches from scratch.

use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};

use easel_core::CanvasState;

use crate::html;
use crate::image::ImageMap;
use crate::{OutputFormat, RenderError, RenderOutput, RenderResult, Renderer};

/// Script that resolves once every image on the page has either loaded
/// or failed, with a per-image 3s safety timeout.
const WAIT_FOR_IMAGES_JS: &str = r"
(() => Promise.all(Array.from(document.images).map(img =>
    img.complete ? Promise.resolve() : new Promise(resolve => {
        img.addEventListener('load', resolve);
        img.addEventListener('error', resolve);
        setTimeout(resolve, 3000);
    })
)))()";

/// Screenshot renderer backed by headless Chromium.
pub struct BrowserRenderer {
    enabled: bool,
    handle: Mutex<Option<Arc<Browser>>>,
}

impl BrowserRenderer {
    /// Create the renderer. With `enabled` false it reports itself
    /// unavailable and never launches a browser, which keeps exports
    /// deterministic in environments without Chromium.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            handle: Mutex::new(None),
        }
    }

    /// Drop the browser handle, terminating the Chromium process.
    pub fn shutdown(&self) {
        let mut guard = self.lock();
        if guard.take().is_some() {
            tracing::info!("headless browser shut down");
        }
    }

    fn acquire(&self) -> RenderResult<Arc<Browser>> {
        if !self.enabled {
            return Err(RenderError::Unavailable(
                "browser rendering disabled".to_string(),
            ));
        }

        let mut guard = self.lock();
        if let Some(browser) = guard.as_ref() {
            return Ok(Arc::clone(browser));
        }

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .build()
            .map_err(|e| RenderError::Browser(format!("launch options: {e}")))?;
        let browser = Browser::new(options)
            .map_err(|e| RenderError::Browser(format!("launch failed: {e}")))?;
        tracing::info!("headless browser launched");

        let browser = Arc::new(browser);
        *guard = Some(Arc::clone(&browser));
        Ok(browser)
    }

    /// Forget the current handle after a failure so the next render
    /// relaunches.
    fn reset(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<Browser>>> {
        self.handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn snapshot(&self, state: &CanvasState, images: &ImageMap) -> RenderResult<Vec<u8>> {
        let browser = self.acquire()?;
        let document = html::document(state, images);
        let url = format!("data:text/html;base64,{}", STANDARD.encode(document));

        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::Browser(format!("tab open failed: {e}")))?;

        let capture = (|| {
            tab.navigate_to(&url)
                .map_err(|e| RenderError::Browser(format!("navigation failed: {e}")))?;
            tab.wait_until_navigated()
                .map_err(|e| RenderError::Browser(format!("navigation failed: {e}")))?;
            tab.evaluate(WAIT_FOR_IMAGES_JS, true)
                .map_err(|e| RenderError::Browser(format!("image wait failed: {e}")))?;

            tab.capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                Some(Page::Viewport {
                    x: 0.0,
                    y: 0.0,
                    width: f64::from(state.width),
                    height: f64::from(state.height),
                    scale: 1.0,
                }),
                true,
            )
            .map_err(|e| RenderError::Browser(format!("screenshot failed: {e}")))
        })();

        let _ = tab.close(false);
        capture
    }
}

impl Renderer for BrowserRenderer {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn is_available(&self) -> bool {
        if !self.enabled {
            return false;
        }
        match self.acquire() {
            Ok(_) => true,
            Err(error) => {
                tracing::debug!(%error, "browser unavailable");
                false
            }
        }
    }

    fn render(&self, state: &CanvasState, images: &ImageMap) -> RenderResult<RenderOutput> {
        match self.snapshot(state, images) {
            Ok(bytes) => Ok(RenderOutput {
                bytes,
                format: OutputFormat::Png,
            }),
            Err(error) => {
                self.reset();
                Err(error)
            }
        }
    }
}
