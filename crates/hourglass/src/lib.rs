//! Hourglass sand simulation engine.
//!
//! A fixed-resolution grid of sand grains confined to a rasterized glass
//! silhouette, stepped once per animation frame with gravity taken from the
//! host widget's orientation.

pub mod api;
pub mod cell;
pub mod config;
pub mod error;
pub mod frame;
pub mod grid;
pub mod mask;
pub mod orientation;
pub mod palette;
pub mod rules;
pub mod silhouette;
pub mod simulator;


use std::cell::{Cell as StdCell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

pub use config::HourglassConfig;
pub use error::{ConfigError, PathError, PlaceError};
pub use orientation::Orientation;
pub use simulator::GranularFlowSimulator;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only when a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("hourglass module initialized");
}

/// JS handle for one mounted hourglass.
///
/// The host owns the orientation; it either calls `tick` itself from its own
/// animation loop, or mounts a canvas and lets the Rust frame loop read the
/// orientation set through `setRotation` / `toggle`.
#[wasm_bindgen]
#[derive(Debug)]
pub struct Hourglass {
    sim: Rc<RefCell<GranularFlowSimulator>>,
    orientation: Rc<StdCell<Orientation>>,
    #[cfg(target_arch = "wasm32")]
    frame_loop: Option<frame::CanvasLoop>,
}

impl Hourglass {
    /// Build from a validated config.
    pub fn from_config(config: &HourglassConfig, seed: u64) -> Result<Self, ConfigError> {
        let sim = GranularFlowSimulator::new(config, seed)?;
        Ok(Self {
            sim: Rc::new(RefCell::new(sim)),
            orientation: Rc::new(StdCell::new(Orientation::Upright)),
            #[cfg(target_arch = "wasm32")]
            frame_loop: None,
        })
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation.get()
    }
}

#[wasm_bindgen]
impl Hourglass {
    /// The portfolio widget's hourglass with a fresh random seed.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Hourglass, JsError> {
        Ok(Self::from_config(&HourglassConfig::default(), initial_seed())?)
    }

    #[wasm_bindgen(js_name = withSeed)]
    pub fn with_seed(seed: u32) -> Result<Hourglass, JsError> {
        Ok(Self::from_config(&HourglassConfig::default(), u64::from(seed))?)
    }

    /// Defaults overridden by a TOML document.
    #[wasm_bindgen(js_name = fromToml)]
    pub fn from_toml(src: &str, seed: u32) -> Result<Hourglass, JsError> {
        let config = HourglassConfig::load(Some(src))?;
        Ok(Self::from_config(&config, u64::from(seed))?)
    }

    /// One update with an explicit orientation. Returns whether anything moved.
    pub fn tick(&mut self, upright: bool) -> bool {
        self.sim.borrow_mut().update(Orientation::from_upright(upright))
    }

    /// One update with the orientation derived from a dial angle.
    #[wasm_bindgen(js_name = tickRotation)]
    pub fn tick_rotation(&mut self, degrees: f64) -> bool {
        self.sim
            .borrow_mut()
            .update(Orientation::from_rotation_degrees(degrees))
    }

    /// Paint the current grid into the pixel buffer.
    pub fn render(&mut self) {
        self.sim.borrow_mut().render();
    }

    /// Pointer to the RGBA buffer in wasm memory, `width * height * 4` bytes.
    #[wasm_bindgen(js_name = pixelsPtr)]
    pub fn pixels_ptr(&self) -> *const u8 {
        self.sim.borrow().pixels().as_ptr()
    }

    #[wasm_bindgen(js_name = pixelsLen)]
    pub fn pixels_len(&self) -> usize {
        self.sim.borrow().pixels().len()
    }

    pub fn width(&self) -> u32 {
        self.sim.borrow().width() as u32
    }

    pub fn height(&self) -> u32 {
        self.sim.borrow().height() as u32
    }

    #[wasm_bindgen(js_name = grainCount)]
    pub fn grain_count(&self) -> u32 {
        self.sim.borrow().grain_count() as u32
    }

    /// Orientation used by the mounted frame loop, from a dial angle.
    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&mut self, degrees: f64) {
        self.orientation
            .set(Orientation::from_rotation_degrees(degrees));
    }

    #[wasm_bindgen(js_name = setUpright)]
    pub fn set_upright(&mut self, upright: bool) {
        self.orientation.set(Orientation::from_upright(upright));
    }

    /// Flip the glass, as a click on the widget does.
    pub fn toggle(&mut self) {
        self.orientation.set(self.orientation.get().toggled());
    }

    #[wasm_bindgen(js_name = isUpright)]
    pub fn is_upright(&self) -> bool {
        self.orientation.get() == Orientation::Upright
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl Hourglass {
    /// Start drawing into `canvas` every animation frame. Replaces any
    /// previous mount.
    pub fn mount(&mut self, canvas: web_sys::HtmlCanvasElement) -> Result<(), JsValue> {
        self.unmount();
        let (width, height) = {
            let sim = self.sim.borrow();
            (sim.width(), sim.height())
        };
        let surface = frame::CanvasSurface::new(canvas, width, height)?;
        let frame_loop =
            frame::start_on_canvas(Rc::clone(&self.sim), surface, Rc::clone(&self.orientation))?;
        self.frame_loop = Some(frame_loop);
        Ok(())
    }

    /// Cancel the pending frame callback. Safe to call when not mounted.
    pub fn unmount(&mut self) {
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.stop();
            log::debug!("hourglass unmounted");
        }
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.frame_loop.as_ref().is_some_and(frame::CanvasLoop::is_running)
    }
}

fn initial_seed() -> u64 {
    rand::random()
}
