//! Per-frame driver: update then render onto a surface, once per display refresh.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::orientation::Orientation;
use crate::simulator::GranularFlowSimulator;

/// Where finished frames go.
pub trait FrameSurface {
    /// `false` once the surface has been detached from the page.
    fn is_live(&self) -> bool;

    /// Show a `width`×`height` RGBA frame, one pixel per cell.
    fn present(&mut self, rgba: &[u8], width: usize, height: usize);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FrameOutcome {
    Presented { moved: bool },
    /// Host held the simulator mid-frame; nothing was updated or drawn.
    Skipped,
    /// Surface gone; nothing was updated or drawn.
    Detached,
}

/// Run one frame. A dead surface turns the frame into a no-op.
pub fn step_frame<S: FrameSurface + ?Sized>(
    sim: &mut GranularFlowSimulator,
    orientation: Orientation,
    surface: &mut S,
) -> FrameOutcome {
    if !surface.is_live() {
        log::debug!("surface detached after {} frames", sim.frame_count());
        return FrameOutcome::Detached;
    }
    let moved = sim.update(orientation);
    let (width, height) = (sim.width(), sim.height());
    surface.present(sim.render(), width, height);
    FrameOutcome::Presented { moved }
}

/// Host hook that runs the loop's frame callback once on the next display refresh.
pub trait FrameScheduler {
    type Error: fmt::Debug;

    /// Queue one callback. Returns the handle [`cancel`](Self::cancel) takes.
    fn request(&self) -> Result<i32, Self::Error>;

    /// Revoke a queued callback.
    fn cancel(&self, handle: i32);

    /// Let go of the callback itself. Called from outside the callback when
    /// the loop is torn down.
    fn release(&self) {}
}

struct LoopDriver<S, F> {
    sim: Rc<RefCell<GranularFlowSimulator>>,
    surface: RefCell<F>,
    orientation: Rc<Cell<Orientation>>,
    scheduler: S,
    pending: Cell<Option<i32>>,
    stopped: Cell<bool>,
}

impl<S: FrameScheduler, F: FrameSurface> LoopDriver<S, F> {
    fn schedule(&self) -> Result<(), S::Error> {
        if self.stopped.get() || self.pending.get().is_some() {
            return Ok(());
        }
        let handle = self.scheduler.request()?;
        self.pending.set(Some(handle));
        Ok(())
    }

    fn on_frame(&self) -> FrameOutcome {
        self.pending.set(None);
        if self.stopped.get() {
            return FrameOutcome::Detached;
        }
        let outcome = match self.sim.try_borrow_mut() {
            Ok(mut sim) => step_frame(
                &mut sim,
                self.orientation.get(),
                &mut *self.surface.borrow_mut(),
            ),
            Err(_) => FrameOutcome::Skipped,
        };
        if outcome == FrameOutcome::Detached {
            // Still inside the callback here, so it is not released.
            self.stopped.set(true);
            log::debug!("frame loop stopped: surface detached");
            return outcome;
        }
        if let Err(e) = self.schedule() {
            log::warn!("could not schedule next frame: {e:?}");
        }
        outcome
    }

    fn stop(&self) {
        self.stopped.set(true);
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
        self.scheduler.release();
    }
}

/// Self-rescheduling frame loop. Stops on [`stop`](Self::stop), on drop, or
/// when the surface reports it is no longer live.
pub struct FrameLoop<S: FrameScheduler, F: FrameSurface> {
    driver: Rc<LoopDriver<S, F>>,
}

impl<S: FrameScheduler, F: FrameSurface> fmt::Debug for FrameLoop<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLoop")
            .field("pending", &self.driver.pending.get())
            .field("stopped", &self.driver.stopped.get())
            .finish_non_exhaustive()
    }
}

impl<S: FrameScheduler, F: FrameSurface> FrameLoop<S, F> {
    /// Wire up a loop without queueing anything yet.
    pub fn new(
        sim: Rc<RefCell<GranularFlowSimulator>>,
        surface: F,
        orientation: Rc<Cell<Orientation>>,
        scheduler: S,
    ) -> Self {
        Self {
            driver: Rc::new(LoopDriver {
                sim,
                surface: RefCell::new(surface),
                orientation,
                scheduler,
                pending: Cell::new(None),
                stopped: Cell::new(false),
            }),
        }
    }

    /// Queue the next frame unless one is already queued or the loop has stopped.
    pub fn resume(&self) -> Result<(), S::Error> {
        self.driver.schedule()?;
        if self.is_running() {
            log::debug!("frame loop running");
        }
        Ok(())
    }

    /// Body of the scheduled callback: one frame, then queue the next.
    pub fn on_frame(&self) -> FrameOutcome {
        self.driver.on_frame()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.driver.pending.get().is_some()
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.driver.scheduler
    }

    /// Cancel the queued callback and release the scheduler. Idempotent.
    pub fn stop(&self) {
        self.driver.stop();
    }

    #[cfg(target_arch = "wasm32")]
    fn downgrade(&self) -> std::rc::Weak<LoopDriver<S, F>> {
        Rc::downgrade(&self.driver)
    }
}

impl<S: FrameScheduler, F: FrameSurface> Drop for FrameLoop<S, F> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{start_on_canvas, CanvasLoop, CanvasSurface, RafScheduler};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::{Cell, RefCell};
    use std::fmt;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::{Clamped, JsCast};
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

    use super::{FrameLoop, FrameScheduler, FrameSurface};
    use crate::orientation::Orientation;
    use crate::simulator::GranularFlowSimulator;

    /// 2D canvas at grid resolution. CSS scales it up; smoothing is off so
    /// the grains stay chunky.
    #[derive(Debug)]
    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasSurface {
        pub fn new(canvas: HtmlCanvasElement, width: usize, height: usize) -> Result<Self, JsValue> {
            canvas.set_width(width as u32);
            canvas.set_height(height as u32);
            let ctx = canvas
                .get_context("2d")?
                .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
                .dyn_into::<CanvasRenderingContext2d>()?;
            ctx.set_image_smoothing_enabled(false);
            Ok(Self { canvas, ctx })
        }
    }

    impl FrameSurface for CanvasSurface {
        fn is_live(&self) -> bool {
            self.canvas.is_connected()
        }

        fn present(&mut self, rgba: &[u8], width: usize, height: usize) {
            let image = match ImageData::new_with_u8_clamped_array_and_sh(
                Clamped(rgba),
                width as u32,
                height as u32,
            ) {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("ImageData rejected frame: {e:?}");
                    return;
                }
            };
            if let Err(e) = self.ctx.put_image_data(&image, 0.0, 0.0) {
                log::warn!("putImageData failed: {e:?}");
            }
        }
    }

    /// `requestAnimationFrame` on the page's window.
    #[derive(Default)]
    pub struct RafScheduler {
        callback: RefCell<Option<Closure<dyn FnMut()>>>,
    }

    impl fmt::Debug for RafScheduler {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("RafScheduler")
                .field("armed", &self.callback.borrow().is_some())
                .finish()
        }
    }

    impl RafScheduler {
        fn arm(&self, callback: Closure<dyn FnMut()>) {
            *self.callback.borrow_mut() = Some(callback);
        }
    }

    impl FrameScheduler for RafScheduler {
        type Error = JsValue;

        fn request(&self) -> Result<i32, JsValue> {
            let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
            let callback = self.callback.borrow();
            let callback = callback
                .as_ref()
                .ok_or_else(|| JsValue::from_str("frame callback released"))?;
            window.request_animation_frame(callback.as_ref().unchecked_ref())
        }

        fn cancel(&self, handle: i32) {
            if let Some(window) = web_sys::window() {
                if let Err(e) = window.cancel_animation_frame(handle) {
                    log::warn!("cancelAnimationFrame failed: {e:?}");
                }
            }
        }

        fn release(&self) {
            self.callback.borrow_mut().take();
        }
    }

    pub type CanvasLoop = FrameLoop<RafScheduler, CanvasSurface>;

    /// Start drawing `sim` into `surface` every animation frame.
    pub fn start_on_canvas(
        sim: Rc<RefCell<GranularFlowSimulator>>,
        surface: CanvasSurface,
        orientation: Rc<Cell<Orientation>>,
    ) -> Result<CanvasLoop, JsValue> {
        let frame_loop = FrameLoop::new(sim, surface, orientation, RafScheduler::default());
        let driver = frame_loop.downgrade();
        frame_loop
            .scheduler()
            .arm(Closure::<dyn FnMut()>::new(move || {
                if let Some(driver) = driver.upgrade() {
                    driver.on_frame();
                }
            }));
        frame_loop.resume()?;
        Ok(frame_loop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HourglassConfig;
    use crate::grid::Grid;
    use crate::mask::Mask;

    #[derive(Debug, Default)]
    struct FakeSurface {
        live: bool,
        frames: Vec<(usize, usize, usize)>,
    }

    impl FrameSurface for FakeSurface {
        fn is_live(&self) -> bool {
            self.live
        }

        fn present(&mut self, rgba: &[u8], width: usize, height: usize) {
            self.frames.push((rgba.len(), width, height));
        }
    }

    #[test]
    fn live_surface_gets_each_frame() {
        let mut grid = Grid::new(Mask::open(4, 4));
        grid.place(1, 0).unwrap();
        let mut sim = GranularFlowSimulator::from_grid(grid, 3);
        let mut surface = FakeSurface { live: true, ..Default::default() };

        let outcome = step_frame(&mut sim, Orientation::Upright, &mut surface);
        assert_eq!(outcome, FrameOutcome::Presented { moved: true });
        assert_eq!(surface.frames, vec![(64, 4, 4)]);
        assert_eq!(sim.frame_count(), 1);
    }

    #[test]
    fn settled_frames_still_present() {
        let mut grid = Grid::new(Mask::open(2, 1));
        grid.place(0, 0).unwrap();
        let mut sim = GranularFlowSimulator::from_grid(grid, 0);
        let mut surface = FakeSurface { live: true, ..Default::default() };
        let outcome = step_frame(&mut sim, Orientation::Upright, &mut surface);
        assert_eq!(outcome, FrameOutcome::Presented { moved: false });
        assert_eq!(surface.frames.len(), 1);
    }

    #[test]
    fn detached_surface_is_left_alone() {
        let mut sim = GranularFlowSimulator::new(&HourglassConfig::default(), 11).unwrap();
        let before = sim.grid().occupancy().to_vec();
        let mut surface = FakeSurface::default();

        let outcome = step_frame(&mut sim, Orientation::Inverted, &mut surface);
        assert_eq!(outcome, FrameOutcome::Detached);
        assert!(surface.frames.is_empty());
        assert_eq!(sim.frame_count(), 0);
        assert_eq!(sim.grid().occupancy(), before.as_slice());
    }

    #[derive(Debug, Default)]
    struct SchedulerLog {
        next: i32,
        pending: Vec<i32>,
        cancelled: Vec<i32>,
        released: bool,
    }

    /// Hands out increasing handles and records what the loop asked for.
    #[derive(Debug, Default, Clone)]
    struct FakeScheduler(Rc<RefCell<SchedulerLog>>);

    impl FrameScheduler for FakeScheduler {
        type Error = String;

        fn request(&self) -> Result<i32, String> {
            let mut log = self.0.borrow_mut();
            if log.released {
                return Err("released".to_string());
            }
            log.next += 1;
            let handle = log.next;
            log.pending.push(handle);
            Ok(handle)
        }

        fn cancel(&self, handle: i32) {
            let mut log = self.0.borrow_mut();
            log.pending.retain(|&h| h != handle);
            log.cancelled.push(handle);
        }

        fn release(&self) {
            self.0.borrow_mut().released = true;
        }
    }

    impl FakeScheduler {
        /// The browser firing the oldest queued callback.
        fn fire<F: FrameSurface>(&self, frame_loop: &FrameLoop<Self, F>) -> FrameOutcome {
            let fired = self.0.borrow_mut().pending.remove(0);
            assert!(fired > 0);
            frame_loop.on_frame()
        }

        fn pending(&self) -> usize {
            self.0.borrow().pending.len()
        }
    }

    fn falling_sim() -> Rc<RefCell<GranularFlowSimulator>> {
        let mut grid = Grid::new(Mask::open(4, 8));
        grid.place(1, 0).unwrap();
        Rc::new(RefCell::new(GranularFlowSimulator::from_grid(grid, 6)))
    }

    fn started(
        sim: &Rc<RefCell<GranularFlowSimulator>>,
        live: bool,
    ) -> (FrameLoop<FakeScheduler, FakeSurface>, FakeScheduler) {
        let scheduler = FakeScheduler::default();
        let surface = FakeSurface { live, ..Default::default() };
        let orientation = Rc::new(Cell::new(Orientation::Upright));
        let frame_loop = FrameLoop::new(Rc::clone(sim), surface, orientation, scheduler.clone());
        frame_loop.resume().unwrap();
        (frame_loop, scheduler)
    }

    #[test]
    fn loop_keeps_exactly_one_frame_queued() {
        let sim = falling_sim();
        let (frame_loop, scheduler) = started(&sim, true);
        assert!(frame_loop.is_running());
        assert_eq!(scheduler.pending(), 1);

        for _ in 0..3 {
            let outcome = scheduler.fire(&frame_loop);
            assert!(matches!(outcome, FrameOutcome::Presented { .. }));
            assert_eq!(scheduler.pending(), 1);
        }
        assert_eq!(sim.borrow().frame_count(), 3);

        // A second resume does not double-queue.
        frame_loop.resume().unwrap();
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn stop_cancels_the_queued_frame() {
        let sim = falling_sim();
        let (frame_loop, scheduler) = started(&sim, true);
        scheduler.fire(&frame_loop);

        frame_loop.stop();
        assert!(!frame_loop.is_running());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.0.borrow().cancelled, vec![2]);
        assert!(scheduler.0.borrow().released);

        // A callback already in flight does nothing once stopped.
        assert_eq!(frame_loop.on_frame(), FrameOutcome::Detached);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(sim.borrow().frame_count(), 1);

        frame_loop.stop();
        frame_loop.resume().unwrap();
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn dropping_the_loop_cancels_it() {
        let sim = falling_sim();
        let (frame_loop, scheduler) = started(&sim, true);
        drop(frame_loop);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.0.borrow().cancelled, vec![1]);
        assert!(scheduler.0.borrow().released);
        assert_eq!(Rc::strong_count(&sim), 1);
    }

    #[test]
    fn detached_surface_stops_rescheduling() {
        let sim = falling_sim();
        let (frame_loop, scheduler) = started(&sim, false);

        assert_eq!(scheduler.fire(&frame_loop), FrameOutcome::Detached);
        assert_eq!(scheduler.pending(), 0);
        assert!(!frame_loop.is_running());
        assert_eq!(sim.borrow().frame_count(), 0);
        // Released only on teardown, never from inside the callback.
        assert!(!scheduler.0.borrow().released);

        frame_loop.resume().unwrap();
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn borrowed_simulator_skips_the_frame() {
        let sim = falling_sim();
        let (frame_loop, scheduler) = started(&sim, true);

        let outcome = {
            let _host = sim.borrow();
            scheduler.fire(&frame_loop)
        };
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(scheduler.pending(), 1, "skipped frame must requeue");
        assert_eq!(sim.borrow().frame_count(), 0);

        assert_eq!(
            scheduler.fire(&frame_loop),
            FrameOutcome::Presented { moved: true }
        );
        assert_eq!(sim.borrow().frame_count(), 1);
    }
}
