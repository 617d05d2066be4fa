use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::events::{EventHub, EventKind, ListenerId, PageEvent};
use crate::graphics::{render_scene, Framebuffer, Scene};
use crate::math::{ease_out_quad, Rect};
use crate::scheduler::{spawn_frame_loop, LoopHandle, Scheduler};

/// Per-frame camera smoothing factor.
const POINTER_EASING: f64 = 0.05;
/// Per-frame cube rotation around X and Y, in radians.
const ROTATION_STEP: [f64; 2] = [0.0025, 0.004];

/// Surface the background is drawn on.
pub trait RenderTarget {
    /// Bounding box of the container in page units. `None` when there is
    /// nothing to draw into.
    fn bounds(&self) -> Option<Rect>;

    /// Framebuffer pixels per page unit, horizontally and vertically.
    fn pixel_density(&self) -> (f64, f64) {
        (1.0, 1.0)
    }

    fn present(&mut self, frame: &Framebuffer) -> std::io::Result<()>;
}

/// Something whose uniform scale can be eased to a target.
pub trait ScalePulse {
    /// Eases the current scale to `target` over `duration_ms` with an
    /// ease-out curve, one sample per frame. A new call restarts from the
    /// scale at the moment of the call.
    fn animate_scale(&self, target: f64, duration_ms: f64);
}

struct Stage {
    scene: Scene,
    frame: Framebuffer,
    target: Box<dyn RenderTarget>,
    container: Rect,
    /// Pointer in [-1, 1] on both axes, relative to the container.
    pointer: [f64; 2],
}

impl Stage {
    fn resize(&mut self) {
        let Some(bounds) = self.target.bounds().filter(|b| !b.size.is_empty()) else {
            return;
        };
        let (dx, dy) = self.target.pixel_density();
        let width = (bounds.size.width * dx).round() as usize;
        let height = (bounds.size.height * dy).round() as usize;
        self.container = bounds;
        self.frame.resize(width, height);
        if width > 0 && height > 0 {
            self.scene.camera.aspect = width as f64 / height as f64;
        }
        debug!(width, height, aspect = self.scene.camera.aspect, "background resized");
    }
}

/// Rotating cube drawn behind the page.
pub struct BackgroundRenderer {
    scheduler: Weak<Scheduler>,
    events: Weak<EventHub>,
    stage: Rc<RefCell<Stage>>,
    loops: Vec<LoopHandle>,
    listeners: Vec<ListenerId>,
}

impl BackgroundRenderer {
    /// Builds the scene, sizes it to the container and starts the pointer
    /// and rotation loops.
    pub fn mount(
        scheduler: &Rc<Scheduler>,
        events: &Rc<EventHub>,
        target: Option<Box<dyn RenderTarget>>,
    ) -> Result<Self> {
        let target = target.ok_or_else(|| Error::RendererUnavailable {
            reason: "no render backend".to_string(),
        })?;
        let container = target
            .bounds()
            .filter(|b| !b.size.is_empty())
            .ok_or_else(|| Error::RendererUnavailable {
                reason: "render container missing".to_string(),
            })?;

        let mut stage = Stage {
            scene: Scene::default(),
            frame: Framebuffer::new(0, 0),
            target,
            container,
            pointer: [0.0; 2],
        };
        stage.resize();
        let stage = Rc::new(RefCell::new(stage));

        let mut listeners = Vec::new();
        let weak = Rc::downgrade(&stage);
        listeners.push(events.listen(EventKind::Resize, move |_| {
            if let Some(stage) = weak.upgrade() {
                stage.borrow_mut().resize();
            }
        }));
        let weak = Rc::downgrade(&stage);
        listeners.push(events.listen(EventKind::PointerMove, move |event| {
            let (PageEvent::PointerMove(p), Some(stage)) = (event, weak.upgrade()) else {
                return;
            };
            let mut stage = stage.borrow_mut();
            let rect = stage.container;
            stage.pointer = [
                (p.x - rect.origin.x) / rect.size.width * 2.0 - 1.0,
                (p.y - rect.origin.y) / rect.size.height * 2.0 - 1.0,
            ];
        }));

        let follow = Rc::clone(&stage);
        let pointer_loop = spawn_frame_loop(scheduler, move |_| {
            let mut stage = follow.borrow_mut();
            let [mx, my] = stage.pointer;
            let camera = &mut stage.scene.camera;
            camera.position[0] += (mx * 0.5 - camera.position[0]) * POINTER_EASING;
            camera.position[1] += (-my * 0.3 - camera.position[1]) * POINTER_EASING;
            camera.look_at([0.0; 3]);
        });

        let spin = Rc::clone(&stage);
        let rotation_loop = spawn_frame_loop(scheduler, move |_| {
            let mut stage = spin.borrow_mut();
            let stage = &mut *stage;
            stage.scene.cube.rotation[0] += ROTATION_STEP[0];
            stage.scene.cube.rotation[1] += ROTATION_STEP[1];
            render_scene(&stage.scene, &mut stage.frame);
            if let Err(err) = stage.target.present(&stage.frame) {
                warn!(%err, "failed to present background frame");
            }
        });

        debug!(
            width = container.size.width,
            height = container.size.height,
            "background renderer mounted"
        );

        Ok(BackgroundRenderer {
            scheduler: Rc::downgrade(scheduler),
            events: Rc::downgrade(events),
            stage,
            loops: vec![pointer_loop, rotation_loop],
            listeners,
        })
    }

    /// Handle on the cube for the pulse effect.
    pub fn cube(&self) -> CubeHandle {
        CubeHandle {
            scheduler: self.scheduler.clone(),
            stage: Rc::downgrade(&self.stage),
        }
    }

    /// Snapshot of the current scene.
    pub fn scene(&self) -> Scene {
        self.stage.borrow().scene.clone()
    }

    pub fn is_running(&self) -> bool {
        self.loops.iter().any(LoopHandle::is_running)
    }

    /// Stops both loops and detaches the resize and pointer listeners.
    pub fn dispose(&mut self) {
        for handle in self.loops.drain(..) {
            handle.stop();
        }
        if let Some(events) = self.events.upgrade() {
            for id in self.listeners.drain(..) {
                events.unlisten(id);
            }
        }
        debug!("background renderer disposed");
    }
}

/// Shared access to the cube's scale.
#[derive(Clone)]
pub struct CubeHandle {
    scheduler: Weak<Scheduler>,
    stage: Weak<RefCell<Stage>>,
}

impl CubeHandle {
    /// Uniform scale (the X component).
    pub fn scale(&self) -> f64 {
        self.stage
            .upgrade()
            .map(|stage| stage.borrow().scene.cube.scale[0])
            .unwrap_or(1.0)
    }

    pub fn set_scale(&self, scale: [f64; 3]) {
        if let Some(stage) = self.stage.upgrade() {
            stage.borrow_mut().scene.cube.scale = scale;
        }
    }

    fn ease_frame(&self, scheduler: &Scheduler, start: f64, from: f64, target: f64, duration_ms: f64) {
        let handle = self.clone();
        scheduler.request_frame(move |now| {
            let t = if duration_ms <= 0.0 {
                1.0
            } else {
                ((now - start) / duration_ms).clamp(0.0, 1.0)
            };
            let s = from + (target - from) * ease_out_quad(t);
            handle.set_scale([s; 3]);
            if t < 1.0 {
                if let Some(scheduler) = handle.scheduler.upgrade() {
                    handle.ease_frame(&scheduler, start, from, target, duration_ms);
                }
            }
        });
    }
}

impl ScalePulse for CubeHandle {
    fn animate_scale(&self, target: f64, duration_ms: f64) {
        let Some(scheduler) = self.scheduler.upgrade() else {
            return;
        };
        let from = self.scale();
        debug!(from, target, duration_ms, "cube scale pulse");
        self.ease_frame(&scheduler, scheduler.now(), from, target, duration_ms);
    }
}
