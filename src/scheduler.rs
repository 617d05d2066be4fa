use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Identifies a pending timer or frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

type TimerFn = Box<dyn FnOnce()>;
type FrameFn = Box<dyn FnOnce(f64)>;

struct Timer {
    id: TaskId,
    due: f64,
    callback: TimerFn,
}

#[derive(Default)]
struct Queue {
    next_id: u64,
    timers: Vec<Timer>,
    frames: Vec<(TaskId, FrameFn)>,
}

impl Queue {
    fn next_id(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId(self.next_id)
    }
}

/// Cooperative single-threaded scheduler standing in for the browser's
/// timer and animation-frame primitives.
///
/// The clock only moves when the owner calls [`Scheduler::advance_to`], so
/// tests drive time deterministically and the terminal loop feeds it
/// wall-clock milliseconds.
pub struct Scheduler {
    now: Cell<f64>,
    queue: RefCell<Queue>,
}

impl Scheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Scheduler {
            now: Cell::new(0.0),
            queue: RefCell::new(Queue::default()),
        })
    }

    /// Current time in milliseconds.
    pub fn now(&self) -> f64 {
        self.now.get()
    }

    /// Runs `callback` once, `delay_ms` after the current time.
    pub fn set_timeout(&self, delay_ms: f64, callback: impl FnOnce() + 'static) -> TaskId {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id();
        let due = self.now() + delay_ms.max(0.0);
        queue.timers.push(Timer {
            id,
            due,
            callback: Box::new(callback),
        });
        id
    }

    /// Runs `callback` with the frame timestamp on the next frame batch.
    pub fn request_frame(&self, callback: impl FnOnce(f64) + 'static) -> TaskId {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id();
        queue.frames.push((id, Box::new(callback)));
        id
    }

    /// Drops a pending timer or frame callback. Unknown ids are ignored.
    pub fn cancel(&self, id: TaskId) {
        let mut queue = self.queue.borrow_mut();
        queue.timers.retain(|timer| timer.id != id);
        queue.frames.retain(|(frame_id, _)| *frame_id != id);
    }

    /// Number of timers and frame callbacks still waiting.
    pub fn pending(&self) -> usize {
        let queue = self.queue.borrow();
        queue.timers.len() + queue.frames.len()
    }

    /// Moves the clock to `now_ms`, firing every timer due on the way, then
    /// runs one frame batch.
    pub fn advance_to(&self, now_ms: f64) {
        if now_ms < self.now() {
            return;
        }

        while let Some(timer) = self.pop_due_timer(now_ms) {
            self.now.set(timer.due);
            (timer.callback)();
        }
        self.now.set(now_ms);

        // Frames requested while this batch runs belong to the next one
        let batch = std::mem::take(&mut self.queue.borrow_mut().frames);
        tracing::trace!(now = now_ms, callbacks = batch.len(), "frame");
        for (_, callback) in batch {
            callback(now_ms);
        }
    }

    /// Advances in fixed steps until `until_ms`, one frame per step.
    pub fn run_frames(&self, until_ms: f64, frame_ms: f64) {
        let mut t = self.now();
        while t < until_ms {
            t = (t + frame_ms).min(until_ms);
            self.advance_to(t);
        }
    }

    fn pop_due_timer(&self, limit: f64) -> Option<Timer> {
        let mut queue = self.queue.borrow_mut();
        // Earliest due wins; position breaks ties so scheduling order holds
        let index = queue
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= limit)
            .min_by(|(ia, a), (ib, b)| a.due.total_cmp(&b.due).then(ia.cmp(ib)))
            .map(|(index, _)| index)?;
        Some(queue.timers.remove(index))
    }
}

/// Lifecycle handle of a long-lived frame loop.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    running: Rc<Cell<bool>>,
}

impl LoopHandle {
    fn new() -> Self {
        LoopHandle {
            running: Rc::new(Cell::new(true)),
        }
    }

    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

/// Calls `step` on every frame until the returned handle is stopped or the
/// scheduler is dropped.
pub fn spawn_frame_loop<F>(scheduler: &Rc<Scheduler>, step: F) -> LoopHandle
where
    F: FnMut(f64) + 'static,
{
    let handle = LoopHandle::new();
    let step: Rc<RefCell<dyn FnMut(f64)>> = Rc::new(RefCell::new(step));
    schedule_loop(Rc::downgrade(scheduler), handle.clone(), step);
    handle
}

fn schedule_loop(scheduler: Weak<Scheduler>, handle: LoopHandle, step: Rc<RefCell<dyn FnMut(f64)>>) {
    let Some(strong) = scheduler.upgrade() else {
        return;
    };
    strong.request_frame(move |now| {
        if !handle.is_running() {
            return;
        }
        (step.borrow_mut())(now);
        schedule_loop(scheduler, handle, step);
    });
}
