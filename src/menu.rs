use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info};

use crate::background::ScalePulse;
use crate::error::{Error, Result};
use crate::events::{EventHub, EventKind, HitTarget, Key, ListenerId, PageEvent};
use crate::math::{ease_out_quad, lerp};
use crate::scheduler::{Scheduler, TaskId};
use crate::stagger::StaggerPlan;
use crate::state::{MenuInput, MenuState};
use crate::transform::ItemPresets;

/// Cube scale pulse played when the menu opens: (target, duration).
const OPEN_PULSE: (f64, f64) = (1.06, 220.0);
/// Pulse played when it closes.
const CLOSE_PULSE: (f64, f64) = (1.0, 260.0);
/// Length of an item's style transition once its delay has elapsed.
pub const ITEM_TRANSITION_MS: f64 = 600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ItemMarkup {
    pub label: String,
    /// Raw `data-angle` attribute.
    pub angle: Option<String>,
}

impl ItemMarkup {
    pub fn new(label: impl Into<String>, angle: impl Into<String>) -> Self {
        ItemMarkup {
            label: label.into(),
            angle: Some(angle.into()),
        }
    }
}

/// Elements the menu binds to. `None` stands for an element missing from
/// the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuMarkup {
    pub toggle_label: Option<String>,
    pub items: Option<Vec<ItemMarkup>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleButton {
    pub label: String,
    pub aria_expanded: bool,
    /// The button's own "open" class.
    pub open_class: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerClass {
    Open,
    Closing,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuContainer {
    pub class: ContainerClass,
    pub aria_hidden: bool,
}

/// Which cached preset an item currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Entry,
    Deployed,
    Exit,
}

/// Inline style of an item element.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStyle {
    pub pose: Pose,
    pub transform: String,
    pub opacity: f64,
    pub pointer_events: bool,
    pub transition_delay_ms: f64,
}

/// In-flight style transition, as a compositor would run it.
#[derive(Debug, Clone, PartialEq)]
struct Motion {
    from_offset: (f64, f64),
    from_opacity: f64,
    start_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub angle_degrees: f64,
    pub presets: ItemPresets,
    pub style: ItemStyle,
    motion: Motion,
}

impl MenuItem {
    fn new(index: usize, markup: &ItemMarkup, radius: f64) -> Self {
        let angle_degrees = parse_angle(markup.angle.as_deref());
        let presets = ItemPresets::new(angle_degrees, radius);
        let entry = presets.entry.offset();
        MenuItem {
            label: markup.label.clone(),
            angle_degrees,
            style: ItemStyle {
                pose: Pose::Entry,
                transform: presets.entry.to_css(),
                opacity: 0.0,
                pointer_events: false,
                transition_delay_ms: StaggerPlan::OPENING.step_delay(index),
            },
            presets,
            motion: Motion {
                from_offset: entry,
                from_opacity: 0.0,
                start_ms: 0.0,
            },
        }
    }

    fn target_offset(&self) -> (f64, f64) {
        match self.style.pose {
            Pose::Entry => self.presets.entry.offset(),
            Pose::Deployed => self.presets.deployed.offset(),
            Pose::Exit => self.presets.exit.offset(),
        }
    }

    fn set_style(&mut self, pose: Pose, opacity: f64, pointer_events: bool, now: f64) {
        let (from_offset, from_opacity) = self.presented(now);
        self.motion = Motion {
            from_offset,
            from_opacity,
            start_ms: now + self.style.transition_delay_ms,
        };
        self.style.pose = pose;
        self.style.transform = match pose {
            Pose::Entry => self.presets.entry.to_css(),
            Pose::Deployed => self.presets.deployed.to_css(),
            Pose::Exit => self.presets.exit.to_css(),
        };
        self.style.opacity = opacity;
        self.style.pointer_events = pointer_events;
    }

    /// Offset from the anchor and opacity as drawn at `now`.
    pub fn presented(&self, now: f64) -> ((f64, f64), f64) {
        let progress = ((now - self.motion.start_ms) / ITEM_TRANSITION_MS).clamp(0.0, 1.0);
        let k = ease_out_quad(progress);
        let (tx, ty) = self.target_offset();
        let (fx, fy) = self.motion.from_offset;
        (
            (lerp(fx, tx, k), lerp(fy, ty, k)),
            lerp(self.motion.from_opacity, self.style.opacity, k),
        )
    }
}

/// Lenient `data-angle` parsing: missing or non-numeric values mean 0°.
pub fn parse_angle(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|a| a.is_finite())
        .unwrap_or(0.0)
}

struct Inner {
    state: MenuState,
    toggle: ToggleButton,
    container: MenuContainer,
    items: Vec<MenuItem>,
    timers: Vec<TaskId>,
}

impl Inner {
    /// Moves to `state` and mirrors it into the ARIA attributes.
    fn set_state(&mut self, state: MenuState) {
        self.state = state;
        self.toggle.aria_expanded = state.is_expanded();
        self.container.aria_hidden = !state.is_expanded();
    }
}

struct MenuCore {
    scheduler: Weak<Scheduler>,
    pulse: Option<Rc<dyn ScalePulse>>,
    inner: RefCell<Inner>,
}

impl MenuCore {
    fn request(self: &Rc<Self>, input: MenuInput) -> bool {
        let Some(scheduler) = self.scheduler.upgrade() else {
            return false;
        };
        let pulse = {
            let mut inner = self.inner.borrow_mut();
            let Some(next) = inner.state.apply(input) else {
                debug!(state = %inner.state, animating = inner.state.is_animating(), ?input, "menu input ignored");
                return false;
            };
            match next {
                MenuState::Opening => self.begin_opening(&mut inner, &scheduler),
                MenuState::Closing => self.begin_closing(&mut inner, &scheduler),
                _ => return false,
            }
        };
        if let Some(target) = &self.pulse {
            target.animate_scale(pulse.0, pulse.1);
        }
        true
    }

    fn begin_opening(self: &Rc<Self>, inner: &mut Inner, scheduler: &Scheduler) -> (f64, f64) {
        let plan = StaggerPlan::OPENING;
        inner.set_state(MenuState::Opening);
        inner.container.class = ContainerClass::Open;
        inner.toggle.open_class = true;
        inner.timers.clear();

        // Stagger comes from each item's transition delay; the timer only kicks off
        for index in 0..inner.items.len() {
            let core = Rc::downgrade(self);
            let id = scheduler.set_timeout(plan.kickoff_ms, move || {
                if let Some(core) = core.upgrade() {
                    core.reveal_item(index);
                }
            });
            inner.timers.push(id);
        }
        let total = plan.sequence_duration(inner.items.len());
        inner.timers.push(self.settle_after(scheduler, total));

        info!(items = inner.items.len(), settle_ms = total, "menu opening");
        OPEN_PULSE
    }

    fn begin_closing(self: &Rc<Self>, inner: &mut Inner, scheduler: &Scheduler) -> (f64, f64) {
        let plan = StaggerPlan::CLOSING;
        inner.set_state(MenuState::Closing);
        inner.container.class = ContainerClass::Closing;
        inner.toggle.open_class = false;
        inner.timers.clear();

        for index in 0..inner.items.len() {
            let core = Rc::downgrade(self);
            let id = scheduler.set_timeout(plan.delay(index), move || {
                if let Some(core) = core.upgrade() {
                    core.dismiss_item(index);
                }
            });
            inner.timers.push(id);
        }
        let total = plan.sequence_duration(inner.items.len());
        inner.timers.push(self.settle_after(scheduler, total));

        info!(items = inner.items.len(), settle_ms = total, "menu closing");
        CLOSE_PULSE
    }

    fn settle_after(self: &Rc<Self>, scheduler: &Scheduler, delay_ms: f64) -> TaskId {
        let core = Rc::downgrade(self);
        scheduler.set_timeout(delay_ms, move || {
            if let Some(core) = core.upgrade() {
                core.settle();
            }
        })
    }

    fn now(&self) -> f64 {
        self.scheduler.upgrade().map(|s| s.now()).unwrap_or(0.0)
    }

    fn reveal_item(&self, index: usize) {
        let now = self.now();
        if let Some(item) = self.inner.borrow_mut().items.get_mut(index) {
            debug!(index, delay_ms = item.style.transition_delay_ms, "item deploy");
            item.set_style(Pose::Deployed, 1.0, true, now);
        }
    }

    fn dismiss_item(&self, index: usize) {
        let now = self.now();
        if let Some(item) = self.inner.borrow_mut().items.get_mut(index) {
            debug!(index, "item exit");
            item.set_style(Pose::Exit, 0.0, false, now);
        }
    }

    fn settle(&self) {
        let now = self.now();
        let mut inner = self.inner.borrow_mut();
        let Some(next) = inner.state.apply(MenuInput::Settled) else {
            return;
        };
        if next == MenuState::Closed {
            // Back to the top so the next open animates from there
            for item in &mut inner.items {
                item.set_style(Pose::Entry, 0.0, false, now);
            }
            inner.container.class = ContainerClass::Closed;
        }
        inner.set_state(next);
        inner.timers.clear();
        info!(state = %next, "menu settled");
    }
}

/// Radial pop-out menu bound to a toggle button and a set of items.
pub struct RadialMenu {
    core: Rc<MenuCore>,
    events: Weak<EventHub>,
    listeners: Vec<ListenerId>,
    radius: f64,
}

impl RadialMenu {
    /// Binds to the markup and attaches the click and keyboard listeners.
    /// Fails without attaching anything when the toggle button or the menu
    /// container is missing.
    pub fn mount(
        scheduler: &Rc<Scheduler>,
        events: &Rc<EventHub>,
        markup: &MenuMarkup,
        radius: f64,
        pulse: Option<Rc<dyn ScalePulse>>,
    ) -> Result<Self> {
        let label = markup
            .toggle_label
            .clone()
            .ok_or(Error::MenuElementsMissing {
                element: "toggle button",
            })?;
        let item_markup = markup.items.as_ref().ok_or(Error::MenuElementsMissing {
            element: "menu container",
        })?;

        let items: Vec<MenuItem> = item_markup
            .iter()
            .enumerate()
            .map(|(index, m)| MenuItem::new(index, m, radius))
            .collect();

        let core = Rc::new(MenuCore {
            scheduler: Rc::downgrade(scheduler),
            pulse,
            inner: RefCell::new(Inner {
                state: MenuState::Closed,
                toggle: ToggleButton {
                    label,
                    aria_expanded: false,
                    open_class: false,
                },
                container: MenuContainer {
                    class: ContainerClass::Closed,
                    aria_hidden: true,
                },
                items,
                timers: Vec::new(),
            }),
        });

        let mut listeners = Vec::new();

        let weak = Rc::downgrade(&core);
        listeners.push(events.listen(EventKind::Click, move |event| {
            if let (PageEvent::Click { target: HitTarget::Toggle, .. }, Some(core)) = (event, weak.upgrade()) {
                core.request(MenuInput::Toggle);
            }
        }));

        let weak = Rc::downgrade(&core);
        listeners.push(events.listen(EventKind::KeyDown, move |event| {
            if let (
                PageEvent::KeyDown {
                    key: Key::Enter | Key::Space,
                    target: HitTarget::Toggle,
                },
                Some(core),
            ) = (event, weak.upgrade())
            {
                core.request(MenuInput::Toggle);
            }
        }));

        let weak = Rc::downgrade(&core);
        listeners.push(events.listen(EventKind::KeyDown, move |event| {
            if let (PageEvent::KeyDown { key: Key::Escape, .. }, Some(core)) = (event, weak.upgrade()) {
                core.request(MenuInput::Dismiss);
            }
        }));

        let weak = Rc::downgrade(&core);
        listeners.push(events.listen(EventKind::Click, move |event| {
            let (PageEvent::Click { target, .. }, Some(core)) = (event, weak.upgrade()) else {
                return;
            };
            if !target.is_menu_part() && core.inner.borrow().state == MenuState::Open {
                core.request(MenuInput::Dismiss);
            }
        }));

        info!(items = item_markup.len(), radius, "radial menu mounted");

        Ok(RadialMenu {
            core,
            events: Rc::downgrade(events),
            listeners,
            radius,
        })
    }

    /// Same as activating the toggle button. Returns whether a sequence
    /// started.
    pub fn toggle(&self) -> bool {
        self.core.request(MenuInput::Toggle)
    }

    pub fn open(&self) -> bool {
        self.state() == MenuState::Closed && self.toggle()
    }

    pub fn close(&self) -> bool {
        self.state() == MenuState::Open && self.toggle()
    }

    /// Escape or outside-click behaviour.
    pub fn dismiss(&self) -> bool {
        self.core.request(MenuInput::Dismiss)
    }

    pub fn state(&self) -> MenuState {
        self.core.inner.borrow().state
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.core.inner.borrow().items.clone()
    }

    pub fn toggle_button(&self) -> ToggleButton {
        self.core.inner.borrow().toggle.clone()
    }

    pub fn container(&self) -> MenuContainer {
        self.core.inner.borrow().container.clone()
    }

    /// Detaches the listeners and cancels any running sequence.
    pub fn dispose(&mut self) {
        if let Some(events) = self.events.upgrade() {
            for id in self.listeners.drain(..) {
                events.unlisten(id);
            }
        }
        let timers = std::mem::take(&mut self.core.inner.borrow_mut().timers);
        if let Some(scheduler) = self.core.scheduler.upgrade() {
            for id in timers {
                scheduler.cancel(id);
            }
        }
        debug!("radial menu disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point;

    const FRAME: f64 = 16.0;

    #[derive(Default)]
    struct RecordingPulse {
        calls: RefCell<Vec<(f64, f64)>>,
    }

    impl ScalePulse for RecordingPulse {
        fn animate_scale(&self, target: f64, duration_ms: f64) {
            self.calls.borrow_mut().push((target, duration_ms));
        }
    }

    struct Fixture {
        scheduler: Rc<Scheduler>,
        events: Rc<EventHub>,
        pulse: Rc<RecordingPulse>,
        menu: RadialMenu,
    }

    fn markup() -> MenuMarkup {
        MenuMarkup {
            toggle_label: Some("Menu".to_string()),
            items: Some(vec![
                ItemMarkup::new("Home", "0"),
                ItemMarkup::new("Work", "90"),
                ItemMarkup::new("About", "180"),
                ItemMarkup::new("Contact", "270"),
            ]),
        }
    }

    fn fixture() -> Fixture {
        let scheduler = Scheduler::new();
        let events = EventHub::new();
        let pulse = Rc::new(RecordingPulse::default());
        let menu = RadialMenu::mount(
            &scheduler,
            &events,
            &markup(),
            220.0,
            Some(Rc::clone(&pulse) as Rc<dyn ScalePulse>),
        )
        .expect("mount");
        Fixture {
            scheduler,
            events,
            pulse,
            menu,
        }
    }

    impl Fixture {
        /// Lets every pending timer fire.
        fn settle(&self) {
            let until = self.scheduler.now() + 2000.0;
            self.scheduler.run_frames(until, FRAME);
        }

        fn click(&self, target: HitTarget) {
            self.events.dispatch(&PageEvent::Click {
                at: Point::default(),
                target,
            });
        }

        fn key(&self, key: Key, target: HitTarget) {
            self.events.dispatch(&PageEvent::KeyDown { key, target });
        }
    }

    fn assert_closed_at_rest(menu: &RadialMenu) {
        assert_eq!(menu.state(), MenuState::Closed);
        assert_eq!(menu.container().class, ContainerClass::Closed);
        assert!(menu.container().aria_hidden);
        assert!(!menu.toggle_button().aria_expanded);
        for item in menu.items() {
            assert_eq!(item.style.opacity, 0.0);
            assert!(!item.style.pointer_events);
            assert_eq!(item.style.pose, Pose::Entry);
            assert_eq!(item.style.transform, item.presets.entry.to_css());
        }
    }

    fn assert_open_at_rest(menu: &RadialMenu) {
        assert_eq!(menu.state(), MenuState::Open);
        assert_eq!(menu.container().class, ContainerClass::Open);
        assert!(!menu.container().aria_hidden);
        assert!(menu.toggle_button().aria_expanded);
        for item in menu.items() {
            assert_eq!(item.style.opacity, 1.0);
            assert!(item.style.pointer_events);
            assert_eq!(item.style.pose, Pose::Deployed);
            assert_eq!(item.style.transform, item.presets.deployed.to_css());
        }
    }

    #[test]
    fn mounts_closed() {
        let f = fixture();
        assert_closed_at_rest(&f.menu);
        let delays: Vec<f64> = f.menu.items().iter().map(|i| i.style.transition_delay_ms).collect();
        assert_eq!(delays, vec![0.0, 70.0, 140.0, 210.0]);
        assert_eq!(f.events.listener_count(), 4);
    }

    #[test]
    fn missing_elements_attach_nothing() {
        let scheduler = Scheduler::new();
        let events = EventHub::new();

        let no_toggle = MenuMarkup {
            toggle_label: None,
            ..markup()
        };
        let err = RadialMenu::mount(&scheduler, &events, &no_toggle, 220.0, None).err().unwrap();
        assert!(matches!(err, Error::MenuElementsMissing { element: "toggle button" }));

        let no_container = MenuMarkup {
            items: None,
            ..markup()
        };
        let err = RadialMenu::mount(&scheduler, &events, &no_container, 220.0, None).err().unwrap();
        assert!(matches!(err, Error::MenuElementsMissing { element: "menu container" }));

        assert_eq!(events.listener_count(), 0);
    }

    #[test]
    fn open_sequence_timing() {
        let f = fixture();
        f.click(HitTarget::Toggle);
        assert_eq!(f.menu.state(), MenuState::Opening);
        assert!(f.menu.toggle_button().aria_expanded);
        assert!(f.menu.toggle_button().open_class);
        assert!(!f.menu.container().aria_hidden);
        assert_eq!(*f.pulse.calls.borrow(), vec![OPEN_PULSE]);

        // Nothing moves before the kick-off
        f.scheduler.advance_to(5.0);
        assert!(f.menu.items().iter().all(|i| i.style.pose == Pose::Entry));

        f.scheduler.advance_to(10.0);
        assert!(f.menu.items().iter().all(|i| i.style.pose == Pose::Deployed));
        assert_eq!(f.menu.state(), MenuState::Opening);

        // 700 + 4 * 70
        f.scheduler.advance_to(979.0);
        assert_eq!(f.menu.state(), MenuState::Opening);
        f.scheduler.advance_to(980.0);
        assert_open_at_rest(&f.menu);
    }

    #[test]
    fn close_sequence_timing() {
        let f = fixture();
        f.menu.toggle();
        f.settle();
        let start = f.scheduler.now();

        assert!(f.menu.toggle());
        assert_eq!(f.menu.state(), MenuState::Closing);
        assert_eq!(f.menu.container().class, ContainerClass::Closing);
        assert!(f.menu.container().aria_hidden);
        assert!(!f.menu.toggle_button().aria_expanded);
        assert_eq!(f.pulse.calls.borrow().last(), Some(&CLOSE_PULSE));

        // Item 0 leaves immediately, item 3 after 120ms
        f.scheduler.advance_to(start);
        let items = f.menu.items();
        assert_eq!(items[0].style.pose, Pose::Exit);
        assert_eq!(items[0].style.opacity, 0.0);
        assert!(!items[0].style.pointer_events);
        assert_eq!(items[3].style.pose, Pose::Deployed);

        f.scheduler.advance_to(start + 120.0);
        assert!(f.menu.items().iter().all(|i| i.style.pose == Pose::Exit));

        // 700 + 4 * 40
        f.scheduler.advance_to(start + 859.0);
        assert_eq!(f.menu.state(), MenuState::Closing);
        f.scheduler.advance_to(start + 860.0);
        assert_closed_at_rest(&f.menu);
    }

    #[test]
    fn redundant_toggle_while_animating_is_a_no_op() {
        let f = fixture();
        f.menu.toggle();
        f.scheduler.advance_to(10.0);
        let items = f.menu.items();
        let toggle = f.menu.toggle_button();

        assert!(!f.menu.toggle());
        f.click(HitTarget::Toggle);
        f.key(Key::Enter, HitTarget::Toggle);

        assert_eq!(f.menu.state(), MenuState::Opening);
        assert_eq!(f.menu.items(), items);
        assert_eq!(f.menu.toggle_button(), toggle);
        assert_eq!(f.pulse.calls.borrow().len(), 1);
    }

    #[test]
    fn immediate_close_is_dropped_then_later_close_settles() {
        let f = fixture();
        f.menu.toggle();
        assert!(!f.menu.toggle());
        f.settle();
        assert_open_at_rest(&f.menu);

        f.menu.toggle();
        assert!(!f.menu.toggle());
        f.settle();
        assert_closed_at_rest(&f.menu);
        assert_eq!(f.scheduler.pending(), 0);
    }

    #[test]
    fn close_only_acts_on_an_open_menu() {
        let f = fixture();
        assert!(!f.menu.close());
        assert_closed_at_rest(&f.menu);

        assert!(f.menu.open());
        assert!(!f.menu.close());
        assert_eq!(f.menu.state(), MenuState::Opening);
        f.settle();

        assert!(f.menu.close());
        assert_eq!(f.menu.state(), MenuState::Closing);
        assert!(!f.menu.close());
        f.settle();
        assert_closed_at_rest(&f.menu);
        assert_eq!(*f.pulse.calls.borrow(), vec![OPEN_PULSE, CLOSE_PULSE]);
    }

    #[test]
    fn dismiss_is_a_no_op_unless_open() {
        let f = fixture();
        assert!(!f.menu.dismiss());
        assert_closed_at_rest(&f.menu);
        assert!(f.pulse.calls.borrow().is_empty());

        f.menu.open();
        assert!(!f.menu.dismiss());
        assert_eq!(f.menu.state(), MenuState::Opening);
        f.settle();
        assert_open_at_rest(&f.menu);

        assert!(f.menu.dismiss());
        assert_eq!(f.menu.state(), MenuState::Closing);
        assert!(!f.menu.dismiss());
        f.settle();
        assert_closed_at_rest(&f.menu);
    }

    #[test]
    fn enter_and_space_act_like_click() {
        let f = fixture();
        f.key(Key::Enter, HitTarget::Toggle);
        assert_eq!(f.menu.state(), MenuState::Opening);
        f.settle();

        f.key(Key::Space, HitTarget::Toggle);
        assert_eq!(f.menu.state(), MenuState::Closing);
        f.settle();

        // Enter somewhere else does nothing
        f.key(Key::Enter, HitTarget::Background);
        assert_eq!(f.menu.state(), MenuState::Closed);
    }

    #[test]
    fn escape_closes_an_open_menu_only() {
        let f = fixture();
        f.key(Key::Escape, HitTarget::Background);
        assert_closed_at_rest(&f.menu);
        assert!(f.pulse.calls.borrow().is_empty());

        f.menu.open();
        f.key(Key::Escape, HitTarget::Background);
        assert_eq!(f.menu.state(), MenuState::Opening);
        f.settle();

        f.key(Key::Escape, HitTarget::Background);
        assert_eq!(f.menu.state(), MenuState::Closing);
        assert!(!f.menu.toggle_button().open_class);
        f.settle();
        assert_closed_at_rest(&f.menu);
    }

    #[test]
    fn outside_click_closes_inside_click_does_not() {
        let f = fixture();
        f.menu.open();
        f.settle();

        f.click(HitTarget::Menu);
        f.click(HitTarget::Item(2));
        assert_eq!(f.menu.state(), MenuState::Open);

        f.click(HitTarget::Background);
        assert_eq!(f.menu.state(), MenuState::Closing);
        f.settle();
        assert_closed_at_rest(&f.menu);

        // Closed: outside clicks stay no-ops
        f.click(HitTarget::Background);
        assert_eq!(f.menu.state(), MenuState::Closed);
    }

    #[test]
    fn toggle_click_does_not_count_as_outside() {
        let f = fixture();
        f.menu.open();
        f.settle();
        f.click(HitTarget::Toggle);
        assert_eq!(f.menu.state(), MenuState::Closing);
        assert_eq!(f.pulse.calls.borrow().len(), 2);
    }

    #[test]
    fn presented_position_follows_transition_delay() {
        let f = fixture();
        f.menu.open();
        f.scheduler.advance_to(10.0);
        let items = f.menu.items();

        // Item 3 waits its 210ms delay before leaving the entry position
        let (offset, opacity) = items[3].presented(100.0);
        assert_eq!(offset, items[3].presets.entry.offset());
        assert_eq!(opacity, 0.0);

        let done = 10.0 + 210.0 + ITEM_TRANSITION_MS;
        let (offset, opacity) = items[3].presented(done);
        let target = items[3].presets.deployed.offset();
        assert!((offset.0 - target.0).abs() < 1e-9 && (offset.1 - target.1).abs() < 1e-9);
        assert_eq!(opacity, 1.0);
    }

    #[test]
    fn angles_parse_leniently() {
        assert_eq!(parse_angle(Some(" 45 ")), 45.0);
        assert_eq!(parse_angle(Some("-20")), -20.0);
        assert_eq!(parse_angle(Some("north")), 0.0);
        assert_eq!(parse_angle(None), 0.0);
    }

    #[test]
    fn dispose_detaches_and_cancels() {
        let mut f = fixture();
        f.menu.open();
        f.menu.dispose();
        assert_eq!(f.events.listener_count(), 0);
        assert_eq!(f.scheduler.pending(), 0);

        f.settle();
        assert_eq!(f.menu.state(), MenuState::Opening);
        f.click(HitTarget::Toggle);
        assert_eq!(f.pulse.calls.borrow().len(), 1);
    }
}
