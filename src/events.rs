use std::cell::RefCell;
use std::rc::Rc;

use crate::math::{Point, Size};

/// Keys the page reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Char(char),
    Other,
}

/// What a pointer or keyboard event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Toggle,
    Menu,
    Item(usize),
    Background,
}

impl HitTarget {
    /// True for the toggle button, the menu container and its items.
    pub fn is_menu_part(self) -> bool {
        !matches!(self, HitTarget::Background)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageEvent {
    PointerMove(Point),
    Resize(Size),
    Click { at: Point, target: HitTarget },
    KeyDown { key: Key, target: HitTarget },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PointerMove,
    Resize,
    Click,
    KeyDown,
}

impl PageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PageEvent::PointerMove(_) => EventKind::PointerMove,
            PageEvent::Resize(_) => EventKind::Resize,
            PageEvent::Click { .. } => EventKind::Click,
            PageEvent::KeyDown { .. } => EventKind::KeyDown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&PageEvent)>;

/// Listener registry for page events.
///
/// Listeners run in registration order. A listener may add or remove
/// listeners while an event is being dispatched; the change applies from the
/// next dispatch on.
#[derive(Default)]
pub struct EventHub {
    next_id: RefCell<u64>,
    listeners: RefCell<Vec<(ListenerId, EventKind, Listener)>>,
}

impl EventHub {
    pub fn new() -> Rc<Self> {
        Rc::new(EventHub::default())
    }

    pub fn listen(&self, kind: EventKind, listener: impl Fn(&PageEvent) + 'static) -> ListenerId {
        let mut next_id = self.next_id.borrow_mut();
        *next_id += 1;
        let id = ListenerId(*next_id);
        self.listeners.borrow_mut().push((id, kind, Rc::new(listener)));
        id
    }

    pub fn unlisten(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(listener_id, _, _)| *listener_id != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn dispatch(&self, event: &PageEvent) {
        let kind = event.kind();
        let matching: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, listener_kind, _)| *listener_kind == kind)
            .map(|(_, _, listener)| Rc::clone(listener))
            .collect();
        for listener in matching {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn dispatch_only_reaches_matching_kind() {
        let hub = EventHub::new();
        let resizes = Rc::new(Cell::new(0));
        let sink = Rc::clone(&resizes);
        hub.listen(EventKind::Resize, move |_| sink.set(sink.get() + 1));

        hub.dispatch(&PageEvent::Resize(Size::new(80.0, 24.0)));
        hub.dispatch(&PageEvent::PointerMove(Point::new(1.0, 1.0)));
        assert_eq!(resizes.get(), 1);
    }

    #[test]
    fn unlisten_removes_listener() {
        let hub = EventHub::new();
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        let id = hub.listen(EventKind::KeyDown, move |_| sink.set(sink.get() + 1));
        hub.unlisten(id);

        hub.dispatch(&PageEvent::KeyDown {
            key: Key::Escape,
            target: HitTarget::Background,
        });
        assert_eq!(hits.get(), 0);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn listener_may_unregister_itself_mid_dispatch() {
        let hub = EventHub::new();
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let weak_hub = Rc::downgrade(&hub);
        let own_id = Rc::clone(&slot);
        let id = hub.listen(EventKind::Click, move |_| {
            if let (Some(hub), Some(id)) = (weak_hub.upgrade(), own_id.get()) {
                hub.unlisten(id);
            }
        });
        slot.set(Some(id));

        hub.dispatch(&PageEvent::Click {
            at: Point::new(0.0, 0.0),
            target: HitTarget::Background,
        });
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn menu_parts_are_inside() {
        assert!(HitTarget::Toggle.is_menu_part());
        assert!(HitTarget::Item(2).is_menu_part());
        assert!(!HitTarget::Background.is_menu_part());
    }
}
