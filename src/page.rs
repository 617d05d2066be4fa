use std::rc::Rc;

use tracing::{info, warn};

use crate::background::{BackgroundRenderer, RenderTarget, ScalePulse};
use crate::config::PageConfig;
use crate::events::{EventHub, HitTarget, Key, PageEvent};
use crate::math::{Point, Rect, Size};
use crate::menu::RadialMenu;
use crate::scheduler::Scheduler;

/// Maps menu pixels onto terminal cells around an anchor at the centre of
/// the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub viewport: Size,
}

impl Layout {
    pub const PX_PER_COL: f64 = 8.0;
    pub const PX_PER_ROW: f64 = 16.0;

    pub fn new(viewport: Size) -> Self {
        Layout { viewport }
    }

    pub fn anchor(&self) -> Point {
        Point::new((self.viewport.width / 2.0).floor(), (self.viewport.height / 2.0).floor())
    }

    /// Cell position of an offset given in menu pixels.
    pub fn to_cells(&self, offset_px: (f64, f64)) -> Point {
        let anchor = self.anchor();
        Point::new(
            (anchor.x + offset_px.0 / Self::PX_PER_COL).round(),
            (anchor.y + offset_px.1 / Self::PX_PER_ROW).round(),
        )
    }

    /// One-row box of `width` cells centred on `center`.
    pub fn centered(center: Point, width: usize) -> Rect {
        let width = width as f64;
        Rect::new(center.x - (width / 2.0).floor(), center.y, width, 1.0)
    }

    pub fn toggle_text(label: &str) -> String {
        format!("[ {label} ]")
    }

    pub fn item_text(label: &str) -> String {
        format!(" {label} ")
    }

    pub fn toggle_rect(&self, label: &str) -> Rect {
        Self::centered(self.anchor(), Self::toggle_text(label).chars().count())
    }

    /// The menu container box wraps the toggle with a one-cell margin.
    pub fn container_rect(&self, label: &str) -> Rect {
        let toggle = self.toggle_rect(label);
        Rect::new(
            toggle.origin.x - 1.0,
            toggle.origin.y - 1.0,
            toggle.size.width + 2.0,
            toggle.size.height + 2.0,
        )
    }
}

/// The whole page: one scheduler and event hub shared by the background
/// and the menu, which are brought up independently.
pub struct Page {
    scheduler: Rc<Scheduler>,
    events: Rc<EventHub>,
    background: Option<BackgroundRenderer>,
    menu: Option<RadialMenu>,
    layout: Layout,
}

impl Page {
    pub fn load(config: &PageConfig, viewport: Size, target: Option<Box<dyn RenderTarget>>) -> Self {
        let scheduler = Scheduler::new();
        let events = EventHub::new();

        let target = if config.background { target } else { None };
        let background = match BackgroundRenderer::mount(&scheduler, &events, target) {
            Ok(renderer) => Some(renderer),
            Err(err) => {
                warn!(%err, "continuing without the 3D background");
                None
            }
        };

        let pulse = background
            .as_ref()
            .map(|renderer| Rc::new(renderer.cube()) as Rc<dyn ScalePulse>);
        let menu = match RadialMenu::mount(&scheduler, &events, &config.markup, config.radius, pulse) {
            Ok(menu) => Some(menu),
            Err(err) => {
                warn!(%err, "continuing without the menu");
                None
            }
        };

        info!(
            background = background.is_some(),
            menu = menu.is_some(),
            "page loaded"
        );

        Page {
            scheduler,
            events,
            background,
            menu,
            layout: Layout::new(viewport),
        }
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    pub fn background(&self) -> Option<&BackgroundRenderer> {
        self.background.as_ref()
    }

    pub fn menu(&self) -> Option<&RadialMenu> {
        self.menu.as_ref()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn tick(&self, now_ms: f64) {
        self.scheduler.advance_to(now_ms);
    }

    pub fn pointer(&self, at: Point) {
        self.events.dispatch(&PageEvent::PointerMove(at));
    }

    pub fn resize(&mut self, viewport: Size) {
        self.layout = Layout::new(viewport);
        self.events.dispatch(&PageEvent::Resize(viewport));
    }

    pub fn click(&self, at: Point) {
        let target = self.hit_test(at);
        self.events.dispatch(&PageEvent::Click { at, target });
    }

    /// Keyboard focus sits on the toggle button whenever there is one.
    pub fn key(&self, key: Key) {
        let target = if self.menu.is_some() {
            HitTarget::Toggle
        } else {
            HitTarget::Background
        };
        self.events.dispatch(&PageEvent::KeyDown { key, target });
    }

    pub fn hit_test(&self, at: Point) -> HitTarget {
        let Some(menu) = &self.menu else {
            return HitTarget::Background;
        };
        let label = menu.toggle_button().label;
        if self.layout.toggle_rect(&label).contains(at) {
            return HitTarget::Toggle;
        }

        let now = self.scheduler.now();
        for (index, item) in menu.items().iter().enumerate() {
            if !item.style.pointer_events {
                continue;
            }
            let (offset, _) = item.presented(now);
            let rect = Layout::centered(
                self.layout.to_cells(offset),
                Layout::item_text(&item.label).chars().count(),
            );
            if rect.contains(at) {
                return HitTarget::Item(index);
            }
        }

        if self.layout.container_rect(&label).contains(at) {
            return HitTarget::Menu;
        }
        HitTarget::Background
    }

    pub fn dispose(&mut self) {
        if let Some(menu) = self.menu.as_mut() {
            menu.dispose();
        }
        if let Some(background) = self.background.as_mut() {
            background.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Framebuffer;
    use crate::menu::{ItemMarkup, MenuMarkup};
    use crate::state::MenuState;

    const FRAME: f64 = 16.0;

    struct NullTarget(Rect);

    impl RenderTarget for NullTarget {
        fn bounds(&self) -> Option<Rect> {
            Some(self.0)
        }

        fn present(&mut self, _frame: &Framebuffer) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn viewport() -> Size {
        Size::new(120.0, 40.0)
    }

    fn load(config: &PageConfig) -> Page {
        let target = NullTarget(Rect::new(0.0, 0.0, 120.0, 40.0));
        Page::load(config, viewport(), Some(Box::new(target)))
    }

    fn settle(page: &Page) {
        let until = page.scheduler().now() + 2000.0;
        page.scheduler().run_frames(until, FRAME);
    }

    fn four_items() -> PageConfig {
        PageConfig {
            markup: MenuMarkup {
                toggle_label: Some("Menu".to_string()),
                items: Some(vec![
                    ItemMarkup::new("Home", "0"),
                    ItemMarkup::new("Work", "90"),
                    ItemMarkup::new("About", "180"),
                    ItemMarkup::new("Contact", "270"),
                ]),
            },
            ..PageConfig::default()
        }
    }

    #[test]
    fn opening_pulses_the_cube() {
        let page = load(&four_items());
        let cube = page.background().unwrap().cube();

        page.click(page.layout().anchor());
        assert_eq!(page.menu().unwrap().state(), MenuState::Opening);
        settle(&page);
        assert!((cube.scale() - 1.06).abs() < 1e-9);

        page.key(Key::Escape);
        settle(&page);
        assert_eq!(page.menu().unwrap().state(), MenuState::Closed);
        assert!((cube.scale() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hit_testing() {
        let page = load(&four_items());
        let layout = page.layout();
        assert_eq!(page.hit_test(layout.anchor()), HitTarget::Toggle);
        assert_eq!(page.hit_test(Point::new(0.0, 0.0)), HitTarget::Background);

        let container = layout.container_rect("Menu");
        assert_eq!(page.hit_test(container.origin), HitTarget::Menu);

        // Closed items are not clickable where they would deploy
        let home = layout.to_cells((220.0, 0.0));
        assert_eq!(page.hit_test(home), HitTarget::Background);

        page.click(layout.anchor());
        settle(&page);
        assert_eq!(page.hit_test(home), HitTarget::Item(0));
        let about = layout.to_cells((-220.0, 0.0));
        assert_eq!(page.hit_test(about), HitTarget::Item(2));
    }

    #[test]
    fn clicks_inside_keep_the_menu_open() {
        let page = load(&four_items());
        page.click(page.layout().anchor());
        settle(&page);

        page.click(page.layout().to_cells((220.0, 0.0)));
        assert_eq!(page.menu().unwrap().state(), MenuState::Open);

        page.click(Point::new(1.0, 1.0));
        assert_eq!(page.menu().unwrap().state(), MenuState::Closing);
    }

    #[test]
    fn menu_works_without_background() {
        let config = PageConfig {
            background: false,
            ..four_items()
        };
        let page = load(&config);
        assert!(page.background().is_none());

        page.key(Key::Enter);
        settle(&page);
        assert_eq!(page.menu().unwrap().state(), MenuState::Open);
    }

    #[test]
    fn background_runs_without_menu() {
        let config = PageConfig {
            markup: MenuMarkup::default(),
            ..PageConfig::default()
        };
        let page = load(&config);
        assert!(page.menu().is_none());

        page.scheduler().run_frames(10.0 * FRAME, FRAME);
        assert!(page.background().unwrap().scene().cube.rotation[1] > 0.0);
        assert_eq!(page.hit_test(page.layout().anchor()), HitTarget::Background);
    }

    #[test]
    fn dispose_leaves_nothing_scheduled() {
        let mut page = load(&four_items());
        page.click(page.layout().anchor());
        page.dispose();
        page.scheduler().run_frames(1000.0, FRAME);
        assert_eq!(page.scheduler().pending(), 0);
    }

    #[test]
    fn layout_maps_pixels_to_cells() {
        let layout = Layout::new(viewport());
        assert_eq!(layout.anchor(), Point::new(60.0, 20.0));
        assert_eq!(layout.to_cells((220.0, 0.0)), Point::new(88.0, 20.0));
        assert_eq!(layout.to_cells((0.0, -220.0)), Point::new(60.0, 6.0));
    }
}
