use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::{Color, Print, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute, queue};
use tracing::info;

use crate::background::RenderTarget;
use crate::config::{Args, PageConfig};
use crate::error::{Error, Result};
use crate::events::Key;
use crate::graphics::{Framebuffer, PAGE_COLOR};
use crate::math::{lerp, Point, Rect, Rgb, Size};
use crate::page::{Layout, Page};

const INK: Rgb = Rgb::from_hex(0x16181d);
const ACCENT: Rgb = Rgb::from_hex(0x2f6fde);
/// Items fainter than this are not drawn.
const MIN_VISIBLE_OPACITY: f64 = 0.35;

/// Columns and rows of the controlling terminal.
pub fn terminal_size() -> Option<(u16, u16)> {
    termsize::get()
        .map(|size| (size.cols, size.rows))
        .or_else(|| terminal::size().ok())
        .filter(|(cols, rows)| *cols > 0 && *rows > 0)
}

/// Render target backed by the terminal: one cell holds two vertical
/// pixels drawn with a half block.
pub struct TerminalSurface {
    frame: Rc<RefCell<Framebuffer>>,
}

impl RenderTarget for TerminalSurface {
    fn bounds(&self) -> Option<Rect> {
        terminal_size().map(|(cols, rows)| Rect::new(0.0, 0.0, cols as f64, rows as f64))
    }

    fn pixel_density(&self) -> (f64, f64) {
        (1.0, 2.0)
    }

    fn present(&mut self, frame: &Framebuffer) -> io::Result<()> {
        self.frame.borrow_mut().clone_from(frame);
        Ok(())
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.0,
        g: rgb.1,
        b: rgb.2,
    }
}

fn blend(from: Rgb, to: Rgb, t: f64) -> Rgb {
    let mix = |a: u8, b: u8| lerp(a as f64, b as f64, t).round().clamp(0.0, 255.0) as u8;
    Rgb(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Frames-per-second counter for the debug overlay.
struct FpsCounter {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
}

impl FpsCounter {
    fn new() -> Self {
        FpsCounter {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
        }
    }

    fn frame(&mut self) {
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }
    }
}

/// Owns the terminal modes the page switches on. Dropping it switches them
/// all off again, whatever failed before.
struct TerminalGuard<W: Write> {
    out: W,
    raw_mode: bool,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Self::with_raw_mode(out, true)
    }

    /// The guard exists before the first escape sequence is written, so a
    /// failed write is undone on the way out.
    fn with_raw_mode(out: W, raw_mode: bool) -> io::Result<Self> {
        let mut guard = TerminalGuard { out, raw_mode };
        execute!(guard.out, EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;
        Ok(guard)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        let _ = execute!(self.out, DisableMouseCapture, LeaveAlternateScreen, cursor::Show);
        if self.raw_mode {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Runs the page in the terminal until `q`, Ctrl-C or an I/O error.
pub fn run(args: &Args) -> Result<()> {
    let config = PageConfig::from_args(args)?;
    let (cols, rows) = terminal_size().ok_or_else(|| Error::Io(io::Error::other("stdout is not a terminal")))?;

    let shared = Rc::new(RefCell::new(Framebuffer::new(0, 0)));
    let target: Box<dyn RenderTarget> = Box::new(TerminalSurface {
        frame: Rc::clone(&shared),
    });
    let mut page = Page::load(&config, Size::new(cols as f64, rows as f64), Some(target));

    let result = TerminalGuard::enter(io::stdout()).map_err(Error::from).and_then(|mut guard| {
        event_loop(&mut page, &shared, &mut guard.out, args)
    });

    page.dispose();
    info!("terminal restored");
    result
}

fn event_loop(
    page: &mut Page,
    shared: &Rc<RefCell<Framebuffer>>,
    out: &mut impl Write,
    args: &Args,
) -> Result<()> {
    let start = Instant::now();
    let frame_time = Duration::from_secs_f64(1.0 / args.fps.max(1) as f64);
    let mut debug = args.debug;
    let mut fps = FpsCounter::new();

    loop {
        let frame_start = Instant::now();

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press,
                    ..
                }) => match code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                    KeyCode::Char('d') | KeyCode::Char('D') => debug = !debug,
                    KeyCode::Enter => page.key(Key::Enter),
                    KeyCode::Char(' ') => page.key(Key::Space),
                    KeyCode::Esc => page.key(Key::Escape),
                    KeyCode::Char(c) => page.key(Key::Char(c)),
                    _ => page.key(Key::Other),
                },
                Event::Mouse(MouseEvent {
                    kind, column, row, ..
                }) => {
                    let at = Point::new(column as f64, row as f64);
                    match kind {
                        MouseEventKind::Moved | MouseEventKind::Drag(_) => page.pointer(at),
                        MouseEventKind::Down(MouseButton::Left) => page.click(at),
                        _ => {}
                    }
                }
                Event::Resize(cols, rows) => page.resize(Size::new(cols as f64, rows as f64)),
                _ => {}
            }
        }

        page.tick(start.elapsed().as_secs_f64() * 1000.0);
        fps.frame();
        draw(out, page, &shared.borrow(), debug.then_some(fps.fps))?;

        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

/// Draws one frame: the background, the menu overlay and, when enabled,
/// the debug lines.
fn draw(out: &mut impl Write, page: &Page, frame: &Framebuffer, debug_fps: Option<f64>) -> io::Result<()> {
    let layout = page.layout();
    let cols = layout.viewport.width as usize;
    let rows = layout.viewport.height as usize;

    queue!(out, SetBackgroundColor(color(PAGE_COLOR)))?;
    if frame.width() < cols || frame.height() < rows * 2 {
        queue!(out, Clear(ClearType::All))?;
    }

    let (fw, fh) = (frame.width().min(cols), (frame.height() / 2).min(rows));
    let mut last: Option<(Rgb, Rgb)> = None;
    for row in 0..fh {
        queue!(out, cursor::MoveTo(0, row as u16))?;
        for col in 0..fw {
            let top = frame.pixel(col, row * 2);
            let bottom = frame.pixel(col, row * 2 + 1);
            if last != Some((top, bottom)) {
                queue!(out, SetForegroundColor(color(top)), SetBackgroundColor(color(bottom)))?;
                last = Some((top, bottom));
            }
            queue!(out, Print('▀'))?;
        }
    }

    if let Some(menu) = page.menu() {
        let now = page.scheduler().now();
        for item in menu.items() {
            let (offset, opacity) = item.presented(now);
            if opacity < MIN_VISIBLE_OPACITY {
                continue;
            }
            let ink = blend(PAGE_COLOR, INK, opacity.min(1.0));
            let at = Layout::centered(layout.to_cells(offset), Layout::item_text(&item.label).chars().count());
            text(out, &layout, at.origin, &Layout::item_text(&item.label), ink, PAGE_COLOR)?;
        }

        let toggle = menu.toggle_button();
        let (fg, bg) = if toggle.open_class {
            (PAGE_COLOR, ACCENT)
        } else {
            (INK, PAGE_COLOR)
        };
        let rect = layout.toggle_rect(&toggle.label);
        text(out, &layout, rect.origin, &Layout::toggle_text(&toggle.label), fg, bg)?;
    }

    if let Some(fps) = debug_fps {
        let mut lines = vec![
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            format!("FPS: {fps:.2}"),
        ];
        if let Some(menu) = page.menu() {
            lines.push(format!("Menu: {} (radius {}px)", menu.state(), menu.radius()));
        }
        if let Some(background) = page.background() {
            let scene = background.scene();
            let p = scene.camera.position;
            lines.push(format!("Scale: {:.3}", scene.cube.scale[0]));
            lines.push(format!("Camera: ({:.2}, {:.2}, {:.2})", p[0], p[1], p[2]));
        }
        for (i, line) in lines.iter().enumerate() {
            text(out, &layout, Point::new(1.0, i as f64), line, INK, PAGE_COLOR)?;
        }
    }

    out.flush()
}

/// Prints `s` at `at`, clipped to the viewport.
fn text(out: &mut impl Write, layout: &Layout, at: Point, s: &str, fg: Rgb, bg: Rgb) -> io::Result<()> {
    let (cols, rows) = (layout.viewport.width, layout.viewport.height);
    if at.y < 0.0 || at.y >= rows {
        return Ok(());
    }
    let skip = (-at.x).max(0.0) as usize;
    let x = at.x.max(0.0);
    let room = (cols - x).max(0.0) as usize;
    let visible: String = s.chars().skip(skip).take(room).collect();
    if visible.is_empty() {
        return Ok(());
    }
    queue!(
        out,
        cursor::MoveTo(x as u16, at.y as u16),
        SetForegroundColor(color(fg)),
        SetBackgroundColor(color(bg)),
        Print(visible)
    )
}
