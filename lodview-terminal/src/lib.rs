//! Terminal front end: paints a [`ModelView`] as colored ASCII and maps
//! keyboard and mouse input onto camera gestures.

use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use lodview_core::{FrameStats, ModelView, ViewState};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub mod logging;
pub mod renderer;

pub use renderer::AsciiSurface;

/// Drag units per terminal column moved with the mouse
const MOUSE_DRAG_SCALE: f32 = 4.0;
/// Drag units per arrow key press
const KEY_PAN_STEP: f32 = 10.0;
/// Zoom factor per scroll notch or +/- press
const ZOOM_STEP: f32 = 1.1;

/// What a single input event asks the app to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    Pan(f32, f32),
    Zoom(f32),
    Reset,
    ToggleAutoRotate,
    Reload,
    GestureStart(f32, f32),
    GestureEnd,
}

/// Map a key press to an action
pub fn key_action(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Left => Some(Action::Pan(-KEY_PAN_STEP, 0.0)),
        KeyCode::Right => Some(Action::Pan(KEY_PAN_STEP, 0.0)),
        KeyCode::Up => Some(Action::Pan(0.0, -KEY_PAN_STEP)),
        KeyCode::Down => Some(Action::Pan(0.0, KEY_PAN_STEP)),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Zoom(ZOOM_STEP)),
        KeyCode::Char('-') => Some(Action::Zoom(1.0 / ZOOM_STEP)),
        KeyCode::Char('r') => Some(Action::Reset),
        KeyCode::Char(' ') => Some(Action::ToggleAutoRotate),
        KeyCode::Char('l') => Some(Action::Reload),
        _ => None,
    }
}

/// Tracks the last mouse cell so drags become deltas
#[derive(Debug, Default)]
pub struct MouseTracker {
    last: Option<(u16, u16)>,
}

impl MouseTracker {
    pub fn action(&mut self, mouse: MouseEvent) -> Option<Action> {
        let (col, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.last = Some((col, row));
                Some(Action::GestureStart(col as f32, row as f32 * 2.0))
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let (last_col, last_row) = self.last.replace((col, row))?;
                let dx = (col as f32 - last_col as f32) * MOUSE_DRAG_SCALE;
                // Rows are twice as tall as columns are wide
                let dy = (row as f32 - last_row as f32) * MOUSE_DRAG_SCALE * 2.0;
                Some(Action::Pan(dx, dy))
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.last = None;
                Some(Action::GestureEnd)
            }
            MouseEventKind::ScrollUp => Some(Action::Zoom(ZOOM_STEP)),
            MouseEventKind::ScrollDown => Some(Action::Zoom(1.0 / ZOOM_STEP)),
            _ => None,
        }
    }
}

/// One-line status for the overlay
pub fn status_line(view: &ModelView, stats: Option<FrameStats>, fps: f32) -> String {
    let detail = match view.state() {
        ViewState::Empty => "no model".to_string(),
        ViewState::Loading { path } => format!("loading {}...", path),
        ViewState::Failed { path, reason } => format!("failed to load {}: {}", path, reason),
        ViewState::Ready => match view.model() {
            Some(model) => {
                let culled = stats.map(|s| s.faces_culled).unwrap_or(0);
                format!(
                    "{} | faces {}/{} | vertices {} | culled {}",
                    model.name(),
                    model.face_count(),
                    model.original_face_count(),
                    model.vertex_count(),
                    culled
                )
            }
            None => "no model".to_string(),
        },
    };
    format!("lodview | FPS: {:.1} | {}", fps, detail)
}

/// Main application struct for terminal rendering
pub struct TerminalApp {
    view: ModelView,
    surface: AsciiSurface,
    mouse: MouseTracker,
    running: bool,
    last_tick: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    stats: Option<FrameStats>,
}

impl TerminalApp {
    pub fn new(view: ModelView) -> io::Result<Self> {
        let (width, height) = terminal::size()?;

        Ok(Self {
            view,
            surface: AsciiSurface::new(width as usize, height as usize),
            mouse: MouseTracker::default(),
            running: true,
            last_tick: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            stats: None,
        })
    }

    pub fn view(&self) -> &ModelView {
        &self.view
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target
        info!("terminal viewer started");

        while self.running {
            let frame_start = Instant::now();

            // Drain pending input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?)?;
            }

            let dt = self.last_tick.elapsed().as_secs_f32();
            self.last_tick = Instant::now();
            self.render(dt)?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        info!("terminal viewer stopped");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        let action = match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                key_action(code)
            }
            Event::Mouse(mouse) => self.mouse.action(mouse),
            Event::Resize(width, height) => {
                debug!(width, height, "terminal resized");
                self.surface.resize(width as usize, height as usize);
                execute!(stdout(), terminal::Clear(ClearType::All))?;
                None
            }
            _ => None,
        };
        if let Some(action) = action {
            self.apply(action);
        }
        Ok(())
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Reload => {
                if !self.view.reload() {
                    debug!("nothing to reload");
                }
            }
            Action::Pan(dx, dy) => self.view.camera_mut().pan(dx, dy),
            Action::Zoom(factor) => self.view.camera_mut().pinch(factor),
            Action::Reset => self.view.camera_mut().reset(),
            Action::ToggleAutoRotate => {
                let camera = self.view.camera_mut();
                let enabled = !camera.is_auto_rotating();
                camera.set_auto_rotate(enabled);
            }
            Action::GestureStart(x, y) => self.view.camera_mut().gesture_start(x, y),
            Action::GestureEnd => self.view.camera_mut().gesture_end(),
        }
    }

    fn render(&mut self, dt: f32) -> io::Result<()> {
        self.surface.clear();
        self.stats = self.view.frame(dt, &mut self.surface);

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.surface.draw(&mut stdout)?;

        // Draw UI overlay
        let (width, _) = terminal::size()?;
        let mut status = status_line(&self.view, self.stats, self.fps);
        status.truncate(width as usize);
        let overlay_color = match self.view.state() {
            ViewState::Failed { .. } => Color::Red,
            _ => Color::Yellow,
        };
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(overlay_color),
            Print(status),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use lodview_core::{builder, BundleLoader, ViewerConfig};
    use std::sync::Arc;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_key_map() {
        assert_eq!(key_action(KeyCode::Char('q')), Some(Action::Quit));
        assert_eq!(key_action(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(key_action(KeyCode::Left), Some(Action::Pan(-KEY_PAN_STEP, 0.0)));
        assert_eq!(key_action(KeyCode::Char('+')), Some(Action::Zoom(ZOOM_STEP)));
        assert_eq!(key_action(KeyCode::Char(' ')), Some(Action::ToggleAutoRotate));
        assert_eq!(key_action(KeyCode::Char('l')), Some(Action::Reload));
        assert_eq!(key_action(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_mouse_drag_becomes_pan() {
        let mut tracker = MouseTracker::default();
        assert_eq!(
            tracker.action(mouse(MouseEventKind::Down(MouseButton::Left), 10, 5)),
            Some(Action::GestureStart(10.0, 10.0))
        );
        assert_eq!(
            tracker.action(mouse(MouseEventKind::Drag(MouseButton::Left), 12, 4)),
            Some(Action::Pan(2.0 * MOUSE_DRAG_SCALE, -2.0 * MOUSE_DRAG_SCALE))
        );
        assert_eq!(
            tracker.action(mouse(MouseEventKind::Up(MouseButton::Left), 12, 4)),
            Some(Action::GestureEnd)
        );
        // A drag with no press has no origin
        assert_eq!(
            tracker.action(mouse(MouseEventKind::Drag(MouseButton::Left), 14, 4)),
            None
        );
    }

    #[test]
    fn test_scroll_zooms() {
        let mut tracker = MouseTracker::default();
        assert_eq!(
            tracker.action(mouse(MouseEventKind::ScrollUp, 0, 0)),
            Some(Action::Zoom(ZOOM_STEP))
        );
        assert_eq!(
            tracker.action(mouse(MouseEventKind::ScrollDown, 0, 0)),
            Some(Action::Zoom(1.0 / ZOOM_STEP))
        );
    }

    #[test]
    fn test_status_line_follows_state() {
        let loader = BundleLoader::new().with("cube.glb", builder::cube(1.0));
        let mut view = ModelView::new(Arc::new(loader), ViewerConfig::default());
        assert!(status_line(&view, None, 30.0).contains("no model"));

        view.request_load("cube.glb");
        assert!(status_line(&view, None, 30.0).contains("loading cube.glb"));

        while view.is_loading() {
            view.poll();
            std::thread::yield_now();
        }
        let line = status_line(&view, None, 30.0);
        assert!(line.contains("cube"));
        assert!(line.contains("faces 12/12"));
    }

    #[test]
    fn test_frame_paints_ascii_surface() {
        let loader = BundleLoader::new().with("cube.glb", builder::cube(1.0));
        let mut view = ModelView::new(Arc::new(loader), ViewerConfig::default());
        view.request_load("cube.glb");
        while view.is_loading() {
            view.poll();
            std::thread::yield_now();
        }
        let mut surface = AsciiSurface::new(60, 30);
        let stats = view.frame(0.0, &mut surface).unwrap();
        assert_eq!(stats.faces_drawn, 12);
        assert!(surface.covered() > 0);
    }
}
