//! Terminal preview backend.
//!
//! Presents both framebuffers as half-block cells (one terminal cell is a
//! 1×2 pixel column) and translates key presses into control requests.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tracing::info;

use crate::client::{Command, FetchClient};
use crate::config::Config;
use crate::refresh::Orchestrator;
use crate::renderer::{self, Framebuffer, InfoPanel};
use crate::renderer::overlay::OverlayAnimation;
use crate::state::StateStore;
use super::Outcome;

pub async fn run(config: Config) -> Result<Outcome> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<Outcome> {
    let client = FetchClient::new(&config.server.address, config.server.port)?;
    info!(
        "connecting to {}:{}",
        config.server.address, config.server.port
    );

    let mut orchestrator = Orchestrator::new(
        client.clone(),
        Duration::from_millis(config.display.refresh_interval_ms),
    );
    let mut store = StateStore::default();
    let mut top = Framebuffer::top_screen();
    let mut bottom = Framebuffer::bottom_screen();
    let mut overlay = OverlayAnimation::default();
    let mut panel = InfoPanel::new(Duration::from_millis(config.display.marquee_step_ms));
    let mut volume = VolumeControl::default();

    let frame_budget = Duration::from_secs_f64(1.0 / config.display.fps.max(1) as f64);

    loop {
        let now = Instant::now();

        orchestrator.tick(now, &mut store);
        volume.reconcile(store.media.volume_percent);
        renderer::render_frame(&mut top, &mut overlay, &mut store);
        renderer::render_panel(&mut bottom, &mut panel, &store, now);

        terminal.draw(|frame| {
            let area = frame.area();
            let screens = Layout::vertical([
                Constraint::Length(1),
                Constraint::Ratio(1, 2),
                Constraint::Ratio(1, 2),
            ])
            .split(area);
            render_keys_line(frame, screens[0]);
            blit(frame, screens[1], &top);
            blit(frame, screens[2], &bottom);
        })?;

        // Frame pacing doubles as the input wait, like any vblank.
        if event::poll(frame_budget)? {
            if let Event::Key(key) = event::read()? {
                match key {
                    KeyEvent {
                        code: KeyCode::Char('q'),
                        ..
                    }
                    | KeyEvent {
                        code: KeyCode::Char('c'),
                        modifiers: KeyModifiers::CONTROL,
                        ..
                    } => {
                        return Ok(Outcome::Quit);
                    }
                    KeyEvent {
                        code: KeyCode::Char('e'),
                        ..
                    } => {
                        return Ok(Outcome::ReenterAddress);
                    }
                    KeyEvent {
                        code: KeyCode::Char(' ') | KeyCode::Enter,
                        ..
                    } => {
                        if store.media.is_playing {
                            client.send_command(Command::Pause);
                        } else {
                            client.send_command(Command::Play);
                            store.play_flash = true;
                        }
                        orchestrator.request_refresh();
                    }
                    KeyEvent {
                        code: KeyCode::Left,
                        ..
                    } => {
                        client.send_command(Command::Previous);
                        orchestrator.request_refresh();
                    }
                    KeyEvent {
                        code: KeyCode::Right,
                        ..
                    } => {
                        client.send_command(Command::Next);
                        orchestrator.request_refresh();
                    }
                    KeyEvent {
                        code: KeyCode::Char('+') | KeyCode::Char('='),
                        ..
                    } => {
                        client.send_command(Command::Volume(volume.step(5)));
                        orchestrator.request_refresh();
                    }
                    KeyEvent {
                        code: KeyCode::Char('-'),
                        ..
                    } => {
                        client.send_command(Command::Volume(volume.step(-5)));
                        orchestrator.request_refresh();
                    }
                    KeyEvent {
                        code: KeyCode::Char('r'),
                        ..
                    } => {
                        orchestrator.request_refresh();
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Local volume target, so rapid presses step from the previous press
/// instead of the last-fetched server value. A changed server report
/// takes the target back over.
#[derive(Debug, Default)]
struct VolumeControl {
    target: Option<u8>,
    reported: Option<u8>,
}

impl VolumeControl {
    fn reconcile(&mut self, reported: Option<u8>) {
        if reported != self.reported {
            self.reported = reported;
            self.target = reported;
        }
    }

    fn step(&mut self, delta: i16) -> u8 {
        let next = (self.target.unwrap_or(50) as i16 + delta).clamp(0, 100) as u8;
        self.target = Some(next);
        next
    }
}

fn render_keys_line(frame: &mut Frame, area: Rect) {
    let line = " [space] play/pause | [<-/->] prev/next | [+/-] volume | [e] server | [q] quit ";
    for (i, ch) in line.chars().enumerate() {
        if (i as u16) < area.width {
            if let Some(cell) = frame.buffer_mut().cell_mut((area.x + i as u16, area.y)) {
                cell.set_char(ch);
                cell.set_fg(Color::DarkGray);
            }
        }
    }
}

/// Nearest-sample a framebuffer into `area` using half blocks, centered
/// and aspect-preserving (a cell counts as one pixel wide, two tall).
fn blit(frame: &mut Frame, area: Rect, fb: &Framebuffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let max_w = area.width as f32;
    let max_h = area.height as f32 * 2.0;
    let scale = (fb.width() as f32 / max_w).max(fb.height() as f32 / max_h);
    let out_cols = ((fb.width() as f32 / scale) as u16).clamp(1, area.width);
    let out_rows = ((fb.height() as f32 / scale / 2.0) as u16).clamp(1, area.height);
    let x_off = area.x + (area.width - out_cols) / 2;
    let y_off = area.y + (area.height - out_rows) / 2;

    for cy in 0..out_rows {
        for cx in 0..out_cols {
            let sx = (cx as f32 * scale) as i32;
            let sy_top = (cy as f32 * 2.0 * scale) as i32;
            let sy_bottom = ((cy as f32 * 2.0 + 1.0) * scale) as i32;
            let (tr, tg, tb) = fb.get(sx, sy_top);
            let (br, bg, bb) = fb.get(sx, sy_bottom);
            if let Some(cell) = frame.buffer_mut().cell_mut((x_off + cx, y_off + cy)) {
                cell.set_char('▀');
                cell.set_fg(Color::Rgb(tr, tg, tb));
                cell.set_bg(Color::Rgb(br, bg, bb));
            }
        }
    }
}
