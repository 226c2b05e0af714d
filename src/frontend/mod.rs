// src/frontend/mod.rs

//! Window lifecycle: owns the engine and the per-window state, routes
//! platform events to the engine and runs the event loop.

use anyhow::Context;
use log::{debug, error, info, trace, warn};

use crate::color::ColourTable;
use crate::config::Config;
use crate::error::FrontendError;
use crate::fonts::FontCache;
use crate::input::{translate_button, translate_key};
use crate::midend::{Command, Midend};
use crate::platform::backends::{Driver, PixelRect, WindowSpec};
use crate::platform::{MenuAction, PlatformEvent, TimerId};
use crate::render::RenderSession;
use crate::timer::{TimerDriver, TimerTick};

mod drawing;
pub mod menu;


/// Whether the window is still open after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontendStatus {
    Running,
    Closed,
}

/// Everything one puzzle window owns apart from the engine.
///
/// This is what the engine sees as its [`DrawingApi`](crate::DrawingApi).
pub struct FrontendState<D: Driver> {
    // Fonts may reference driver resources, so they drop first.
    fonts: FontCache<D::Font>,
    driver: D,
    config: Config,
    colours: ColourTable,
    session: RenderSession,
    width: i32,
    height: i32,
    timer: TimerDriver,
    statusbar: bool,
    /// First unrecoverable error raised from inside an engine callback.
    fatal: Option<FrontendError>,
}

impl<D: Driver> FrontendState<D> {
    fn new(driver: D, config: Config, width: i32, height: i32, statusbar: bool) -> Self {
        let fonts = FontCache::new(config.fonts.fallback_face.clone());
        let timer = TimerDriver::new(config.timer.interval());
        Self {
            driver,
            config,
            colours: ColourTable::default(),
            fonts,
            session: RenderSession::new(),
            width,
            height,
            timer,
            statusbar,
            fatal: None,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn colours(&self) -> &ColourTable {
        &self.colours
    }

    pub fn fonts(&self) -> &FontCache<D::Font> {
        &self.fonts
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn timer(&self) -> &TimerDriver {
        &self.timer
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn has_statusbar(&self) -> bool {
        self.statusbar
    }

    /// Records an error raised where it cannot be returned. Only the first
    /// one is kept.
    fn fail(&mut self, err: FrontendError) {
        if self.fatal.is_none() {
            error!("{}", err);
            self.fatal = Some(err);
        }
    }

    fn take_fatal(&mut self) -> Result<(), FrontendError> {
        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// One open puzzle window: the engine plus its front-end state.
pub struct Frontend<D: Driver, M: Midend> {
    midend: M,
    state: FrontendState<D>,
    presets: Vec<(String, M::Params)>,
    closed: bool,
}

impl<D: Driver, M: Midend> Frontend<D, M> {
    /// Starts a game, allocates the palette and creates the window.
    pub fn new(driver: D, mut midend: M, config: Config) -> Result<Self, FrontendError> {
        midend.new_game(None);
        let (width, height) = midend.size();
        let statusbar = midend.wants_statusbar();
        let mut state = FrontendState::new(driver, config, width, height, statusbar);

        let palette = midend.colours(&state);
        state.colours = ColourTable::allocate(&mut state.driver, &palette)?;

        let presets: Vec<(String, M::Params)> = (0..midend.num_presets())
            .filter_map(|i| midend.fetch_preset(i))
            .collect();
        let names: Vec<String> = presets.iter().map(|(name, _)| name.clone()).collect();

        let spec = WindowSpec {
            title: state.config.window.title.clone(),
            width,
            height,
            statusbar,
            menu: menu::game_menu(&names),
        };
        state
            .driver
            .create_window(&spec)
            .context("creating the puzzle window")?;
        state.take_fatal()?;

        info!(
            "Puzzle window '{}' created at {}x{} with {} colours and {} presets",
            spec.title,
            width,
            height,
            state.colours.len(),
            presets.len()
        );

        Ok(Self {
            midend,
            state,
            presets,
            closed: false,
        })
    }

    pub fn midend(&self) -> &M {
        &self.midend
    }

    pub fn midend_mut(&mut self) -> &mut M {
        &mut self.midend
    }

    pub fn state(&self) -> &FrontendState<D> {
        &self.state
    }

    pub fn driver(&self) -> &D {
        &self.state.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.state.driver
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn status(&self) -> FrontendStatus {
        if self.closed {
            FrontendStatus::Closed
        } else {
            FrontendStatus::Running
        }
    }

    /// Pumps driver events until the window closes or the driver runs dry.
    pub fn run(&mut self) -> Result<(), FrontendError> {
        while !self.closed {
            let Some(event) = self.state.driver.next_event()? else {
                debug!("Driver reported no more events");
                break;
            };
            if self.handle_event(event)? == FrontendStatus::Closed {
                break;
            }
        }
        Ok(())
    }

    /// Routes one platform event.
    pub fn handle_event(&mut self, event: PlatformEvent) -> Result<FrontendStatus, FrontendError> {
        if self.closed {
            trace!("Window closed; dropping {:?}", event);
            return Ok(FrontendStatus::Closed);
        }
        match event {
            PlatformEvent::Configure { width, height } => self.on_configure(width, height)?,
            PlatformEvent::Expose { area } => self.on_expose(area),
            PlatformEvent::Map => self.state.driver.queue_repaint(),
            PlatformEvent::Key { symbol, text, .. } => {
                if !self.state.driver.has_buffer() {
                    trace!("Key before first configure; ignored");
                } else if let Some(command) = translate_key(symbol, &text) {
                    self.dispatch(0, 0, command);
                }
            }
            PlatformEvent::Button(button) => {
                if !self.state.driver.has_buffer() {
                    trace!("Button before first configure; ignored");
                } else if let Some((command, x, y)) =
                    translate_button(&button, &self.state.config.input)
                {
                    self.dispatch(x, y, command);
                }
            }
            PlatformEvent::PointerMotion { .. } => {}
            PlatformEvent::Menu(MenuAction::Key(command)) => self.dispatch(0, 0, command),
            PlatformEvent::Menu(MenuAction::Preset(index)) => self.select_preset(index)?,
            PlatformEvent::Timer(id) => {
                if self.on_timer(id)? == TimerTick::Stop {
                    self.state.driver.remove_timeout(id);
                }
            }
            PlatformEvent::CloseRequested => {
                info!("Close requested by the window manager");
                self.close();
            }
        }
        self.state.take_fatal()?;
        Ok(self.status())
    }

    /// Feeds a command to the engine and closes the window if the engine
    /// says the session is over.
    fn dispatch(&mut self, x: i32, y: i32, command: Command) {
        trace!("Dispatching {:?} at ({}, {})", command, x, y);
        if !self.midend.process_key(&mut self.state, x, y, command) {
            info!("Engine ended the session");
            self.close();
        }
    }

    /// Recreates the off-screen buffer at the engine's size, cleared to
    /// colour 0, and redraws into it.
    fn on_configure(&mut self, width: i32, height: i32) -> Result<(), FrontendError> {
        let (w, h) = (self.state.width, self.state.height);
        debug!(
            "Configure {}x{}; recreating {}x{} buffer",
            width, height, w, h
        );
        let fill = self.state.colours.pixel(0).unwrap_or_else(|| {
            warn!("Palette is empty; clearing buffer to pixel 0");
            0
        });
        self.state
            .driver
            .create_buffer(w, h, fill)
            .with_context(|| format!("allocating {}x{} off-screen buffer", w, h))?;
        self.midend.redraw(&mut self.state);
        Ok(())
    }

    /// Repairs the visible surface by copying the whole buffer.
    fn on_expose(&mut self, area: PixelRect) {
        if !self.state.driver.has_buffer() {
            return;
        }
        trace!(
            "Expose ({}, {}) {}x{}; re-blitting full buffer",
            area.x, area.y, area.width, area.height
        );
        let full = PixelRect::new(0, 0, self.state.width, self.state.height);
        self.state.driver.blit(full);
    }

    /// One animation tick.
    pub fn on_timer(&mut self, id: TimerId) -> Result<TimerTick, FrontendError> {
        if !self.state.timer.accepts(id) {
            return Ok(TimerTick::Stop);
        }
        let elapsed = self.state.timer.interval_secs();
        self.midend.timer(&mut self.state, elapsed);
        self.state.take_fatal()?;
        if self.state.timer.handle() == Some(id) {
            Ok(TimerTick::Continue)
        } else {
            Ok(TimerTick::Stop)
        }
    }

    /// Switches to preset `index`: new parameters, a new game and a resized
    /// drawing area.
    pub fn select_preset(&mut self, index: usize) -> Result<(), FrontendError> {
        let Some((name, params)) = self.presets.get(index).cloned() else {
            warn!("No preset {}; ignored", index);
            return Ok(());
        };
        info!("Switching to preset '{}'", name);
        self.midend.set_params(&params);
        self.midend.new_game(None);
        let (width, height) = self.midend.size();
        self.state
            .driver
            .resize_canvas(width, height)
            .context("resizing drawing area")?;
        self.state.width = width;
        self.state.height = height;
        Ok(())
    }

    /// Tears the window down. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.state.timer.deactivate(&mut self.state.driver);
        self.state.driver.destroy_window();
        self.closed = true;
        info!("Puzzle window closed");
    }
}
