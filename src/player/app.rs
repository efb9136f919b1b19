use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::error::Error;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::audio::RodioOutput;
use super::picker::{FilePicker, PickerOutcome};
use super::ui;
use apem_player::catalog::{Catalog, CatalogEntry, EntryId};
use apem_player::config::Config;
use apem_player::constants::STATUS_MESSAGE_SECS;
use apem_player::controller::{ControllerOptions, PlaybackController};

const INPUT_POLL: Duration = Duration::from_millis(50);

pub struct App {
    pub should_quit: bool,
    pub catalog: Catalog,
    pub controller: PlaybackController<RodioOutput>,
    pub selected: usize,
    pub picker: Option<FilePicker>,
    pub picker_start: PathBuf,
    pub status_message: Option<String>,
    pub status_timer: Option<Instant>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let options = ControllerOptions {
            poll_interval: config.poll_interval(),
            skip_interval_ms: config.skip_interval_ms(),
        };

        Self {
            should_quit: false,
            catalog: Catalog::with_bundled(),
            controller: PlaybackController::new(RodioOutput::new(), options),
            selected: 0,
            picker: None,
            picker_start: config.picker_start_path(),
            status_message: None,
            status_timer: None,
        }
    }

    /// Adds a file to the catalog, named after its file name.
    pub fn add_external(&mut self, path: PathBuf) -> EntryId {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.catalog.add_external(path, display_name)
    }

    pub fn selected_entry(&self) -> Option<&CatalogEntry> {
        self.catalog.list_entries().get(self.selected)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.catalog.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(len as isize) as usize;
    }

    /// Loads the first catalog entry so the player starts with a track
    /// selected and playing.
    pub fn select_first(&mut self) {
        self.selected = 0;
        self.play_selected();
    }

    pub fn play_selected(&mut self) {
        let Some(entry) = self.selected_entry().cloned() else {
            return;
        };
        if let Err(e) = self.controller.select(&entry) {
            self.controller.take_error();
            self.set_status(e.to_string());
        }
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.selected_entry().map(|entry| entry.id) else {
            return;
        };

        match self.catalog.remove(id) {
            Ok(removed) => {
                self.controller.on_entry_removed(removed.id);
                if self.selected >= self.catalog.len() {
                    self.selected = self.catalog.len().saturating_sub(1);
                }
                self.set_status(format!("Removed {}", removed.display_name));
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    pub fn open_picker(&mut self) {
        self.picker = Some(FilePicker::new(self.picker_start.clone()));
    }

    pub fn apply_picker_outcome(&mut self, outcome: PickerOutcome) {
        self.picker = None;
        match outcome {
            PickerOutcome::Cancelled => info!("File picker cancelled"),
            PickerOutcome::Picked { path, display_name } => {
                // Next time the picker opens where this file was found
                if let Some(parent) = path.parent() {
                    self.picker_start = parent.to_path_buf();
                }
                self.catalog.add_external(path, display_name.clone());
                self.selected = self.catalog.len() - 1;
                self.set_status(format!("Added {display_name}"));
            }
        }
    }

    /// Seeks to `tenths` tenths of the loaded duration.
    pub fn seek_fraction(&mut self, tenths: u32) {
        if let Some(session) = self.controller.session() {
            let target = session.duration_ms * u64::from(tenths) / 10;
            self.controller.seek(target as i64);
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_timer = Some(Instant::now());
    }

    pub fn update(&mut self, now: Instant) {
        self.controller.pump(now);

        if let Some(e) = self.controller.take_error() {
            self.set_status(e.to_string());
        }

        if let Some(timer) = self.status_timer
            && now.duration_since(timer) > Duration::from_secs(STATUS_MESSAGE_SECS)
        {
            self.status_message = None;
            self.status_timer.take();
        }
    }
}

pub fn run(files: &[PathBuf], config: &Config) -> Result<(), Box<dyn Error>> {
    init_logging(config)?;
    info!("Starting apem player");

    let mut app = App::new(config);
    for file in files {
        if file.is_file() {
            app.add_external(file.clone());
        } else {
            warn!("Skipping {}: not a file", file.display());
        }
    }
    app.select_first();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    app.controller.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        error!("Player loop failed: {e}");
    }
    info!("apem player exited");
    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        app.update(Instant::now());

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(INPUT_POLL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key_event(app, key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
    if app.picker.is_some() {
        handle_picker_keys(app, key);
    } else {
        handle_player_keys(app, key);
    }
}

fn handle_picker_keys(app: &mut App, key: event::KeyEvent) {
    let Some(picker) = app.picker.as_mut() else {
        return;
    };

    let outcome = match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            picker.navigate_up();
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            picker.navigate_down();
            None
        }
        KeyCode::Enter => picker.activate(),
        KeyCode::Esc | KeyCode::Char('q') => Some(picker.cancel()),
        _ => None,
    };

    if let Some(outcome) = outcome {
        app.apply_picker_outcome(outcome);
    }
}

fn handle_player_keys(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Enter => app.play_selected(),
        KeyCode::Char(' ') => app.controller.toggle_play_pause(),
        KeyCode::Left | KeyCode::Char('h') => app.controller.skip_back(),
        KeyCode::Right | KeyCode::Char('l') => app.controller.skip_forward(),
        KeyCode::Char('s') => app.controller.stop(),
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected(),
        KeyCode::Char('o') => app.open_picker(),
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if let Some(tenths) = c.to_digit(10) {
                app.seek_fraction(tenths);
            }
        }
        _ => {}
    }
}

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, LevelFilter, WriteLogger};

    let level = config.log_level.parse::<LevelFilter>()?;
    let log_path = shellexpand::tilde(&config.log_file).to_string();
    if let Some(parent) = Path::new(&log_path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    CombinedLogger::init(vec![WriteLogger::new(
        level,
        simplelog::Config::default(),
        File::create(&log_path)?,
    )])?;

    Ok(())
}
