use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};

use crate::fetcher::Fetcher;
use crate::github::GithubError;
use crate::models::{Credentials, Snapshot};
use crate::storage::Storage;
use crate::wallpaper::{self, ApplyError, WallpaperTarget};
use arboard::Clipboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Loading,
    Dashboard,
    Setup,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Login,
    Token,
}

pub struct App {
    pub should_quit: bool,
    pub needs_refresh: bool,
    pub needs_apply: bool,
    pub mode: Mode,
    pub status: Option<String>,
    pub setup_field: SetupField,
    pub login_input: String,
    pub token_input: String,
    pub dark_mode: bool,
    pub snapshot: Option<Snapshot>,
    pub stale: bool,
    pub last_refresh: Option<DateTime<Local>>,
    pub show_help: bool,
    storage: Storage,
    target: WallpaperTarget,
    toast: Option<Toast>,
}

impl App {
    pub fn new(storage: Storage, target: WallpaperTarget, force_setup: bool) -> Self {
        let config = storage.read_config();
        let has_login = config
            .login
            .as_deref()
            .is_some_and(|login| !login.trim().is_empty());
        let start_on_dashboard = has_login && !force_setup;
        let mode = if start_on_dashboard {
            Mode::Loading
        } else {
            Mode::Setup
        };

        App {
            should_quit: false,
            needs_refresh: start_on_dashboard,
            needs_apply: false,
            mode,
            status: None,
            setup_field: SetupField::Login,
            login_input: config.login.unwrap_or_default(),
            token_input: storage.read_token().unwrap_or_default(),
            dark_mode: config.dark_mode,
            snapshot: None,
            stale: false,
            last_refresh: None,
            show_help: false,
            storage,
            target,
            toast: None,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Setup => self.handle_setup_input(key),
            Mode::Dashboard | Mode::Loading | Mode::Error => self.handle_dashboard_input(key),
        }
    }

    /// Blocking fetch, run from the main loop right after a Loading
    /// frame has been drawn.
    pub fn refresh_data(&mut self) {
        self.needs_refresh = false;
        self.status = None;

        let config = self.storage.read_config();
        let login = match config.login.filter(|login| !login.trim().is_empty()) {
            Some(login) => login,
            None => {
                self.mode = Mode::Setup;
                return;
            }
        };

        let credentials = Credentials {
            login,
            token: self.storage.read_token(),
        };
        let fetcher = Fetcher::new(self.storage.clone());
        match fetcher.fetch(&credentials) {
            Ok(outcome) => {
                self.stale = outcome.stale;
                if outcome.stale {
                    self.set_toast("GitHub unreachable. Showing cached data.", true);
                }
                self.snapshot = Some(outcome.snapshot);
                self.last_refresh = Some(Local::now());
                self.mode = Mode::Dashboard;
            }
            Err(err) => self.handle_error(err),
        }
    }

    /// Blocking fetch + image write, run from the main loop like
    /// refresh_data.
    pub fn apply_wallpaper(&mut self) {
        self.needs_apply = false;

        match wallpaper::apply(&self.storage, &self.target) {
            Ok(outcome) => {
                self.stale = outcome.stale;
                self.snapshot = Some(outcome.snapshot);
                self.last_refresh = Some(Local::now());
                self.mode = Mode::Dashboard;
                let message = format!("Wallpaper written to {}", self.target.output.display());
                self.status = None;
                self.set_toast(message, false);
            }
            Err(ApplyError::NotConfigured) => {
                self.mode = Mode::Setup;
                self.status = Some(ApplyError::NotConfigured.to_string());
            }
            Err(err) => {
                let message = err.to_string();
                self.status = Some(message.clone());
                self.set_toast(message, true);
                self.mode = if self.snapshot.is_some() {
                    Mode::Dashboard
                } else {
                    Mode::Error
                };
            }
        }
    }

    fn handle_error(&mut self, err: GithubError) {
        match &err {
            GithubError::Unauthorized | GithubError::UserNotFound(_) => {
                self.mode = Mode::Setup;
                self.status = Some(err.to_string());
            }
            _ => {
                self.mode = Mode::Error;
                self.status = Some(err.to_string());
            }
        }
    }

    fn handle_dashboard_input(&mut self, key: KeyEvent) {
        if self.show_help {
            match key.code {
                KeyCode::Char('h') | KeyCode::Esc => {
                    self.show_help = false;
                }
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => self.trigger_refresh(),
            KeyCode::Char('w') => self.trigger_apply(),
            KeyCode::Char('m') => self.toggle_theme(),
            KeyCode::Char('c') => self.copy_stats_to_clipboard(),
            KeyCode::Char('e') => self.enter_setup(),
            KeyCode::Char('h') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_setup_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.toggle_field();
            }
            KeyCode::Enter => self.submit_setup(),
            KeyCode::Backspace => {
                self.active_input_mut().pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    self.active_input_mut().push(ch);
                }
            }
            KeyCode::Esc => {
                if self.snapshot.is_some() {
                    self.mode = Mode::Dashboard;
                    self.status = None;
                } else {
                    self.should_quit = true;
                }
            }
            _ => {}
        }
    }

    fn submit_setup(&mut self) {
        let login = self.login_input.trim().to_string();
        if login.is_empty() {
            self.status = Some("Enter a GitHub username.".to_string());
            return;
        }

        let mut config = self.storage.read_config();
        config.login = Some(login);
        if let Err(err) = self.storage.write_config(&config) {
            self.status = Some(format!("Failed to save settings: {err}"));
            return;
        }

        // An empty token field keeps whatever token is already stored.
        let token = self.token_input.trim();
        if !token.is_empty() {
            if let Err(err) = self.storage.write_token(token) {
                self.status = Some(format!("Failed to save token: {err}"));
                return;
            }
        }

        self.status = None;
        self.mode = Mode::Loading;
        self.needs_refresh = true;
    }

    fn toggle_field(&mut self) {
        self.setup_field = match self.setup_field {
            SetupField::Login => SetupField::Token,
            SetupField::Token => SetupField::Login,
        };
    }

    fn active_input_mut(&mut self) -> &mut String {
        match self.setup_field {
            SetupField::Login => &mut self.login_input,
            SetupField::Token => &mut self.token_input,
        }
    }

    fn enter_setup(&mut self) {
        let config = self.storage.read_config();
        self.login_input = config.login.unwrap_or_default();
        self.token_input = self.storage.read_token().unwrap_or_default();
        self.setup_field = SetupField::Login;
        self.mode = Mode::Setup;
        self.status = None;
    }

    fn trigger_refresh(&mut self) {
        self.mode = Mode::Loading;
        self.needs_refresh = true;
    }

    fn trigger_apply(&mut self) {
        self.mode = Mode::Loading;
        self.needs_apply = true;
    }

    fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
        let mut config = self.storage.read_config();
        config.dark_mode = self.dark_mode;
        match self.storage.write_config(&config) {
            Ok(()) => {
                let label = if self.dark_mode { "dark" } else { "light" };
                self.set_toast(format!("Theme set to {label}."), false);
            }
            Err(err) => self.set_toast(format!("Failed to save theme: {err}"), true),
        }
    }

    fn copy_stats_to_clipboard(&mut self) {
        let text = match &self.snapshot {
            Some(snapshot) => format!(
                "GitHub contributions for {}: {} today, current streak {} days, longest streak {} days, {} in the last year",
                snapshot.login,
                snapshot.today_count,
                snapshot.current_streak,
                snapshot.longest_streak,
                snapshot.total
            ),
            None => {
                self.status = Some("No stats to copy.".to_string());
                self.set_toast("No stats to copy.", true);
                return;
            }
        };

        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(_) => {
                self.status = Some("Copied stats to clipboard.".to_string());
                self.set_toast("Copied stats to clipboard.", false);
            }
            Err(err) => {
                let message = format!("Clipboard error: {err}");
                self.status = Some(message.clone());
                self.set_toast(message, true);
            }
        }
    }

    pub fn active_toast(&mut self) -> Option<ToastView> {
        let toast = self.toast.as_ref()?;
        if toast.created_at.elapsed() > Duration::from_secs(2) {
            self.toast = None;
            return None;
        }
        Some(ToastView {
            message: toast.message.clone(),
            is_error: toast.is_error,
        })
    }

    fn set_toast(&mut self, message: impl Into<String>, is_error: bool) {
        self.toast = Some(Toast {
            message: message.into(),
            created_at: Instant::now(),
            is_error,
        });
    }
}

struct Toast {
    message: String,
    created_at: Instant,
    is_error: bool,
}

pub struct ToastView {
    pub message: String,
    pub is_error: bool,
}
