use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::event::{self, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

mod app;
mod dates;
mod fetcher;
mod github;
mod models;
mod raster;
mod render;
mod scheduler;
mod stats;
mod storage;
mod ui;
mod wallpaper;

use app::App;
use scheduler::Schedule;
use storage::Storage;
use wallpaper::WallpaperTarget;

/// GitHub contribution heatmap as your wallpaper.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Re-run the GitHub account setup before opening the dashboard
    #[arg(long)]
    setup: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch contributions and write the wallpaper image once
    Render {
        /// Where to write the image (defaults to the configured output)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long, default_value_t = wallpaper::DEFAULT_WIDTH)]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value_t = wallpaper::DEFAULT_HEIGHT)]
        height: u32,

        /// Render the cached snapshot without calling GitHub
        #[arg(long)]
        cached: bool,
    },
    /// Keep the wallpaper fresh on a daily schedule
    Daemon {
        /// Time of day to refresh, HH:MM
        #[arg(long)]
        at: Option<String>,

        /// Where to write the image (defaults to the configured output)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long, default_value_t = wallpaper::DEFAULT_WIDTH)]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value_t = wallpaper::DEFAULT_HEIGHT)]
        height: u32,

        /// Refresh once right away instead of waiting for the first tick
        #[arg(long)]
        now: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let storage = Storage::new().ok_or("Home directory not found")?;

    match cli.command {
        Some(Command::Render {
            out,
            width,
            height,
            cached,
        }) => {
            init_tracing()?;
            let target = resolve_target(&storage, out, width, height)?;
            run_render(&storage, &target, cached)
        }
        Some(Command::Daemon {
            at,
            out,
            width,
            height,
            now,
        }) => {
            init_tracing()?;
            let schedule = match at {
                Some(value) => Schedule::parse(&value)?,
                None => Schedule::default(),
            };
            let target = resolve_target(&storage, out, width, height)?;
            scheduler::run(&storage, &target, schedule, now);
            Ok(())
        }
        None => {
            let target = resolve_target(
                &storage,
                None,
                wallpaper::DEFAULT_WIDTH,
                wallpaper::DEFAULT_HEIGHT,
            )?;
            run_tui(storage, target, cli.setup)
        }
    }
}

fn init_tracing() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();
    Ok(())
}

fn resolve_target(
    storage: &Storage,
    out: Option<PathBuf>,
    width: u32,
    height: u32,
) -> Result<WallpaperTarget, Box<dyn Error>> {
    let config = storage.read_config();
    let output = out
        .or(config.output)
        .or_else(wallpaper::default_output)
        .ok_or("No output path available; pass --out or set one in the config")?;
    Ok(WallpaperTarget {
        output,
        width,
        height,
    })
}

fn run_render(storage: &Storage, target: &WallpaperTarget, cached: bool) -> Result<(), Box<dyn Error>> {
    if cached {
        wallpaper::repaint_cached(storage, target)?;
    } else {
        wallpaper::apply(storage, target)?;
    }
    println!("Wallpaper written to {}", target.output.display());
    Ok(())
}

fn run_tui(storage: Storage, target: WallpaperTarget, force_setup: bool) -> Result<(), Box<dyn Error>> {
    let mut stdout = std::io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(storage, target, force_setup);

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        if app.needs_apply {
            app.apply_wallpaper();
        } else if app.needs_refresh {
            app.refresh_data();
        }

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(120))? {
            let event = event::read()?;
            if let Event::Key(key) = event {
                app.handle_key_event(key);
            }
        }
    }

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
