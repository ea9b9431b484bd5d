//! Chess GUI
//!
//! Play a game against an external UCI engine, moving pieces by
//! drag-and-drop. The engine binary and game options come from a TOML file:
//!
//! ```text
//! chess_gui [CONFIG]
//! ```
//!
//! Without an argument the file named by `CHESS_GUI_CONFIG` is used, then
//! `chess_gui.toml` in the working directory. `CHESS_GUI_ENGINE` overrides
//! the engine path.

mod app;
mod board;
mod config;
mod controller;
mod game;
mod input;
mod styles;

use std::path::PathBuf;

use app::ChessApp;
use iced::{application, window, Size};
use styles::{BOARD_SIZE, PANEL_WIDTH};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load(std::env::args_os().nth(1).map(PathBuf::from));
    if let Ok(settings) = &settings {
        info!(
            engine = %settings.engine.path.display(),
            human = ?settings.human,
            move_time = ?settings.limits.move_time,
            "configuration loaded"
        );
    }

    // Board, panel and their padding
    let size = Size::new(BOARD_SIZE + PANEL_WIDTH + 60.0, BOARD_SIZE + 40.0);

    application("Chess", ChessApp::update, ChessApp::view)
        .subscription(ChessApp::subscription)
        .theme(ChessApp::theme)
        .window(window::Settings {
            size,
            resizable: false,
            exit_on_close_request: false,
            ..window::Settings::default()
        })
        .run_with(move || ChessApp::new(settings))?;

    Ok(())
}
