//! Main application state and logic

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cozy_chess::{Board, Color as Side, Move};
use iced::widget::{
    button, canvas, center, column, container, horizontal_rule, mouse_area, opaque, row,
    scrollable, stack, text, vertical_space,
};
use iced::{window, Color, Element, Length, Subscription, Task, Theme};
use tracing::{debug, error, info, warn};
use uci_client::{move_to_uci, Engine, EngineConfig, SearchLimits, UciEngine};

use crate::board::{BoardMessage, BoardView};
use crate::config::{ConfigError, Settings};
use crate::controller::{Controller, EngineTurn, Release};
use crate::game::Outcome;
use crate::styles::PANEL_WIDTH;

/// Shared handle to the running engine.
///
/// Calls run on blocking threads; the mutex keeps them one at a time.
#[derive(Clone)]
pub struct EngineHandle {
    name: String,
    inner: Arc<Mutex<Box<dyn Engine>>>,
}

impl EngineHandle {
    fn new(engine: impl Engine + 'static) -> Self {
        Self {
            name: engine.name().to_string(),
            inner: Arc::new(Mutex::new(Box::new(engine))),
        }
    }

    /// Run `f` against the engine on a blocking thread.
    async fn call<T, F>(&self, f: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Engine) -> Result<T, uci_client::EngineError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut engine = inner
                .lock()
                .map_err(|_| "engine handle poisoned by an earlier failure".to_string())?;
            f(&mut **engine).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| format!("engine task failed: {e}"))?
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle").field("name", &self.name).finish()
    }
}

/// Modal dialogs
#[derive(Debug, Clone)]
pub enum Dialog {
    /// Configuration or engine start failed; the only way out is Quit
    StartFailure(String),
    GameOver(Outcome),
    /// Engine failed during play
    EngineFailure(String),
}

/// Main application state
pub struct ChessApp {
    controller: Controller,
    /// None until the engine has started
    engine: Option<EngineHandle>,
    limits: SearchLimits,
    engine_delay: Duration,
    /// Bumped on New Game; timer and engine results from older games are dropped
    generation: u64,
    dialog: Option<Dialog>,
    /// Cached checkerboard layer
    squares: canvas::Cache,
}

/// Application messages
#[derive(Debug, Clone)]
pub enum Message {
    // Board interaction
    Board(BoardMessage),

    // Game controls
    NewGame,
    DismissDialog,
    Quit,
    CloseRequested(window::Id),

    // Engine
    EngineStarted(Result<EngineHandle, String>),
    EngineTurnDue(u64),
    EngineMoveReady(u64, Result<Move, String>),
    NewGameReady(u64, Result<(), String>),
}

impl ChessApp {
    pub fn new(settings: Result<Settings, ConfigError>) -> (Self, Task<Message>) {
        let (human, limits, engine_delay) = match &settings {
            Ok(s) => (s.human, s.limits, s.engine_delay),
            Err(_) => (Side::White, SearchLimits::default(), Duration::ZERO),
        };
        let mut app = Self {
            controller: Controller::new(human),
            engine: None,
            limits,
            engine_delay,
            generation: 0,
            dialog: None,
            squares: canvas::Cache::default(),
        };

        let task = match settings {
            Ok(settings) => start_engine(settings.engine),
            Err(e) => {
                error!("configuration error: {e}");
                app.controller.halt();
                app.dialog = Some(Dialog::StartFailure(e.to_string()));
                Task::none()
            }
        };
        (app, task)
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        window::close_requests().map(Message::CloseRequested)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Board(msg) => self.handle_board_message(msg),

            Message::EngineStarted(Ok(handle)) => {
                info!(engine = %handle.name, "engine started");
                self.engine = Some(handle);
                self.opening_turn()
            }

            Message::EngineStarted(Err(e)) => {
                error!("engine failed to start: {e}");
                self.controller.halt();
                self.dialog = Some(Dialog::StartFailure(e));
                Task::none()
            }

            Message::NewGame => {
                let Some(engine) = self.engine.clone() else {
                    return Task::none();
                };
                self.generation += 1;
                self.controller.new_game();
                self.dialog = None;
                info!(generation = self.generation, "new game");

                let generation = self.generation;
                Task::perform(
                    async move { engine.call(|e| e.new_game()).await },
                    move |result| Message::NewGameReady(generation, result),
                )
            }

            Message::NewGameReady(generation, result) => {
                if generation != self.generation {
                    return Task::none();
                }
                match result {
                    Ok(()) => self.opening_turn(),
                    Err(e) => self.engine_failed(e),
                }
            }

            Message::EngineTurnDue(generation) => {
                if generation != self.generation {
                    debug!(generation, "dropping stale engine turn");
                    return Task::none();
                }
                match self.controller.begin_engine_turn() {
                    EngineTurn::NotDue => Task::none(),
                    EngineTurn::GameOver(outcome) => self.game_over(outcome),
                    EngineTurn::Search(board) => self.request_engine_move(board),
                }
            }

            Message::EngineMoveReady(generation, result) => {
                if generation != self.generation {
                    debug!(generation, "dropping stale engine move");
                    return Task::none();
                }
                let mv = match result {
                    Ok(mv) => mv,
                    Err(e) => return self.engine_failed(e),
                };
                match self.controller.apply_engine_move(mv) {
                    Ok(outcome) => {
                        self.log_last_move("engine");
                        match outcome {
                            Some(outcome) => self.game_over(outcome),
                            None => Task::none(),
                        }
                    }
                    Err(e) => {
                        let uci = move_to_uci(self.controller.game().board(), mv);
                        self.engine_failed(format!("engine move {uci} rejected: {e}"))
                    }
                }
            }

            Message::DismissDialog => {
                if !matches!(self.dialog, Some(Dialog::StartFailure(_))) {
                    self.dialog = None;
                }
                Task::none()
            }

            Message::Quit => {
                self.shutdown();
                iced::exit()
            }

            Message::CloseRequested(id) => {
                self.shutdown();
                window::close(id)
            }
        }
    }

    fn handle_board_message(&mut self, msg: BoardMessage) -> Task<Message> {
        if self.engine.is_none() || self.dialog.is_some() {
            return Task::none();
        }
        match msg {
            BoardMessage::Pressed(point) => {
                self.controller.press(point);
                Task::none()
            }
            BoardMessage::Moved(point) => {
                self.controller.drag_to(point);
                Task::none()
            }
            BoardMessage::Released(point) => match self.controller.release(point) {
                Release::Committed(_) => {
                    self.log_last_move("human");
                    self.schedule_engine_turn()
                }
                Release::Reverted => {
                    debug!(?point, "drop rejected");
                    Task::none()
                }
                Release::Ignored => Task::none(),
            },
        }
    }

    /// Wait the configured delay, then hand the turn to the engine
    fn schedule_engine_turn(&self) -> Task<Message> {
        let generation = self.generation;
        let delay = self.engine_delay;
        Task::perform(
            async move {
                tokio::time::sleep(delay).await;
                generation
            },
            Message::EngineTurnDue,
        )
    }

    /// The engine opens when the human plays Black
    fn opening_turn(&mut self) -> Task<Message> {
        if self.controller.schedule_opening_turn() {
            Task::done(Message::EngineTurnDue(self.generation))
        } else {
            Task::none()
        }
    }

    fn request_engine_move(&mut self, board: Board) -> Task<Message> {
        let Some(engine) = self.engine.clone() else {
            return self.engine_failed("engine is not running".to_string());
        };
        debug!(fen = %board, "asking engine for a move");

        let generation = self.generation;
        let limits = self.limits;
        Task::perform(
            async move { engine.call(move |e| e.best_move(&board, &limits)).await },
            move |result| Message::EngineMoveReady(generation, result),
        )
    }

    fn game_over(&mut self, outcome: Outcome) -> Task<Message> {
        info!(result = outcome.result(), "game over: {outcome}");
        self.dialog = Some(Dialog::GameOver(outcome));
        Task::none()
    }

    fn engine_failed(&mut self, reason: String) -> Task<Message> {
        error!("engine failure: {reason}");
        self.controller.halt();
        self.dialog = Some(Dialog::EngineFailure(reason));
        Task::none()
    }

    fn log_last_move(&self, by: &str) {
        let game = self.controller.game();
        if let Some(record) = game.moves().last() {
            info!(ply = game.moves().len(), by, "played {}", record.san);
        }
    }

    /// Release the engine before the window goes away.
    fn shutdown(&mut self) {
        info!("shutting down");
        if let Some(engine) = self.engine.take() {
            if Arc::strong_count(&engine.inner) > 1 {
                warn!("engine still busy at shutdown; it is stopped once the search returns");
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let board = BoardView::new(
            self.controller.game(),
            self.controller.drag(),
            self.controller.human(),
            &self.squares,
        )
        .view()
        .map(Message::Board);

        let content = row![
            board,
            container(self.control_panel())
                .width(PANEL_WIDTH)
                .height(Length::Fill)
                .padding(15),
        ]
        .spacing(20)
        .padding(20);

        match &self.dialog {
            Some(dialog) => {
                let on_blur = match dialog {
                    Dialog::StartFailure(_) => None,
                    _ => Some(Message::DismissDialog),
                };
                modal(content, dialog_view(dialog), on_blur)
            }
            None => content.into(),
        }
    }

    /// Render the control panel
    fn control_panel(&self) -> Element<'_, Message> {
        let new_game_btn = button(text("New Game"))
            .on_press_maybe(self.engine.is_some().then_some(Message::NewGame))
            .style(button::primary)
            .width(Length::Fill);

        let engine_name = match &self.engine {
            Some(engine) => engine.name.as_str(),
            None => "-",
        };
        let human = match self.controller.human() {
            Side::White => "You play White",
            Side::Black => "You play Black",
        };

        // Move history
        let moves_title = text("Moves").size(16);
        let mut moves_list = column![].spacing(2);

        for (i, chunk) in self.controller.game().moves().chunks(2).enumerate() {
            let move_num = i + 1;
            let white_move = &chunk[0].san;
            let black_move = chunk.get(1).map(|m| m.san.as_str()).unwrap_or("");

            moves_list = moves_list
                .push(text(format!("{}. {} {}", move_num, white_move, black_move)).size(13));
        }

        let moves_scroll = scrollable(moves_list).height(Length::Fill);

        column![
            new_game_btn,
            vertical_space().height(20),
            text("Engine").size(14),
            text(engine_name).size(16),
            vertical_space().height(10),
            text(human).size(14),
            vertical_space().height(20),
            horizontal_rule(1),
            vertical_space().height(10),
            text(self.status()).size(16),
            vertical_space().height(20),
            horizontal_rule(1),
            vertical_space().height(10),
            moves_title,
            moves_scroll,
        ]
        .spacing(5)
        .into()
    }

    fn status(&self) -> String {
        let game = self.controller.game();
        if let Some(outcome) = game.outcome() {
            return outcome.to_string();
        }
        if self.controller.is_halted() {
            return "Play stopped".to_string();
        }
        if self.engine.is_none() {
            return "Starting engine...".to_string();
        }
        if self.controller.engine_pending() {
            return "Engine thinking...".to_string();
        }
        if game.side_to_move() == self.controller.human() {
            "Your move".to_string()
        } else {
            "Engine to move".to_string()
        }
    }
}

/// Start the engine process off the UI thread
fn start_engine(config: EngineConfig) -> Task<Message> {
    info!(path = %config.path.display(), "starting engine");
    Task::perform(
        async move {
            tokio::task::spawn_blocking(move || UciEngine::spawn(&config))
                .await
                .map_err(|e| format!("engine task failed: {e}"))?
                .map(EngineHandle::new)
                .map_err(|e| e.to_string())
        },
        Message::EngineStarted,
    )
}

fn dialog_view(dialog: &Dialog) -> Element<'_, Message> {
    let (title, body, action) = match dialog {
        Dialog::StartFailure(reason) => (
            "Cannot start",
            reason.clone(),
            button(text("Quit"))
                .on_press(Message::Quit)
                .style(button::danger),
        ),
        Dialog::GameOver(outcome) => (
            "Game over",
            outcome.to_string(),
            button(text("Close"))
                .on_press(Message::DismissDialog)
                .style(button::primary),
        ),
        Dialog::EngineFailure(reason) => (
            "Engine error",
            format!("{reason}\n\nPlay has stopped. Start a new game to try again."),
            button(text("Close"))
                .on_press(Message::DismissDialog)
                .style(button::secondary),
        ),
    };

    container(
        column![text(title).size(20), text(body).size(14), action]
            .spacing(15)
            .width(320),
    )
    .padding(20)
    .style(container::rounded_box)
    .into()
}

/// Overlay `content` on top of `base`, blocking input to it
fn modal<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Option<Message>,
) -> Element<'a, Message> {
    let backdrop = mouse_area(center(opaque(content)).style(|_theme| container::Style {
        background: Some(
            Color {
                a: 0.8,
                ..Color::BLACK
            }
            .into(),
        ),
        ..container::Style::default()
    }));
    let backdrop = match on_blur {
        Some(message) => backdrop.on_press(message),
        None => backdrop,
    };

    stack![base.into(), opaque(backdrop)].into()
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod app_tests;
