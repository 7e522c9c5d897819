//! List/detail viewer main loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use omdbview_api::omdb::{
    AccumulateError, Accumulated, DetailRecord, OmdbApi, OmdbClient, PlotLength, SearchPage,
    accumulate_search,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use super::state::{Command, InputMode, ListingSettings, RequestId, ViewModel};
use super::ui;

/// Sleep between key polls while no input is pending.
const TICK: Duration = Duration::from_millis(50);

/// Result of a finished [`Command`], sent back to the event loop.
#[derive(Debug)]
enum Outcome {
    Listing(RequestId, Result<Accumulated, AccumulateError>),
    Search(RequestId, anyhow::Result<SearchPage>),
    Detail(RequestId, anyhow::Result<DetailRecord>),
}

/// What the event loop should do after a key press.
#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    None,
    Quit,
    Dispatch(Command),
}

impl From<Option<Command>> for KeyAction {
    fn from(command: Option<Command>) -> Self {
        command.map_or(Self::None, Self::Dispatch)
    }
}

/// Runs the list/detail viewer TUI.
///
/// The default listing is requested immediately; the screen shows the
/// loading placeholder until it arrives.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
#[allow(clippy::module_name_repetitions)]
pub async fn run_viewer(client: Arc<OmdbClient>, settings: ListingSettings) -> Result<()> {
    let mut state = ViewModel::new(settings);
    let (tx, mut rx) = mpsc::unbounded_channel();
    dispatch(state.begin_listing(), &client, &tx);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut state, &client, &tx, &mut rx).await;

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut ViewModel,
    client: &Arc<OmdbClient>,
    tx: &mpsc::UnboundedSender<Outcome>,
    rx: &mut mpsc::UnboundedReceiver<Outcome>,
) -> Result<()> {
    let mut main_area_height: u16 = 0;

    loop {
        while let Ok(outcome) = rx.try_recv() {
            apply_outcome(state, outcome);
        }

        terminal
            .draw(|frame| {
                main_area_height = ui::draw(frame, state);
            })
            .context("failed to draw TUI")?;

        let page_size = usize::from(main_area_height.saturating_sub(4));

        if !event::poll(Duration::ZERO).context("failed to poll events")? {
            tokio::time::sleep(TICK).await;
            continue;
        }

        if let Event::Key(key) = event::read().context("failed to read event")?
            && key.kind == KeyEventKind::Press
        {
            match handle_key(state, key.code, key.modifiers, page_size) {
                KeyAction::Quit => return Ok(()),
                KeyAction::Dispatch(command) => dispatch(command, client, tx),
                KeyAction::None => {}
            }
        }
    }
}

/// Runs `command` on a spawned task that reports back over `tx`.
fn dispatch(command: Command, client: &Arc<OmdbClient>, tx: &mpsc::UnboundedSender<Outcome>) {
    let client = Arc::clone(client);
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = match command {
            Command::LoadListing {
                request,
                params,
                target,
                max_pages,
            } => Outcome::Listing(
                request,
                accumulate_search(client.as_ref(), &params, target, max_pages).await,
            ),
            Command::Search { request, params } => {
                Outcome::Search(request, client.search(&params).await)
            }
            Command::FetchDetail { request, imdb_id } => Outcome::Detail(
                request,
                client.details(&imdb_id, PlotLength::Full).await,
            ),
        };
        // Receiver is gone once the viewer has exited.
        let _ = tx.send(outcome);
    });
}

/// Feeds a finished command back into the state container.
fn apply_outcome(state: &mut ViewModel, outcome: Outcome) {
    match outcome {
        Outcome::Listing(request, result) => {
            state.finish_listing(request, result);
        }
        Outcome::Search(request, result) => {
            state.finish_search(request, result);
        }
        Outcome::Detail(request, result) => {
            state.finish_detail(request, result);
        }
    }
}

/// Routes a key press to the handler for the current mode.
fn handle_key(
    state: &mut ViewModel,
    key: KeyCode,
    modifiers: KeyModifiers,
    page_size: usize,
) -> KeyAction {
    if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }
    match state.input_mode {
        InputMode::Search => handle_search_input(state, key),
        InputMode::Normal if state.selection.is_some() => handle_detail_input(state, key),
        InputMode::Normal => handle_normal_input(state, key, page_size),
    }
}

/// Handles key input in search mode.
fn handle_search_input(state: &mut ViewModel, key: KeyCode) -> KeyAction {
    match key {
        KeyCode::Esc => state.cancel_search_input(),
        KeyCode::Enter => return state.submit_search().into(),
        KeyCode::Backspace => state.input_pop(),
        KeyCode::Char(c) => state.input_push(c),
        _ => {}
    }
    KeyAction::None
}

/// Handles key input while the detail panel is open.
fn handle_detail_input(state: &mut ViewModel, key: KeyCode) -> KeyAction {
    match key {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Esc | KeyCode::Backspace => state.close_detail(),
        KeyCode::Up | KeyCode::Char('k') => state.scroll_detail_up(),
        KeyCode::Down | KeyCode::Char('j') => state.scroll_detail_down(),
        KeyCode::Char('/') => state.start_search_input(),
        KeyCode::Char('o') => open_imdb_url(state),
        _ => {}
    }
    KeyAction::None
}

/// Handles key input on the result grid.
fn handle_normal_input(state: &mut ViewModel, key: KeyCode, page_size: usize) -> KeyAction {
    match key {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => state.move_up(),
        KeyCode::Down | KeyCode::Char('j') => state.move_down(),
        KeyCode::PageUp => state.page_up(page_size),
        KeyCode::PageDown => state.page_down(page_size),
        KeyCode::Enter => return state.open_selected().into(),
        KeyCode::Char('r') => return KeyAction::Dispatch(state.begin_listing()),
        KeyCode::Char('/') => state.start_search_input(),
        KeyCode::Char('o') => open_imdb_url(state),
        _ => {}
    }
    KeyAction::None
}

/// Opens the IMDb page for the open detail or the item under the cursor.
fn open_imdb_url(state: &ViewModel) {
    let Some(url) = state.imdb_url() else {
        return;
    };
    if let Err(err) = open::that(&url) {
        tracing::debug!(url = %url, error = %err, "failed to open browser");
    }
}
