//! TUI rendering logic for the list/detail viewer.

use omdbview_api::omdb::{DetailRecord, NOT_AVAILABLE, SearchResultItem};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState, Wrap};

use super::state::{InputMode, Screen, ViewError, ViewModel};

/// Draws the viewer UI. Returns the main content area height for page size calculation.
#[allow(clippy::indexing_slicing)]
pub fn draw(frame: &mut Frame, state: &mut ViewModel) -> u16 {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search form
            Constraint::Min(5),    // main content
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state);

    let main_area = chunks[1];
    let mut table_state = std::mem::take(&mut state.table_state);
    match state.screen() {
        Screen::Loading => draw_loading(frame, main_area),
        Screen::Detail(detail) => draw_detail(frame, main_area, detail, state.detail_scroll),
        Screen::Grid { items, error } => draw_grid(
            frame,
            main_area,
            &state.heading,
            items,
            error,
            &mut table_state,
        ),
    }
    state.table_state = table_state;

    draw_footer(frame, chunks[2], state);

    main_area.height
}

/// Draws the search form and result count.
#[allow(clippy::indexing_slicing)]
fn draw_header(frame: &mut Frame, area: Rect, state: &ViewModel) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let input_style = if state.input_mode == InputMode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let search = Paragraph::new(state.input.clone())
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(" Search: / "));
    frame.render_widget(search, header_chunks[0]);

    let status = if state.loading {
        String::from("loading...")
    } else {
        format!("{} items", state.items.len())
    };
    let count = Paragraph::new(status)
        .block(Block::default().borders(Borders::ALL).title(" OMDB Viewer "));
    frame.render_widget(count, header_chunks[1]);
}

/// Draws the loading placeholder.
fn draw_loading(frame: &mut Frame, area: Rect) {
    let loading = Paragraph::new(Line::from(Span::styled(
        "Loading...",
        Style::default().fg(Color::Yellow),
    )))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(loading, area);
}

/// Draws the result grid with an optional error line above it.
#[allow(clippy::indexing_slicing)]
fn draw_grid(
    frame: &mut Frame,
    area: Rect,
    heading: &str,
    items: &[SearchResultItem],
    error: Option<&ViewError>,
    table_state: &mut TableState,
) {
    let table_area = if let Some(err) = error {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);
        let line = Paragraph::new(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
        frame.render_widget(line, chunks[0]);
        chunks[1]
    } else {
        area
    };

    let header = Row::new(vec!["Title", "Year", "Type", "imdbID", "Poster"])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .bottom_margin(1);

    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            Row::new(vec![
                item.title.clone(),
                item.year.clone(),
                item.media_type.to_string(),
                item.imdb_id.clone(),
                String::from(if item.poster_url().is_some() { "yes" } else { "--" }),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(30),
        Constraint::Length(11),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(6),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {heading} ")),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(table, table_area, table_state);
}

/// Draws the detail panel for one record.
fn draw_detail(frame: &mut Frame, area: Rect, detail: &DetailRecord, scroll: u16) {
    let title = format!(" {} ({}) ", detail.title, detail.year);
    let panel = Paragraph::new(detail_lines(detail))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(panel, area);
}

/// Builds the labelled lines of the detail panel. Fields OMDB reports as
/// `N/A` or leaves empty are skipped.
fn detail_lines(detail: &DetailRecord) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut fields: Vec<(&str, String)> = vec![
        ("Type", detail.media_type.to_string()),
        ("Rated", detail.rated.clone()),
        ("Released", detail.released.clone()),
        ("Runtime", detail.runtime.clone()),
        ("Genre", detail.genre.clone()),
        ("Director", detail.director.clone()),
        ("Writer", detail.writer.clone()),
        ("Actors", detail.actors.clone()),
        ("Language", detail.language.clone()),
        ("Country", detail.country.clone()),
        ("Awards", detail.awards.clone()),
    ];
    if let Some(seasons) = &detail.total_seasons {
        fields.push(("Seasons", seasons.clone()));
    }
    if let Some(box_office) = &detail.box_office {
        fields.push(("Box office", box_office.clone()));
    }
    fields.push(("IMDb", format_imdb_rating(detail)));
    for rating in &detail.ratings {
        fields.push(("Rating", format!("{} ({})", rating.value, rating.source)));
    }
    if let Some(poster) = detail.poster_url() {
        fields.push(("Poster", poster.to_owned()));
    }

    let mut lines: Vec<Line<'static>> = fields
        .into_iter()
        .filter(|(_, value)| is_present(value))
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label:<11}"), label_style),
                Span::raw(value),
            ])
        })
        .collect();

    if is_present(&detail.plot) {
        lines.push(Line::from(""));
        lines.push(Line::from(detail.plot.clone()));
    }
    lines
}

/// Formats the IMDb rating and vote count (e.g. "9.5/10 (2,100,000 votes)").
fn format_imdb_rating(detail: &DetailRecord) -> String {
    if !is_present(&detail.imdb_rating) {
        return String::new();
    }
    if is_present(&detail.imdb_votes) {
        format!("{}/10 ({} votes)", detail.imdb_rating, detail.imdb_votes)
    } else {
        format!("{}/10", detail.imdb_rating)
    }
}

/// Returns `true` if an OMDB text field carries a value.
fn is_present(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != NOT_AVAILABLE
}

/// Draws the footer with key hints.
fn draw_footer(frame: &mut Frame, area: Rect, state: &ViewModel) {
    let help_text = match (state.input_mode, state.selection.is_some()) {
        (InputMode::Search, _) => Line::from("Type a title | Esc: cancel | Enter: search"),
        (InputMode::Normal, true) => Line::from(vec![Span::raw(
            "Esc/Backspace: back  \u{2191}\u{2193}: scroll  o: open IMDb  q: quit",
        )]),
        (InputMode::Normal, false) => Line::from(vec![Span::raw(
            "\u{2191}\u{2193}/j/k: move  PgUp/PgDn: page  Enter: details  /: search  r: reload  o: open IMDb  q: quit",
        )]),
    };

    let footer = Paragraph::new(help_text).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
