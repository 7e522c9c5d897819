//! Viewer state container.
//!
//! All view transitions go through the update methods on [`ViewModel`].
//! Methods that need the network return a [`Command`]; the event loop runs
//! it and feeds the outcome back through the matching `finish_*` method.

use omdbview_api::omdb::{
    AccumulateError, Accumulated, DetailRecord, MediaType, SearchPage, SearchParams,
    SearchResultItem,
};
use ratatui::widgets::TableState;

/// Identifies one issued request. Only the latest id is ever applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestId(u64);

/// Network work requested by an update method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fill the default listing with paged searches.
    LoadListing {
        /// Request id to report back with.
        request: RequestId,
        /// First-page search parameters.
        params: SearchParams,
        /// Number of items to collect.
        target: usize,
        /// Page ceiling.
        max_pages: u32,
    },
    /// Run one keyword search.
    Search {
        /// Request id to report back with.
        request: RequestId,
        /// Search parameters.
        params: SearchParams,
    },
    /// Fetch full metadata for one item.
    FetchDetail {
        /// Request id to report back with.
        request: RequestId,
        /// IMDb identifier.
        imdb_id: String,
    },
}

/// User-visible error shown under the search form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// Search submitted with a blank term.
    #[error("Please enter a title to search.")]
    EmptyQuery,
    /// The search or listing matched nothing.
    #[error("No results found. Please check the spelling and try again.")]
    NoResults,
    /// A search request failed.
    #[error("Please check your internet connection. ({0})")]
    Network(String),
    /// The default listing could not be filled.
    #[error("Failed to load listing: {0}")]
    Listing(String),
    /// The detail request failed.
    #[error("Failed to load details: {0}")]
    Detail(String),
}

/// Validates a search term, returning it trimmed.
///
/// # Errors
///
/// Returns [`ViewError::EmptyQuery`] for empty or whitespace-only input.
pub fn validate_term(input: &str) -> Result<&str, ViewError> {
    let term = input.trim();
    if term.is_empty() {
        Err(ViewError::EmptyQuery)
    } else {
        Ok(term)
    }
}

/// Input mode for the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode.
    Normal,
    /// Search text input mode.
    Search,
}

/// Settings for the default listing and searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSettings {
    /// Query used for the default listing.
    pub query: String,
    /// Media type filter for the default listing.
    pub media_type: Option<MediaType>,
    /// Media type filter for keyword searches.
    pub search_media_type: Option<MediaType>,
    /// Number of items the listing tries to fill.
    pub target: usize,
    /// Page ceiling for the listing.
    pub max_pages: u32,
}

/// What the renderer should draw below the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen<'a> {
    /// A request is in flight.
    Loading,
    /// The selected item's detail panel.
    Detail(&'a DetailRecord),
    /// The result cards plus an optional error line.
    Grid {
        /// Result items.
        items: &'a [SearchResultItem],
        /// Error to display above the cards.
        error: Option<&'a ViewError>,
    },
}

/// State for the list/detail viewer.
#[derive(Debug)]
pub struct ViewModel {
    /// Listing settings.
    pub settings: ListingSettings,
    /// Current result items.
    pub items: Vec<SearchResultItem>,
    /// Currently selected detail record.
    pub selection: Option<DetailRecord>,
    /// Error shown with the result grid.
    pub error: Option<ViewError>,
    /// Whether a request is in flight.
    pub loading: bool,
    /// Heading of the result grid.
    pub heading: String,
    /// Search input buffer.
    pub input: String,
    /// Current input mode.
    pub input_mode: InputMode,
    /// Table state for the result grid (handles selection and scroll).
    pub table_state: TableState,
    /// Vertical scroll offset of the detail panel.
    pub detail_scroll: u16,
    /// Last issued request id.
    last_issued: u64,
    /// Request whose outcome is still awaited.
    pending: Option<RequestId>,
}

impl ViewModel {
    /// Creates an empty state with the given listing settings.
    #[must_use]
    pub fn new(settings: ListingSettings) -> Self {
        let heading = listing_heading(&settings);
        Self {
            settings,
            items: Vec::new(),
            selection: None,
            error: None,
            loading: false,
            heading,
            input: String::new(),
            input_mode: InputMode::Normal,
            table_state: TableState::default(),
            detail_scroll: 0,
            last_issued: 0,
            pending: None,
        }
    }

    /// Allocates a new request id and marks it as the awaited one.
    fn issue(&mut self) -> RequestId {
        self.last_issued = self.last_issued.saturating_add(1);
        let id = RequestId(self.last_issued);
        self.pending = Some(id);
        id
    }

    /// Accepts an outcome only if it belongs to the awaited request.
    fn accept(&mut self, request: RequestId) -> bool {
        if self.pending == Some(request) {
            self.pending = None;
            true
        } else {
            tracing::debug!(?request, pending = ?self.pending, "discarding stale response");
            false
        }
    }

    /// Returns `true` if a request is awaited.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    // --- Listing ---

    /// Starts (re)loading the default listing.
    pub fn begin_listing(&mut self) -> Command {
        self.selection = None;
        self.error = None;
        self.loading = true;
        let request = self.issue();
        let mut params = SearchParams::new(self.settings.query.clone());
        if let Some(media_type) = self.settings.media_type {
            params = params.media_type(media_type);
        }
        Command::LoadListing {
            request,
            params,
            target: self.settings.target,
            max_pages: self.settings.max_pages,
        }
    }

    /// Applies the outcome of [`Command::LoadListing`].
    ///
    /// Returns `false` if the outcome was stale and ignored.
    pub fn finish_listing(
        &mut self,
        request: RequestId,
        result: Result<Accumulated, AccumulateError>,
    ) -> bool {
        if !self.accept(request) {
            return false;
        }
        self.loading = false;
        match result {
            Ok(accumulated) if accumulated.items.is_empty() => {
                self.replace_items(Vec::new());
                self.error = Some(ViewError::NoResults);
            }
            Ok(accumulated) => {
                self.heading = listing_heading(&self.settings);
                self.replace_items(accumulated.items);
                self.error = None;
            }
            Err(err) => {
                tracing::debug!(error = %err, "listing failed");
                self.error = Some(ViewError::Listing(err.to_string()));
            }
        }
        true
    }

    // --- Search ---

    /// Submits the search input.
    ///
    /// Blank input sets [`ViewError::EmptyQuery`] and returns `None`
    /// without issuing a request.
    pub fn submit_search(&mut self) -> Option<Command> {
        self.input_mode = InputMode::Normal;
        let term = match validate_term(&self.input) {
            Ok(term) => term.to_owned(),
            Err(err) => {
                self.error = Some(err);
                return None;
            }
        };

        self.selection = None;
        self.loading = true;
        self.heading = format!("Results for \"{term}\"");
        let request = self.issue();
        let mut params = SearchParams::new(term);
        if let Some(media_type) = self.settings.search_media_type {
            params = params.media_type(media_type);
        }
        Some(Command::Search { request, params })
    }

    /// Applies the outcome of [`Command::Search`].
    ///
    /// Returns `false` if the outcome was stale and ignored.
    pub fn finish_search(&mut self, request: RequestId, result: anyhow::Result<SearchPage>) -> bool {
        if !self.accept(request) {
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) if !page.items.is_empty() => {
                let mut items = page.items;
                items.truncate(self.settings.target);
                self.replace_items(items);
                self.error = None;
            }
            Ok(_) => {
                self.replace_items(Vec::new());
                self.error = Some(ViewError::NoResults);
            }
            Err(err) => {
                tracing::debug!(error = %err, "search failed");
                self.replace_items(Vec::new());
                self.error = Some(ViewError::Network(format!("{err:#}")));
            }
        }
        true
    }

    // --- Detail ---

    /// Starts fetching the detail record for `imdb_id`.
    pub fn select_item(&mut self, imdb_id: &str) -> Command {
        self.loading = true;
        let request = self.issue();
        Command::FetchDetail {
            request,
            imdb_id: imdb_id.to_owned(),
        }
    }

    /// Starts fetching the detail record for the item under the cursor.
    pub fn open_selected(&mut self) -> Option<Command> {
        let imdb_id = self.current_item()?.imdb_id.clone();
        Some(self.select_item(&imdb_id))
    }

    /// Applies the outcome of [`Command::FetchDetail`].
    ///
    /// Returns `false` if the outcome was stale and ignored.
    pub fn finish_detail(
        &mut self,
        request: RequestId,
        result: anyhow::Result<DetailRecord>,
    ) -> bool {
        if !self.accept(request) {
            return false;
        }
        self.loading = false;
        match result {
            Ok(detail) => {
                self.selection = Some(detail);
                self.detail_scroll = 0;
                self.error = None;
            }
            Err(err) => {
                tracing::debug!(error = %err, "detail fetch failed");
                self.selection = None;
                self.error = Some(ViewError::Detail(format!("{err:#}")));
            }
        }
        true
    }

    /// Closes the detail panel. The result list and cursor are untouched.
    pub fn close_detail(&mut self) {
        self.selection = None;
        self.detail_scroll = 0;
    }

    // --- Rendering ---

    /// Returns what should be drawn below the search form.
    #[must_use]
    pub fn screen(&self) -> Screen<'_> {
        if self.loading {
            Screen::Loading
        } else if let Some(detail) = &self.selection {
            Screen::Detail(detail)
        } else {
            Screen::Grid {
                items: &self.items,
                error: self.error.as_ref(),
            }
        }
    }

    /// Returns the IMDb page of the open detail or the item under the cursor.
    #[must_use]
    pub fn imdb_url(&self) -> Option<String> {
        let imdb_id = match &self.selection {
            Some(detail) => detail.imdb_id.as_str(),
            None => self.current_item()?.imdb_id.as_str(),
        };
        Some(format!("https://www.imdb.com/title/{imdb_id}/"))
    }

    // --- Navigation ---

    /// Returns the cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    /// Returns the item under the cursor (if any).
    #[must_use]
    pub fn current_item(&self) -> Option<&SearchResultItem> {
        self.items.get(self.table_state.selected()?)
    }

    /// Moves cursor up.
    pub fn move_up(&mut self) {
        let current = self.cursor();
        if current > 0 {
            self.table_state.select(Some(current.saturating_sub(1)));
        }
    }

    /// Moves cursor down.
    pub fn move_down(&mut self) {
        let next = self.cursor().saturating_add(1);
        if next < self.items.len() {
            self.table_state.select(Some(next));
        }
    }

    /// Scrolls up by a page.
    pub fn page_up(&mut self, page_size: usize) {
        if self.items.is_empty() {
            return;
        }
        let current = self.cursor();
        self.table_state
            .select(Some(current.saturating_sub(page_size)));
    }

    /// Scrolls down by a page.
    pub fn page_down(&mut self, page_size: usize) {
        if self.items.is_empty() {
            return;
        }
        let max = self.items.len().saturating_sub(1);
        let current = self.cursor();
        self.table_state
            .select(Some(current.saturating_add(page_size).min(max)));
    }

    /// Scrolls the detail panel up one line.
    pub const fn scroll_detail_up(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_sub(1);
    }

    /// Scrolls the detail panel down one line.
    pub const fn scroll_detail_down(&mut self) {
        self.detail_scroll = self.detail_scroll.saturating_add(1);
    }

    // --- Search input ---

    /// Enters search input mode.
    pub const fn start_search_input(&mut self) {
        self.input_mode = InputMode::Search;
    }

    /// Leaves search input mode without submitting.
    pub const fn cancel_search_input(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Appends a character to the search input.
    pub fn input_push(&mut self, ch: char) {
        self.input.push(ch);
    }

    /// Removes the last character from the search input.
    pub fn input_pop(&mut self) {
        self.input.pop();
    }

    /// Replaces the item list and resets the cursor.
    fn replace_items(&mut self, items: Vec<SearchResultItem>) {
        self.items = items;
        if self.items.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(0));
        }
    }
}

/// Heading shown above the default listing (e.g. "Series").
fn listing_heading(settings: &ListingSettings) -> String {
    match settings.media_type {
        Some(MediaType::Movie) => String::from("Movies"),
        Some(MediaType::Series) => String::from("Series"),
        Some(MediaType::Episode) => String::from("Episodes"),
        Some(MediaType::Game) => String::from("Games"),
        Some(MediaType::Other) | None => format!("\"{}\"", settings.query),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]
    #![allow(clippy::indexing_slicing)]

    use anyhow::anyhow;

    use super::*;

    fn settings() -> ListingSettings {
        ListingSettings {
            query: String::from("series"),
            media_type: Some(MediaType::Series),
            search_media_type: None,
            target: 120,
            max_pages: 20,
        }
    }

    fn item(n: usize) -> SearchResultItem {
        SearchResultItem {
            imdb_id: format!("tt{n:07}"),
            title: format!("Show {n}"),
            year: String::from("2011"),
            poster: String::from("N/A"),
            media_type: MediaType::Series,
        }
    }

    fn detail(imdb_id: &str) -> DetailRecord {
        let json = format!(
            r#"{{"Title":"Show","Year":"2011","imdbID":"{imdb_id}","Type":"series","Response":"True"}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    fn loaded_state(count: usize) -> ViewModel {
        let mut state = ViewModel::new(settings());
        let Command::LoadListing { request, .. } = state.begin_listing() else {
            panic!("expected LoadListing");
        };
        let accumulated = Accumulated {
            items: (0..count).map(item).collect(),
            pages: 1,
            exhausted: false,
        };
        state.finish_listing(request, Ok(accumulated));
        state
    }

    fn request_of(command: &Command) -> RequestId {
        match command {
            Command::LoadListing { request, .. }
            | Command::Search { request, .. }
            | Command::FetchDetail { request, .. } => *request,
        }
    }

    #[test]
    fn test_begin_listing_sets_loading_and_params() {
        // Arrange
        let mut state = ViewModel::new(settings());

        // Act
        let command = state.begin_listing();

        // Assert
        assert!(state.loading);
        assert_eq!(state.screen(), Screen::Loading);
        let Command::LoadListing {
            params,
            target,
            max_pages,
            ..
        } = command
        else {
            panic!("expected LoadListing");
        };
        assert_eq!(params.query, "series");
        assert_eq!(params.media_type, Some(MediaType::Series));
        assert_eq!(params.page, 1);
        assert_eq!(target, 120);
        assert_eq!(max_pages, 20);
    }

    #[test]
    fn test_finish_listing_populates_grid() {
        // Arrange & Act
        let state = loaded_state(120);

        // Assert
        assert!(!state.loading);
        assert_eq!(state.items.len(), 120);
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.heading, "Series");
        assert!(matches!(state.screen(), Screen::Grid { error: None, .. }));
    }

    #[test]
    fn test_finish_listing_empty_sets_no_results() {
        // Arrange & Act
        let state = loaded_state(0);

        // Assert
        assert!(state.items.is_empty());
        assert_eq!(state.error, Some(ViewError::NoResults));
    }

    #[test]
    fn test_finish_listing_error_is_surfaced() {
        // Arrange
        let mut state = ViewModel::new(settings());
        let request = request_of(&state.begin_listing());

        // Act
        state.finish_listing(
            request,
            Err(AccumulateError::PageCeilingExceeded {
                max_pages: 20,
                collected: 40,
                target: 120,
            }),
        );

        // Assert
        assert!(!state.loading);
        let Some(ViewError::Listing(message)) = &state.error else {
            panic!("expected listing error");
        };
        assert!(message.contains("page ceiling of 20"));
    }

    #[test]
    fn test_submit_blank_search_issues_no_request() {
        // Arrange
        let mut state = loaded_state(3);
        state.input = String::from("   \t");

        // Act
        let command = state.submit_search();

        // Assert
        assert!(command.is_none());
        assert!(!state.loading);
        assert!(!state.is_pending());
        assert_eq!(state.error, Some(ViewError::EmptyQuery));
        assert_eq!(state.items.len(), 3);
    }

    #[test]
    fn test_submit_search_trims_term_and_clears_selection() {
        // Arrange
        let mut state = loaded_state(3);
        let request = request_of(&state.select_item("tt0000001"));
        state.finish_detail(request, Ok(detail("tt0000001")));
        state.input = String::from("  breaking bad ");

        // Act
        let command = state.submit_search().unwrap();

        // Assert
        assert!(state.selection.is_none());
        assert!(state.loading);
        let Command::Search { params, .. } = command else {
            panic!("expected Search");
        };
        assert_eq!(params.query, "breaking bad");
        assert_eq!(params.media_type, None);
        assert_eq!(state.heading, "Results for \"breaking bad\"");
    }

    #[test]
    fn test_finish_search_replaces_list_and_clears_error() {
        // Arrange
        let mut state = loaded_state(0);
        state.input = String::from("lost");
        let request = request_of(&state.submit_search().unwrap());
        let page = SearchPage {
            items: vec![item(7), item(8)],
            total_results: Some(2),
        };

        // Act
        let applied = state.finish_search(request, Ok(page));

        // Assert
        assert!(applied);
        assert_eq!(state.items, vec![item(7), item(8)]);
        assert!(state.error.is_none());
        assert!(!state.loading);
    }

    #[test]
    fn test_finish_search_empty_clears_list() {
        // Arrange
        let mut state = loaded_state(5);
        state.input = String::from("zzzz");
        let request = request_of(&state.submit_search().unwrap());

        // Act
        state.finish_search(request, Ok(SearchPage::default()));

        // Assert
        assert!(state.items.is_empty());
        assert_eq!(state.error, Some(ViewError::NoResults));
        assert!(state.current_item().is_none());
    }

    #[test]
    fn test_finish_search_failure_clears_list_and_sets_network_error() {
        // Arrange
        let mut state = loaded_state(5);
        state.input = String::from("lost");
        let request = request_of(&state.submit_search().unwrap());

        // Act
        state.finish_search(request, Err(anyhow!("dns error")));

        // Assert
        assert!(state.items.is_empty());
        let Some(ViewError::Network(message)) = &state.error else {
            panic!("expected network error");
        };
        assert!(message.contains("dns error"));
    }

    #[test]
    fn test_select_item_sets_loading_synchronously() {
        // Arrange
        let mut state = loaded_state(3);

        // Act
        let command = state.open_selected().unwrap();

        // Assert
        assert!(state.loading);
        assert_eq!(state.screen(), Screen::Loading);
        let Command::FetchDetail { imdb_id, .. } = command else {
            panic!("expected FetchDetail");
        };
        assert_eq!(imdb_id, "tt0000000");
    }

    #[test]
    fn test_finish_detail_success_shows_detail() {
        // Arrange
        let mut state = loaded_state(3);
        let request = request_of(&state.select_item("tt0000002"));

        // Act
        state.finish_detail(request, Ok(detail("tt0000002")));

        // Assert
        assert!(!state.loading);
        let Screen::Detail(record) = state.screen() else {
            panic!("expected detail screen");
        };
        assert_eq!(record.imdb_id, "tt0000002");
        assert_eq!(
            state.imdb_url().as_deref(),
            Some("https://www.imdb.com/title/tt0000002/")
        );
    }

    #[test]
    fn test_finish_detail_failure_returns_to_list_with_error() {
        // Arrange
        let mut state = loaded_state(3);
        let request = request_of(&state.select_item("tt0000002"));

        // Act
        state.finish_detail(request, Err(anyhow!("timeout")));

        // Assert
        assert!(!state.loading);
        assert!(state.selection.is_none());
        let Screen::Grid { items, error } = state.screen() else {
            panic!("expected grid");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(error, Some(ViewError::Detail(_))));
    }

    #[test]
    fn test_close_detail_restores_prior_list() {
        // Arrange
        let mut state = loaded_state(10);
        state.move_down();
        state.move_down();
        let items_before = state.items.clone();
        let cursor_before = state.cursor();
        let request = request_of(&state.open_selected().unwrap());
        state.finish_detail(request, Ok(detail("tt0000002")));

        // Act
        state.close_detail();

        // Assert
        assert!(state.selection.is_none());
        assert_eq!(state.items, items_before);
        assert_eq!(state.cursor(), cursor_before);
        assert!(matches!(state.screen(), Screen::Grid { .. }));
    }

    #[test]
    fn test_detail_success_clears_earlier_detail_error() {
        // Arrange
        let mut state = loaded_state(3);
        let failed = request_of(&state.select_item("tt0000001"));
        state.finish_detail(failed, Err(anyhow!("timeout")));
        assert!(matches!(state.error, Some(ViewError::Detail(_))));
        let retried = request_of(&state.select_item("tt0000001"));
        state.finish_detail(retried, Ok(detail("tt0000001")));

        // Act
        state.close_detail();

        // Assert
        assert!(matches!(state.screen(), Screen::Grid { error: None, .. }));
        assert_eq!(state.items.len(), 3);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        // Arrange: two detail requests in a row, the first resolves last
        let mut state = loaded_state(3);
        let first = request_of(&state.select_item("tt0000000"));
        let second = request_of(&state.select_item("tt0000001"));

        // Act
        let applied_second = state.finish_detail(second, Ok(detail("tt0000001")));
        let applied_first = state.finish_detail(first, Ok(detail("tt0000000")));

        // Assert
        assert!(applied_second);
        assert!(!applied_first);
        assert_eq!(state.selection.unwrap().imdb_id, "tt0000001");
    }

    #[test]
    fn test_search_supersedes_pending_detail() {
        // Arrange
        let mut state = loaded_state(3);
        let detail_request = request_of(&state.select_item("tt0000000"));
        state.input = String::from("lost");
        let search_request = request_of(&state.submit_search().unwrap());

        // Act
        let applied_detail = state.finish_detail(detail_request, Ok(detail("tt0000000")));

        // Assert
        assert!(!applied_detail);
        assert!(state.loading);
        assert!(state.selection.is_none());
        assert!(state.finish_search(search_request, Ok(SearchPage::default())));
    }

    #[test]
    fn test_move_and_page_navigation() {
        // Arrange
        let mut state = loaded_state(3);

        // Act & Assert
        state.move_up();
        assert_eq!(state.cursor(), 0);
        state.move_down();
        state.move_down();
        state.move_down();
        assert_eq!(state.cursor(), 2);
        state.page_up(10);
        assert_eq!(state.cursor(), 0);
        state.page_down(10);
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn test_search_input_editing() {
        // Arrange
        let mut state = ViewModel::new(settings());

        // Act
        state.start_search_input();
        state.input_push('l');
        state.input_push('o');
        state.input_push('x');
        state.input_pop();

        // Assert
        assert_eq!(state.input_mode, InputMode::Search);
        assert_eq!(state.input, "lo");
        state.cancel_search_input();
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_validate_term() {
        // Arrange & Act & Assert
        assert_eq!(validate_term("  x "), Ok("x"));
        assert_eq!(validate_term(""), Err(ViewError::EmptyQuery));
        assert_eq!(
            ViewError::EmptyQuery.to_string(),
            "Please enter a title to search."
        );
    }
}
