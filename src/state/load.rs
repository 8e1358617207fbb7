//! Fetch state and stage-keyed discarding of stale fetches

use tracing::warn;

use crate::error::BackendError;

/// Outcome of a fetch as seen by the caller
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    #[default]
    Loading,
    Ready(T),
    Error(String),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> From<Result<T, BackendError>> for LoadState<T> {
    fn from(result: Result<T, BackendError>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Error(err.user_message()),
        }
    }
}

/// Where review form loading stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageState {
    /// Fetching; the stage is unknown until the review stage has been read
    Loading(Option<u32>),
    Ready(u32),
    Error(String),
}

/// Handed out with every review form fetch and checked on completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub stage: u32,
    generation: u64,
}

/// Keys review form fetches by stage.
///
/// Selecting a stage issues a new ticket; only the completion carrying the
/// latest ticket is applied, so a slow response for a stage the user already
/// left cannot overwrite the newer one.
#[derive(Debug, Clone)]
pub struct StageTracker {
    state: StageState,
    generation: u64,
    latest: Option<FetchTicket>,
    total_stages: Option<u32>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            state: StageState::Loading(None),
            generation: 0,
            latest: None,
            total_stages: None,
        }
    }

    pub fn state(&self) -> &StageState {
        &self.state
    }

    /// Stage currently selected, if any
    pub fn stage(&self) -> Option<u32> {
        self.latest.map(|ticket| ticket.stage)
    }

    pub fn total_stages(&self) -> Option<u32> {
        self.total_stages
    }

    pub fn set_total_stages(&mut self, total: u32) {
        self.total_stages = Some(total);
    }

    /// Start loading a stage; supersedes every earlier ticket
    pub fn select(&mut self, stage: u32) -> FetchTicket {
        self.generation += 1;
        let ticket = FetchTicket {
            stage,
            generation: self.generation,
        };
        self.latest = Some(ticket);
        self.state = StageState::Loading(Some(stage));
        ticket
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest == Some(ticket)
    }

    /// Mark the ticket's stage ready. Returns false, changing nothing, when
    /// the ticket has been superseded.
    pub fn complete(&mut self, ticket: FetchTicket) -> bool {
        if !self.is_current(ticket) {
            warn!(stage = ticket.stage, "discarding stale review form fetch");
            return false;
        }
        self.state = StageState::Ready(ticket.stage);
        true
    }

    /// Record a failed fetch; stale failures are discarded like completions
    pub fn fail(&mut self, ticket: FetchTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            warn!(stage = ticket.stage, "discarding stale review form failure");
            return false;
        }
        self.state = StageState::Error(message.into());
        true
    }

    /// Failure before any stage was known (reading the review stage itself)
    pub fn fail_unstaged(&mut self, message: impl Into<String>) {
        self.latest = None;
        self.state = StageState::Error(message.into());
    }
}
