/// Whether a wholesale native reload is owed at the end of the turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushState {
    #[default]
    Clean,
    ReloadPending,
}

/// Coalesces any number of `replace_all` calls within one turn into a single native reload.
/// Structural splices never go through here.
#[derive(Debug, Default)]
pub struct FlushCoordinator {
    state: FlushState,
}

impl FlushCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    pub fn mark_reload(&mut self) {
        self.state = FlushState::ReloadPending;
    }

    pub fn is_pending(&self) -> bool {
        self.state == FlushState::ReloadPending
    }

    /// Returns true exactly once per pending reload and resets to clean
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.state) == FlushState::ReloadPending
    }
}
