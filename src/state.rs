use std::fmt;

/// Open/close state of the radial menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

/// Inputs that drive the menu state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    /// Toggle button activated (click, Enter, Space).
    Toggle,
    /// Escape key or a click outside the menu.
    Dismiss,
    /// The running sequence finished.
    Settled,
}

impl MenuState {
    /// The only place transitions are decided. `None` means the input is
    /// not legal in this state and must be ignored.
    pub fn apply(self, input: MenuInput) -> Option<MenuState> {
        use MenuInput::*;
        use MenuState::*;
        match (self, input) {
            (Closed, Toggle) => Some(Opening),
            (Open, Toggle | Dismiss) => Some(Closing),
            (Opening, Settled) => Some(Open),
            (Closing, Settled) => Some(Closed),
            _ => None,
        }
    }

    /// A sequence is in flight; every user input is dropped.
    pub fn is_animating(self) -> bool {
        matches!(self, MenuState::Opening | MenuState::Closing)
    }

    /// Mirrors `aria-expanded` on the toggle button.
    pub fn is_expanded(self) -> bool {
        matches!(self, MenuState::Opening | MenuState::Open)
    }
}

impl fmt::Display for MenuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MenuState::Closed => "closed",
            MenuState::Opening => "opening",
            MenuState::Open => "open",
            MenuState::Closing => "closing",
        };
        f.write_str(name)
    }
}
