//! Placement state machine.

use serde::{Deserialize, Serialize};

/// The state of one order placement.
///
/// State transitions:
/// ```text
/// Started ──► UserResolved ──► OrderWritten ──► LinesDecremented(k of N) ──► Committed
///    │             │                │                    │
///    └─────────────┴────────────────┴────────────────────┴──► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlacementState {
    /// Nothing has been done yet.
    #[default]
    Started,

    /// The customer's user record has been found or created.
    UserResolved,

    /// The order header and its `lines` lines are written inside the unit.
    OrderWritten { lines: usize },

    /// `applied` of `total` lines have had their stock decremented.
    LinesDecremented { applied: usize, total: usize },

    /// The unit has been committed (terminal state).
    Committed,

    /// The unit has been rolled back or never opened (terminal state).
    Aborted,
}

impl PlacementState {
    /// Returns true if another line decrement may be attempted.
    pub fn can_decrement(&self) -> bool {
        match *self {
            PlacementState::OrderWritten { lines } => lines > 0,
            PlacementState::LinesDecremented { applied, total } => applied < total,
            _ => false,
        }
    }

    /// Returns true once every line of the order has been decremented.
    pub fn can_commit(&self) -> bool {
        match *self {
            PlacementState::OrderWritten { lines } => lines == 0,
            PlacementState::LinesDecremented { applied, total } => applied == total,
            _ => false,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlacementState::Committed | PlacementState::Aborted)
    }

    /// The state reached after one more line is decremented.
    ///
    /// Returns `None` if no decrement is allowed from here.
    pub fn after_line_applied(&self) -> Option<PlacementState> {
        if !self.can_decrement() {
            return None;
        }
        match *self {
            PlacementState::OrderWritten { lines } => Some(PlacementState::LinesDecremented {
                applied: 1,
                total: lines,
            }),
            PlacementState::LinesDecremented { applied, total } => {
                Some(PlacementState::LinesDecremented {
                    applied: applied + 1,
                    total,
                })
            }
            _ => None,
        }
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: &PlacementState) -> bool {
        match (self, next) {
            (current, PlacementState::Aborted) => !current.is_terminal(),
            (PlacementState::Started, PlacementState::UserResolved) => true,
            (PlacementState::UserResolved, PlacementState::OrderWritten { .. }) => true,
            (_, PlacementState::LinesDecremented { .. }) => {
                self.after_line_applied().as_ref() == Some(next)
            }
            (current, PlacementState::Committed) => current.can_commit(),
            _ => false,
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementState::Started => "Started",
            PlacementState::UserResolved => "UserResolved",
            PlacementState::OrderWritten { .. } => "OrderWritten",
            PlacementState::LinesDecremented { .. } => "LinesDecremented",
            PlacementState::Committed => "Committed",
            PlacementState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for PlacementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementState::LinesDecremented { applied, total } => {
                write!(f, "LinesDecremented({applied} of {total})")
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}
