//! Drag-and-drop reordering in the sidebar.
//!
//! Each slide row in the sidebar has two drop zones, `before-{id}` and
//! `after-{id}`. A drag runs through one owner, [`DragMachine`], and one
//! transition function:
//!
//! ```text
//!            Start                    Drop (zone active)
//!   Idle ─────────────→ Dragging ─────────────────────→ DropPending
//!    ↑                   │  ↺ Over(zone)                     │
//!    └── End / Drop ─────┘                                   │
//!    └──────────────────── take_drop() ─────────────────────┘
//! ```
//!
//! A pending drop becomes a [`DropIntent`], which maps to a from/to pair of
//! deck positions. The client carries the move out as adjacent swaps
//! (see [`crate::client::Client::move_slide_to`]).

use std::fmt;
use std::str::FromStr;

/// Which side of the target row the slide is dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    Before,
    After,
}

/// A drop zone, identified in the sidebar as `before-{id}` or `after-{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropZone {
    pub position: DropPosition,
    pub target: String,
}

impl DropZone {
    pub fn before(target: impl Into<String>) -> Self {
        Self {
            position: DropPosition::Before,
            target: target.into(),
        }
    }

    pub fn after(target: impl Into<String>) -> Self {
        Self {
            position: DropPosition::After,
            target: target.into(),
        }
    }
}

impl FromStr for DropZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let zone = if let Some(target) = s.strip_prefix("before-") {
            Self::before(target)
        } else if let Some(target) = s.strip_prefix("after-") {
            Self::after(target)
        } else {
            return Err(format!("drop zone must start with before- or after-: {s}"));
        };
        if zone.target.is_empty() {
            return Err(format!("drop zone has no target: {s}"));
        }
        Ok(zone)
    }
}

impl fmt::Display for DropZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            DropPosition::Before => write!(f, "before-{}", self.target),
            DropPosition::After => write!(f, "after-{}", self.target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        dragged: String,
        active_zone: Option<DropZone>,
        /// Id of the drag preview element shown while dragging.
        preview_element: Option<String>,
    },
    DropPending {
        dragged: String,
        zone: DropZone,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start {
        story_id: String,
        preview_element: Option<String>,
    },
    /// The pointer entered a zone, or left every zone (`None`).
    Over(Option<DropZone>),
    Drop,
    End,
}

/// The transition function.
pub fn transition(state: DragState, event: DragEvent) -> DragState {
    match (state, event) {
        (
            DragState::Idle,
            DragEvent::Start {
                story_id,
                preview_element,
            },
        ) => DragState::Dragging {
            dragged: story_id,
            active_zone: None,
            preview_element,
        },
        (
            DragState::Dragging {
                dragged,
                preview_element,
                ..
            },
            DragEvent::Over(zone),
        ) => {
            // Dropping a slide next to itself is not a move.
            let active_zone = zone.filter(|z| z.target != dragged);
            DragState::Dragging {
                dragged,
                active_zone,
                preview_element,
            }
        }
        (
            DragState::Dragging {
                dragged,
                active_zone: Some(zone),
                ..
            },
            DragEvent::Drop,
        ) => DragState::DropPending { dragged, zone },
        (DragState::Dragging { .. }, DragEvent::Drop | DragEvent::End) => DragState::Idle,
        (state, _) => state,
    }
}

/// A completed drop: move `dragged` to `zone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIntent {
    pub dragged: String,
    pub zone: DropZone,
}

impl DropIntent {
    /// Current and final positions of the dragged slide in `deck_ids`, or
    /// `None` if either id is not in the deck.
    pub fn positions<S: AsRef<str>>(&self, deck_ids: &[S]) -> Option<(usize, usize)> {
        let find = |id: &str| deck_ids.iter().position(|d| d.as_ref() == id);
        let from = find(&self.dragged)?;
        let target = find(&self.zone.target)?;
        let slot = match self.zone.position {
            DropPosition::Before => target,
            DropPosition::After => target + 1,
        };
        // Removing the dragged slide first shifts later slots up by one.
        let to = if slot > from { slot - 1 } else { slot };
        Some((from, to))
    }
}

/// Single owner of the drag state.
#[derive(Debug, Default)]
pub struct DragMachine {
    state: DragState,
}

impl DragMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn apply(&mut self, event: DragEvent) -> &DragState {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state, event);
        tracing::trace!(state = ?self.state, "drag transition");
        &self.state
    }

    /// Consume a pending drop, returning to `Idle`.
    pub fn take_drop(&mut self) -> Option<DropIntent> {
        match std::mem::take(&mut self.state) {
            DragState::DropPending { dragged, zone } => Some(DropIntent { dragged, zone }),
            other => {
                self.state = other;
                None
            }
        }
    }
}
