//! Two-click move input: select a piece, then click a destination.

use chess::{Piece, Square};
use log::debug;

use crate::game::rules::RulesEngine;
use crate::game::store::{MoveRecord, PositionStore};

/// Destinations reachable from the selected square, split by visual treatment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destinations {
    pub quiet: Vec<Square>,
    pub captures: Vec<Square>,
}

impl Destinations {
    /// Legal destinations of the piece on `from`. Promotion variants collapse to one square.
    pub fn of<E: RulesEngine>(engine: &E, from: Square) -> Self {
        let mut dests = Destinations::default();
        for mv in engine.legal_moves(Some(from)) {
            let bucket = if mv.flags.is_capture() {
                &mut dests.captures
            } else {
                &mut dests.quiet
            };
            if !bucket.contains(&mv.to) {
                bucket.push(mv.to);
            }
        }
        dests
    }

    pub fn contains(&self, square: Square) -> bool {
        self.quiet.contains(&square) || self.captures.contains(&square)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Idle,
    PieceSelected {
        square: Square,
        destinations: Destinations,
    },
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Input was not accepted at all (opponent's turn)
    Ignored,
    /// Idle click on an empty or enemy square
    Unchanged,
    Selected(Square),
    Deselected,
    Moved(MoveRecord),
    /// A destination was clicked but the store refused the move
    Rejected,
}

impl Selection {
    pub fn square(&self) -> Option<Square> {
        match self {
            Selection::Idle => None,
            Selection::PieceSelected { square, .. } => Some(*square),
        }
    }

    pub fn destinations(&self) -> Option<&Destinations> {
        match self {
            Selection::Idle => None,
            Selection::PieceSelected { destinations, .. } => Some(destinations),
        }
    }

    pub fn clear(&mut self) {
        *self = Selection::Idle;
    }

    fn select<E: RulesEngine>(&mut self, engine: &E, square: Square) -> ClickOutcome {
        let destinations = Destinations::of(engine, square);
        debug!(
            "Selected {} ({} quiet, {} captures)",
            square,
            destinations.quiet.len(),
            destinations.captures.len()
        );
        *self = Selection::PieceSelected { square, destinations };
        ClickOutcome::Selected(square)
    }

    /// Feeds one click on `clicked` into the state machine. Guards on whose turn it is are
    /// the caller's responsibility.
    pub fn click<E: RulesEngine>(
        &mut self,
        store: &mut PositionStore<E>,
        clicked: Square,
        promotion: Option<Piece>,
    ) -> ClickOutcome {
        let turn = store.engine().turn();
        let own_piece = store.engine().piece_at(clicked).map_or(false, |occupant| occupant.color == turn);

        match std::mem::take(self) {
            Selection::Idle => {
                if own_piece {
                    self.select(store.engine(), clicked)
                } else {
                    ClickOutcome::Unchanged
                }
            }
            Selection::PieceSelected { square, .. } if square == clicked => {
                debug!("Deselected {}", square);
                ClickOutcome::Deselected
            }
            Selection::PieceSelected { .. } if own_piece => self.select(store.engine(), clicked),
            Selection::PieceSelected { square, destinations } if destinations.contains(clicked) => {
                match store.apply_move(square, clicked, promotion) {
                    Some(record) => ClickOutcome::Moved(record),
                    None => ClickOutcome::Rejected,
                }
            }
            Selection::PieceSelected { square, .. } => {
                debug!("{} is not reachable from {}, deselecting", clicked, square);
                ClickOutcome::Deselected
            }
        }
    }
}
