//! The capability interface the rest of the application uses to talk to a rules engine.
//!
//! Square, piece and colour vocabulary is taken from the `chess` crate so that any engine
//! built on it can be plugged in without conversions.

use chess::{Color, Piece, Square};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a rules engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),
}

/// Special-move flags attached to every generated or applied move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFlags {
    pub capture: bool,
    pub en_passant: bool,
    pub castle: bool,
    pub promotion: bool,
    pub double_push: bool,
}

impl MoveFlags {
    /// Standard capture or en-passant capture.
    pub fn is_capture(&self) -> bool {
        self.capture || self.en_passant
    }
}

/// A legal move as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub san: String,
    pub flags: MoveFlags,
}

/// A piece standing on a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub piece: Piece,
    pub color: Color,
}

/// Everything the application needs from a rules engine.
pub trait RulesEngine {
    /// Replaces the current position and clears the undo history.
    fn load(&mut self, fen: &str) -> Result<(), RulesError>;

    /// Complete six-field FEN of the current position.
    fn fen(&self) -> String;

    fn turn(&self) -> Color;

    fn piece_at(&self, square: Square) -> Option<Occupant>;

    /// All fully legal moves, optionally restricted to those leaving `from`.
    fn legal_moves(&self, from: Option<Square>) -> Vec<MoveInfo>;

    /// Applies a move for the side to move. Returns `None` without touching the position
    /// when the move is illegal.
    fn apply_move(&mut self, from: Square, to: Square, promotion: Option<Piece>) -> Option<MoveInfo>;

    /// Reverts the last applied move, returning `false` if there is nothing to revert.
    fn undo(&mut self) -> bool;

    fn is_checkmate(&self) -> bool;

    fn is_stalemate(&self) -> bool;

    fn is_draw(&self) -> bool;

    fn is_check(&self) -> bool;

    fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }
}
