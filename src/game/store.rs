//! The authoritative position and move list for one session.

use chess::{Piece, Square};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::game::rules::{MoveFlags, MoveInfo, RulesEngine};
use crate::game::standard::START_FEN;
use crate::game::utils::{parse_promotion, parse_square, piece_letter};

/// One completed move, with enough context to replay or undo it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub san: String,
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
    pub flags: MoveFlags,
    pub fen_before: String,
    pub fen_after: String,
}

impl MoveRecord {
    fn from_info(info: &MoveInfo, fen_before: String, fen_after: String) -> Self {
        Self {
            san: info.san.clone(),
            from: info.from.to_string(),
            to: info.to.to_string(),
            promotion: info.promotion.map(|piece| piece_letter(piece).to_ascii_lowercase().to_string()),
            flags: info.flags,
            fen_before,
            fen_after,
        }
    }
}

/// Whether `load` used the supplied position or fell back to the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    FellBack,
}

/// What the write-through hook sees after each mutation.
pub struct StoreSnapshot<'a> {
    pub fen: &'a str,
    pub history: &'a [MoveRecord],
}

type ChangeHook = Box<dyn FnMut(&StoreSnapshot<'_>)>;

pub struct PositionStore<E: RulesEngine> {
    engine: E,
    history: Vec<MoveRecord>,
    on_change: Option<ChangeHook>,
}

impl<E: RulesEngine> PositionStore<E> {
    /// Wraps `engine`, which is reset to the starting position.
    pub fn new(mut engine: E) -> Self {
        if engine.load(START_FEN).is_err() {
            warn!("Rules engine rejected the starting position");
        }
        Self {
            engine,
            history: Vec::new(),
            on_change: None,
        }
    }

    /// Registers the hook called after every successful mutation.
    pub fn set_on_change<F>(&mut self, hook: F)
    where
        F: FnMut(&StoreSnapshot<'_>) + 'static,
    {
        self.on_change = Some(Box::new(hook));
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn fen(&self) -> String {
        self.engine.fen()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }

    fn notify(&mut self) {
        let fen = self.engine.fen();
        if let Some(hook) = self.on_change.as_mut() {
            hook(&StoreSnapshot {
                fen: &fen,
                history: &self.history,
            });
        }
    }

    /// Loads a serialized position, falling back to the starting position if it does not
    /// parse. The history is cleared either way.
    pub fn load(&mut self, fen: &str) -> LoadOutcome {
        self.history.clear();
        let outcome = match self.engine.load(fen) {
            Ok(()) => LoadOutcome::Loaded,
            Err(e) => {
                warn!("Discarding stored position ({}), starting a new game", e);
                self.load_start();
                LoadOutcome::FellBack
            }
        };
        self.notify();
        outcome
    }

    fn load_start(&mut self) {
        if self.engine.load(START_FEN).is_err() {
            warn!("Rules engine rejected the starting position");
        }
    }

    /// Restores a persisted session. The history is kept only if replaying it from its
    /// first position reproduces `fen`.
    pub fn restore(&mut self, fen: &str, history: Vec<MoveRecord>) -> LoadOutcome {
        if !history.is_empty() && self.replay(&history) && self.engine.fen() == fen {
            info!("Restored session with {} moves", history.len());
            self.history = history;
            self.notify();
            return LoadOutcome::Loaded;
        }
        if !history.is_empty() {
            warn!("Stored move history does not match the stored position, dropping it");
        }
        self.load(fen)
    }

    fn replay(&mut self, history: &[MoveRecord]) -> bool {
        if self.engine.load(&history[0].fen_before).is_err() {
            return false;
        }
        history.iter().all(|record| {
            let (from, to) = match (parse_square(&record.from), parse_square(&record.to)) {
                (Ok(from), Ok(to)) => (from, to),
                _ => return false,
            };
            let promotion = record.promotion.as_deref().and_then(parse_promotion);
            self.engine.apply_move(from, to, promotion).is_some()
        })
    }

    /// Applies a move for the side to move. Returns `None`, with no state change, if the
    /// move is illegal.
    pub fn apply_move(&mut self, from: Square, to: Square, promotion: Option<Piece>) -> Option<MoveRecord> {
        let fen_before = self.engine.fen();
        let info = self.engine.apply_move(from, to, promotion)?;
        let record = MoveRecord::from_info(&info, fen_before, self.engine.fen());
        debug!("Applied {} ({}{})", record.san, record.from, record.to);
        self.history.push(record.clone());
        self.notify();
        Some(record)
    }

    /// Reverts the most recent move.
    pub fn undo(&mut self) -> Option<MoveRecord> {
        if self.history.is_empty() || !self.engine.undo() {
            return None;
        }
        let record = self.history.pop();
        self.notify();
        record
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.load_start();
        self.notify();
    }
}
