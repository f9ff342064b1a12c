//! What the page needs to draw the board, side panel and controls.

use chess::{Piece, ALL_SQUARES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::game::rules::RulesEngine;
use crate::game::session::Session;
use crate::game::utils::{color_to_string, get_game_status};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SquareStyle {
    Selected,
    QuietTarget,
    CaptureTarget,
    LastMove,
    Check,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoardView {
    pub fen: String,
    pub square_styles: BTreeMap<String, SquareStyle>,
    pub moves: Vec<String>,
    pub status: String,
    pub turn: String,
    pub human_color: String,
    pub vs_computer: bool,
    pub computer_thinking: bool,
    pub confirming_new_game: bool,
    pub theme: String,
}

/// Per-square highlights. Later layers win: last move, then check, then the selection
/// and its targets.
pub fn square_styles<E: RulesEngine>(session: &Session<E>) -> BTreeMap<String, SquareStyle> {
    let mut styles = BTreeMap::new();
    let store = session.store();
    let engine = store.engine();

    if let Some(last) = store.last_move() {
        styles.insert(last.from.clone(), SquareStyle::LastMove);
        styles.insert(last.to.clone(), SquareStyle::LastMove);
    }

    if engine.is_check() {
        let turn = engine.turn();
        let king = ALL_SQUARES.iter().copied().find(|&sq| {
            engine
                .piece_at(sq)
                .map_or(false, |occupant| occupant.piece == Piece::King && occupant.color == turn)
        });
        if let Some(king) = king {
            styles.insert(king.to_string(), SquareStyle::Check);
        }
    }

    let selection = session.selection();
    if let (Some(square), Some(dests)) = (selection.square(), selection.destinations()) {
        styles.insert(square.to_string(), SquareStyle::Selected);
        for target in &dests.quiet {
            styles.insert(target.to_string(), SquareStyle::QuietTarget);
        }
        for target in &dests.captures {
            styles.insert(target.to_string(), SquareStyle::CaptureTarget);
        }
    }
    styles
}

impl BoardView {
    pub fn from_session<E: RulesEngine>(session: &Session<E>) -> Self {
        let store = session.store();
        let settings = session.settings();
        BoardView {
            fen: store.fen(),
            square_styles: square_styles(session),
            moves: store.history().iter().map(|record| record.san.clone()).collect(),
            status: get_game_status(store.engine()),
            turn: color_to_string(store.engine().turn()),
            human_color: color_to_string(settings.human_side()),
            vs_computer: settings.vs_computer,
            computer_thinking: session.opponent_pending(),
            confirming_new_game: session.is_confirming_new_game(),
            theme: session.theme().to_string(),
        }
    }
}
