//! One player's session: position, move input, automated opponent and controls.

use chess::{Color, Piece, Square};
use log::info;

use crate::game::celebration::{CelebrationEffect, CelebrationTrigger};
use crate::game::opponent::{MoveTicket, OpponentDriver};
use crate::game::rules::RulesEngine;
use crate::game::selection::{ClickOutcome, Selection};
use crate::game::store::{MoveRecord, PositionStore};
use crate::game::utils::color_to_string;
use crate::storage::{Persistence, Settings};

pub const THEMES: [&str; 2] = ["light", "dark"];

pub struct Session<E: RulesEngine> {
    store: PositionStore<E>,
    selection: Selection,
    opponent: OpponentDriver,
    celebration: CelebrationTrigger,
    settings: Settings,
    theme: String,
    confirming_new_game: bool,
    promotion: Piece,
    persistence: Option<Persistence>,
}

impl<E: RulesEngine> Session<E> {
    /// A fresh, unpersisted session at the starting position.
    pub fn new(engine: E, opponent: OpponentDriver, promotion: Piece) -> Self {
        let store = PositionStore::new(engine);
        let mut celebration = CelebrationTrigger::default();
        celebration.prime(store.fen());
        Self {
            store,
            selection: Selection::Idle,
            opponent,
            celebration,
            settings: Settings::default(),
            theme: THEMES[0].to_string(),
            confirming_new_game: false,
            promotion,
            persistence: None,
        }
    }

    /// Restores the session kept in `persistence` and writes every later change back to it.
    pub fn restore(engine: E, opponent: OpponentDriver, promotion: Piece, persistence: Persistence) -> Self {
        let mut session = Self::new(engine, opponent, promotion);
        let saved = persistence.load();

        let sink = persistence.clone();
        session
            .store
            .set_on_change(move |snapshot| sink.save_position(snapshot.fen, snapshot.history));

        if let Some(position) = saved.position.as_deref() {
            session.store.restore(position, saved.history);
        }
        session.settings = saved.settings;
        if let Some(theme) = saved.theme.filter(|t| THEMES.contains(&t.as_str())) {
            session.theme = theme;
        }
        session.celebration.prime(session.store.fen());
        session.persistence = Some(persistence);
        info!(
            "Session ready at move {} ({} vs computer, human plays {})",
            session.store.history().len(),
            if session.settings.vs_computer { "playing" } else { "not playing" },
            color_to_string(session.settings.human_side())
        );
        session
    }

    pub fn store(&self) -> &PositionStore<E> {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn is_confirming_new_game(&self) -> bool {
        self.confirming_new_game
    }

    pub fn human_side(&self) -> Color {
        self.settings.human_side()
    }

    pub fn opponent_pending(&self) -> bool {
        self.opponent.is_pending()
    }

    pub fn opponent_delay(&self) -> std::time::Duration {
        self.opponent.delay()
    }

    /// True when the automated side should make the next move.
    pub fn opponent_to_move(&self) -> bool {
        let engine = self.store.engine();
        self.settings.vs_computer && !engine.is_game_over() && engine.turn() != self.human_side()
    }

    fn interrupt(&mut self) {
        self.selection.clear();
        self.opponent.cancel();
    }

    fn persist_settings(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.save_settings(&self.settings);
        }
    }

    pub fn click(&mut self, square: Square) -> ClickOutcome {
        if self.settings.vs_computer && self.store.engine().turn() != self.human_side() {
            return ClickOutcome::Ignored;
        }
        let outcome = self.selection.click(&mut self.store, square, Some(self.promotion));
        if matches!(outcome, ClickOutcome::Moved(_)) {
            self.opponent.cancel();
        }
        outcome
    }

    /// Arms the opponent if it is its turn and not already armed. Returns the new ticket
    /// to present once the delay has elapsed. Any state-changing action cancels the
    /// pending ticket, so an armed ticket always belongs to the current position.
    pub fn schedule_opponent(&mut self) -> Option<MoveTicket> {
        if !self.opponent_to_move() {
            self.opponent.cancel();
            return None;
        }
        if self.opponent.is_pending() {
            return None;
        }
        Some(self.opponent.schedule())
    }

    /// Plays the opponent's reply for `ticket`. Stale or cancelled tickets do nothing.
    pub fn play_opponent(&mut self, ticket: MoveTicket) -> Option<MoveRecord> {
        if !self.opponent.redeem(ticket) || !self.opponent_to_move() {
            return None;
        }
        let choice = self.opponent.choose(self.store.engine())?;
        let record = self.store.apply_move(choice.from, choice.to, choice.promotion);
        self.selection.clear();
        record
    }

    /// Edge-triggered celebration check, to be called after every change.
    pub fn take_celebration(&mut self) -> Option<CelebrationEffect> {
        self.celebration
            .observe(self.store.engine(), self.human_side(), self.settings.vs_computer)
    }

    pub fn request_new_game(&mut self) {
        self.confirming_new_game = true;
    }

    pub fn cancel_new_game(&mut self) {
        self.confirming_new_game = false;
    }

    /// Resets the game if a new game was requested first. Returns whether it reset.
    pub fn confirm_new_game(&mut self) -> bool {
        if !self.confirming_new_game {
            return false;
        }
        self.confirming_new_game = false;
        self.interrupt();
        self.store.reset();
        info!("New game started");
        true
    }

    /// Takes back the last move. Against the computer this keeps going until it is the
    /// human's turn again, so the reply is taken back together with the human's move.
    pub fn undo(&mut self) -> Vec<MoveRecord> {
        self.interrupt();
        let mut undone = Vec::new();
        if let Some(record) = self.store.undo() {
            undone.push(record);
        }
        if self.settings.vs_computer && self.store.engine().turn() != self.human_side() {
            if let Some(record) = self.store.undo() {
                undone.push(record);
            }
        }
        undone
    }

    pub fn toggle_opponent(&mut self) {
        self.interrupt();
        self.settings.vs_computer = !self.settings.vs_computer;
        self.persist_settings();
    }

    pub fn toggle_human_side(&mut self) {
        self.interrupt();
        self.settings.human_is_white = !self.settings.human_is_white;
        self.persist_settings();
    }

    /// Stores a display theme preference. Unknown names are ignored.
    pub fn set_theme(&mut self, theme: &str) -> bool {
        if !THEMES.contains(&theme) {
            return false;
        }
        self.theme = theme.to_string();
        if let Some(persistence) = &self.persistence {
            persistence.save_theme(theme);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::opponent::DEFAULT_OPPONENT_DELAY;
    use crate::game::standard::{StandardRules, START_FEN};
    use crate::storage::{MemoryStore, SharedStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    fn driver() -> OpponentDriver {
        OpponentDriver::with_rng(DEFAULT_OPPONENT_DELAY, StdRng::seed_from_u64(7))
    }

    fn session() -> Session<StandardRules> {
        Session::new(StandardRules::default(), driver(), Piece::Queen)
    }

    fn two_player() -> Session<StandardRules> {
        let mut session = session();
        session.toggle_opponent();
        session
    }

    fn play(session: &mut Session<StandardRules>, from: Square, to: Square) {
        assert_eq!(session.click(from), ClickOutcome::Selected(from));
        assert!(matches!(session.click(to), ClickOutcome::Moved(_)));
    }

    fn persisted() -> Persistence {
        let shared: SharedStore = Arc::new(Mutex::new(MemoryStore::default()));
        Persistence::new(shared)
    }

    #[test]
    fn clicks_are_ignored_on_computer_turn() {
        let mut session = session();
        play(&mut session, Square::E2, Square::E4);
        assert!(session.opponent_to_move());
        assert_eq!(session.click(Square::E7), ClickOutcome::Ignored);
        assert_eq!(session.selection(), &Selection::Idle);
    }

    #[test]
    fn opponent_replies_once_per_ticket() {
        let mut session = session();
        play(&mut session, Square::E2, Square::E4);
        let ticket = session.schedule_opponent().expect("computer to move");
        let reply = session.play_opponent(ticket).expect("reply played");
        assert_eq!(session.store().history().len(), 2);
        assert_eq!(session.store().history()[1], reply);
        assert!(session.play_opponent(ticket).is_none());
        assert_eq!(session.store().history().len(), 2);
        assert!(session.schedule_opponent().is_none());
    }

    #[test]
    fn scheduling_twice_keeps_the_first_ticket() {
        let mut session = session();
        play(&mut session, Square::E2, Square::E4);
        let ticket = session.schedule_opponent().unwrap();
        assert!(session.schedule_opponent().is_none());
        assert!(session.opponent_pending());
        assert!(session.play_opponent(ticket).is_some());
    }

    #[test]
    fn opponent_takes_available_capture() {
        let mut session = two_player();
        play(&mut session, Square::E2, Square::E4);
        play(&mut session, Square::D7, Square::D5);
        session.toggle_opponent();
        session.toggle_human_side();
        let ticket = session.schedule_opponent().expect("computer plays white");
        let reply = session.play_opponent(ticket).unwrap();
        assert!(reply.flags.is_capture());
        assert_eq!(reply.san, "exd5");
    }

    #[test]
    fn undo_cancels_pending_reply() {
        let mut session = session();
        play(&mut session, Square::E2, Square::E4);
        let ticket = session.schedule_opponent().unwrap();
        let undone = session.undo();
        assert_eq!(undone.len(), 1);
        assert!(session.play_opponent(ticket).is_none());
        assert_eq!(session.store().fen(), START_FEN);
    }

    #[test]
    fn reset_cancels_pending_reply() {
        let mut session = session();
        play(&mut session, Square::E2, Square::E4);
        let ticket = session.schedule_opponent().unwrap();
        session.request_new_game();
        assert!(session.confirm_new_game());
        assert!(session.play_opponent(ticket).is_none());
        assert_eq!(session.store().fen(), START_FEN);
        assert!(session.store().history().is_empty());
    }

    #[test]
    fn undo_against_computer_returns_to_human_turn() {
        let mut session = session();
        play(&mut session, Square::E2, Square::E4);
        let ticket = session.schedule_opponent().unwrap();
        session.play_opponent(ticket).unwrap();
        let undone = session.undo();
        assert_eq!(undone.len(), 2);
        assert_eq!(session.store().fen(), START_FEN);
        assert!(!session.opponent_to_move());
    }

    #[test]
    fn undo_in_two_player_mode_is_single_step() {
        let mut session = two_player();
        play(&mut session, Square::E2, Square::E4);
        play(&mut session, Square::E7, Square::E5);
        assert_eq!(session.undo().len(), 1);
        assert_eq!(session.store().history().len(), 1);
        assert!(session.undo().len() == 1);
        assert!(session.undo().is_empty());
    }

    #[test]
    fn new_game_needs_confirmation() {
        let mut session = two_player();
        play(&mut session, Square::E2, Square::E4);
        assert!(!session.confirm_new_game());
        assert_eq!(session.store().history().len(), 1);

        session.request_new_game();
        assert!(session.is_confirming_new_game());
        session.cancel_new_game();
        assert!(!session.confirm_new_game());

        session.request_new_game();
        assert!(session.confirm_new_game());
        assert_eq!(session.store().fen(), START_FEN);
    }

    #[test]
    fn playing_black_lets_computer_open() {
        let mut session = session();
        session.toggle_human_side();
        assert_eq!(session.human_side(), Color::Black);
        assert!(session.opponent_to_move());
        assert_eq!(session.click(Square::E2), ClickOutcome::Ignored);
        let ticket = session.schedule_opponent().unwrap();
        session.play_opponent(ticket).unwrap();
        assert_eq!(session.store().engine().turn(), Color::Black);
    }

    #[test]
    fn toggles_clear_selection_and_cancel_reply() {
        let mut session = session();
        session.click(Square::G1);
        session.toggle_opponent();
        assert_eq!(session.selection(), &Selection::Idle);

        session.toggle_opponent();
        session.toggle_human_side();
        let ticket = session.schedule_opponent().unwrap();
        session.toggle_human_side();
        assert!(session.play_opponent(ticket).is_none());
        assert!(!session.opponent_pending());
    }

    #[test]
    fn celebrates_human_mate_once() {
        let mut session = session();
        play(&mut session, Square::E2, Square::E4);
        // Steer black into 1. e4 f6 2. ?? g5 3. Qh5# by switching to two-player for a moment
        session.toggle_opponent();
        play(&mut session, Square::F7, Square::F6);
        play(&mut session, Square::D2, Square::D3);
        play(&mut session, Square::G7, Square::G5);
        session.toggle_opponent();
        assert!(session.take_celebration().is_none());
        play(&mut session, Square::D1, Square::H5);
        assert!(session.store().engine().is_checkmate());
        assert!(session.take_celebration().is_some());
        assert!(session.take_celebration().is_none());
        assert!(session.schedule_opponent().is_none());
    }

    #[test]
    fn computer_mate_does_not_celebrate() {
        let mut session = two_player();
        play(&mut session, Square::F2, Square::F3);
        play(&mut session, Square::E7, Square::E5);
        play(&mut session, Square::G2, Square::G4);
        play(&mut session, Square::D8, Square::H4);
        // Human is white, so black's mate counts as the computer's
        session.toggle_opponent();
        assert!(session.store().engine().is_checkmate());
        assert!(session.take_celebration().is_none());
    }

    #[test]
    fn restore_round_trips_through_persistence() {
        let persistence = persisted();
        {
            let mut session = Session::restore(StandardRules::default(), driver(), Piece::Queen, persistence.clone());
            session.toggle_opponent();
            play(&mut session, Square::E2, Square::E4);
            play(&mut session, Square::E7, Square::E5);
            assert!(session.set_theme("dark"));
            assert!(!session.set_theme("neon"));
        }
        let mut session = Session::restore(StandardRules::default(), driver(), Piece::Queen, persistence);
        assert_eq!(session.store().history().len(), 2);
        assert_eq!(session.theme(), "dark");
        assert!(!session.settings().vs_computer);
        assert_eq!(session.undo().len(), 1);
        assert_eq!(session.store().history().len(), 1);
    }

    #[test]
    fn corrupt_persisted_position_starts_fresh() {
        let persistence = persisted();
        persistence.save_position("definitely not chess", &[]);
        let session = Session::restore(StandardRules::default(), driver(), Piece::Queen, persistence.clone());
        assert_eq!(session.store().fen(), START_FEN);
        assert_eq!(persistence.load().position.as_deref(), Some(START_FEN));
    }
}
