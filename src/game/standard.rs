//! `RulesEngine` implementation backed by the `chess` crate.

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square, EMPTY};
use std::str::FromStr;

use crate::game::notation::{is_castle, is_en_passant, to_san};
use crate::game::rules::{MoveFlags, MoveInfo, Occupant, RulesEngine, RulesError};
use crate::game::utils::has_insufficient_material;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Half-moves without capture or pawn move after which the game is drawn.
const FIFTY_MOVE_LIMIT: u32 = 100;

#[derive(Clone, Copy)]
struct Snapshot {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

/// Standard chess rules. Tracks the move counters and the undo stack that
/// `chess::Board` leaves to its caller.
#[derive(Clone)]
pub struct StandardRules {
    current: Snapshot,
    undo_stack: Vec<Snapshot>,
    /// Position hashes since the last load, for repetition detection
    seen: Vec<u64>,
    default_promotion: Piece,
}

impl Default for StandardRules {
    fn default() -> Self {
        Self::new(Piece::Queen)
    }
}

impl StandardRules {
    pub fn new(default_promotion: Piece) -> Self {
        let board = Board::default();
        Self {
            current: Snapshot {
                board,
                halfmove_clock: 0,
                fullmove_number: 1,
            },
            undo_stack: Vec::new(),
            seen: vec![board.get_hash()],
            default_promotion,
        }
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.current.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.current.fullmove_number
    }

    fn describe(&self, mv: ChessMove) -> MoveInfo {
        let board = &self.current.board;
        let from = mv.get_source();
        let to = mv.get_dest();
        let is_pawn = board.piece_on(from) == Some(Piece::Pawn);
        let flags = MoveFlags {
            capture: board.piece_on(to).is_some(),
            en_passant: is_en_passant(board, mv),
            castle: is_castle(board, mv),
            promotion: mv.get_promotion().is_some(),
            double_push: is_pawn && from.get_rank().to_index().abs_diff(to.get_rank().to_index()) == 2,
        };
        MoveInfo {
            from,
            to,
            promotion: mv.get_promotion(),
            san: to_san(board, mv),
            flags,
        }
    }

    fn needs_promotion(&self, from: Square, to: Square) -> bool {
        let board = &self.current.board;
        if board.piece_on(from) != Some(Piece::Pawn) {
            return false;
        }
        let last_rank = match board.side_to_move() {
            Color::White => 7,
            Color::Black => 0,
        };
        to.get_rank().to_index() == last_rank
    }

    fn repetition_count(&self) -> usize {
        let hash = self.current.board.get_hash();
        self.seen.iter().filter(|&&h| h == hash).count()
    }
}

/// Checks the piece placement field before it reaches `chess::Board`, which assumes both
/// kings are present and indexes its attack tables by their squares.
fn check_placement(placement: &str) -> bool {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return false;
    }
    let (mut white_kings, mut black_kings) = (0, 0);
    for (index, rank) in ranks.iter().enumerate() {
        let back_rank = index == 0 || index == 7;
        let mut files = 0;
        for ch in rank.chars() {
            files += match ch {
                '1'..='8' => ch as u32 - '0' as u32,
                'K' => {
                    white_kings += 1;
                    1
                }
                'k' => {
                    black_kings += 1;
                    1
                }
                'P' | 'p' if back_rank => return false,
                'P' | 'N' | 'B' | 'R' | 'Q' | 'p' | 'n' | 'b' | 'r' | 'q' => 1,
                _ => return false,
            };
            if files > 8 {
                return false;
            }
        }
        if files != 8 {
            return false;
        }
    }
    white_kings == 1 && black_kings == 1
}

fn parse_counter(field: Option<&str>, default: u32, fen: &str) -> Result<u32, RulesError> {
    match field {
        None => Ok(default),
        Some(text) => text.parse::<u32>().map_err(|_| RulesError::InvalidFen(fen.to_string())),
    }
}

impl RulesEngine for StandardRules {
    fn load(&mut self, fen: &str) -> Result<(), RulesError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(RulesError::InvalidFen(fen.to_string()));
        }
        if !check_placement(fields[0]) {
            return Err(RulesError::InvalidFen(fen.to_string()));
        }
        let placement = fields[..4].join(" ");
        let board = Board::from_str(&placement).map_err(|_| RulesError::InvalidFen(fen.to_string()))?;
        let halfmove_clock = parse_counter(fields.get(4).copied(), 0, fen)?;
        let fullmove_number = parse_counter(fields.get(5).copied(), 1, fen)?.max(1);

        self.current = Snapshot {
            board,
            halfmove_clock,
            fullmove_number,
        };
        self.undo_stack.clear();
        self.seen = vec![board.get_hash()];
        Ok(())
    }

    fn fen(&self) -> String {
        // chess::Board always prints "0 1" for the counters
        let board_fen = self.current.board.to_string();
        let fields: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            fields.join(" "),
            self.current.halfmove_clock,
            self.current.fullmove_number
        )
    }

    fn turn(&self) -> Color {
        self.current.board.side_to_move()
    }

    fn piece_at(&self, square: Square) -> Option<Occupant> {
        let board = &self.current.board;
        match (board.piece_on(square), board.color_on(square)) {
            (Some(piece), Some(color)) => Some(Occupant { piece, color }),
            _ => None,
        }
    }

    fn legal_moves(&self, from: Option<Square>) -> Vec<MoveInfo> {
        MoveGen::new_legal(&self.current.board)
            .filter(|mv| from.map_or(true, |sq| mv.get_source() == sq))
            .map(|mv| self.describe(mv))
            .collect()
    }

    fn apply_move(&mut self, from: Square, to: Square, promotion: Option<Piece>) -> Option<MoveInfo> {
        let promotion = if self.needs_promotion(from, to) {
            Some(promotion.unwrap_or(self.default_promotion))
        } else {
            None
        };
        let mv = ChessMove::new(from, to, promotion);
        let board = self.current.board;
        if !board.legal(mv) {
            return None;
        }

        let info = self.describe(mv);
        let resets_clock = board.piece_on(from) == Some(Piece::Pawn) || info.flags.is_capture();
        let next = Snapshot {
            board: board.make_move_new(mv),
            halfmove_clock: if resets_clock { 0 } else { self.current.halfmove_clock + 1 },
            fullmove_number: match board.side_to_move() {
                Color::White => self.current.fullmove_number,
                Color::Black => self.current.fullmove_number + 1,
            },
        };

        self.undo_stack.push(self.current);
        self.current = next;
        self.seen.push(next.board.get_hash());
        Some(info)
    }

    fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                self.current = previous;
                self.seen.pop();
                true
            }
            None => false,
        }
    }

    fn is_checkmate(&self) -> bool {
        self.current.board.status() == BoardStatus::Checkmate
    }

    fn is_stalemate(&self) -> bool {
        self.current.board.status() == BoardStatus::Stalemate
    }

    fn is_draw(&self) -> bool {
        self.is_stalemate()
            || self.current.halfmove_clock >= FIFTY_MOVE_LIMIT
            || has_insufficient_material(&self.current.board)
            || self.repetition_count() >= 3
    }

    fn is_check(&self) -> bool {
        *self.current.board.checkers() != EMPTY
    }
}
