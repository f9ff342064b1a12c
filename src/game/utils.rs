use chess::{Board, Color, Piece, Square, ALL_SQUARES};
use std::str::FromStr;

use crate::game::rules::{RulesEngine, RulesError};

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Parse a square identifier such as "e2" (case-insensitive)
pub fn parse_square(text: &str) -> Result<Square, RulesError> {
    Square::from_str(&text.trim().to_lowercase()).map_err(|_| RulesError::InvalidSquare(text.to_string()))
}

/// Parse a promotion piece letter (q, r, b, n)
pub fn parse_promotion(text: &str) -> Option<Piece> {
    match text.trim().to_lowercase().as_str() {
        "q" | "queen" => Some(Piece::Queen),
        "r" | "rook" => Some(Piece::Rook),
        "b" | "bishop" => Some(Piece::Bishop),
        "n" | "knight" => Some(Piece::Knight),
        _ => None,
    }
}

/// Upper-case letter used in algebraic notation
pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

/// Get the game status as a string
pub fn get_game_status<E: RulesEngine>(engine: &E) -> String {
    if engine.is_checkmate() {
        // The side to move is the one that got mated
        match engine.turn() {
            Color::White => "black_wins".to_string(),
            Color::Black => "white_wins".to_string(),
        }
    } else if engine.is_stalemate() {
        "stalemate".to_string()
    } else if engine.is_draw() {
        "draw".to_string()
    } else if engine.is_check() {
        "check".to_string()
    } else if engine.turn() == Color::White {
        "white_turn".to_string()
    } else {
        "black_turn".to_string()
    }
}

#[derive(Default)]
struct Material {
    pawns: u32,
    knights: u32,
    bishops: u32,
    rooks: u32,
    queens: u32,
    bishop_on_light: bool,
    bishop_on_dark: bool,
}

impl Material {
    fn minor_count(&self) -> u32 {
        self.knights + self.bishops
    }

    fn only_king(&self) -> bool {
        self.pawns == 0 && self.rooks == 0 && self.queens == 0 && self.minor_count() == 0
    }

    fn single_minor(&self) -> bool {
        self.pawns == 0 && self.rooks == 0 && self.queens == 0 && self.minor_count() == 1
    }

    fn single_bishop(&self) -> bool {
        self.single_minor() && self.bishops == 1
    }
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    let mut white = Material::default();
    let mut black = Material::default();

    for square in ALL_SQUARES {
        let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
            (Some(piece), Some(color)) => (piece, color),
            _ => continue,
        };
        let side = match color {
            Color::White => &mut white,
            Color::Black => &mut black,
        };
        match piece {
            Piece::Pawn => side.pawns += 1,
            Piece::Knight => side.knights += 1,
            Piece::Bishop => {
                side.bishops += 1;
                if (square.get_rank().to_index() + square.get_file().to_index()) % 2 == 0 {
                    side.bishop_on_dark = true;
                } else {
                    side.bishop_on_light = true;
                }
            }
            Piece::Rook => side.rooks += 1,
            Piece::Queen => side.queens += 1,
            // Kings are always present
            Piece::King => {}
        }
    }

    // King vs King
    if white.only_king() && black.only_king() {
        return true;
    }

    // King and minor piece vs King
    if (white.single_minor() && black.only_king()) || (black.single_minor() && white.only_king()) {
        return true;
    }

    // King and Bishop vs King and Bishop, bishops on the same colour
    if white.single_bishop() && black.single_bishop() {
        return (white.bishop_on_light && black.bishop_on_light) || (white.bishop_on_dark && black.bishop_on_dark);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).expect("valid test FEN")
    }

    #[test]
    fn bare_kings_are_insufficient() {
        assert!(has_insufficient_material(&board("8/8/4k3/8/8/3K4/8/8 w - - 0 1")));
    }

    #[test]
    fn single_minor_is_insufficient() {
        assert!(has_insufficient_material(&board("8/8/4k3/8/8/3KN3/8/8 w - - 0 1")));
        assert!(has_insufficient_material(&board("8/8/4kb2/8/8/3K4/8/8 w - - 0 1")));
    }

    #[test]
    fn same_coloured_bishops_are_insufficient() {
        // c1 and f4 are both dark squares
        assert!(has_insufficient_material(&board("8/8/4k3/8/5b2/3K4/8/2B5 w - - 0 1")));
        // c1 dark, c2 light
        assert!(!has_insufficient_material(&board("8/8/4k3/8/8/3K4/2b5/2B5 w - - 0 1")));
    }

    #[test]
    fn rook_or_pawn_is_sufficient() {
        assert!(!has_insufficient_material(&board("8/8/4k3/8/8/3K4/8/R7 w - - 0 1")));
        assert!(!has_insufficient_material(&board("8/8/4k3/8/8/3K4/P7/8 w - - 0 1")));
        assert!(!has_insufficient_material(&Board::default()));
    }

    #[test]
    fn parses_squares_and_promotions() {
        assert_eq!(parse_square("E2").unwrap(), Square::E2);
        assert!(parse_square("z9").is_err());
        assert_eq!(parse_promotion("n"), Some(Piece::Knight));
        assert_eq!(parse_promotion("k"), None);
    }
}
