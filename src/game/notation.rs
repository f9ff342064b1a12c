//! Standard algebraic notation for moves generated by the `chess` crate.

use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece, Square, EMPTY};

use crate::game::utils::piece_letter;

fn file_char(square: Square) -> char {
    (b'a' + square.get_file().to_index() as u8) as char
}

fn rank_char(square: Square) -> char {
    (b'1' + square.get_rank().to_index() as u8) as char
}

/// True when `mv` is a king stepping two files, which the `chess` crate uses for castling.
pub fn is_castle(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_source()) == Some(Piece::King)
        && mv.get_source().get_file().to_index().abs_diff(mv.get_dest().get_file().to_index()) == 2
}

/// True when `mv` is a pawn capture onto an empty square.
pub fn is_en_passant(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_source()) == Some(Piece::Pawn)
        && mv.get_source().get_file() != mv.get_dest().get_file()
        && board.piece_on(mv.get_dest()).is_none()
}

/// Origin disambiguation for a non-pawn move ("", file, rank or full square).
fn disambiguation(board: &Board, mv: ChessMove, piece: Piece) -> String {
    let from = mv.get_source();
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|other| {
            other.get_dest() == mv.get_dest()
                && other.get_source() != from
                && board.piece_on(other.get_source()) == Some(piece)
        })
        .map(|other| other.get_source())
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.get_file() != from.get_file()) {
        file_char(from).to_string()
    } else if rivals.iter().all(|sq| sq.get_rank() != from.get_rank()) {
        rank_char(from).to_string()
    } else {
        from.to_string()
    }
}

/// Render `mv` (legal on `board`) in standard algebraic notation, e.g. `Nbd7`, `exd6`,
/// `e8=Q+`, `O-O-O#`.
pub fn to_san(board: &Board, mv: ChessMove) -> String {
    let from = mv.get_source();
    let to = mv.get_dest();
    let mut san = String::new();

    match board.piece_on(from) {
        Some(Piece::King) if is_castle(board, mv) => {
            if to.get_file().to_index() > from.get_file().to_index() {
                san.push_str("O-O");
            } else {
                san.push_str("O-O-O");
            }
        }
        Some(Piece::Pawn) => {
            if from.get_file() != to.get_file() {
                san.push(file_char(from));
                san.push('x');
            }
            san.push_str(&to.to_string());
            if let Some(promotion) = mv.get_promotion() {
                san.push('=');
                san.push(piece_letter(promotion));
            }
        }
        Some(piece) => {
            san.push(piece_letter(piece));
            san.push_str(&disambiguation(board, mv, piece));
            if board.piece_on(to).is_some() {
                san.push('x');
            }
            san.push_str(&to.to_string());
        }
        None => return mv.to_string(),
    }

    let after = board.make_move_new(mv);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if *after.checkers() != EMPTY {
        san.push('+');
    }
    san
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn san_of(fen: &str, from: Square, to: Square, promotion: Option<Piece>) -> String {
        let board = Board::from_str(fen).expect("valid test FEN");
        to_san(&board, ChessMove::new(from, to, promotion))
    }

    #[test]
    fn opening_moves() {
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(san_of(start, Square::E2, Square::E4, None), "e4");
        assert_eq!(san_of(start, Square::G1, Square::F3, None), "Nf3");
    }

    #[test]
    fn knight_disambiguation_by_file() {
        // Knights on b1 and f3 can both reach d2
        let fen = "4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1";
        assert_eq!(san_of(fen, Square::B1, Square::D2, None), "Nbd2");
    }

    #[test]
    fn rook_disambiguation_by_rank() {
        let fen = "4k3/8/8/8/R7/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, Square::A1, Square::A2, None), "R1a2");
    }

    #[test]
    fn castling_and_mate_suffix() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(san_of(fen, Square::E1, Square::G1, None), "O-O");
        assert_eq!(san_of(fen, Square::E1, Square::C1, None), "O-O-O");

        // Fool's mate
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
        assert_eq!(san_of(fen, Square::D8, Square::H4, None), "Qh4#");
    }

    #[test]
    fn pawn_capture_and_promotion() {
        let fen = "3r3k/4P3/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(san_of(fen, Square::E7, Square::D8, Some(Piece::Queen)), "exd8=Q+");
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2";
        assert_eq!(san_of(fen, Square::E5, Square::D6, None), "exd6");
    }
}
