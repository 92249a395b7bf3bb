use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color};
use crate::error::EngineError;
use crate::square::Square;

use super::Board;

impl Board {
    /// Loads a FEN string into `self`, replacing all prior state.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), EngineError> {
        let mut fields = fen.split_whitespace();

        let placement = fields
            .next()
            .ok_or_else(|| EngineError::InvalidFen(fen.to_string()))?;

        let mut board = Board::new_empty();
        board.piece_bb = [[0u64; 6]; 2];
        board.occ_white = 0;
        board.occ_black = 0;
        board.occ_all = 0;
        board.piece_on_sq = [super::EMPTY_SQ; 64];

        let mut rank = 0usize;
        let mut file = 0usize;
        for c in placement.chars() {
            match c {
                '/' => {
                    if file != 8 {
                        return Err(EngineError::InvalidFen(fen.to_string()));
                    }
                    rank += 1;
                    file = 0;
                }
                '1'..='8' => {
                    let skip = c.to_digit(10).unwrap() as usize;
                    file += skip;
                }
                _ => {
                    let (piece, color) = CHAR_TO_PC[c as usize]
                        .ok_or_else(|| EngineError::InvalidFen(fen.to_string()))?;
                    if rank >= 8 || file >= 8 {
                        return Err(EngineError::InvalidFen(fen.to_string()));
                    }
                    let sq = Square::from_index((rank * 8 + file) as u8);
                    let bb = board.bb(color, piece) | sq.bit();
                    board.piece_bb[color as usize][piece as usize] = bb;
                    board.place_piece_at_sq(color, piece, sq);
                    file += 1;
                }
            }
        }
        board.occ_white = board.piece_bb[Color::White as usize].iter().fold(0, |a, b| a | b);
        board.occ_black = board.piece_bb[Color::Black as usize].iter().fold(0, |a, b| a | b);
        board.occ_all = board.occ_white | board.occ_black;

        let side = fields
            .next()
            .ok_or_else(|| EngineError::InvalidFen(fen.to_string()))?;
        board.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(EngineError::InvalidFen(fen.to_string())),
        };

        let castling = fields
            .next()
            .ok_or_else(|| EngineError::InvalidFen(fen.to_string()))?;
        board.castling_rights = 0;
        if castling != "-" {
            for c in castling.chars() {
                match c {
                    'K' => board.castling_rights |= CASTLE_WK,
                    'Q' => board.castling_rights |= CASTLE_WQ,
                    'k' => board.castling_rights |= CASTLE_BK,
                    'q' => board.castling_rights |= CASTLE_BQ,
                    _ => return Err(EngineError::InvalidFen(fen.to_string())),
                }
            }
        }

        let ep = fields
            .next()
            .ok_or_else(|| EngineError::InvalidFen(fen.to_string()))?;
        board.en_passant = if ep == "-" {
            None
        } else {
            let bytes = ep.as_bytes();
            if bytes.len() != 2 {
                return Err(EngineError::InvalidFen(fen.to_string()));
            }
            let file = bytes[0].wrapping_sub(b'a');
            let rank_char = bytes[1];
            if !(b'1'..=b'8').contains(&rank_char) || file >= 8 {
                return Err(EngineError::InvalidFen(fen.to_string()));
            }
            let rank = 8 - (rank_char - b'0');
            Some(Square::from_index(rank * 8 + file))
        };

        board.halfmove_clock = fields.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        board.fullmove_number = fields.next().and_then(|s| s.parse().ok()).unwrap_or(1);

        board.history.clear();
        board.refresh_zobrist();

        *self = board;
        Ok(())
    }

    /// Serializes the current position to FEN.
    pub fn to_fen(&self) -> String {
        let mut s = String::with_capacity(64);

        for rank in 0..8 {
            let mut empty_run = 0;
            for file in 0..8 {
                let sq = Square::from_index((rank * 8 + file) as u8);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            s.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        let idx = (color as usize) * 6 + (piece as usize);
                        s.push(PC_TO_CHAR[idx]);
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                s.push((b'0' + empty_run) as char);
            }
            if rank != 7 {
                s.push('/');
            }
        }

        s.push(' ');
        s.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        s.push(' ');
        if self.castling_rights == 0 {
            s.push('-');
        } else {
            if self.has_castling(CASTLE_WK) {
                s.push('K');
            }
            if self.has_castling(CASTLE_WQ) {
                s.push('Q');
            }
            if self.has_castling(CASTLE_BK) {
                s.push('k');
            }
            if self.has_castling(CASTLE_BQ) {
                s.push('q');
            }
        }

        s.push(' ');
        match self.en_passant {
            Some(sq) => s.push_str(&sq.to_string()),
            None => s.push('-'),
        }

        s.push(' ');
        s.push_str(&self.halfmove_clock.to_string());
        s.push(' ');
        s.push_str(&self.fullmove_number.to_string());

        s
    }
}
