use crate::board::{Board, Color, Piece};
use crate::moves::magic::MagicTables;
use crate::search::pesto;
use crate::utils::pop_lsb;

const LAZY_EVAL_MARGIN: i32 = 200;

/// Game-phase thresholds, in the same units as the opening piece-value
/// table: at or above `GPO` the position is scored as a pure opening, at or
/// below `GPE` as a pure endgame, and linearly blended in between.
const GPO: i32 = 6192;
const GPE: i32 = 518;

/// Sum of the opening-table value of every non-pawn, non-king piece on the
/// board, both colors. Decreases as material is traded off.
pub fn calculate_phase(board: &Board) -> i32 {
    let mut phase = 0;
    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        let (mg_val, _) = get_piece_value(piece);
        let count = board.pieces(piece, Color::White).count_ones()
            + board.pieces(piece, Color::Black).count_ones();
        phase += count as i32 * mg_val;
    }
    phase
}

#[inline(always)]
pub fn mirror_vert(sq: u8) -> usize {
    (sq ^ 56) as usize
}

fn get_psqt(kind: Piece) -> (&'static [i32; 64], &'static [i32; 64]) {
    match kind {
        Piece::Pawn => (pesto::PAWN_TABLE.0, pesto::PAWN_TABLE.1),
        Piece::Knight => (pesto::KNIGHT_TABLE.0, pesto::KNIGHT_TABLE.1),
        Piece::Bishop => (pesto::BISHOP_TABLE.0, pesto::BISHOP_TABLE.1),
        Piece::Rook => (pesto::ROOK_TABLE.0, pesto::ROOK_TABLE.1),
        Piece::Queen => (pesto::QUEEN_TABLE.0, pesto::QUEEN_TABLE.1),
        Piece::King => (pesto::KING_TABLE.0, pesto::KING_TABLE.1),
    }
}

fn get_piece_value(kind: Piece) -> (i32, i32) {
    match kind {
        Piece::Pawn => pesto::PAWN_VAL,
        Piece::Knight => pesto::KNIGHT_VAL,
        Piece::Bishop => pesto::BISHOP_VAL,
        Piece::Rook => pesto::ROOK_VAL,
        Piece::Queen => pesto::QUEEN_VAL,
        Piece::King => pesto::KING_VAL,
    }
}

/// Material + PSQT, tapered between phase 0 (endgame) and phase 24 (opening),
/// from White's perspective.
pub fn pesto_eval(board: &Board) -> i32 {
    let mut mg_score = 0;
    let mut eg_score = 0;
    let phase = calculate_phase(board);

    for piece_type in [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ] {
        let (mg_val, eg_val) = get_piece_value(piece_type);
        let (mg_table, eg_table) = get_psqt(piece_type);

        let mut w_bb = board.pieces(piece_type, Color::White);
        while w_bb != 0 {
            let sq = pop_lsb(&mut w_bb);
            // Tables are stored a8=0; White reads them directly.
            mg_score += mg_val + mg_table[sq as usize];
            eg_score += eg_val + eg_table[sq as usize];
        }

        let mut b_bb = board.pieces(piece_type, Color::Black);
        while b_bb != 0 {
            let sq = pop_lsb(&mut b_bb);
            // Black mirrors vertically to reuse White's a8=0 table.
            let table_sq = mirror_vert(sq);
            mg_score -= mg_val + mg_table[table_sq];
            eg_score -= eg_val + eg_table[table_sq];
        }
    }

    taper(mg_score, eg_score, phase)
}

/// Blends opening (`mg`) and endgame (`eg`) scores by the current game
/// phase: pure opening at or above `GPO`, pure endgame at or below `GPE`,
/// linear interpolation in between.
fn taper(mg: i32, eg: i32, phase: i32) -> i32 {
    if phase >= GPO {
        mg
    } else if phase <= GPE {
        eg
    } else {
        (mg * phase + eg * (GPO - phase)) / GPO
    }
}

/// Static evaluation from the side-to-move's perspective, with a lazy
/// alpha/beta margin cutoff around the material+PSQT score.
pub fn static_eval(board: &Board, _tables: &MagicTables, alpha: i32, beta: i32) -> i32 {
    let side = board.side_to_move;
    let color_multiplier = if side == Color::White { 1 } else { -1 };
    let score = pesto_eval(board) * color_multiplier;

    if score - LAZY_EVAL_MARGIN >= beta {
        return score;
    }
    if score + LAZY_EVAL_MARGIN <= alpha {
        return score;
    }

    score
}

// Debug helper: returns just the material component (tapered)
pub fn eval_material(board: &Board) -> i32 {
    let mut mg_score = 0;
    let mut eg_score = 0;
    let phase = calculate_phase(board);

    for piece_type in [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ] {
        let (mg_val, eg_val) = get_piece_value(piece_type);

        let w_count = board.pieces(piece_type, Color::White).count_ones() as i32;
        let b_count = board.pieces(piece_type, Color::Black).count_ones() as i32;

        mg_score += mg_val * (w_count - b_count);
        eg_score += eg_val * (w_count - b_count);
    }

    taper(mg_score, eg_score, phase)
}

// Debug helper: returns just the PSQT component (tapered)
pub fn eval_psqt(board: &Board) -> i32 {
    let mut mg_score = 0;
    let mut eg_score = 0;
    let phase = calculate_phase(board);

    for piece_type in [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ] {
        let (mg_table, eg_table) = get_psqt(piece_type);

        let mut w_bb = board.pieces(piece_type, Color::White);
        while w_bb != 0 {
            let sq = pop_lsb(&mut w_bb);
            mg_score += mg_table[sq as usize];
            eg_score += eg_table[sq as usize];
        }

        let mut b_bb = board.pieces(piece_type, Color::Black);
        while b_bb != 0 {
            let sq = pop_lsb(&mut b_bb);
            let table_sq = mirror_vert(sq);
            mg_score -= mg_table[table_sq];
            eg_score -= eg_table[table_sq];
        }
    }

    taper(mg_score, eg_score, phase)
}
