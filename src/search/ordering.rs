use crate::board::{Board, Piece};
use crate::moves::types::Move;

const PV_SCORE: i32 = 20_000;
const CAPTURE_BASE: i32 = 10_000;
const KILLER1_SCORE: i32 = 9_000;
const KILLER2_SCORE: i32 = 8_000;

/// MVV-LVA score for an (attacker, victim) pair, in [100, 605]. Color does
/// not affect the value — only the two piece kinds do — so the nominal
/// 12x12 table collapses to this 6x6 formula.
#[inline]
pub fn mvv_lva_score(attacker: Piece, victim: Piece) -> i32 {
    (victim as i32 + 1) * 100 + (5 - attacker as i32)
}

/// Looks up the MVV-LVA bonus for a pseudo-legal capture, resolving en
/// passant (whose destination square is empty) to a captured pawn.
fn capture_score(mv: Move, board: &Board) -> Option<i32> {
    if let Some((_, captured)) = board.piece_at(mv.to) {
        return Some(mvv_lva_score(mv.piece, captured));
    }
    if mv.is_en_passant() {
        return Some(mvv_lva_score(mv.piece, Piece::Pawn));
    }
    None
}

#[allow(clippy::too_many_arguments)]
pub fn order_moves(
    moves: &mut [Move],
    board: &Board,
    killer_moves: &[Option<Move>; 2],
    history: &[[i32; 64]; 12],
    hash_move: Option<Move>,
    follow_pv: Option<Move>,
) {
    moves.sort_by_cached_key(|&mv| {
        if let Some(pv) = follow_pv
            && mv.from == pv.from
            && mv.to == pv.to
            && mv.promotion == pv.promotion
        {
            return -PV_SCORE;
        }

        if let Some(hm) = hash_move
            && mv.from == hm.from
            && mv.to == hm.to
            && mv.promotion == hm.promotion
        {
            return -PV_SCORE;
        }

        if let Some(score) = capture_score(mv, board) {
            return -(CAPTURE_BASE + score);
        }

        if let Some(k1) = killer_moves[0]
            && mv.from == k1.from
            && mv.to == k1.to
            && mv.promotion == k1.promotion
        {
            return -KILLER1_SCORE;
        }
        if let Some(k2) = killer_moves[1]
            && mv.from == k2.from
            && mv.to == k2.to
            && mv.promotion == k2.promotion
        {
            return -KILLER2_SCORE;
        }

        let piece_index = history_piece_index(board, mv);
        -history[piece_index][mv.to.index() as usize]
    });
}

/// Index into `history[piece][target]`: color-folded piece kind, 0..11.
#[inline]
pub fn history_piece_index(board: &Board, mv: Move) -> usize {
    let color = board.side_to_move;
    (color as usize) * 6 + (mv.piece as usize)
}
