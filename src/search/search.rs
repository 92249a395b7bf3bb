use crate::board::Board;
use crate::moves::execute::{
    generate_captures, generate_legal, make_move_basic, make_null_move, undo_move_basic,
    undo_null_move,
};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::in_check;
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::eval::static_eval;
use crate::search::ordering::{history_piece_index, order_moves};
use crate::search::tt::{NO_HASH_ENTRY, NodeType, TranspositionTable};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const INF: i32 = 32000;
const MATE_SCORE: i32 = 31000;
const MATE_THRESHOLD: i32 = 30000;
const MAX_PLY: usize = 128;
const MAX_Q_PLY: usize = 32;
const DRAW_SCORE: i32 = 0;
const NODE_POLL_INTERVAL: u64 = 2047;
const ASPIRATION_WINDOW: i32 = 50;

pub struct TimeManager {
    pub start_time: Instant,
    pub allotted: Option<Duration>,
    pub stop_signal: bool,
    /// Set by the protocol layer (e.g. on a `stop` command read from stdin on
    /// another thread) and polled alongside the deadline. `None` when the
    /// caller offers no such channel (e.g. in unit tests).
    external_stop: Option<Arc<AtomicBool>>,
}

impl TimeManager {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            start_time: Instant::now(),
            allotted: limit,
            stop_signal: false,
            external_stop: None,
        }
    }

    pub fn with_external_stop(limit: Option<Duration>, external_stop: Arc<AtomicBool>) -> Self {
        Self {
            start_time: Instant::now(),
            allotted: limit,
            stop_signal: false,
            external_stop: Some(external_stop),
        }
    }

    #[inline(always)]
    pub fn check_time(&mut self) {
        if self.stop_signal {
            return;
        }
        if let Some(flag) = &self.external_stop
            && flag.load(Ordering::Relaxed)
        {
            self.stop_signal = true;
            return;
        }
        if let Some(limit) = self.allotted
            && self.start_time.elapsed() >= limit
        {
            self.stop_signal = true;
        }
    }

    #[inline(always)]
    pub fn allocated_time(&self) -> Option<Duration> {
        self.allotted
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Captures-only search to a quiet position. Recursion is capped at `ply +
/// MAX_Q_PLY`, a defensive bound against pathological capture chains.
#[allow(clippy::too_many_arguments)]
pub fn quiescence(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    ply: usize,
    alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> i32 {
    quiescence_inner(board, tables, ctx, tt, ply, ply, alpha, beta, nodes, time)
}

#[allow(clippy::too_many_arguments)]
fn quiescence_inner(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    q_root: usize,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> i32 {
    if *nodes % (NODE_POLL_INTERVAL + 1) == 0 {
        time.check_time();
    }
    if time.stop_signal {
        return 0;
    }
    *nodes += 1;

    let stand_pat = static_eval(board, tables, alpha, beta);
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    if ply >= q_root + MAX_Q_PLY {
        return stand_pat;
    }

    let mut captures = Vec::with_capacity(32);
    let mut scratch = Vec::with_capacity(64);
    generate_captures(board, tables, &mut captures, &mut scratch);

    let no_killers = [None, None];
    order_moves(&mut captures, board, &no_killers, &ctx.history, None, None);

    for mv in captures {
        let undo = make_move_basic(board, mv);
        let score = -quiescence_inner(
            board,
            tables,
            ctx,
            tt,
            q_root,
            ply + 1,
            -beta,
            -alpha,
            nodes,
            time,
        );
        undo_move_basic(board, undo);

        if time.stop_signal {
            return 0;
        }
        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

#[allow(clippy::too_many_arguments)]
pub fn alpha_beta(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    mut depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
    follow_pv: bool,
) -> (i32, Option<Move>) {
    let pv_node = beta - alpha > 1;

    // 1. Repetition (non-root only).
    if ply > 0 && board.is_repetition() {
        return (DRAW_SCORE, None);
    }

    let hash = board.zobrist;

    // 2. TT probe (non-root, non-PV only).
    if ply > 0 && !pv_node {
        let probed = tt.probe(hash, depth.max(0) as u8, alpha, beta, ply as i32);
        if probed != NO_HASH_ENTRY {
            return (probed, tt.best_move(hash));
        }
    }
    let hash_move = tt.best_move(hash);

    // 3. Poll the clock periodically.
    if *nodes % (NODE_POLL_INTERVAL + 1) == 0 {
        time.check_time();
    }
    if time.stop_signal {
        return (0, None);
    }

    // 4. PV length rooted at this ply starts empty.
    if ply < ctx.pv_length.len() {
        ctx.pv_length[ply] = ply;
    }

    // 5. Horizon: drop into quiescence.
    if depth <= 0 {
        let score = quiescence(board, tables, ctx, tt, ply, alpha, beta, nodes, time);
        return (score, None);
    }

    // 6. Recursion-depth backstop. Leaves room for a child at ply+1 to still
    // index the PV/killer tables below.
    if ply + 1 >= MAX_PLY {
        return (static_eval(board, tables, alpha, beta), None);
    }

    // 7. Node accounting.
    *nodes += 1;
    let in_check_now = in_check(board, board.side_to_move, tables);

    // 8. Check extension.
    if in_check_now {
        depth += 1;
    }

    // 9. Null-move pruning.
    if depth >= 3
        && !in_check_now
        && ply > 0
        && board.has_major_pieces(board.side_to_move)
    {
        let undo = make_null_move(board);
        let (val, _) = alpha_beta(
            board,
            tables,
            ctx,
            tt,
            depth - 1 - 2,
            ply + 1,
            -beta,
            -beta + 1,
            nodes,
            time,
            false,
        );
        let score = -val;
        undo_null_move(board, undo);

        if time.stop_signal {
            return (0, None);
        }
        if score >= beta {
            return (beta, None);
        }
    }

    // 10. Generate and order moves.
    let mut moves = Vec::with_capacity(64);
    let mut scratch = Vec::with_capacity(96);
    generate_legal(board, tables, &mut moves, &mut scratch);

    let follow_pv_move = if follow_pv && ply < ctx.pv_table.len() {
        ctx.pv_table[ply][ply]
    } else {
        None
    };
    let killers = ctx.killer_moves[ply];
    order_moves(
        &mut moves,
        board,
        &killers,
        &ctx.history,
        hash_move,
        follow_pv_move,
    );

    let original_alpha = alpha;
    let mut best_move = None;
    let mut moves_searched = 0usize;

    // 11. Search each legal move.
    for mv in moves {
        let child_follow_pv = follow_pv && Some(mv) == follow_pv_move;
        let undo = make_move_basic(board, mv);

        let score = if moves_searched == 0 {
            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - 1,
                ply + 1,
                -beta,
                -alpha,
                nodes,
                time,
                child_follow_pv,
            );
            -val
        } else {
            let do_lmr = moves_searched >= 4
                && depth >= 3
                && !in_check_now
                && !mv.is_capture()
                && !mv.is_promotion();

            let mut s = alpha + 1; // tripwire: forces the full-depth re-search below
            if do_lmr {
                let (val, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    depth - 2,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    nodes,
                    time,
                    false,
                );
                s = -val;
            }

            if s > alpha {
                let (val, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    depth - 1,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    nodes,
                    time,
                    false,
                );
                s = -val;

                if s > alpha && s < beta {
                    let (val, _) = alpha_beta(
                        board, tables, ctx, tt, depth - 1, ply + 1, -beta, -alpha, nodes, time,
                        child_follow_pv,
                    );
                    s = -val;
                }
            }
            s
        };

        undo_move_basic(board, undo);

        if time.stop_signal {
            return (0, None);
        }
        moves_searched += 1;

        if score > alpha {
            alpha = score;
            best_move = Some(mv);

            if !mv.is_capture() {
                let piece_index = history_piece_index(board, mv);
                ctx.update_history(piece_index, mv.to.index() as usize, depth);
            }
            ctx.update_pv(ply, mv);

            if alpha >= beta {
                tt.save(
                    hash,
                    Some(mv),
                    beta,
                    depth as u8,
                    NodeType::LowerBound as u8,
                    ply as i32,
                );
                if !mv.is_capture() {
                    ctx.update_killer(ply, mv);
                }
                return (beta, Some(mv));
            }
        }
    }

    // 12. No legal replies: checkmate or stalemate.
    if moves_searched == 0 {
        if in_check_now {
            return (-MATE_SCORE + ply as i32, None);
        }
        return (0, None);
    }

    if time.stop_signal {
        return (0, None);
    }

    // 13. Write back and return.
    let node_type = if alpha > original_alpha {
        NodeType::Exact
    } else {
        NodeType::UpperBound
    };
    tt.save(hash, best_move, alpha, depth as u8, node_type as u8, ply as i32);

    (alpha, best_move)
}

fn format_score(score: i32) -> String {
    if score.abs() >= MATE_THRESHOLD {
        let plies_to_mate = MATE_SCORE - score.abs();
        let moves_to_mate = (plies_to_mate + 1) / 2;
        if score > 0 {
            format!("mate {}", moves_to_mate)
        } else {
            format!("mate -{}", moves_to_mate)
        }
    } else {
        format!("cp {}", score)
    }
}

/// Iterative deepening driver. The transposition table is caller-owned and
/// persists across calls (new_search() bumps its aging generation).
pub fn search(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    max_depth: i32,
    time_limit: Option<Duration>,
) -> (i32, Option<Move>) {
    let time = TimeManager::new(time_limit);
    search_driver(board, tables, tt, max_depth, time)
}

/// Same as `search`, but polls `stop` (set from another thread on a UCI
/// `stop` command) alongside the deadline, so a running search can be cut
/// off promptly instead of only at the next completed iteration.
pub fn search_with_stop(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    max_depth: i32,
    time_limit: Option<Duration>,
    stop: Arc<AtomicBool>,
) -> (i32, Option<Move>) {
    let time = TimeManager::with_external_stop(time_limit, stop);
    search_driver(board, tables, tt, max_depth, time)
}

fn search_driver(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    max_depth: i32,
    mut time: TimeManager,
) -> (i32, Option<Move>) {
    let mut ctx = SearchContext::new();
    let mut nodes = 0u64;
    tt.new_search();

    let mut best_score = 0;
    let mut best_move = None;

    for depth in 1..=max_depth {
        ctx.age_history();

        let mut alpha = -INF;
        let mut beta = INF;
        if depth > 1 {
            alpha = best_score - ASPIRATION_WINDOW;
            beta = best_score + ASPIRATION_WINDOW;
        }

        let (score, mv) = loop {
            let result = alpha_beta(
                board, tables, &mut ctx, tt, depth, 0, alpha, beta, &mut nodes, &mut time, true,
            );

            if time.stop_signal {
                break result;
            }
            if result.0 <= alpha || result.0 >= beta {
                alpha = -INF;
                beta = INF;
                continue;
            }
            break result;
        };

        if time.stop_signal {
            break;
        }

        best_score = score;
        let pv = ctx.principal_variation();
        best_move = pv.first().copied().or(mv);

        if let Some(bm) = best_move {
            let pv_str = if pv.is_empty() {
                bm.to_uci()
            } else {
                pv.iter()
                    .map(|m| m.to_uci())
                    .collect::<Vec<_>>()
                    .join(" ")
            };

            println!(
                "info score {} depth {} nodes {} time {} pv {}",
                format_score(best_score),
                depth,
                nodes,
                time.elapsed().as_millis(),
                pv_str
            );
        }

        if best_score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    (best_score, best_move)
}
