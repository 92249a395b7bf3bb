use chessel::board::{Board, Color, Piece};
use chessel::moves::execute::{generate_legal, make_move_basic};
use chessel::moves::magic::MagicTables;
use chessel::moves::magic::loader::load_magic_tables;
use chessel::moves::perft::perft_divide;
use chessel::moves::types::Move;
use chessel::search::search::search_with_stop;
use chessel::search::tt::TranspositionTable;
use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const DEFAULT_HASH_MB: usize = 64;
const MIN_HASH_MB: usize = 4;
const MAX_HASH_MB: usize = 128;

/// Reads stdin on a dedicated thread and forwards each line to the main
/// loop over a channel, so a `stop` typed while `go` is mid-search is seen
/// immediately rather than only after the current line-read completes.
fn spawn_stdin_reader(stop: Arc<AtomicBool>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l.trim().to_string(),
                Err(_) => break,
            };
            if line == "stop" {
                stop.store(true, Ordering::Relaxed);
            }
            if tx.send(line.clone()).is_err() {
                break;
            }
            if line == "quit" {
                break;
            }
        }
    });
    rx
}

fn main() {
    #[cfg(feature = "cli")]
    chessel::logger::init_logging("logs/uci.log", "info");

    let tables = load_magic_tables();
    let mut board = Board::new();
    let mut tt = TranspositionTable::new(DEFAULT_HASH_MB);
    let stop = Arc::new(AtomicBool::new(false));

    let rx = spawn_stdin_reader(stop.clone());
    for line in rx {
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "uci" => handle_uci(),
            "isready" => println!("readyok"),
            "ucinewgame" => {
                board = Board::new();
                tt = TranspositionTable::new(DEFAULT_HASH_MB);
            }
            "position" => {
                if let Some(new_board) = handle_position(&parts, &tables) {
                    board = new_board;
                }
            }
            "setoption" => handle_setoption(&parts, &mut tt),
            "go" => {
                stop.store(false, Ordering::Relaxed);
                handle_go(&parts, &mut board, &tables, &mut tt, stop.clone());
            }
            "stop" => {}
            "d" | "display" => {
                eprintln!("{}", board);
                eprintln!("fen: {}", board.to_fen());
            }
            "perft" => {
                if let Some(depth) = parts.get(1).and_then(|d| d.parse::<u32>().ok()) {
                    let mut scratch = board.clone();
                    let nodes = perft_divide(&mut scratch, &tables, depth);
                    println!("info string perft {} nodes {}", depth, nodes);
                }
            }
            "quit" => break,
            _ => {}
        }
    }
}

fn handle_uci() {
    println!("id name Chessel 1.0");
    println!("id author Chessel Contributors");
    println!(
        "option name Hash type spin default {} min {} max {}",
        DEFAULT_HASH_MB, MIN_HASH_MB, MAX_HASH_MB
    );
    println!("uciok");
}

fn handle_setoption(parts: &[&str], tt: &mut TranspositionTable) {
    // setoption name Hash value <N>
    if parts.len() >= 5 && parts[1] == "name" && parts[2] == "Hash" && parts[3] == "value" {
        if let Ok(mb) = parts[4].parse::<usize>() {
            let clamped = mb.clamp(MIN_HASH_MB, MAX_HASH_MB);
            *tt = TranspositionTable::new(clamped);
        }
    }
}

fn handle_position(parts: &[&str], tables: &MagicTables) -> Option<Board> {
    let mut board = if parts.len() > 1 && parts[1] == "startpos" {
        Board::new()
    } else if parts.len() > 1 && parts[1] == "fen" {
        let fen_start = 2;
        let mut fen_end = parts.len();
        for (i, &part) in parts.iter().enumerate().skip(fen_start) {
            if part == "moves" {
                fen_end = i;
                break;
            }
        }
        let fen_string = parts[fen_start..fen_end].join(" ");
        Board::from_str(&fen_string).ok()?
    } else {
        Board::new()
    };

    if let Some(moves_idx) = parts.iter().position(|&p| p == "moves") {
        for move_str in &parts[moves_idx + 1..] {
            match parse_uci_move(&board, move_str, tables) {
                Some(mv) => make_move_basic(&mut board, mv),
                // Stop at the first move that doesn't match; keep the
                // position as of the last successfully applied move and
                // ignore everything after it. No error reported.
                None => break,
            }
        }
    }

    Some(board)
}

fn parse_uci_move(board: &Board, move_str: &str, tables: &MagicTables) -> Option<Move> {
    if move_str.len() < 4 {
        return None;
    }
    let chars: Vec<char> = move_str.chars().collect();

    let from_file = (chars[0] as u8).wrapping_sub(b'a');
    let from_rank = (chars[1] as u8).wrapping_sub(b'1');
    let to_file = (chars[2] as u8).wrapping_sub(b'a');
    let to_rank = (chars[3] as u8).wrapping_sub(b'1');
    if from_file > 7 || from_rank > 7 || to_file > 7 || to_rank > 7 {
        return None;
    }

    // Board indices run a8 = 0 .. h1 = 63, so the row counted from the top is
    // the complement of the rank digit (rank '1' is row 7, rank '8' is row 0).
    let from_square = ((7 - from_rank) * 8 + from_file) as usize;
    let to_square = ((7 - to_rank) * 8 + to_file) as usize;

    let promo_piece = if move_str.len() >= 5 {
        match chars[4] {
            'q' => Some(Piece::Queen),
            'r' => Some(Piece::Rook),
            'b' => Some(Piece::Bishop),
            'n' => Some(Piece::Knight),
            _ => None,
        }
    } else {
        None
    };

    let mut moves = Vec::with_capacity(256);
    let mut scratch = Vec::with_capacity(256);
    let mut board_copy = board.clone();
    generate_legal(&mut board_copy, tables, &mut moves, &mut scratch);

    for mv in moves {
        if (mv.from.index() as usize) == from_square && (mv.to.index() as usize) == to_square {
            if promo_piece.is_some() {
                if mv.promotion == promo_piece {
                    return Some(mv);
                }
            } else if mv.promotion.is_none() {
                return Some(mv);
            }
        }
    }
    None
}

fn handle_go(
    parts: &[&str],
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    stop: Arc<AtomicBool>,
) {
    let mut depth = 64;
    let mut time_limit = None;

    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc: u64 = 0;
    let mut binc: u64 = 0;
    let mut movestogo: Option<u64> = None;
    let mut movetime: Option<u64> = None;

    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                if i + 1 < parts.len() {
                    depth = parts[i + 1].parse().unwrap_or(64);
                }
                i += 2;
            }
            "movetime" => {
                if i + 1 < parts.len() {
                    movetime = parts[i + 1].parse().ok();
                }
                i += 2;
            }
            "wtime" => {
                if i + 1 < parts.len() {
                    wtime = parts[i + 1].parse().ok();
                }
                i += 2;
            }
            "btime" => {
                if i + 1 < parts.len() {
                    btime = parts[i + 1].parse().ok();
                }
                i += 2;
            }
            "winc" => {
                if i + 1 < parts.len() {
                    winc = parts[i + 1].parse().unwrap_or(0);
                }
                i += 2;
            }
            "binc" => {
                if i + 1 < parts.len() {
                    binc = parts[i + 1].parse().unwrap_or(0);
                }
                i += 2;
            }
            "movestogo" => {
                if i + 1 < parts.len() {
                    movestogo = parts[i + 1].parse().ok();
                }
                i += 2;
            }
            "infinite" => {
                depth = 64;
                time_limit = None;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    if let Some(ms) = movetime {
        time_limit = Some(Duration::from_millis(ms));
    } else {
        let (my_time, my_inc) = if board.side_to_move == Color::White {
            (wtime, winc)
        } else {
            (btime, binc)
        };

        if let Some(t) = my_time {
            // Reserve 15% of the clock or 500ms, whichever is smaller, for
            // GUI/OS overhead; never visible to the search.
            let safety_buffer = (t * 15 / 100).min(500);
            let usable_time = t.saturating_sub(safety_buffer);

            let mut alloc: u64;
            if let Some(mtg) = movestogo {
                let moves_to_plan = mtg.max(2);
                alloc = usable_time / moves_to_plan;
                alloc += (my_inc * 3) / 4;
            } else if usable_time > 5000 {
                alloc = usable_time / 40 + (my_inc * 9) / 10;
            } else if usable_time > 2000 {
                alloc = usable_time / 30 + (my_inc * 3) / 4;
            } else if usable_time > 500 {
                alloc = usable_time / 20 + my_inc / 2;
            } else {
                alloc = my_inc / 2 + 20;
            }

            let hard_cap = usable_time / 5;
            alloc = alloc.min(hard_cap).min(usable_time);
            if alloc < 10 && usable_time >= 10 {
                alloc = 10;
            }

            time_limit = Some(Duration::from_millis(alloc));
        }
    }

    let (_score, best_move) = search_with_stop(board, tables, tt, depth, time_limit, stop);

    match best_move {
        Some(m) => println!("bestmove {}", m.to_uci()),
        None => println!("bestmove 0000"),
    }
}
