//! Terminal chess against the computer
//!
//! Usage: cargo run --release -- --difficulty 3 --black computer
//!        cargo run --release -- --white computer --black computer --seed 1

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{eyre, Result};
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::{info, warn, Level};

use chess_opponent::board::Board;
use chess_opponent::game::{complete_promotion, execute_move, GameState};
use chess_opponent::perft::perft_divide;
use chess_opponent::search::{get_ai_move_with_rng, Difficulty};
use chess_opponent::types::{Color, GameStatus, MoveInput, PieceType, Position};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Player {
    Human,
    Computer,
}

#[derive(Parser, Debug)]
#[command(name = "chess_opponent")]
#[command(about = "Play chess in the terminal against a computer opponent")]
struct Args {
    /// Who plays the white pieces
    #[arg(long, value_enum, default_value_t = Player::Human)]
    white: Player,

    /// Who plays the black pieces
    #[arg(long, value_enum, default_value_t = Player::Computer)]
    black: Player,

    /// Computer strength, 1 (random) to 4 (three ply search)
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=4))]
    difficulty: u8,

    /// Seed for the computer's random choices
    #[arg(long)]
    seed: Option<u64>,

    /// Stop the game after this many plies
    #[arg(long, default_value_t = 300)]
    max_moves: usize,

    /// Pause before each computer move, in milliseconds
    #[arg(long, default_value_t = 0)]
    think_ms: u64,

    /// Print perft counts per root move of the starting position and exit
    #[arg(long)]
    perft: Option<u8>,

    /// More logging, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn player(&self, color: Color) -> Player {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Print `prompt` and read one trimmed line. `None` at end of input.
fn prompt_line(lines: &mut impl Iterator<Item = io::Result<String>>, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn print_captured(state: &GameState) {
    for color in [Color::White, Color::Black] {
        let captured = state.captured_pieces(color);
        if !captured.is_empty() {
            let symbols: Vec<&str> = captured.iter().map(|p| p.to_symbol()).collect();
            println!("{} lost: {}", color, symbols.join(" "));
        }
    }
}

fn print_result(state: &GameState) {
    state.board.draw_to_terminal();
    print_captured(state);
    match state.winner {
        Some(color) => println!("Checkmate, {} wins", color),
        None if state.is_over() => println!("Stalemate"),
        None => println!("Game stopped"),
    }
}

/// Ask for a move until a legal one is entered. `None` when the player quits.
fn human_turn(
    state: &GameState,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<Option<GameState>> {
    loop {
        let line = match prompt_line(lines, &format!("{} to move: ", state.turn))? {
            Some(line) => line,
            None => return Ok(None),
        };
        match line.as_str() {
            "" => continue,
            "quit" | "exit" => return Ok(None),
            "help" => {
                println!("Enter moves as e2e4, or e7e8q to promote. `moves e2` lists targets.");
                continue;
            }
            _ => {}
        }

        if let Some(square) = line.strip_prefix("moves ") {
            match Position::from_algebraic(square.trim()) {
                Ok(pos) => {
                    let targets: Vec<String> =
                        state.legal_moves_from(pos).iter().map(|p| p.to_algebraic()).collect();
                    println!("{}", targets.join(" "));
                }
                Err(e) => println!("{}", e),
            }
            continue;
        }

        let input = match MoveInput::parse(&line) {
            Ok(input) => input,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        let own_piece = state
            .board
            .piece_at(input.from)
            .is_some_and(|p| p.color == state.turn);
        if !own_piece || !state.legal_moves_from(input.from).contains(&input.to) {
            println!("Illegal move {}{}", input.from, input.to);
            continue;
        }

        let mut next = execute_move(state, input.from, input.to, input.promotion);
        while next.pending_promotion().is_some() {
            let choice = match prompt_line(lines, "Promote to (q, r, b, n): ")? {
                Some(line) => line,
                None => return Ok(None),
            };
            match choice.chars().next().map(PieceType::from_char) {
                Some(Ok(piece_type)) if piece_type.can_promote_to() => {
                    next = complete_promotion(&next, piece_type);
                }
                _ => println!("Pick one of q, r, b or n"),
            }
        }
        return Ok(Some(next));
    }
}

fn computer_turn<R: Rng>(
    state: &GameState,
    difficulty: Difficulty,
    think: Duration,
    rng: &mut R,
) -> Result<GameState> {
    let ai_move = get_ai_move_with_rng(
        &state.board,
        difficulty,
        state.turn,
        state.en_passant_target,
        rng,
    )
    .ok_or_else(|| eyre!("{} has no move in a running game", state.turn))?;

    if !think.is_zero() {
        thread::sleep(think);
    }
    let next = execute_move(state, ai_move.from, ai_move.to, ai_move.promotion);
    if let Some(mv) = next.last_move {
        println!("{} plays {}", state.turn, mv.to_coordinate());
    }
    Ok(next)
}

fn run_perft(depth: u8) {
    let board = Board::new();
    let divide = perft_divide(&board, Color::White, None, depth);
    for (mv, nodes) in divide.iter() {
        println!("{}: {}", mv.to_coordinate(), nodes);
    }
    println!("\nNodes searched: {}", divide.iter().map(|(_, n)| n).sum::<u64>());
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(args.verbose))
        .with_writer(io::stderr)
        .init();

    if let Some(depth) = args.perft {
        run_perft(depth);
        return Ok(());
    }

    let difficulty = Difficulty::from_level(args.difficulty)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let think = Duration::from_millis(args.think_ms);
    info!(
        "white: {:?}, black: {:?}, difficulty: {}",
        args.white, args.black, difficulty
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut state = GameState::new();
    let mut plies = 0;

    while !state.is_over() {
        if plies >= args.max_moves {
            warn!("stopping after {} plies", plies);
            break;
        }
        state = match args.player(state.turn) {
            Player::Human => {
                state.board.draw_to_terminal();
                print_captured(&state);
                match human_turn(&state, &mut lines)? {
                    Some(next) => next,
                    None => return Ok(()),
                }
            }
            Player::Computer => computer_turn(&state, difficulty, think, &mut rng)?,
        };
        plies += 1;

        if state.status == GameStatus::Check {
            println!("{} is in check", state.turn);
        }
    }

    print_result(&state);
    Ok(())
}
