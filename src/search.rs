use std::cmp::{max, min, Reverse};
use std::fmt;

use rand::prelude::*;
use tracing::{debug, trace};

use crate::board::Board;
use crate::evaluate::Evaluator;
use crate::movegen::{all_legal_moves, is_in_check, next_en_passant_target};
use crate::types::{Color, Move, ParseError, PieceType, Position};

pub const MIN_SCORE: i32 = -1_000_000_000;
pub const MAX_SCORE: i32 = 1_000_000_000;
/// Base score of a checkmate. The remaining depth is added on top so quicker mates
/// are preferred.
pub const MATE_SCORE: i32 = 100_000;
/// Largest random offset added to each root score on easy
pub const EASY_JITTER: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Difficulty {
    /// random legal moves
    Beginner = 1,
    /// one ply, material only, with some noise
    Easy = 2,
    /// two ply, material and piece placement
    Medium = 3,
    /// three ply, full evaluation
    Hard = 4,
}

impl Difficulty {
    pub fn from_level(level: u8) -> Result<Difficulty, ParseError> {
        match level {
            1 => Ok(Difficulty::Beginner),
            2 => Ok(Difficulty::Easy),
            3 => Ok(Difficulty::Medium),
            4 => Ok(Difficulty::Hard),
            other => Err(ParseError::Difficulty(other)),
        }
    }

    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Search depth in plies. Beginner does not search.
    pub fn depth(&self) -> u8 {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn evaluator(&self) -> Option<Evaluator> {
        match self {
            Difficulty::Beginner => None,
            Difficulty::Easy => Some(Evaluator::Material),
            Difficulty::Medium => Some(Evaluator::Positional),
            Difficulty::Hard => Some(Evaluator::Full),
        }
    }

    /// Bound of the random noise added to root scores
    pub fn jitter(&self) -> i32 {
        match self {
            Difficulty::Easy => EASY_JITTER,
            _ => 0,
        }
    }

    pub fn to_human(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_human())
    }
}

/// The move picked for the computer. `promotion` is always set when a pawn reaches
/// the last rank, so the pending promotion phase is never entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiMove {
    pub from: Position,
    pub to: Position,
    pub promotion: Option<PieceType>,
}

impl From<&Move> for AiMove {
    fn from(mv: &Move) -> Self {
        AiMove {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
        }
    }
}

/// Fixed inputs of one search, plus a node counter
pub struct SearchContext {
    pub evaluator: Evaluator,
    /// The maximizing side
    pub ai_color: Color,
    pub nodes: u64,
}

impl SearchContext {
    pub fn new(evaluator: Evaluator, ai_color: Color) -> Self {
        Self {
            evaluator,
            ai_color,
            nodes: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
}

/// Play `mv` on a copy of `board` the way the search sees it: pawns reaching the
/// last rank become queens. Returns the new board and its en passant target.
pub fn simulate_move(board: &Board, mv: &Move) -> (Board, Option<Position>) {
    let mut mv = *mv;
    if mv.is_promotion_move() && mv.promotion.is_none() {
        mv.promotion = Some(PieceType::Queen);
    }
    (board.apply_move(&mv), next_en_passant_target(&mv))
}

/// Legal moves of `color`, captures first with the most valuable victim leading.
/// The sort is stable so quiet moves keep generation order.
pub fn ordered_moves(board: &Board, color: Color, en_passant_target: Option<Position>) -> Vec<Move> {
    let mut moves = all_legal_moves(board, color, en_passant_target);
    moves.sort_by_key(|m| Reverse(m.captured.map_or(0, |p| p.piece_type.to_material())));
    moves
}

/// Minimax with alpha beta pruning. Scores are from the point of view of
/// `ctx.ai_color`, which moves when `maximizing` is true.
pub fn minimax(
    board: &Board,
    depth: u8,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    en_passant_target: Option<Position>,
    ctx: &mut SearchContext,
) -> i32 {
    ctx.nodes += 1;
    if depth == 0 {
        return ctx.evaluator.evaluate(board, ctx.ai_color);
    }

    let side = if maximizing {
        ctx.ai_color
    } else {
        ctx.ai_color.other_color()
    };
    let moves = ordered_moves(board, side, en_passant_target);

    if moves.is_empty() {
        if !is_in_check(board, side) {
            return 0;
        }
        let mate = MATE_SCORE + depth as i32;
        return if maximizing { -mate } else { mate };
    }

    if maximizing {
        let mut best = MIN_SCORE;
        for mv in moves.iter() {
            let (child, child_ep) = simulate_move(board, mv);
            let score = minimax(&child, depth - 1, alpha, beta, false, child_ep, ctx);
            best = max(best, score);
            alpha = max(alpha, score);
            if beta <= alpha {
                break;
            }
        }
        best
    } else {
        let mut best = MAX_SCORE;
        for mv in moves.iter() {
            let (child, child_ep) = simulate_move(board, mv);
            let score = minimax(&child, depth - 1, alpha, beta, true, child_ep, ctx);
            best = min(best, score);
            beta = min(beta, score);
            if beta <= alpha {
                break;
            }
        }
        best
    }
}

/// Pick a move for `side` at the given difficulty. The best root score wins and
/// the first move seen keeps ties.
pub fn search<R: Rng + ?Sized>(
    board: &Board,
    difficulty: Difficulty,
    side: Color,
    en_passant_target: Option<Position>,
    rng: &mut R,
) -> SearchResult {
    let mut moves = ordered_moves(board, side, en_passant_target);
    for mv in moves.iter_mut() {
        if mv.is_promotion_move() {
            mv.promotion = Some(PieceType::Queen);
        }
    }

    let evaluator = match difficulty.evaluator() {
        Some(evaluator) => evaluator,
        None => {
            return SearchResult {
                best_move: moves.choose(rng).copied(),
                score: 0,
                depth: 0,
                nodes: 0,
            };
        }
    };

    let depth = difficulty.depth();
    let jitter = difficulty.jitter();
    let mut ctx = SearchContext::new(evaluator, side);
    let mut best_move = None;
    let mut best_score = MIN_SCORE;

    for mv in moves.iter() {
        let (child, child_ep) = simulate_move(board, mv);
        let mut score = minimax(&child, depth - 1, MIN_SCORE, MAX_SCORE, false, child_ep, &mut ctx);
        if jitter > 0 {
            score += rng.gen_range(-jitter..=jitter);
        }
        trace!("{} scores {}", mv.to_coordinate(), score);
        if best_move.is_none() || score > best_score {
            best_score = score;
            best_move = Some(*mv);
        }
    }

    SearchResult {
        best_move,
        score: best_score,
        depth,
        nodes: ctx.nodes,
    }
}

/// Move for the computer playing `side`, or `None` when it has no legal move
pub fn get_ai_move(
    board: &Board,
    difficulty: Difficulty,
    side: Color,
    en_passant_target: Option<Position>,
) -> Option<AiMove> {
    get_ai_move_with_rng(board, difficulty, side, en_passant_target, &mut thread_rng())
}

/// [`get_ai_move`] with a caller supplied random source, for reproducible games
pub fn get_ai_move_with_rng<R: Rng + ?Sized>(
    board: &Board,
    difficulty: Difficulty,
    side: Color,
    en_passant_target: Option<Position>,
    rng: &mut R,
) -> Option<AiMove> {
    let result = search(board, difficulty, side, en_passant_target, rng);
    match &result.best_move {
        Some(mv) => debug!(
            "{} {} plays {} (score {}, {} nodes)",
            difficulty,
            side,
            mv.to_coordinate(),
            result.score,
            result.nodes
        ),
        None => debug!("{} has no legal move", side),
    }
    result.best_move.as_ref().map(AiMove::from)
}
