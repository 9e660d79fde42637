use crate::board::Board;
use crate::movegen::all_legal_moves;
use crate::types::{Color, Piece, PieceType, Position};

pub const MATERIAL_SCALE: i32 = 100;
pub const DOUBLED_PAWN_PENALTY: i32 = 10;
pub const ISOLATED_PAWN_PENALTY: i32 = 15;
pub const KING_SHIELD_BONUS: i32 = 10;
pub const MOBILITY_WEIGHT: i32 = 2;

// Piece square tables. Row 0 is the back rank of the side being scored, so white
// reads them as they are and black reads them upside down.

#[rustfmt::skip]
const PAWN_TABLE: [[i32; 8]; 8] = [
    [  0,   0,   0,   0,   0,   0,   0,   0],
    [  5,  10,  10, -20, -20,  10,  10,   5],
    [  5,  -5, -10,   0,   0, -10,  -5,   5],
    [  0,   0,   0,  20,  20,   0,   0,   0],
    [  5,   5,  10,  25,  25,  10,   5,   5],
    [ 10,  10,  20,  30,  30,  20,  10,  10],
    [ 50,  50,  50,  50,  50,  50,  50,  50],
    [  0,   0,   0,   0,   0,   0,   0,   0],
];

#[rustfmt::skip]
const KNIGHT_TABLE: [[i32; 8]; 8] = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20,   0,   5,   5,   0, -20, -40],
    [-30,   5,  10,  15,  15,  10,   5, -30],
    [-30,   0,  15,  20,  20,  15,   0, -30],
    [-30,   5,  15,  20,  20,  15,   5, -30],
    [-30,   0,  10,  15,  15,  10,   0, -30],
    [-40, -20,   0,   0,   0,   0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

#[rustfmt::skip]
const BISHOP_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10,   5,   0,   0,   0,   0,   5, -10],
    [-10,  10,  10,  10,  10,  10,  10, -10],
    [-10,   0,  10,  10,  10,  10,   0, -10],
    [-10,   5,   5,  10,  10,   5,   5, -10],
    [-10,   0,   5,  10,  10,   5,   0, -10],
    [-10,   0,   0,   0,   0,   0,   0, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

#[rustfmt::skip]
const ROOK_TABLE: [[i32; 8]; 8] = [
    [  0,   0,   0,   5,   5,   0,   0,   0],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [ -5,   0,   0,   0,   0,   0,   0,  -5],
    [  5,  10,  10,  10,  10,  10,  10,   5],
    [  0,   0,   0,   0,   0,   0,   0,   0],
];

#[rustfmt::skip]
const QUEEN_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10,  -5,  -5, -10, -10, -20],
    [-10,   0,   5,   0,   0,   0,   0, -10],
    [-10,   5,   5,   5,   5,   5,   0, -10],
    [  0,   0,   5,   5,   5,   5,   0,  -5],
    [ -5,   0,   5,   5,   5,   5,   0,  -5],
    [-10,   0,   5,   5,   5,   5,   0, -10],
    [-10,   0,   0,   0,   0,   0,   0, -10],
    [-20, -10, -10,  -5,  -5, -10, -10, -20],
];

#[rustfmt::skip]
const KING_TABLE: [[i32; 8]; 8] = [
    [ 20,  30,  10,   0,   0,  10,  30,  20],
    [ 20,  20,   0,   0,   0,   0,  20,  20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
];

fn get_raw_pst_table(piece_type: PieceType) -> &'static [[i32; 8]; 8] {
    match piece_type {
        PieceType::Pawn => &PAWN_TABLE,
        PieceType::Knight => &KNIGHT_TABLE,
        PieceType::Bishop => &BISHOP_TABLE,
        PieceType::Rook => &ROOK_TABLE,
        PieceType::Queen => &QUEEN_TABLE,
        PieceType::King => &KING_TABLE,
    }
}

/// Table value of `piece` standing on `pos`, from the piece's own point of view
pub fn get_pst_value(piece: &Piece, pos: Position) -> i32 {
    let row = match piece.color {
        Color::White => pos.row,
        Color::Black => 7 - pos.row,
    };
    get_raw_pst_table(piece.piece_type)[row as usize][pos.col as usize]
}

/// How much of the evaluation is switched on. Each tier adds terms to the one before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluator {
    /// material only
    Material,
    /// material and piece placement
    Positional,
    /// material, placement, pawn structure, king shelter and mobility
    Full,
}

impl Evaluator {
    /// Score of `board` for `perspective`, positive when that side is better off
    pub fn evaluate(&self, board: &Board, perspective: Color) -> i32 {
        let white_score = match self {
            Evaluator::Material => material(board),
            Evaluator::Positional => material(board) + positional(board),
            Evaluator::Full => {
                material(board)
                    + positional(board)
                    + pawn_structure(board)
                    + king_safety(board)
                    + mobility(board)
            }
        };
        white_score * perspective.sign()
    }
}

// All the terms below are scored from white's point of view.

/// Sum of piece values in centipawns
pub fn material(board: &Board) -> i32 {
    board
        .iter_pieces()
        .map(|(_, p)| p.piece_type.to_material() * MATERIAL_SCALE * p.color.sign())
        .sum()
}

/// Sum of piece square table values
pub fn positional(board: &Board) -> i32 {
    board
        .iter_pieces()
        .map(|(pos, p)| get_pst_value(&p, pos) * p.color.sign())
        .sum()
}

/// Penalties for doubled and isolated pawns
pub fn pawn_structure(board: &Board) -> i32 {
    pawn_penalty(board, Color::Black) - pawn_penalty(board, Color::White)
}

fn pawn_penalty(board: &Board, color: Color) -> i32 {
    let mut files = [0i32; 8];
    for (pos, p) in board.pieces_of(color) {
        if p.piece_type == PieceType::Pawn {
            files[pos.col as usize] += 1;
        }
    }

    let mut penalty = 0;
    for (col, count) in files.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        penalty += (count - 1) * DOUBLED_PAWN_PENALTY;

        let left = col.checked_sub(1).map_or(0, |c| files[c]);
        let right = files.get(col + 1).copied().unwrap_or(0);
        if left == 0 && right == 0 {
            penalty += count * ISOLATED_PAWN_PENALTY;
        }
    }
    penalty
}

/// Bonus for pawns on the three squares in front of each king
pub fn king_safety(board: &Board) -> i32 {
    king_shield(board, Color::White) - king_shield(board, Color::Black)
}

fn king_shield(board: &Board, color: Color) -> i32 {
    let king = match board.find_king(color) {
        Some(k) => k,
        None => return 0,
    };
    let shield = [-1, 0, 1]
        .iter()
        .filter_map(|d_col| king.offset(color.forward(), *d_col))
        .filter(|pos| {
            board
                .piece_at(*pos)
                .is_some_and(|p| p.color == color && p.piece_type == PieceType::Pawn)
        })
        .count() as i32;
    shield * KING_SHIELD_BONUS
}

/// Difference in legal move counts. Computed exactly on every call, so this is by
/// far the most expensive term.
pub fn mobility(board: &Board) -> i32 {
    let white = all_legal_moves(board, Color::White, None).len() as i32;
    let black = all_legal_moves(board, Color::Black, None).len() as i32;
    (white - black) * MOBILITY_WEIGHT
}
