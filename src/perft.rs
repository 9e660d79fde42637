use crate::board::Board;
use crate::movegen::{all_legal_moves, next_en_passant_target};
use crate::types::{Color, Move, Position, PIECES_CAN_PROMOTE_TO};

/// Every move `side` can make, with promotions expanded into one move per piece choice
fn expanded_moves(board: &Board, side: Color, en_passant_target: Option<Position>) -> Vec<Move> {
    let mut moves = Vec::new();
    for mv in all_legal_moves(board, side, en_passant_target) {
        if mv.is_promotion_move() {
            moves.extend(PIECES_CAN_PROMOTE_TO.iter().map(|&p| Move {
                promotion: Some(p),
                ..mv
            }));
        } else {
            moves.push(mv);
        }
    }
    moves
}

/// Count the leaf nodes of the move tree `depth` plies deep
///
/// https://www.chessprogramming.org/Perft_Results
pub fn perft(board: &Board, side: Color, en_passant_target: Option<Position>, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = expanded_moves(board, side, en_passant_target);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for m in moves {
        let b = board.apply_move(&m);
        nodes += perft(&b, side.other_color(), next_en_passant_target(&m), depth - 1);
    }
    nodes
}

/// Node count below each root move, in generation order
pub fn perft_divide(
    board: &Board,
    side: Color,
    en_passant_target: Option<Position>,
    depth: u8,
) -> Vec<(Move, u64)> {
    if depth == 0 {
        return vec![];
    }
    expanded_moves(board, side, en_passant_target)
        .into_iter()
        .map(|m| {
            let b = board.apply_move(&m);
            let nodes = perft(&b, side.other_color(), next_en_passant_target(&m), depth - 1);
            (m, nodes)
        })
        .collect()
}
