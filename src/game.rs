use tracing::{debug, info};

use crate::board::Board;
use crate::movegen::{get_legal_moves, has_legal_move, is_in_check, next_en_passant_target};
use crate::types::*;

/// Where the game is in the move cycle. A pawn that reaches the last rank without
/// a promotion choice parks the game in `AwaitingPromotion` until
/// [`complete_promotion`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingMove,
    AwaitingPromotion(Position),
}

/// A square picked by the player and the squares its piece can move to. This is
/// a convenience cache for front ends, the move generator stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub square: Position,
    pub targets: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    // who's move it is
    pub turn: Color,
    pub status: GameStatus,
    pub phase: Phase,
    pub selection: Option<Selection>,
    pub last_move: Option<Move>,
    /// Square a pawn may capture onto en passant. Only set for the ply right after a
    /// two square pawn advance.
    pub en_passant_target: Option<Position>,
    /// White pieces taken so far, cheapest first
    pub white_captured: Vec<Piece>,
    /// Black pieces taken so far, cheapest first
    pub black_captured: Vec<Piece>,
    pub winner: Option<Color>,
}

impl GameState {
    /// A fresh game from the standard starting position, white to move
    pub fn new() -> Self {
        GameState::from_board(Board::new(), Color::White)
    }

    /// A game starting from an arbitrary position with `turn` to move
    pub fn from_board(board: Board, turn: Color) -> Self {
        let (status, winner) = game_status(&board, turn, None);
        GameState {
            board,
            turn,
            status,
            phase: Phase::AwaitingMove,
            selection: None,
            last_move: None,
            en_passant_target: None,
            white_captured: vec![],
            black_captured: vec![],
            winner,
        }
    }

    pub fn pending_promotion(&self) -> Option<Position> {
        match self.phase {
            Phase::AwaitingPromotion(square) => Some(square),
            Phase::AwaitingMove => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Pieces of `color` that have been captured
    pub fn captured_pieces(&self, color: Color) -> &[Piece] {
        match color {
            Color::White => &self.white_captured,
            Color::Black => &self.black_captured,
        }
    }

    /// Legal target squares for the piece on `square`, given this game's en passant state
    pub fn legal_moves_from(&self, square: Position) -> Vec<Position> {
        get_legal_moves(&self.board, square, self.en_passant_target)
    }

    /// Copy of the state with `square` selected. Selecting an empty square, an
    /// opponent piece, or anything once the game is over clears the selection.
    pub fn select(&self, square: Position) -> GameState {
        let own_piece = self
            .board
            .piece_at(square)
            .is_some_and(|p| p.color == self.turn);
        let selection = if own_piece && self.phase == Phase::AwaitingMove && !self.is_over() {
            Some(Selection {
                square,
                targets: self.legal_moves_from(square),
            })
        } else {
            None
        };
        GameState {
            selection,
            ..self.clone()
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Status of `side_to_move` on `board`, and the winner if the game is decided
pub fn game_status(
    board: &Board,
    side_to_move: Color,
    en_passant_target: Option<Position>,
) -> (GameStatus, Option<Color>) {
    let in_check = is_in_check(board, side_to_move);
    if has_legal_move(board, side_to_move, en_passant_target) {
        if in_check {
            (GameStatus::Check, None)
        } else {
            (GameStatus::Playing, None)
        }
    } else if in_check {
        (GameStatus::Checkmate, Some(side_to_move.other_color()))
    } else {
        (GameStatus::Stalemate, None)
    }
}

/// Play the piece on `from` to `to`. Returns the next state; `state` is untouched.
///
/// The move is expected to come from the move generator. Nothing is checked beyond
/// the presence of a piece on `from`: with no piece there, once the game is over, or
/// while a promotion is pending, the state is returned unchanged.
///
/// A pawn reaching the last rank with `promotion` set to `None` is placed, but the
/// turn does not pass until [`complete_promotion`] is called.
pub fn execute_move(
    state: &GameState,
    from: Position,
    to: Position,
    promotion: Option<PieceType>,
) -> GameState {
    if state.is_over() || state.pending_promotion().is_some() {
        return state.clone();
    }
    let piece = match state.board.piece_at(from) {
        Some(p) => p,
        None => return state.clone(),
    };

    let mut mv = Move::new(piece, from, to, state.board.piece_at(to));

    // a pawn moving diagonally onto the empty en passant square takes the pawn beside it
    if piece.piece_type == PieceType::Pawn
        && state.en_passant_target == Some(to)
        && state.board.is_empty_at(to)
        && from.col != to.col
    {
        mv.en_passant = true;
        mv.captured = state.board.piece_at(Position::new(from.row, to.col));
    }

    mv.castle = Board::castle_side_for(&piece, from, to);

    let mut next = GameState {
        board: state.board.apply_move(&mv),
        selection: None,
        last_move: Some(mv),
        ..state.clone()
    };

    if mv.is_promotion_move() {
        match promotion {
            None => {
                debug!("{} awaits a promotion choice", to);
                next.phase = Phase::AwaitingPromotion(to);
                return next;
            }
            Some(choice) => {
                mv = promote(&mut next.board, mv, choice);
                next.last_move = Some(mv);
            }
        }
    }

    finish_turn(next, &mv)
}

/// Resolve a pending promotion with `choice` and hand the turn over. Anything
/// other than a queen, rook, bishop or knight becomes a queen. Without a pending
/// promotion the state is returned unchanged.
pub fn complete_promotion(state: &GameState, choice: PieceType) -> GameState {
    let square = match state.phase {
        Phase::AwaitingPromotion(square) => square,
        Phase::AwaitingMove => return state.clone(),
    };
    let mut next = state.clone();
    let mv = match state.last_move {
        Some(mv) if mv.to == square => promote(&mut next.board, mv, choice),
        _ => return state.clone(),
    };
    next.last_move = Some(mv);
    finish_turn(next, &mv)
}

fn promote(board: &mut Board, mut mv: Move, choice: PieceType) -> Move {
    let choice = if choice.can_promote_to() {
        choice
    } else {
        PieceType::Queen
    };
    board.set(
        mv.to,
        Some(Piece {
            piece_type: choice,
            ..mv.piece.moved()
        }),
    );
    mv.promotion = Some(choice);
    mv
}

/// Bookkeeping once a move is fully on the board: en passant target, captured
/// pieces, turn and status.
fn finish_turn(mut state: GameState, mv: &Move) -> GameState {
    state.en_passant_target = next_en_passant_target(mv);

    if let Some(captured) = mv.captured {
        let list = match captured.color {
            Color::White => &mut state.white_captured,
            Color::Black => &mut state.black_captured,
        };
        list.push(captured);
        list.sort_by_key(|p| p.piece_type.to_material());
    }

    state.turn = mv.piece.color.other_color();
    state.phase = Phase::AwaitingMove;
    let (status, winner) = game_status(&state.board, state.turn, state.en_passant_target);
    state.status = status;
    state.winner = winner;

    debug!("{} ({})", mv.to_human(), mv.to_coordinate());
    if status.is_terminal() {
        match winner {
            Some(color) => info!("checkmate, {} wins", color),
            None => info!("stalemate"),
        }
    }
    state
}
