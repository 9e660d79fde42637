use crate::board::{Board, RAYS};
use crate::types::*;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Generates moves for single squares of one board. The en passant target is the
/// square a pawn may capture onto this ply, if any.
pub struct MoveGenerator<'a> {
    board: &'a Board,
    en_passant_target: Option<Position>,
    moves: Vec<Move>,
}

impl<'a> MoveGenerator<'a> {
    pub fn new(board: &'a Board, en_passant_target: Option<Position>) -> Self {
        Self {
            board,
            en_passant_target,
            moves: Vec::with_capacity(32),
        }
    }

    /// Pseudo legal moves of the piece on `square`: they follow the piece geometry,
    /// but may leave the mover's own king in check.
    pub fn raw_moves(&mut self, square: Position) -> Vec<Move> {
        let piece = match self.board.piece_at(square) {
            Some(p) => p,
            None => return vec![],
        };
        match piece.piece_type {
            PieceType::Pawn => self.generate_pawn_moves(piece, square),
            PieceType::Knight => self.generate_step_moves(piece, square, &KNIGHT_OFFSETS),
            PieceType::Bishop => self.generate_sliding_moves(piece, square, false, true),
            PieceType::Rook => self.generate_sliding_moves(piece, square, true, false),
            PieceType::Queen => self.generate_sliding_moves(piece, square, true, true),
            PieceType::King => {
                self.generate_step_moves(piece, square, &KING_OFFSETS);
                self.generate_castling_moves(piece, square);
            }
        }
        std::mem::take(&mut self.moves)
    }

    /// Raw moves of the piece on `square` that do not leave its own king attacked
    pub fn legal_moves(&mut self, square: Position) -> Vec<Move> {
        let board = self.board;
        self.raw_moves(square)
            .into_iter()
            .filter(|m| !is_in_check(&board.apply_move(m), m.piece.color))
            .collect()
    }

    /// Push a move to `to` unless it holds a friendly piece. Returns whether a
    /// slider could keep going past `to`.
    fn push_if_reachable(&mut self, piece: Piece, from: Position, to: Position) -> bool {
        match self.board.piece_at(to) {
            Some(other) if other.color == piece.color => false,
            Some(other) => {
                self.moves.push(Move::new(piece, from, to, Some(other)));
                false
            }
            None => {
                self.moves.push(Move::new(piece, from, to, None));
                true
            }
        }
    }

    fn generate_step_moves(&mut self, piece: Piece, from: Position, offsets: &[(i8, i8)]) {
        for (d_row, d_col) in offsets {
            if let Some(to) = from.offset(*d_row, *d_col) {
                self.push_if_reachable(piece, from, to);
            }
        }
    }

    fn generate_sliding_moves(&mut self, piece: Piece, from: Position, straight: bool, diagonal: bool) {
        let rays = RAYS.from_position(from);
        let mut directions = vec![];
        if straight {
            directions.extend(rays.straight());
        }
        if diagonal {
            directions.extend(rays.diagonal());
        }
        for ray in directions {
            for to in ray {
                if !self.push_if_reachable(piece, from, *to) {
                    break;
                }
            }
        }
    }

    fn generate_pawn_moves(&mut self, piece: Piece, from: Position) {
        let forward = piece.color.forward();

        // pushes
        if let Some(one_step) = from.offset(forward, 0) {
            if self.board.is_empty_at(one_step) {
                self.moves.push(Move::new(piece, from, one_step, None));
                if from.row == piece.color.pawn_row() {
                    if let Some(two_step) = one_step.offset(forward, 0) {
                        if self.board.is_empty_at(two_step) {
                            self.moves.push(Move::new(piece, from, two_step, None));
                        }
                    }
                }
            }
        }

        // captures, including onto the en passant square
        for d_col in [-1, 1] {
            let to = match from.offset(forward, d_col) {
                Some(to) => to,
                None => continue,
            };
            match self.board.piece_at(to) {
                Some(other) if other.color != piece.color => {
                    self.moves.push(Move::new(piece, from, to, Some(other)));
                }
                Some(_) => {}
                None if self.en_passant_target == Some(to) => {
                    let passed = Position::new(from.row, to.col);
                    if let Some(other) = self.board.piece_at(passed) {
                        if other.color != piece.color && other.piece_type == PieceType::Pawn {
                            let mut mv = Move::new(piece, from, to, Some(other));
                            mv.en_passant = true;
                            self.moves.push(mv);
                        }
                    }
                }
                None => {}
            }
        }
    }

    /// Castling needs an unmoved king and rook, nothing between them, and the king
    /// must not start on, pass through or land on an attacked square.
    fn generate_castling_moves(&mut self, king: Piece, from: Position) {
        if king.has_moved || from.col != 4 {
            return;
        }
        let opponent = king.color.other_color();
        if is_square_attacked_by(self.board, from, opponent) {
            return;
        }

        for side in [CastleSide::Kingside, CastleSide::Queenside] {
            let rook_pos = Position::new(from.row, side.rook_from_col());
            let rook_ready = self.board.piece_at(rook_pos).is_some_and(|p| {
                p.piece_type == PieceType::Rook && p.color == king.color && !p.has_moved
            });
            if !rook_ready {
                continue;
            }

            let (low, high) = if rook_pos.col < from.col {
                (rook_pos.col + 1, from.col)
            } else {
                (from.col + 1, rook_pos.col)
            };
            if (low..high).any(|col| !self.board.is_empty_at(Position::new(from.row, col))) {
                continue;
            }

            let step: i8 = if rook_pos.col < from.col { -1 } else { 1 };
            let (transit, to) = match (from.offset(0, step), from.offset(0, 2 * step)) {
                (Some(transit), Some(to)) => (transit, to),
                _ => continue,
            };
            if is_square_attacked_by(self.board, transit, opponent)
                || is_square_attacked_by(self.board, to, opponent)
            {
                continue;
            }

            let mut mv = Move::new(king, from, to, None);
            mv.castle = Some(side);
            self.moves.push(mv);
        }
    }
}

/// Pseudo legal moves of the piece on `square`, ignoring check
pub fn raw_moves(board: &Board, square: Position, en_passant_target: Option<Position>) -> Vec<Move> {
    MoveGenerator::new(board, en_passant_target).raw_moves(square)
}

/// Moves of the piece on `square` that are safe to play
pub fn legal_moves(board: &Board, square: Position, en_passant_target: Option<Position>) -> Vec<Move> {
    MoveGenerator::new(board, en_passant_target).legal_moves(square)
}

/// Target squares of the piece on `square`. An empty square has none.
pub fn get_legal_moves(
    board: &Board,
    square: Position,
    en_passant_target: Option<Position>,
) -> Vec<Position> {
    legal_moves(board, square, en_passant_target)
        .iter()
        .map(|m| m.to)
        .collect()
}

/// Every legal move for the side `color`
pub fn all_legal_moves(board: &Board, color: Color, en_passant_target: Option<Position>) -> Vec<Move> {
    let mut generator = MoveGenerator::new(board, en_passant_target);
    board
        .pieces_of(color)
        .flat_map(|(pos, _)| generator.legal_moves(pos))
        .collect()
}

/// Like `all_legal_moves(..).is_empty()` but stops at the first move found
pub fn has_legal_move(board: &Board, color: Color, en_passant_target: Option<Position>) -> bool {
    let mut generator = MoveGenerator::new(board, en_passant_target);
    board
        .pieces_of(color)
        .any(|(pos, _)| !generator.legal_moves(pos).is_empty())
}

/// Is `square` attacked by any piece of `by_color`. We look outward from the square
/// for the pieces that could reach it.
pub fn is_square_attacked_by(board: &Board, square: Position, by_color: Color) -> bool {
    let is_enemy = |pos: Position, piece_type: PieceType| {
        board
            .piece_at(pos)
            .is_some_and(|p| p.color == by_color && p.piece_type == piece_type)
    };

    if KNIGHT_OFFSETS
        .iter()
        .filter_map(|(r, c)| square.offset(*r, *c))
        .any(|pos| is_enemy(pos, PieceType::Knight))
    {
        return true;
    }

    // an attacking pawn sits one row behind the square, from its own point of view
    let behind = -by_color.forward();
    if [-1, 1]
        .iter()
        .filter_map(|c| square.offset(behind, *c))
        .any(|pos| is_enemy(pos, PieceType::Pawn))
    {
        return true;
    }

    if KING_OFFSETS
        .iter()
        .filter_map(|(r, c)| square.offset(*r, *c))
        .any(|pos| is_enemy(pos, PieceType::King))
    {
        return true;
    }

    let rays = RAYS.from_position(square);
    let slider_on_ray = |ray: &Vec<Position>, kind: PieceType| {
        ray.iter()
            .find_map(|pos| board.piece_at(*pos))
            .is_some_and(|p| {
                p.color == by_color && (p.piece_type == kind || p.piece_type == PieceType::Queen)
            })
    };
    rays.straight()
        .into_iter()
        .any(|ray| slider_on_ray(ray, PieceType::Rook))
        || rays
            .diagonal()
            .into_iter()
            .any(|ray| slider_on_ray(ray, PieceType::Bishop))
}

/// Is the king of `color` attacked. A board without that king is never in check.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    match board.find_king(color) {
        Some(king) => is_square_attacked_by(board, king, color.other_color()),
        None => false,
    }
}

/// The square skipped over by a two square pawn advance, which the opponent may
/// capture onto on the very next ply
pub fn next_en_passant_target(mv: &Move) -> Option<Position> {
    if mv.piece.piece_type != PieceType::Pawn {
        return None;
    }
    let distance = mv.to.row as i8 - mv.from.row as i8;
    if distance.abs() == 2 {
        Some(Position::new(
            (mv.from.row as i8 + distance / 2) as u8,
            mv.from.col,
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn targets(board: &Board, square: &str, ep: Option<&str>) -> Vec<String> {
        let mut squares: Vec<String> = get_legal_moves(board, pos(square), ep.map(pos))
            .iter()
            .map(|p| p.to_algebraic())
            .collect();
        squares.sort();
        squares
    }

    #[test]
    fn count_legal_moves_from_start_position() {
        let b = Board::new();
        assert_eq!(all_legal_moves(&b, Color::White, None).len(), 20); // 8*2 pawn moves, 2*2 knight moves
        assert_eq!(all_legal_moves(&b, Color::Black, None).len(), 20);
    }

    #[test]
    fn test_empty_square_has_no_moves() {
        let b = Board::new();
        assert!(get_legal_moves(&b, pos("e4"), None).is_empty());
    }

    #[test]
    fn test_pawn_pushes_from_start() {
        let b = Board::new();
        assert_eq!(targets(&b, "e2", None), vec!["e3", "e4"]);
        assert_eq!(targets(&b, "d7", None), vec!["d5", "d6"]);
    }

    #[test]
    fn test_pawn_double_push_blocked() {
        // . . . . ♚ . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . ♞ . . .
        // . . . . . . . .
        // . . . . ♙ . . .
        // . . . . ♔ . . .
        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "....n...",
            "........",
            "....P...",
            "....K...",
        ]);
        assert_eq!(targets(&b, "e2", None), vec!["e3"]);

        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "........",
            "....n...",
            "....P...",
            "....K...",
        ]);
        assert!(targets(&b, "e2", None).is_empty());
    }

    #[test]
    fn test_pawn_captures_diagonally() {
        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "........",
            "...p.N..",
            "....P...",
            "....K...",
        ]);
        assert_eq!(targets(&b, "e2", None), vec!["d3", "e3", "e4"]);
    }

    #[test]
    fn test_en_passant_only_onto_target() {
        // . . . . ♚ . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . ♟︎ ♙ . . .
        // . . . . . . . .
        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "...pP...",
            "........",
            "........",
            "........",
            "....K...",
        ]);
        assert_eq!(targets(&b, "e5", None), vec!["e6"]);
        assert_eq!(targets(&b, "e5", Some("d6")), vec!["d6", "e6"]);

        let ep = legal_moves(&b, pos("e5"), Some(pos("d6")))
            .into_iter()
            .find(|m| m.to == pos("d6"))
            .unwrap();
        assert!(ep.en_passant);
        assert_eq!(ep.captured.unwrap().piece_type, PieceType::Pawn);
        assert_eq!(ep.captured.unwrap().color, Color::Black);
    }

    #[test]
    fn test_en_passant_exposing_king_is_illegal() {
        // Taking en passant would clear the fifth rank between the rook and the king
        let b = Board::from_diagram([
            "........",
            "........",
            "........",
            "K..pP..r",
            "........",
            "........",
            "........",
            "......k.",
        ]);
        assert_eq!(targets(&b, "e5", Some("d6")), vec!["e6"]);
    }

    #[test]
    fn test_knight_moves() {
        let b = Board::new();
        assert_eq!(targets(&b, "g1", None), vec!["f3", "h3"]);

        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "...N....",
            "........",
            "........",
            "....K...",
        ]);
        assert_eq!(
            targets(&b, "d4", None),
            vec!["b3", "b5", "c2", "c6", "e2", "e6", "f3", "f5"]
        );
    }

    #[test]
    fn test_rook_stops_at_blockers() {
        // The rook captures the black knight but stops before the white pawn
        let b = Board::from_diagram([
            "....k...",
            "........",
            "...n....",
            "........",
            "...R..P.",
            "........",
            "........",
            "....K...",
        ]);
        assert_eq!(
            targets(&b, "d4", None),
            vec!["a4", "b4", "c4", "d1", "d2", "d3", "d5", "d6", "e4", "f4"]
        );
    }

    #[test]
    fn test_bishop_and_queen_rays() {
        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "........",
            "........",
            ".P......",
            "B...K...",
        ]);
        assert!(targets(&b, "a1", None).is_empty());

        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "........",
            "........",
            "PP......",
            "Q...K...",
        ]);
        assert_eq!(targets(&b, "a1", None), vec!["b1", "c1", "d1"]);
    }

    #[test]
    fn test_only_one_legal_move() {
        // Here the queen is defended, the king has a single move
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . . . . . . .
        // . . ♖ . . . . .
        // . . ♕ . . . . .
        // . ♚ . . . . . .
        let b = Board::from_diagram([
            "........",
            "........",
            "........",
            "........",
            "........",
            "..R.....",
            "..Q.....",
            ".k.....K",
        ]);
        let legal_moves = all_legal_moves(&b, Color::Black, None);
        assert_eq!(legal_moves.len(), 1);

        let only_move = &legal_moves[0];
        assert_eq!(only_move.piece.piece_type, PieceType::King);
        assert_eq!(only_move.from, pos("b1"));
        assert_eq!(only_move.to, pos("a1"));
        assert!(only_move.captured.is_none());
    }

    #[test]
    fn test_pinned_piece_stays_on_ray() {
        // The bishop on d2 is pinned by the rook on d8
        let b = Board::from_diagram([
            "...r..k.",
            "........",
            "........",
            "........",
            "........",
            "........",
            "...B....",
            "...K....",
        ]);
        assert!(targets(&b, "d2", None).is_empty());

        // A pinned rook may still slide along the pin or capture the pinner
        let b = Board::from_diagram([
            "...r..k.",
            "........",
            "........",
            "........",
            "........",
            "........",
            "...R....",
            "...K....",
        ]);
        assert_eq!(
            targets(&b, "d2", None),
            vec!["d3", "d4", "d5", "d6", "d7", "d8"]
        );
    }

    #[test]
    fn test_block_check_or_capture_checker() {
        let b = Board::from_diagram([
            "....r.k.",
            "........",
            "........",
            "........",
            "........",
            "........",
            "PPP..N..",
            "....K...",
        ]);
        assert!(is_in_check(&b, Color::White));
        // the knight can only interpose on e4
        assert_eq!(targets(&b, "f2", None), vec!["e4"]);
        // the king steps off the file
        assert_eq!(targets(&b, "e1", None), vec!["d1", "d2", "f1"]);
    }

    #[test]
    fn test_king_cannot_capture_defended_piece() {
        let b = Board::from_diagram([
            "........",
            "........",
            "........",
            "........",
            "........",
            "..k.....",
            "...q....",
            "....K...",
        ]);
        assert_eq!(targets(&b, "e1", None), vec!["f1"]);
    }

    #[test]
    fn test_attack_detection() {
        let b = Board::new();
        assert!(is_square_attacked_by(&b, pos("f3"), Color::White));
        assert!(is_square_attacked_by(&b, pos("d3"), Color::White));
        assert!(!is_square_attacked_by(&b, pos("e4"), Color::White));
        assert!(is_square_attacked_by(&b, pos("f6"), Color::Black));
        assert!(!is_square_attacked_by(&b, pos("e5"), Color::Black));
        assert!(!is_in_check(&b, Color::White));
        assert!(!is_in_check(&b, Color::Black));
    }

    #[test]
    fn test_pawn_attacks_forward_only() {
        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "...P....",
            "........",
            "........",
            "....K...",
        ]);
        assert!(is_square_attacked_by(&b, pos("c5"), Color::White));
        assert!(is_square_attacked_by(&b, pos("e5"), Color::White));
        assert!(!is_square_attacked_by(&b, pos("c3"), Color::White));
        assert!(!is_square_attacked_by(&b, pos("d5"), Color::White));
    }

    #[test]
    fn test_slider_attack_blocked() {
        let b = Board::from_diagram([
            "q...k...",
            "........",
            "........",
            "........",
            "........",
            "........",
            "......p.",
            "....K..r",
        ]);
        // the queen hits e4 along the diagonal, the rook's reach stops at f1
        assert!(is_square_attacked_by(&b, pos("e4"), Color::Black));
        assert!(is_square_attacked_by(&b, pos("f1"), Color::Black));
        assert!(is_in_check(&b, Color::White));
    }

    #[test]
    fn test_castling_both_sides() {
        let b = Board::from_diagram([
            "r...k..r",
            "pppppppp",
            "........",
            "........",
            "........",
            "........",
            "PPPPPPPP",
            "R...K..R",
        ]);
        assert_eq!(targets(&b, "e1", None), vec!["c1", "d1", "f1", "g1"]);
        assert_eq!(targets(&b, "e8", None), vec!["c8", "d8", "f8", "g8"]);

        let castles: Vec<Move> = legal_moves(&b, pos("e1"), None)
            .into_iter()
            .filter(|m| m.castle.is_some())
            .collect();
        assert_eq!(castles.len(), 2);
    }

    #[test]
    fn test_cannot_castle_with_moved_pieces() {
        let mut b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "R...K..R",
        ]);
        let rook = b.piece_at(pos("h1")).unwrap();
        b.set(pos("h1"), Some(rook.moved()));
        assert_eq!(targets(&b, "e1", None), vec!["c1", "d1", "d2", "e2", "f1", "f2"]);

        let king = b.piece_at(pos("e1")).unwrap();
        b.set(pos("e1"), Some(king.moved()));
        assert_eq!(targets(&b, "e1", None), vec!["d1", "d2", "e2", "f1", "f2"]);
    }

    #[test]
    fn test_cannot_castle_through_pieces() {
        let b = Board::from_diagram([
            "....k...",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "RN..K.NR",
        ]);
        assert_eq!(targets(&b, "e1", None), vec!["d1", "d2", "e2", "f1", "f2"]);
    }

    #[test]
    fn white_cannot_castle_queenside_through_check_d1_attacked() {
        // Black rook on d8 attacks d1, the king can't pass through d1 for O-O-O
        let b = Board::from_diagram([
            "...rk...",
            "........",
            "........",
            "........",
            "........",
            "........",
            "PPP..PPP",
            "R...K..R",
        ]);
        let t = targets(&b, "e1", None);
        assert!(!t.contains(&"c1".to_string()));
        assert!(t.contains(&"g1".to_string()));
    }

    #[test]
    fn white_cannot_castle_while_in_check() {
        // Black rook on e8 gives check to white king on e1
        let b = Board::from_diagram([
            "....r..k",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "R...K..R",
        ]);
        let t = targets(&b, "e1", None);
        assert!(!t.contains(&"c1".to_string()));
        assert!(!t.contains(&"g1".to_string()));
    }

    #[test]
    fn white_cannot_castle_kingside_onto_attacked_g1() {
        // Black rook on g8 covers g1, f1 and the king's square are safe
        let b = Board::from_diagram([
            "k.....r.",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "R...K..R",
        ]);
        let t = targets(&b, "e1", None);
        assert!(t.contains(&"f1".to_string()));
        assert!(!t.contains(&"g1".to_string()));
        assert!(t.contains(&"c1".to_string()));
    }

    #[test]
    fn test_can_castle_queenside_with_b_file_attacked() {
        // Only the king's own path matters, the rook may cross an attacked b1
        let b = Board::from_diagram([
            ".r..k...",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "R...K...",
        ]);
        assert!(targets(&b, "e1", None).contains(&"c1".to_string()));
    }

    #[test]
    fn test_next_en_passant_target() {
        let b = Board::new();
        let double = legal_moves(&b, pos("e2"), None)
            .into_iter()
            .find(|m| m.to == pos("e4"))
            .unwrap();
        assert_eq!(next_en_passant_target(&double), Some(pos("e3")));

        let single = legal_moves(&b, pos("d7"), None)
            .into_iter()
            .find(|m| m.to == pos("d6"))
            .unwrap();
        assert_eq!(next_en_passant_target(&single), None);

        let double_black = legal_moves(&b, pos("d7"), None)
            .into_iter()
            .find(|m| m.to == pos("d5"))
            .unwrap();
        assert_eq!(next_en_passant_target(&double_black), Some(pos("d6")));
    }

    #[test]
    fn test_promotion_square_is_a_legal_target() {
        let b = Board::from_diagram([
            "......k.",
            "P.......",
            "........",
            "........",
            "........",
            "........",
            "........",
            "....K...",
        ]);
        let moves = legal_moves(&b, pos("a7"), None);
        assert_eq!(moves.len(), 1);
        assert!(moves[0].is_promotion_move());
        assert_eq!(moves[0].promotion, None);
    }
}
