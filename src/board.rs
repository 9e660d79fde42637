use std::fmt;

use itertools::iproduct;
use once_cell::sync::Lazy;

use crate::types::{CastleSide, Color, Move, Piece, PieceType, Position};

pub type Square = Option<Piece>;

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// Struct that caches the squares reachable in each direction from a given square,
/// nearest first. Rook rays come first, then bishop rays.
pub struct RaysFromPosition {
    pub north: Vec<Position>,
    pub south: Vec<Position>,
    pub east: Vec<Position>,
    pub west: Vec<Position>,
    pub northeast: Vec<Position>,
    pub northwest: Vec<Position>,
    pub southeast: Vec<Position>,
    pub southwest: Vec<Position>,
}

impl RaysFromPosition {
    fn walk(pos: Position, d_row: i8, d_col: i8) -> Vec<Position> {
        let mut ray = vec![];
        let mut current = pos;
        while let Some(next) = current.offset(d_row, d_col) {
            ray.push(next);
            current = next;
        }
        ray
    }

    pub fn new_from_position(pos: Position) -> Self {
        Self {
            north: Self::walk(pos, 1, 0),
            south: Self::walk(pos, -1, 0),
            east: Self::walk(pos, 0, 1),
            west: Self::walk(pos, 0, -1),
            northeast: Self::walk(pos, 1, 1),
            northwest: Self::walk(pos, 1, -1),
            southeast: Self::walk(pos, -1, 1),
            southwest: Self::walk(pos, -1, -1),
        }
    }

    /// Orthogonal rays, the ones a rook slides along
    pub fn straight(&self) -> [&Vec<Position>; 4] {
        [&self.north, &self.south, &self.east, &self.west]
    }

    /// Diagonal rays, the ones a bishop slides along
    pub fn diagonal(&self) -> [&Vec<Position>; 4] {
        [
            &self.northeast,
            &self.northwest,
            &self.southeast,
            &self.southwest,
        ]
    }
}

pub struct RaysForBoard {
    pub positions: Vec<Vec<RaysFromPosition>>,
}

impl RaysForBoard {
    pub fn new() -> Self {
        let positions = (0..8)
            .map(|row| {
                (0..8)
                    .map(|col| RaysFromPosition::new_from_position(Position::new(row, col)))
                    .collect()
            })
            .collect();
        RaysForBoard { positions }
    }

    pub fn from_position(&self, pos: Position) -> &RaysFromPosition {
        &self.positions[pos.row as usize][pos.col as usize]
    }
}

impl Default for RaysForBoard {
    fn default() -> Self {
        Self::new()
    }
}

pub static RAYS: Lazy<RaysForBoard> = Lazy::new(RaysForBoard::new);

/// An 8x8 grid of squares. Row 0 is white's back rank, row 7 is black's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    squares: [[Square; 8]; 8],
}

impl Board {
    /// Standard starting arrangement
    pub fn new() -> Board {
        let mut board = Board::empty();
        for color in [Color::White, Color::Black] {
            for (col, piece_type) in BACK_RANK.iter().enumerate() {
                board.squares[color.back_rank() as usize][col] = Some(Piece::new(color, *piece_type));
                board.squares[color.pawn_row() as usize][col] =
                    Some(Piece::new(color, PieceType::Pawn));
            }
        }
        board
    }

    pub fn empty() -> Board {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// Builder used to set up arbitrary positions
    pub fn with_piece(mut self, pos: Position, piece: Piece) -> Board {
        self.set(pos, Some(piece));
        self
    }

    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.squares[pos.row as usize][pos.col as usize]
    }

    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.row as usize][pos.col as usize] = square;
    }

    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.piece_at(pos).is_none()
    }

    /// All occupied squares, row by row starting from white's back rank
    pub fn iter_pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        iproduct!(0..8u8, 0..8u8).filter_map(move |(row, col)| {
            let pos = Position::new(row, col);
            self.piece_at(pos).map(|piece| (pos, piece))
        })
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.iter_pieces().filter(move |(_, p)| p.color == color)
    }

    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces_of(color)
            .find(|(_, p)| p.piece_type == PieceType::King)
            .map(|(pos, _)| pos)
    }

    /// Play `mv` on a copy of the board. Handles the en passant capture, the rook
    /// hop when castling, and the promotion piece when one is set on the move.
    /// The board itself is left as it is.
    pub fn apply_move(&self, mv: &Move) -> Board {
        let mut board = *self;
        board.set(mv.from, None);

        if mv.en_passant {
            board.set(Position::new(mv.from.row, mv.to.col), None);
        }

        if let Some(side) = mv.castle {
            let row = mv.from.row;
            let rook_from = Position::new(row, side.rook_from_col());
            let rook_to = Position::new(row, side.rook_to_col());
            if let Some(rook) = board.piece_at(rook_from) {
                board.set(rook_from, None);
                board.set(rook_to, Some(rook.moved()));
            }
        }

        let placed = match mv.promotion {
            Some(piece_type) => Piece {
                piece_type,
                ..mv.piece
            },
            None => mv.piece,
        };
        board.set(mv.to, Some(placed.moved()));
        board
    }

    /// Which side a king move castles to, if it is a castling move at all
    pub fn castle_side_for(piece: &Piece, from: Position, to: Position) -> Option<CastleSide> {
        if piece.piece_type != PieceType::King || from.row != to.row {
            return None;
        }
        match to.col as i8 - from.col as i8 {
            2 => Some(CastleSide::Kingside),
            -2 => Some(CastleSide::Queenside),
            _ => None,
        }
    }

    pub fn draw_board(&self) -> String {
        let mut string = String::new();
        for row in (0..8).rev() {
            string.push_str(&format!("{} ", row + 1));
            for col in 0..8 {
                let symbol = match self.piece_at(Position::new(row, col)) {
                    Some(p) => p.to_symbol(),
                    None => ".",
                };
                string.push_str(&format!(" {}", symbol));
            }
            string.push('\n');
        }
        string.push_str("   a b c d e f g h\n");
        string
    }

    pub fn draw_to_terminal(&self) {
        println!("{}", self.draw_board());
    }

    /// Build a board from eight rows of piece letters, black's back rank first, the
    /// way a diagram is printed. `.` is an empty square. Kings and rooks off their
    /// starting squares, and pawns off their starting row, are marked as moved.
    #[cfg(test)]
    pub(crate) fn from_diagram(rows: [&str; 8]) -> Board {
        let mut board = Board::empty();
        for (i, line) in rows.iter().enumerate() {
            let row = 7 - i as u8;
            for (col, c) in line.chars().filter(|c| !c.is_whitespace()).enumerate() {
                if c == '.' {
                    continue;
                }
                let mut piece = Piece::from_char(c).unwrap();
                piece.has_moved = match piece.piece_type {
                    PieceType::Pawn => row != piece.color.pawn_row(),
                    PieceType::King => row != piece.color.back_rank() || col != 4,
                    PieceType::Rook => row != piece.color.back_rank() || (col != 0 && col != 7),
                    _ => false,
                };
                board.set(Position::new(row, col as u8), Some(piece));
            }
        }
        board
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.draw_board())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    #[test]
    fn build_starting_board() {
        let b = Board::new();
        b.draw_to_terminal();

        assert_eq!(b.iter_pieces().count(), 32);
        assert_eq!(b.pieces_of(Color::White).count(), 16);
        assert_eq!(b.pieces_of(Color::Black).count(), 16);

        assert_eq!(
            b.piece_at(pos("e1")),
            Some(Piece::new(Color::White, PieceType::King))
        );
        assert_eq!(
            b.piece_at(pos("d8")),
            Some(Piece::new(Color::Black, PieceType::Queen))
        );
        assert_eq!(
            b.piece_at(pos("a2")),
            Some(Piece::new(Color::White, PieceType::Pawn))
        );
        assert_eq!(
            b.piece_at(pos("h7")),
            Some(Piece::new(Color::Black, PieceType::Pawn))
        );
        assert!(b.is_empty_at(pos("e4")));
        assert!(b.iter_pieces().all(|(_, p)| !p.has_moved));
    }

    #[test]
    fn test_find_king() {
        let b = Board::new();
        assert_eq!(b.find_king(Color::White), Some(pos("e1")));
        assert_eq!(b.find_king(Color::Black), Some(pos("e8")));
        assert_eq!(Board::empty().find_king(Color::White), None);
    }

    #[test]
    fn test_rays_from_corner() {
        let rays = RAYS.from_position(pos("a1"));
        assert_eq!(rays.north.len(), 7);
        assert_eq!(rays.east.len(), 7);
        assert_eq!(rays.northeast.len(), 7);
        assert!(rays.south.is_empty());
        assert!(rays.west.is_empty());
        assert!(rays.southwest.is_empty());
        assert_eq!(rays.northeast[0], pos("b2"));
        assert_eq!(rays.northeast[6], pos("h8"));
    }

    #[test]
    fn test_rays_from_center() {
        let rays = RAYS.from_position(pos("d4"));
        assert_eq!(rays.north.len(), 4);
        assert_eq!(rays.south.len(), 3);
        assert_eq!(rays.northwest.len(), 3);
        assert_eq!(rays.southeast.len(), 3);
        assert_eq!(rays.west[0], pos("c4"));
    }

    #[test]
    fn test_apply_move_leaves_original_untouched() {
        let b = Board::new();
        let pawn = b.piece_at(pos("e2")).unwrap();
        let mv = Move::new(pawn, pos("e2"), pos("e4"), None);
        let after = b.apply_move(&mv);

        assert!(b.piece_at(pos("e2")).is_some());
        assert!(after.is_empty_at(pos("e2")));
        let moved = after.piece_at(pos("e4")).unwrap();
        assert_eq!(moved.piece_type, PieceType::Pawn);
        assert!(moved.has_moved);
    }

    #[test]
    fn test_apply_castle_moves_rook() {
        let b = Board::from_diagram([
            "r...k..r",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "R...K..R",
        ]);
        let king = b.piece_at(pos("e1")).unwrap();
        let mut mv = Move::new(king, pos("e1"), pos("c1"), None);
        mv.castle = Board::castle_side_for(&king, mv.from, mv.to);
        assert_eq!(mv.castle, Some(CastleSide::Queenside));

        let after = b.apply_move(&mv);
        assert!(after.is_empty_at(pos("a1")));
        assert!(after.is_empty_at(pos("e1")));
        let rook = after.piece_at(pos("d1")).unwrap();
        assert_eq!(rook.piece_type, PieceType::Rook);
        assert!(rook.has_moved);
        assert_eq!(after.piece_at(pos("c1")).unwrap().piece_type, PieceType::King);
    }

    #[test]
    fn test_apply_en_passant_removes_pawn() {
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
        let pawn = b.piece_at(pos("e5")).unwrap();
        let captured = b.piece_at(pos("d5"));
        let mut mv = Move::new(pawn, pos("e5"), pos("d6"), captured);
        mv.en_passant = true;

        let after = b.apply_move(&mv);
        assert!(after.is_empty_at(pos("d5")));
        assert!(after.is_empty_at(pos("e5")));
        assert_eq!(after.piece_at(pos("d6")).unwrap().color, Color::White);
    }

    #[test]
    fn test_apply_promotion() {
        let b = Board::from_diagram([
            "....k...",
            "P.......",
            "........",
            "........",
            "........",
            "........",
            "........",
            "....K...",
        ]);
        let pawn = b.piece_at(pos("a7")).unwrap();
        let mut mv = Move::new(pawn, pos("a7"), pos("a8"), None);
        mv.promotion = Some(PieceType::Knight);

        let after = b.apply_move(&mv);
        let promoted = after.piece_at(pos("a8")).unwrap();
        assert_eq!(promoted.piece_type, PieceType::Knight);
        assert_eq!(promoted.color, Color::White);
    }

    #[test]
    fn test_diagram_marks_moved_pieces() {
        let b = Board::from_diagram([
            "....k..r",
            "........",
            "........",
            "........",
            "....P...",
            "........",
            "P.......",
            "...K...R",
        ]);
        assert!(!b.piece_at(pos("h1")).unwrap().has_moved);
        assert!(!b.piece_at(pos("h8")).unwrap().has_moved);
        assert!(!b.piece_at(pos("e8")).unwrap().has_moved);
        assert!(b.piece_at(pos("d1")).unwrap().has_moved);
        assert!(b.piece_at(pos("e4")).unwrap().has_moved);
        assert!(!b.piece_at(pos("a2")).unwrap().has_moved);
    }

    #[test]
    fn test_draw_board() {
        let b = Board::empty()
            .with_piece(pos("e1"), Piece::new(Color::White, PieceType::King))
            .with_piece(pos("a8"), Piece::new(Color::Black, PieceType::Rook));
        let lines: Vec<String> = b.draw_board().lines().map(String::from).collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8  ♜ . . . . . . .");
        assert_eq!(lines[7], "1  . . . . ♔ . . .");
        assert_eq!(lines[8], "   a b c d e f g h");
    }
}
