use std::fmt;

use thiserror::Error;

/// Errors raised when reading user supplied text (squares, moves, levels).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("algebraic square must be two characters like `e4`, got `{0}`")]
    Square(String),
    #[error("move must look like `e2e4` or `e7e8q`, got `{0}`")]
    Move(String),
    #[error("unrecognized piece type `{0}`")]
    PieceType(char),
    #[error("difficulty must be between 1 and 4, got {0}")]
    Difficulty(u8),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn other_color(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn to_human(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    /// Row holding this side's king and rooks at the start of the game
    pub fn back_rank(&self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Row this side's pawns start on
    pub fn pawn_row(&self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Row direction this side's pawns advance in
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// +1 for white, -1 for black. Used to sign evaluation terms.
    pub fn sign(&self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_human())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    pub fn from_char(c: char) -> Result<PieceType, ParseError> {
        match c.to_ascii_lowercase() {
            'p' => Ok(PieceType::Pawn),
            'n' => Ok(PieceType::Knight),
            'b' => Ok(PieceType::Bishop),
            'r' => Ok(PieceType::Rook),
            'q' => Ok(PieceType::Queen),
            'k' => Ok(PieceType::King),
            other => Err(ParseError::PieceType(other)),
        }
    }

    /// Is the piece a sliding piece (one which can move multiple square in a given direction)
    pub fn is_sliding(&self) -> bool {
        matches!(self, PieceType::Rook | PieceType::Bishop | PieceType::Queen)
    }

    pub fn to_human(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// Material value in pawns. The king is never traded so it counts for nothing.
    pub fn to_material(&self) -> i32 {
        match self {
            Self::Pawn => 1,
            Self::Knight => 3,
            Self::Bishop => 3,
            Self::Rook => 5,
            Self::Queen => 9,
            Self::King => 0,
        }
    }

    pub fn can_promote_to(&self) -> bool {
        PIECES_CAN_PROMOTE_TO.contains(self)
    }
}

pub const PIECES_CAN_PROMOTE_TO: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Position {
    pub row: u8, // 0 is white's back rank
    pub col: u8, // 0 is the a-file
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Position {
        Position { row, col }
    }

    pub fn from_algebraic(s: &str) -> Result<Position, ParseError> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseError::Square(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase();
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(ParseError::Square(s.to_string()));
        }
        Ok(Position {
            row: rank - b'1',
            col: file - b'a',
        })
    }

    pub fn to_algebraic(&self) -> String {
        format!("{}{}", (b'a' + self.col) as char, (b'1' + self.row) as char)
    }

    /// The position `(d_row, d_col)` away, if it is still on the board
    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<Position> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_algebraic())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Piece {
    pub color: Color,
    pub piece_type: PieceType,
    pub has_moved: bool,
}

impl Piece {
    pub const fn new(color: Color, piece_type: PieceType) -> Piece {
        Piece {
            color,
            piece_type,
            has_moved: false,
        }
    }

    /// Uppercase for white, lowercase for black
    pub fn from_char(c: char) -> Result<Piece, ParseError> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Ok(Piece::new(color, PieceType::from_char(c)?))
    }

    pub fn moved(self) -> Piece {
        Piece {
            has_moved: true,
            ..self
        }
    }

    pub fn to_symbol(&self) -> &'static str {
        match (self.color, self.piece_type) {
            (Color::White, PieceType::Pawn) => "♙",
            (Color::White, PieceType::Knight) => "♘",
            (Color::White, PieceType::Bishop) => "♗",
            (Color::White, PieceType::Rook) => "♖",
            (Color::White, PieceType::Queen) => "♕",
            (Color::White, PieceType::King) => "♔",
            (Color::Black, PieceType::Pawn) => "♟︎",
            (Color::Black, PieceType::Knight) => "♞",
            (Color::Black, PieceType::Bishop) => "♝",
            (Color::Black, PieceType::Rook) => "♜",
            (Color::Black, PieceType::Queen) => "♛",
            (Color::Black, PieceType::King) => "♚",
        }
    }

    pub fn to_char(&self) -> char {
        let c = self.piece_type.to_char();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    /// Column the rook starts on
    pub fn rook_from_col(&self) -> u8 {
        match self {
            CastleSide::Kingside => 7,
            CastleSide::Queenside => 0,
        }
    }

    /// Column the rook lands on, next to the king
    pub fn rook_to_col(&self) -> u8 {
        match self {
            CastleSide::Kingside => 5,
            CastleSide::Queenside => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub piece: Piece,
    pub from: Position,
    pub to: Position,
    pub captured: Option<Piece>,
    pub en_passant: bool,
    pub castle: Option<CastleSide>,
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(piece: Piece, from: Position, to: Position, captured: Option<Piece>) -> Self {
        Self {
            piece,
            from,
            to,
            captured,
            en_passant: false,
            castle: None,
            promotion: None,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Does this move put a pawn on the far back rank
    pub fn is_promotion_move(&self) -> bool {
        self.piece.piece_type == PieceType::Pawn
            && self.to.row == self.piece.color.other_color().back_rank()
    }

    pub fn to_human(&self) -> String {
        if let Some(side) = self.castle {
            return match side {
                CastleSide::Kingside => format!("{} castles kingside", self.piece.color),
                CastleSide::Queenside => format!("{} castles queenside", self.piece.color),
            };
        }
        let maybe_capture_str = match self.captured {
            Some(p) => format!(
                " capturing {} {}{}",
                p.color,
                p.piece_type.to_human(),
                if self.en_passant { " en passant" } else { "" }
            ),
            None => "".to_string(),
        };
        let maybe_promotion_str = match self.promotion {
            Some(promoted_to_type) => format!(" promoting to {}", promoted_to_type.to_human()),
            None => "".to_string(),
        };
        format!(
            "{} moves {} from {} to {}{}{}",
            self.piece.color,
            self.piece.piece_type.to_human(),
            self.from,
            self.to,
            maybe_capture_str,
            maybe_promotion_str,
        )
    }

    /// Coordinate notation, eg `e2e4` or `e7e8q`
    pub fn to_coordinate(&self) -> String {
        format!(
            "{}{}{}",
            self.from,
            self.to,
            match self.promotion {
                Some(p) => p.to_char().to_ascii_lowercase().to_string(),
                None => "".to_string(),
            }
        )
    }
}

/// A move as typed by a player: two squares and an optional promotion choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveInput {
    pub from: Position,
    pub to: Position,
    pub promotion: Option<PieceType>,
}

impl MoveInput {
    /// Parse coordinate notation such as `e2e4` or `e7e8q`
    pub fn parse(s: &str) -> Result<MoveInput, ParseError> {
        let s = s.trim();
        if !(4..=5).contains(&s.len()) || !s.is_ascii() {
            return Err(ParseError::Move(s.to_string()));
        }
        let from = Position::from_algebraic(&s[0..2]).map_err(|_| ParseError::Move(s.to_string()))?;
        let to = Position::from_algebraic(&s[2..4]).map_err(|_| ParseError::Move(s.to_string()))?;
        let promotion = match s[4..].chars().next() {
            Some(c) => {
                let piece_type = PieceType::from_char(c)?;
                if !piece_type.can_promote_to() {
                    return Err(ParseError::Move(s.to_string()));
                }
                Some(piece_type)
            }
            None => None,
        };
        Ok(MoveInput {
            from,
            to,
            promotion,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate)
    }
}
