use std::fmt;

use arrayvec::ArrayVec;
use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};
use serde::{Deserialize, Serialize};

use crate::InvalidPieceIndexError;

/// Colour-code stored in a board cell.
///
/// `0` marks an empty cell; `1..=PieceKind::LEN` identifies the piece kind
/// that occupies it.
pub type ColourCode = u8;

/// Colour-code of an empty cell.
pub const EMPTY: ColourCode = 0;

/// A piece from the catalog together with its rotation state.
///
/// Pieces are immutable values: rotating returns a new `Piece` and leaves
/// the original untouched.
///
/// # Example
///
/// ```
/// use blockgrid_engine::{Piece, PieceKind};
///
/// let piece = Piece::create(2).unwrap();
/// assert_eq!(piece.kind(), PieceKind::Plus);
/// assert_eq!(piece.colour(), 3);
///
/// let rotated = piece.rotated(1);
/// assert_eq!(rotated.rotated(3), piece);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    kind: PieceKind,
    rotation: PieceRotation,
}

impl Piece {
    /// Creates a piece of the given kind in its spawn orientation.
    #[must_use]
    pub const fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: PieceRotation::SPAWN,
        }
    }

    /// Looks up a piece in the catalog by index.
    pub fn create(index: usize) -> Result<Self, InvalidPieceIndexError> {
        PieceKind::from_index(index).map(Self::new)
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub const fn colour(&self) -> ColourCode {
        self.kind.colour()
    }

    /// Returns the 3×3 footprint for the current rotation.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        FOOTPRINTS[self.kind as usize][self.rotation.as_usize()]
    }

    /// Returns a copy rotated by `quarter_turns` clockwise quarter turns.
    ///
    /// Negative values rotate counter-clockwise; the count is taken modulo 4.
    #[must_use]
    pub const fn rotated(self, quarter_turns: i32) -> Self {
        Self {
            kind: self.kind,
            rotation: self.rotation.rotated(quarter_turns),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.name(), self.rotation.0)
    }
}

/// Rotation state of a piece.
///
/// - `0`: spawn orientation
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PieceRotation(u8);

impl PieceRotation {
    pub const SPAWN: Self = Self(0);

    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        self.0
    }

    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn rotated(self, quarter_turns: i32) -> Self {
        let turns = (self.0 as i32 + quarter_turns.rem_euclid(4)).rem_euclid(4);
        Self(turns as u8)
    }

    const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for PieceRotation {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value < 4 {
            Ok(Self(value))
        } else {
            Err(format!("rotation must be 0-3, got {value}"))
        }
    }
}

impl From<PieceRotation> for u8 {
    fn from(rotation: PieceRotation) -> Self {
        rotation.0
    }
}

/// The fixed catalog of piece shapes.
///
/// The discriminant is the catalog index; the colour-code is the index plus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum PieceKind {
    Line = 0,
    C = 1,
    Plus = 2,
    Dot = 3,
    Square = 4,
    L = 5,
    J = 6,
    S = 7,
    Z = 8,
    T = 9,
    X = 10,
    Corner = 11,
    InverseCorner = 12,
    Diagonal = 13,
    Double = 14,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece kinds in the catalog (15).
    pub const LEN: usize = 15;

    pub const ALL: [Self; Self::LEN] = [
        Self::Line,
        Self::C,
        Self::Plus,
        Self::Dot,
        Self::Square,
        Self::L,
        Self::J,
        Self::S,
        Self::Z,
        Self::T,
        Self::X,
        Self::Corner,
        Self::InverseCorner,
        Self::Diagonal,
        Self::Double,
    ];

    pub fn from_index(index: usize) -> Result<Self, InvalidPieceIndexError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(InvalidPieceIndexError { index })
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn colour(self) -> ColourCode {
        self as u8 + 1
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::C => "C",
            Self::Plus => "Plus",
            Self::Dot => "Dot",
            Self::Square => "Square",
            Self::L => "L",
            Self::J => "J",
            Self::S => "S",
            Self::Z => "Z",
            Self::T => "T",
            Self::X => "X",
            Self::Corner => "Corner",
            Self::InverseCorner => "Inverse Corner",
            Self::Diagonal => "Diagonal",
            Self::Double => "Double",
        }
    }
}

/// A 3×3 occupied/empty pattern, stored row by row (`cells[dy][dx]`).
///
/// The centre cell `(1, 1)` is the anchor used for placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Footprint {
    cells: [[bool; 3]; 3],
}

impl Footprint {
    pub const SIZE: usize = 3;

    #[must_use]
    pub const fn new(cells: [[bool; 3]; 3]) -> Self {
        Self { cells }
    }

    #[must_use]
    pub const fn is_occupied(&self, dx: usize, dy: usize) -> bool {
        self.cells[dy][dx]
    }

    /// Returns the `(dx, dy)` offsets of the occupied cells, row by row.
    #[must_use]
    pub fn occupied_offsets(&self) -> ArrayVec<(usize, usize), 9> {
        let mut offsets = ArrayVec::new();
        for (dy, row) in self.cells.iter().enumerate() {
            for (dx, &cell) in row.iter().enumerate() {
                if cell {
                    offsets.push((dx, dy));
                }
            }
        }
        offsets
    }

    /// Rotates the pattern 90° clockwise.
    #[must_use]
    pub const fn rotated_clockwise(self) -> Self {
        let mut cells = [[false; 3]; 3];
        let mut y = 0;
        while y < Self::SIZE {
            let mut x = 0;
            while x < Self::SIZE {
                cells[y][x] = self.cells[Self::SIZE - 1 - x][y];
                x += 1;
            }
            y += 1;
        }
        Self { cells }
    }
}

/// Generates all 4 rotation states of a footprint by rotating 90° clockwise.
const fn footprint_rotations(footprint: Footprint) -> [Footprint; 4] {
    let mut rotations = [footprint; 4];
    let mut i = 1;
    while i < 4 {
        rotations[i] = rotations[i - 1].rotated_clockwise();
        i += 1;
    }
    rotations
}

const FOOTPRINTS: [[Footprint; 4]; PieceKind::LEN] = {
    const C: bool = true;
    const E: bool = false;
    const fn f(cells: [[bool; 3]; 3]) -> [Footprint; 4] {
        footprint_rotations(Footprint::new(cells))
    }

    [
        // Line
        f([[E, E, E], [C, C, C], [E, E, E]]),
        // C
        f([[E, E, E], [C, C, C], [C, E, C]]),
        // Plus
        f([[E, C, E], [C, C, C], [E, C, E]]),
        // Dot
        f([[E, E, E], [E, C, E], [E, E, E]]),
        // Square
        f([[C, C, E], [C, C, E], [E, E, E]]),
        // L
        f([[E, E, E], [C, C, C], [E, E, C]]),
        // J
        f([[E, E, C], [C, C, C], [E, E, E]]),
        // S
        f([[E, E, E], [E, C, C], [C, C, E]]),
        // Z
        f([[C, C, E], [E, C, C], [E, E, E]]),
        // T
        f([[C, E, E], [C, C, E], [C, E, E]]),
        // X
        f([[C, E, C], [E, C, E], [C, E, C]]),
        // Corner
        f([[E, E, E], [C, C, E], [C, E, E]]),
        // Inverse Corner
        f([[C, E, E], [C, C, E], [E, E, E]]),
        // Diagonal
        f([[C, E, E], [E, C, E], [E, E, C]]),
        // Double
        f([[E, C, E], [E, C, E], [E, E, E]]),
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_every_index() {
        for index in 0..PieceKind::LEN {
            let piece = Piece::create(index).unwrap();
            assert_eq!(piece.kind().index(), index);
            assert_eq!(usize::from(piece.colour()), index + 1);
            assert_eq!(piece.rotation(), PieceRotation::SPAWN);
        }
    }

    #[test]
    fn test_create_out_of_range() {
        let err = Piece::create(PieceKind::LEN).unwrap_err();
        assert_eq!(err.index, PieceKind::LEN);
        assert!(Piece::create(usize::MAX).is_err());
    }

    #[test]
    fn test_colour_is_never_empty() {
        for kind in PieceKind::ALL {
            assert_ne!(kind.colour(), EMPTY);
        }
    }

    #[test]
    fn test_four_quarter_turns_restore_piece() {
        for kind in PieceKind::ALL {
            let piece = Piece::new(kind);
            let turned = piece.rotated(1).rotated(1).rotated(1).rotated(1);
            assert_eq!(turned, piece, "{kind:?}");
            assert_eq!(turned.footprint(), piece.footprint(), "{kind:?}");
            assert_eq!(piece.rotated(4), piece.rotated(0));
        }
    }

    #[test]
    fn test_raw_footprint_rotation_has_period_four() {
        for kind in PieceKind::ALL {
            let footprint = Piece::new(kind).footprint();
            let turned = footprint
                .rotated_clockwise()
                .rotated_clockwise()
                .rotated_clockwise()
                .rotated_clockwise();
            assert_eq!(turned, footprint, "{kind:?}");
        }
    }

    #[test]
    fn test_rotation_preserves_colour_and_cell_count() {
        for kind in PieceKind::ALL {
            let piece = Piece::new(kind);
            let count = piece.footprint().occupied_offsets().len();
            for turns in 0..4 {
                let rotated = piece.rotated(turns);
                assert_eq!(rotated.colour(), piece.colour());
                assert_eq!(rotated.footprint().occupied_offsets().len(), count);
            }
        }
    }

    #[test]
    fn test_rotation_is_clockwise() {
        // Double points up from the centre; one clockwise turn points it right.
        let rotated = Piece::new(PieceKind::Double).rotated(1).footprint();
        assert_eq!(rotated.occupied_offsets().as_slice(), &[(1, 1), (2, 1)]);
    }

    #[test]
    fn test_negative_turns_rotate_counter_clockwise() {
        let piece = Piece::new(PieceKind::L);
        assert_eq!(piece.rotated(-1), piece.rotated(3));
        assert_eq!(piece.rotated(-5), piece.rotated(3));
        assert_eq!(piece.rotated(7), piece.rotated(3));
    }

    #[test]
    fn test_rotating_does_not_mutate_input() {
        let piece = Piece::new(PieceKind::T);
        let _rotated = piece.rotated(1);
        assert_eq!(piece.rotation(), PieceRotation::SPAWN);
    }

    #[test]
    fn test_symmetric_pieces() {
        for kind in [PieceKind::Dot, PieceKind::Plus, PieceKind::X] {
            let piece = Piece::new(kind);
            assert_eq!(piece.rotated(1).footprint(), piece.footprint(), "{kind:?}");
        }
    }

    #[test]
    fn test_piece_serialization() {
        let piece = Piece::new(PieceKind::Corner).rotated(2);
        let json = serde_json::to_string(&piece).unwrap();
        assert_eq!(json, r#"{"kind":"Corner","rotation":2}"#);
        let back: Piece = serde_json::from_str(&json).unwrap();
        assert_eq!(back, piece);

        assert!(serde_json::from_str::<Piece>(r#"{"kind":"Corner","rotation":4}"#).is_err());
    }

    #[test]
    fn test_random_kind_in_range() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let kind: PieceKind = rng.random();
            assert!(kind.index() < PieceKind::LEN);
        }
    }
}
