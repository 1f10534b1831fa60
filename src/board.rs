//! NoGo board representation and rules.
//!
//! The board is a 1D array with a one-cell border ring around the playable
//! `N×N` area, so neighbor lookups never need bounds checks. A cell at
//! 1-based `(row, col)` lives at index `row * (N + 1) + col`; consecutive
//! rows share a single border column.
//!
//! NoGo forbids any placement that leaves a group without liberties, the
//! mover's own or the opponent's. Since nothing is ever captured, playing a
//! legal move is a single write and stones are never removed.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::constants::{MAX_SIZE, MIN_SIZE};

/// A point on the board, represented as an index into the 1D board array.
pub type Point = usize;

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The other player.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// Contents of a single cell. `Border` cells form the padding ring and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stone {
    Empty,
    Black,
    White,
    Border,
}

impl From<Color> for Stone {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Stone::Black,
            Color::White => Stone::White,
        }
    }
}

/// Why a placement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("point is not on the board")]
    OffBoard,
    #[error("point is not empty")]
    Occupied,
    #[error("suicide")]
    Suicide,
    #[error("capture")]
    Capture,
}

/// Board construction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unacceptable size {0}, expected {min}..={max}", min = MIN_SIZE, max = MAX_SIZE)]
    InvalidSize(usize),
}

/// On-board orthogonal neighbors of one cell (border cells are left out).
#[derive(Debug, Clone, Copy, Default)]
struct Neighbors {
    points: [Point; 4],
    len: u8,
}

impl Neighbors {
    #[inline]
    fn as_slice(&self) -> &[Point] {
        &self.points[..self.len as usize]
    }
}

/// A NoGo position.
///
/// Cloning gives an independent grid; the adjacency table is shared
/// read-only between clones. The scratch buffers used by the liberty
/// flood fill are per-board, which is why the legality queries take
/// `&mut self` even though they leave the position unchanged.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    stride: usize,
    cells: Vec<Stone>,
    neighbors: Arc<[Neighbors]>,
    marks: Vec<u32>,
    epoch: u32,
    stack: Vec<Point>,
    candidates: Vec<Point>,
}

impl Board {
    /// Create an empty board of the given size.
    ///
    /// # Errors
    /// Returns [`BoardError::InvalidSize`] if `size` is outside `MIN_SIZE..=MAX_SIZE`.
    pub fn new(size: usize) -> Result<Self, BoardError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(BoardError::InvalidSize(size));
        }

        let stride = size + 1;
        let len = (size + 1) * (size + 2) + 1;
        let mut cells = vec![Stone::Border; len];
        for row in 1..=size {
            let start = row * stride + 1;
            cells[start..start + size].fill(Stone::Empty);
        }

        let neighbors: Arc<[Neighbors]> = (0..len)
            .map(|pt| {
                let mut nb = Neighbors::default();
                if cells[pt] == Stone::Border {
                    return nb;
                }
                for n in [pt - 1, pt + 1, pt - stride, pt + stride] {
                    if cells[n] != Stone::Border {
                        nb.points[nb.len as usize] = n;
                        nb.len += 1;
                    }
                }
                nb
            })
            .collect();

        Ok(Board {
            size,
            stride,
            cells,
            neighbors,
            marks: vec![0; len],
            epoch: 0,
            stack: Vec::with_capacity(size * size),
            candidates: Vec::with_capacity(size * size),
        })
    }

    /// Side length of the playable area.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Point index for a 1-based `(row, col)`, or `None` if it is off the board.
    pub fn point(&self, row: usize, col: usize) -> Option<Point> {
        if (1..=self.size).contains(&row) && (1..=self.size).contains(&col) {
            Some(row * self.stride + col)
        } else {
            None
        }
    }

    /// 1-based `(row, col)` of a playable point, or `None` for border/out-of-range indices.
    pub fn coords(&self, pt: Point) -> Option<(usize, usize)> {
        if self.get(pt) == Stone::Border {
            return None;
        }
        Some((pt / self.stride, pt % self.stride))
    }

    /// Contents of a cell. Indices past the end of the grid read as `Border`.
    #[inline]
    pub fn get(&self, pt: Point) -> Stone {
        self.cells.get(pt).copied().unwrap_or(Stone::Border)
    }

    /// All playable points in ascending index order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        let stride = self.stride;
        (1..=self.size).flat_map(move |row| (1..=self.size).map(move |col| row * stride + col))
    }

    /// Empty points in ascending index order.
    pub fn empty_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s == Stone::Empty)
            .map(|(pt, _)| pt)
    }

    /// On-board orthogonal neighbors of a point.
    pub fn neighbors(&self, pt: Point) -> &[Point] {
        self.neighbors
            .get(pt)
            .map(Neighbors::as_slice)
            .unwrap_or(&[])
    }

    /// Number of cells holding the given stone.
    pub fn count(&self, stone: Stone) -> usize {
        self.cells.iter().filter(|&&s| s == stone).count()
    }

    /// Check whether `color` may play at `pt`, and why not if it may not.
    ///
    /// The stone is placed tentatively and removed again before returning.
    pub fn check_move(&mut self, pt: Point, color: Color) -> Result<(), MoveError> {
        match self.get(pt) {
            Stone::Empty => {}
            Stone::Border => return Err(MoveError::OffBoard),
            Stone::Black | Stone::White => return Err(MoveError::Occupied),
        }

        self.cells[pt] = color.into();
        let result = if !self.block_has_liberty(pt) {
            Err(MoveError::Suicide)
        } else if self.captures_neighbor(pt, color.opponent()) {
            Err(MoveError::Capture)
        } else {
            Ok(())
        };
        self.cells[pt] = Stone::Empty;
        result
    }

    /// Whether `color` may play at `pt`.
    #[inline]
    pub fn is_legal(&mut self, pt: Point, color: Color) -> bool {
        self.check_move(pt, color).is_ok()
    }

    /// All legal moves for `color`, in ascending point order.
    pub fn legal_moves(&mut self, color: Color) -> Vec<Point> {
        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();
        candidates.extend(self.empty_points());
        let moves: Vec<Point> = candidates
            .iter()
            .copied()
            .filter(|&pt| self.is_legal(pt, color))
            .collect();
        self.candidates = candidates;
        moves
    }

    /// Whether `color` has at least one legal move.
    pub fn has_legal_move(&mut self, color: Color) -> bool {
        (0..self.cells.len()).any(|pt| self.cells[pt] == Stone::Empty && self.is_legal(pt, color))
    }

    /// A uniformly random legal move for `color`, or `None` if there is none.
    ///
    /// Candidates are drawn by an incremental Fisher-Yates shuffle of the
    /// empty points, so the first legal one found is uniform over all legal
    /// moves while the common case stops after a few draws.
    pub fn random_legal_move(&mut self, color: Color, rng: &mut fastrand::Rng) -> Option<Point> {
        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();
        candidates.extend(self.empty_points());

        let n = candidates.len();
        let mut found = None;
        for i in 0..n {
            let j = rng.usize(i..n);
            candidates.swap(i, j);
            if self.is_legal(candidates[i], color) {
                found = Some(candidates[i]);
                break;
            }
        }

        self.candidates = candidates;
        found
    }

    /// Place a stone without checking legality.
    ///
    /// The caller must have validated the move; NoGo moves never capture,
    /// so nothing else changes.
    #[inline]
    pub fn play(&mut self, pt: Point, color: Color) {
        debug_assert_eq!(self.get(pt), Stone::Empty, "play on non-empty point {pt}");
        self.cells[pt] = color.into();
    }

    /// Validate then play. Leaves the board untouched on error.
    pub fn play_checked(&mut self, pt: Point, color: Color) -> Result<(), MoveError> {
        self.check_move(pt, color)?;
        self.play(pt, color);
        Ok(())
    }

    /// Validate then play, reporting only whether the move was made.
    pub fn play_if_legal(&mut self, pt: Point, color: Color) -> bool {
        self.play_checked(pt, color).is_ok()
    }

    /// Whether any of `color`'s groups adjacent to `pt` has run out of liberties.
    fn captures_neighbor(&mut self, pt: Point, color: Color) -> bool {
        let stone = Stone::from(color);
        let adjacent = self.neighbors[pt];
        adjacent
            .as_slice()
            .iter()
            .any(|&nb| self.cells[nb] == stone && !self.block_has_liberty(nb))
    }

    /// Flood-fill the group containing `start` until an empty neighbor turns up.
    fn block_has_liberty(&mut self, start: Point) -> bool {
        let epoch = self.next_epoch();
        let Board {
            cells,
            neighbors,
            marks,
            stack,
            ..
        } = self;

        let color = cells[start];
        stack.clear();
        stack.push(start);
        marks[start] = epoch;

        while let Some(pt) = stack.pop() {
            for &nb in neighbors[pt].as_slice() {
                match cells[nb] {
                    Stone::Empty => return true,
                    c if c == color && marks[nb] != epoch => {
                        marks[nb] = epoch;
                        stack.push(nb);
                    }
                    _ => {}
                }
            }
        }
        false
    }

    /// Advance the visited-marker generation, clearing the markers on wraparound.
    fn next_epoch(&mut self) -> u32 {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.marks.fill(0);
            self.epoch = 1;
        }
        self.epoch
    }
}

/// Rows are printed top to bottom from row `N` down to row 1, one character
/// per cell: `X` black, `O` white, `.` empty.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (1..=self.size).rev() {
            for col in 1..=self.size {
                let ch = match self.cells[row * self.stride + col] {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    Stone::Empty => '.',
                    Stone::Border => ' ',
                };
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
