//! Game state shared with the command layer.
//!
//! A [`Session`] owns the authoritative board, the side to move and the
//! per-move time budget. Searches run on a private copy; the board only
//! changes once a move has been chosen or accepted.

use std::time::Duration;

use tracing::{debug, info};

use crate::board::{Board, BoardError, Color, MoveError, Point};
use crate::constants::{DEFAULT_SIZE, DEFAULT_TIME_LIMIT, MIN_SEARCH_TIME, TIME_EPSILON};
use crate::mcts::{Budget, Search, SearchConfig};

/// Startup settings for a [`Session`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Initial board size
    pub size: usize,
    /// Wall-clock budget per generated move
    pub time_limit: Duration,
    /// Headroom kept back from `time_limit`
    pub time_epsilon: Duration,
    pub search: SearchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            time_limit: Duration::from_secs_f64(DEFAULT_TIME_LIMIT),
            time_epsilon: Duration::from_secs_f64(TIME_EPSILON),
            search: SearchConfig::default(),
        }
    }
}

/// The current game: board, side to move and search settings.
pub struct Session {
    board: Board,
    to_move: Color,
    time_limit: Duration,
    time_epsilon: Duration,
    search: Search,
}

impl Session {
    /// Start a session on an empty board, black to move.
    ///
    /// # Errors
    /// Fails if `config.size` is not a supported board size.
    pub fn new(config: SessionConfig) -> Result<Self, BoardError> {
        Ok(Self {
            board: Board::new(config.size)?,
            to_move: Color::Black,
            time_limit: config.time_limit,
            time_epsilon: config.time_epsilon,
            search: Search::new(&config.search),
        })
    }

    /// Replace the board with an empty one of a new size, black to move.
    ///
    /// On error the current game is kept.
    pub fn set_board_size(&mut self, size: usize) -> Result<(), BoardError> {
        self.board = Board::new(size)?;
        self.to_move = Color::Black;
        info!(size, "board size set");
        Ok(())
    }

    /// Empty the board and give black the move.
    pub fn clear(&mut self) {
        // Sizes already held by a board are always valid.
        if let Ok(board) = Board::new(self.board.size()) {
            self.board = board;
        }
        self.to_move = Color::Black;
    }

    #[inline]
    pub fn board_size(&self) -> usize {
        self.board.size()
    }

    /// Read-only view of the authoritative board.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    #[inline]
    pub fn current_side(&self) -> Color {
        self.to_move
    }

    pub fn set_time_limit(&mut self, limit: Duration) {
        self.time_limit = limit;
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Legal moves for `color` in ascending point order.
    pub fn legal_moves(&self, color: Color) -> Vec<Point> {
        self.board.clone().legal_moves(color)
    }

    /// Play `color` at `pt`; on success the other side is to move.
    ///
    /// An illegal move leaves the session unchanged.
    pub fn play_move(&mut self, pt: Point, color: Color) -> Result<(), MoveError> {
        self.board.play_checked(pt, color)?;
        self.to_move = color.opponent();
        Ok(())
    }

    /// Search for a move for `color`, play it, and return it.
    ///
    /// Returns `None`, leaving the session unchanged, when no move was found.
    pub fn generate_move(&mut self, color: Color) -> Option<Point> {
        let budget = Budget::Time(self.search_time());
        self.generate_move_with(color, budget)
    }

    /// [`generate_move`](Self::generate_move) with an explicit budget.
    pub fn generate_move_with(&mut self, color: Color, budget: Budget) -> Option<Point> {
        let result = self.search.run(&self.board, color, budget);
        let mv = result.best?;
        self.board.play(mv, color);
        self.to_move = color.opponent();
        debug!(%color, mv, playouts = result.playouts, "move generated");
        Some(mv)
    }

    /// The winner, once the side to move has no legal move left.
    pub fn winner(&self) -> Option<Color> {
        let mut board = self.board.clone();
        (!board.has_legal_move(self.to_move)).then(|| self.to_move.opponent())
    }

    /// Time limit minus headroom, never below a small floor.
    fn search_time(&self) -> Duration {
        self.time_limit
            .saturating_sub(self.time_epsilon)
            .max(Duration::from_secs_f64(MIN_SEARCH_TIME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Stone;

    fn seeded(size: usize) -> Session {
        Session::new(SessionConfig {
            size,
            search: SearchConfig {
                seed: Some(17),
                ..SearchConfig::default()
            },
            ..SessionConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let session = Session::new(SessionConfig::default()).unwrap();
        assert_eq!(session.board_size(), DEFAULT_SIZE);
        assert_eq!(session.current_side(), Color::Black);
        assert_eq!(session.time_limit(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_size_keeps_game() {
        let mut session = seeded(5);
        let p = session.board().point(3, 3).unwrap();
        session.play_move(p, Color::Black).unwrap();
        assert_eq!(session.set_board_size(30), Err(BoardError::InvalidSize(30)));
        assert_eq!(session.board_size(), 5);
        assert_eq!(session.board().get(p), Stone::Black);
        assert!(Session::new(SessionConfig { size: 1, ..SessionConfig::default() }).is_err());
    }

    #[test]
    fn test_play_flips_side() {
        let mut session = seeded(5);
        let p = session.board().point(2, 2).unwrap();
        assert!(session.play_move(p, Color::Black).is_ok());
        assert_eq!(session.current_side(), Color::White);
        assert_eq!(session.play_move(p, Color::White), Err(MoveError::Occupied));
        assert_eq!(session.current_side(), Color::White);
    }

    #[test]
    fn test_clear_and_resize() {
        let mut session = seeded(5);
        let p = session.board().point(1, 1).unwrap();
        session.play_move(p, Color::Black).unwrap();
        session.clear();
        assert_eq!(session.board().get(p), Stone::Empty);
        assert_eq!(session.current_side(), Color::Black);

        session.play_move(p, Color::Black).unwrap();
        session.set_board_size(9).unwrap();
        assert_eq!(session.board_size(), 9);
        assert_eq!(session.board().count(Stone::Empty), 81);
        assert_eq!(session.current_side(), Color::Black);
    }

    #[test]
    fn test_generate_move_plays_it() {
        let mut session = seeded(4);
        let mv = session
            .generate_move_with(Color::Black, Budget::Playouts(100))
            .unwrap();
        assert_eq!(session.board().get(mv), Stone::Black);
        assert_eq!(session.current_side(), Color::White);
        assert_eq!(session.board().count(Stone::Black), 1);
    }

    #[test]
    fn test_generate_move_none_leaves_state() {
        let mut session = seeded(2);
        let a = session.board().point(1, 1).unwrap();
        let b = session.board().point(2, 2).unwrap();
        session.play_move(a, Color::Black).unwrap();
        session.play_move(b, Color::Black).unwrap();
        let before = session.board().to_string();
        assert_eq!(session.generate_move(Color::White), None);
        assert_eq!(session.board().to_string(), before);
        assert_eq!(session.winner(), Some(Color::Black));
    }

    #[test]
    fn test_search_time_headroom() {
        let mut session = seeded(3);
        session.set_time_limit(Duration::from_secs(2));
        assert_eq!(session.search_time(), Duration::from_millis(1900));
        session.set_time_limit(Duration::from_millis(50));
        assert_eq!(session.search_time(), Duration::from_millis(10));
    }

    #[test]
    fn test_legal_moves_matches_board() {
        let mut session = seeded(3);
        let p = session.board().point(2, 2).unwrap();
        session.play_move(p, Color::Black).unwrap();
        let moves = session.legal_moves(Color::White);
        assert_eq!(moves.len(), 8);
        assert!(!moves.contains(&p));
        assert_eq!(session.winner(), None);
    }
}
