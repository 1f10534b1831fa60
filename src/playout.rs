//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves, alternating sides, until
//! the side to move has nothing legal left. Under NoGo that side has lost,
//! so the outcome is simply the other color.

use std::time::Instant;

use crate::board::{Board, Color};

/// Play random moves on `board` starting with `to_move` and return the winner.
///
/// The deadline, if any, is checked before every move. Returns `None` when
/// it passes mid-game; the board is then left in an arbitrary position and
/// should be thrown away.
pub fn random_playout(
    board: &mut Board,
    mut to_move: Color,
    rng: &mut fastrand::Rng,
    deadline: Option<Instant>,
) -> Option<Color> {
    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return None;
        }
        match board.random_legal_move(to_move, rng) {
            Some(pt) => {
                board.play(pt, to_move);
                to_move = to_move.opponent();
            }
            None => return Some(to_move.opponent()),
        }
    }
}
