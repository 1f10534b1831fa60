//! nogo-mcts: a Monte Carlo Tree Search player for NoGo.
//!
//! NoGo is played on a Go board, but any move that leaves a group without
//! liberties (capturing or suicidal) is illegal, and the first player with
//! no legal move loses.
//!
//! ## Modules
//!
//! - [`constants`] - Size bounds and engine parameters
//! - [`board`] - Board representation and legality rules
//! - [`playout`] - Random game simulation
//! - [`mcts`] - Time- or playout-bounded UCT search
//! - [`session`] - Current game state used by the command layer
//! - [`gtp`] - Go Text Protocol front end
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use nogo_mcts::board::Color;
//! use nogo_mcts::session::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig {
//!     size: 5,
//!     time_limit: Duration::from_millis(300),
//!     ..SessionConfig::default()
//! })
//! .unwrap();
//!
//! let c3 = session.board().point(3, 3).unwrap();
//! session.play_move(c3, Color::Black).unwrap();
//!
//! let reply = session.generate_move(Color::White);
//! assert!(reply.is_some());
//! ```

pub mod board;
pub mod constants;
pub mod gtp;
pub mod mcts;
pub mod playout;
pub mod session;
