//! Go Text Protocol (GTP) front end for NoGo.
//!
//! Implements the GTP version 2 subset a NoGo referee or GoGui needs,
//! plus the `gogui-rules_*` extensions that let GoGui display NoGo games.
//!
//! ## Supported Commands
//!
//! - `protocol_version`, `name`, `version`, `known_command`, `list_commands`, `quit`
//! - `boardsize <size>` - New empty board of the given size (2..=25)
//! - `clear_board` - Empty the board, black to move
//! - `komi <value>` - Accepted and ignored (NoGo has no score)
//! - `timelimit <seconds>` - Wall-clock budget per `genmove`
//! - `showboard` - Print the board
//! - `play <color> <vertex>` - Play a move; illegal moves are rejected
//! - `genmove <color>` - Generate and play a move, or answer `resign`
//! - `legal_moves <color>` - All legal vertices, sorted
//! - `gogui-rules_*`, `gogui-analyze_commands` - GoGui rules-engine queries
//!
//! Vertices use a column letter (A..Z without I) and a 1-based row.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{trace, warn};

use crate::board::{Board, Color, Point};
use crate::session::Session;

/// Engine name reported by `name`.
pub const ENGINE_NAME: &str = "nogo-mcts";

/// Column letters; `I` is skipped by Go convention.
const COLUMNS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "protocol_version",
    "quit",
    "name",
    "boardsize",
    "timelimit",
    "showboard",
    "clear_board",
    "komi",
    "version",
    "known_command",
    "list_commands",
    "legal_moves",
    "genmove",
    "play",
    "gogui-rules_game_id",
    "gogui-rules_board_size",
    "gogui-rules_legal_moves",
    "gogui-rules_side_to_move",
    "gogui-rules_board",
    "gogui-rules_final_result",
    "gogui-analyze_commands",
];

const ANALYZE_COMMANDS: &str = "pstring/Legal Moves For ToPlay/gogui-rules_legal_moves\n\
pstring/Side to Play/gogui-rules_side_to_move\n\
pstring/Final Result/gogui-rules_final_result\n\
pstring/Board Size/gogui-rules_board_size\n\
pstring/Rules GameID/gogui-rules_game_id\n\
pstring/Show Board/gogui-rules_board";

/// Parse a color argument (`b`, `black`, `w`, `white`; any case).
pub fn parse_color(s: &str) -> Option<Color> {
    match s.to_ascii_lowercase().as_str() {
        "b" | "black" => Some(Color::Black),
        "w" | "white" => Some(Color::White),
        _ => None,
    }
}

/// Parse a vertex such as `D4` into a point on `board`.
///
/// Returns `None` for `pass`, malformed input, or vertices off the board.
pub fn parse_vertex(s: &str, board: &Board) -> Option<Point> {
    let s = s.to_ascii_uppercase();
    let (letter, row) = s.split_at_checked(1)?;
    let letter = letter.as_bytes()[0];
    let col = COLUMNS.iter().position(|&c| c == letter)? + 1;
    let row: usize = row.parse().ok()?;
    board.point(row, col)
}

/// Format a point on `board` as a vertex such as `D4`.
pub fn format_vertex(pt: Point, board: &Board) -> Option<String> {
    let (row, col) = board.coords(pt)?;
    let letter = *COLUMNS.get(col - 1)? as char;
    Some(format!("{letter}{row}"))
}

/// Vertices for a list of points, sorted as strings and space-separated.
pub fn format_moves(moves: &[Point], board: &Board) -> String {
    let mut vertices: Vec<String> = moves
        .iter()
        .filter_map(|&pt| format_vertex(pt, board))
        .collect();
    vertices.sort();
    vertices.join(" ")
}

/// GTP engine state.
pub struct GtpEngine {
    session: Session,
}

impl GtpEngine {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The game being played.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the GTP command loop until `quit` or end of input.
    ///
    /// # Errors
    /// Fails only when reading input or writing a response fails.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("reading GTP input")?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();
            trace!(%command, ?args, "gtp command");

            let (prefix, message) = match self.execute(&command, args) {
                Ok(message) => ('=', message),
                Err(err) => ('?', err.to_string()),
            };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            if message.is_empty() {
                write!(output, "{prefix}{id_str}\n\n")?;
            } else {
                write!(output, "{prefix}{id_str} {message}\n\n")?;
            }
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let end = line
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(line.len());
        match line[..end].parse::<u32>() {
            Ok(id) => (Some(id), line[end..].trim()),
            Err(_) => (None, line),
        }
    }

    /// Execute a GTP command and return the response text.
    fn execute(&mut self, command: &str, args: &[&str]) -> Result<String> {
        match command {
            "protocol_version" => Ok("2".to_string()),

            "name" => Ok(ENGINE_NAME.to_string()),

            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),

            "known_command" => {
                let known = KNOWN_COMMANDS.contains(&arg(args, 0)?);
                Ok(known.to_string())
            }

            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "quit" => Ok(String::new()),

            "boardsize" => {
                let size: usize = arg(args, 0)?.parse().context("invalid size")?;
                self.session.set_board_size(size)?;
                Ok(String::new())
            }

            "clear_board" => {
                self.session.clear();
                Ok(String::new())
            }

            "komi" => Ok(String::new()),

            "timelimit" => {
                let secs: f64 = arg(args, 0)?.parse().context("invalid time limit")?;
                let limit = Duration::try_from_secs_f64(secs)
                    .ok()
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| anyhow!("invalid time limit {secs}"))?;
                self.session.set_time_limit(limit);
                Ok(String::new())
            }

            "showboard" => Ok(format!("\n{}", self.session.board().to_string().trim_end())),

            "play" => {
                let color = color_arg(args, 0)?;
                let vertex = arg(args, 1)?;
                let pt = parse_vertex(vertex, self.session.board())
                    .ok_or_else(|| anyhow!("illegal move: \"{} {vertex}\" (invalid vertex)", args[0]))?;
                self.session
                    .play_move(pt, color)
                    .map_err(|e| anyhow!("illegal move: \"{} {vertex}\" ({e})", args[0]))?;
                Ok(String::new())
            }

            "genmove" => {
                let color = color_arg(args, 0)?;
                match self.session.generate_move(color) {
                    Some(pt) => format_vertex(pt, self.session.board())
                        .ok_or_else(|| anyhow!("generated off-board point {pt}")),
                    None => Ok("resign".to_string()),
                }
            }

            "legal_moves" => {
                let color = color_arg(args, 0)?;
                let moves = self.session.legal_moves(color);
                Ok(format_moves(&moves, self.session.board()))
            }

            "gogui-rules_game_id" => Ok("NoGo".to_string()),

            "gogui-rules_board_size" => Ok(self.session.board_size().to_string()),

            "gogui-rules_legal_moves" => {
                let moves = self.session.legal_moves(self.session.current_side());
                Ok(format_moves(&moves, self.session.board()))
            }

            "gogui-rules_side_to_move" => Ok(self.session.current_side().to_string()),

            "gogui-rules_board" => Ok(self.session.board().to_string().trim_end().to_string()),

            "gogui-rules_final_result" => Ok(self
                .session
                .winner()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string())),

            "gogui-analyze_commands" => Ok(ANALYZE_COMMANDS.to_string()),

            _ => {
                warn!(command, "unknown command");
                bail!("unknown command")
            }
        }
    }
}

fn arg<'a>(args: &[&'a str], i: usize) -> Result<&'a str> {
    args.get(i).copied().ok_or_else(|| anyhow!("missing argument"))
}

fn color_arg(args: &[&str], i: usize) -> Result<Color> {
    let s = arg(args, i)?;
    parse_color(s).ok_or_else(|| anyhow!("invalid color {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::SearchConfig;
    use crate::session::SessionConfig;

    fn new_engine(size: usize) -> GtpEngine {
        let session = Session::new(SessionConfig {
            size,
            time_limit: Duration::from_millis(300),
            search: SearchConfig {
                seed: Some(1),
                ..SearchConfig::default()
            },
            ..SessionConfig::default()
        })
        .unwrap();
        GtpEngine::new(session)
    }

    fn run_script(engine: &mut GtpEngine, script: &str) -> String {
        let mut out = Vec::new();
        engine.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = GtpEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = GtpEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_vertex_roundtrip() {
        let board = Board::new(25).unwrap();
        for pt in board.points() {
            let vertex = format_vertex(pt, &board).unwrap();
            assert_eq!(parse_vertex(&vertex, &board), Some(pt), "{vertex}");
        }
    }

    #[test]
    fn test_parse_vertex() {
        let board = Board::new(9).unwrap();
        assert_eq!(parse_vertex("a1", &board), board.point(1, 1));
        assert_eq!(parse_vertex("J9", &board), board.point(9, 9));
        assert_eq!(parse_vertex("H5", &board), board.point(5, 8));
        assert_eq!(parse_vertex("I5", &board), None);
        assert_eq!(parse_vertex("K1", &board), None);
        assert_eq!(parse_vertex("A10", &board), None);
        assert_eq!(parse_vertex("A0", &board), None);
        assert_eq!(parse_vertex("pass", &board), None);
        assert_eq!(parse_vertex("", &board), None);
        assert_eq!(parse_vertex("é1", &board), None);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("B"), Some(Color::Black));
        assert_eq!(parse_color("white"), Some(Color::White));
        assert_eq!(parse_color("e"), None);
    }

    #[test]
    fn test_format_moves_sorted() {
        let board = Board::new(3).unwrap();
        let moves: Vec<Point> = board.points().collect();
        assert_eq!(
            format_moves(&moves, &board),
            "A1 A2 A3 B1 B2 B3 C1 C2 C3"
        );
    }

    #[test]
    fn test_basic_commands() {
        let mut engine = new_engine(5);
        let out = run_script(&mut engine, "1 name\nprotocol_version\n\n# comment\nknown_command play\nknown_command foo\n");
        assert_eq!(
            out,
            "=1 nogo-mcts\n\n= 2\n\n= true\n\n= false\n\n"
        );
    }

    #[test]
    fn test_unknown_and_missing_args() {
        let mut engine = new_engine(5);
        let out = run_script(&mut engine, "frobnicate\nplay b\nboardsize 40\n");
        assert_eq!(
            out,
            "? unknown command\n\n? missing argument\n\n? unacceptable size 40, expected 2..=25\n\n"
        );
    }

    #[test]
    fn test_play_and_board() {
        let mut engine = new_engine(3);
        let out = run_script(
            &mut engine,
            "play b A1\nplay w A1\nplay w B1\ngogui-rules_side_to_move\ngogui-rules_board\n",
        );
        assert_eq!(
            out,
            "=\n\n\
             ? illegal move: \"w A1\" (point is not empty)\n\n\
             =\n\n\
             = black\n\n\
             = ...\n...\nXO.\n\n"
        );
    }

    #[test]
    fn test_play_capture_rejected() {
        let mut engine = new_engine(3);
        let out = run_script(&mut engine, "play w A1\nplay b B1\nplay b A2\n");
        assert!(out.ends_with("? illegal move: \"b A2\" (capture)\n\n"), "{out}");
    }

    #[test]
    fn test_legal_moves_and_final_result() {
        let mut engine = new_engine(2);
        let out = run_script(
            &mut engine,
            "play b A1\nplay b B2\ngogui-rules_legal_moves\nlegal_moves b\ngogui-rules_final_result\n",
        );
        assert_eq!(out, "=\n\n=\n\n=\n\n= A2 B1\n\n= black\n\n");
    }

    #[test]
    fn test_genmove_resign_and_move() {
        let mut engine = new_engine(2);
        let out = run_script(&mut engine, "play b A1\nplay b B2\ngenmove w\n");
        assert!(out.ends_with("= resign\n\n"), "{out}");

        let mut engine = new_engine(4);
        let out = run_script(&mut engine, "timelimit 0.3\ngenmove b\n");
        let vertex = out
            .trim_end()
            .rsplit(' ')
            .next()
            .unwrap()
            .to_string();
        let board = engine.session().board();
        let pt = parse_vertex(&vertex, board).unwrap();
        assert_eq!(board.get(pt), crate::board::Stone::Black);
        assert_eq!(engine.session().current_side(), Color::White);
    }

    #[test]
    fn test_timelimit_rejects_bad_values() {
        let mut engine = new_engine(3);
        let out = run_script(&mut engine, "timelimit -1\ntimelimit abc\ntimelimit 5\n");
        assert!(out.starts_with("? invalid time limit -1\n\n? invalid time limit"), "{out}");
        assert!(out.ends_with("=\n\n"));
        assert_eq!(engine.session().time_limit(), Duration::from_secs(5));
    }

    #[test]
    fn test_quit_stops_loop() {
        let mut engine = new_engine(3);
        let out = run_script(&mut engine, "quit\nname\n");
        assert_eq!(out, "=\n\n");
    }
}
