use std::{fmt::Display, io, time::Duration};

/// `EngineError` is the error type returned by the engine clients.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine at {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("engine i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error("engine analysis timed out after {0:?}")]
    Timeout(Duration),
}

/// Engine score, always from the point of view of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Mate in N moves; negative when the side to move is getting mated.
    Mate(i32),
}

impl Score {
    pub fn flip(self) -> Self {
        match self {
            Score::Centipawns(cp) => Score::Centipawns(-cp),
            Score::Mate(moves) => Score::Mate(-moves),
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Score::Centipawns(cp) => write!(f, "{cp}"),
            Score::Mate(moves) => write!(f, "#{moves}"),
        }
    }
}

/// The last scored search line an engine reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub depth: u32,
    pub score: Score,
}

impl Evaluation {
    /// Scores from white's then black's point of view.
    pub fn white_black(&self, white_to_move: bool) -> (Score, Score) {
        if white_to_move {
            (self.score, self.score.flip())
        } else {
            (self.score.flip(), self.score)
        }
    }
}

/// Parses a UCI `info` line carrying an exact score.
///
/// Bound scores (`lowerbound`/`upperbound`) come from aspiration window
/// fail-highs and are skipped, as are `info` lines without a score.
pub fn parse_info_line(line: &str) -> Option<Evaluation> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "info" {
        return None;
    }

    let mut depth = 0;
    let mut score = None;

    while let Some(token) = tokens.next() {
        match token {
            "depth" => depth = tokens.next()?.parse().ok()?,
            "score" => {
                let kind = tokens.next()?;
                let value: i32 = tokens.next()?.parse().ok()?;
                score = Some(match kind {
                    "cp" => Score::Centipawns(value),
                    "mate" => Score::Mate(value),
                    _ => return None,
                });
            }
            "lowerbound" | "upperbound" => return None,
            // the rest of the line is a move list or free text
            "pv" | "string" => break,
            _ => {}
        }
    }

    score.map(|score| Evaluation { depth, score })
}
