use std::fmt;

/// One line of candidate input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 0-based option index.
    Select(usize),
    Mark,
    Next,
    /// 0-based question index.
    GoTo(usize),
    Palette,
    Suspend,
    Resume,
    Submit,
    Quit,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    BadNumber { raw: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "type a command (h for help)"),
            CommandError::Unknown(cmd) => write!(f, "unknown command: {cmd}"),
            CommandError::BadNumber { raw } => {
                write!(f, "expected a number starting at 1, got {raw:?}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Parses a 1-based number as typed by the candidate into a 0-based index.
fn one_based(raw: &str) -> Result<usize, CommandError> {
    raw.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| CommandError::BadNumber {
            raw: raw.to_string(),
        })
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(CommandError::Empty);
        };

        match head {
            "m" | "mark" => Ok(Self::Mark),
            "n" | "next" => Ok(Self::Next),
            "g" | "go" => {
                let raw = parts.next().unwrap_or_default();
                one_based(raw).map(Self::GoTo)
            }
            "p" | "palette" => Ok(Self::Palette),
            "bg" => Ok(Self::Suspend),
            "fg" => Ok(Self::Resume),
            "s" | "submit" => Ok(Self::Submit),
            "q" | "quit" => Ok(Self::Quit),
            "h" | "help" | "?" => Ok(Self::Help),
            other if other.chars().all(|c| c.is_ascii_digit()) => one_based(other).map(Self::Select),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

pub const HELP: &str = "\
Commands:
  <n>      select option n
  m        mark current question for review
  n        next question
  g <k>    go to question k
  p        show the question palette
  bg / fg  simulate the app going to background / foreground
  s        submit the exam
  q        quit (submits)";
