use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use regex::Regex;

/// Operator command accepted while the simulation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    /// Run this many frames, then hold
    Step(u32),
    Quit,
}

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(pause|p|resume|r|step|s|quit|q)(?:\s+(\d+))?\s*$")
            .expect("command pattern is valid")
    })
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = command_pattern()
            .captures(s)
            .ok_or_else(|| format!("Unknown command: {}", s.trim()))?;

        let verb = caps[1].to_ascii_lowercase();
        let count = caps.get(2).map(|m| m.as_str());

        match (verb.as_str(), count) {
            ("pause" | "p", None) => Ok(Command::Pause),
            ("resume" | "r", None) => Ok(Command::Resume),
            ("quit" | "q", None) => Ok(Command::Quit),
            ("step" | "s", None) => Ok(Command::Step(1)),
            ("step" | "s", Some(n)) => n
                .parse()
                .map(Command::Step)
                .map_err(|_| format!("Invalid step count: {}", n)),
            (verb, Some(_)) => Err(format!("'{}' takes no argument", verb)),
            (verb, None) => Err(format!("Unknown command: {}", verb)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Pause => write!(f, "pause"),
            Command::Resume => write!(f, "resume"),
            Command::Step(n) => write!(f, "step {}", n),
            Command::Quit => write!(f, "quit"),
        }
    }
}
