use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Instruction sent from the motion detector to the recording dispatcher.
///
/// The detector only ever sends `Start` and `Stop`. `Unknown` is produced
/// solely by parsing text (`FromStr`), so a future textual command source
/// gets a diagnostic from the dispatcher rather than silent acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    /// Text that did not name a known command, kept so it can be reported.
    Unknown(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
            Command::Unknown(text) => write!(f, "{}", text),
        }
    }
}

impl FromStr for Command {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            other => Command::Unknown(other.to_string()),
        })
    }
}
