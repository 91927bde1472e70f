use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chat mode a message was sent in. Stored as its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatKind {
    #[serde(rename = "global")]
    Global,
    #[serde(rename = "group")]
    Group,
    #[serde(rename = "one-to-one")]
    OneToOne,
}

impl ChatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Group => "group",
            Self::OneToOne => "one-to-one",
        }
    }
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "group" => Ok(Self::Group),
            "one-to-one" => Ok(Self::OneToOne),
            other => Err(format!("unknown chat kind '{}'", other)),
        }
    }
}

/// A book board post either offers a book or asks for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookKind {
    Lend,
    Borrow,
}

impl BookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lend => "lend",
            Self::Borrow => "borrow",
        }
    }
}

impl FromStr for BookKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lend" => Ok(Self::Lend),
            "borrow" => Ok(Self::Borrow),
            other => Err(format!("unknown book kind '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_kind_wire_names() {
        assert_eq!(serde_json::to_string(&ChatKind::OneToOne).unwrap(), "\"one-to-one\"");
        assert_eq!("group".parse::<ChatKind>().unwrap(), ChatKind::Group);
        assert!("private".parse::<ChatKind>().is_err());
    }

    #[test]
    fn book_kind_parses_lowercase() {
        assert_eq!("borrow".parse::<BookKind>().unwrap(), BookKind::Borrow);
        assert_eq!(serde_json::to_string(&BookKind::Lend).unwrap(), "\"lend\"");
    }
}
