use serde::{Serialize, Serializer};

/// Mark a player puts on the board; `None` is an empty cell or "nobody".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sign {
    #[default]
    None,
    Cross,
    Nought,
}

impl Sign {
    /// The sign that moves after this one. `None` has no opponent.
    pub fn opponent(self) -> Sign {
        match self {
            Sign::Cross => Sign::Nought,
            Sign::Nought => Sign::Cross,
            Sign::None => Sign::None,
        }
    }

    /// Wire representation: "x", "o" or nothing.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Sign::Cross => Some("x"),
            Sign::Nought => Some("o"),
            Sign::None => None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Sign::None
    }
}

impl Serialize for Sign {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_str() {
            Some(value) => serializer.serialize_str(value),
            None => serializer.serialize_none(),
        }
    }
}
