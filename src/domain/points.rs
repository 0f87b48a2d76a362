use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// A score counted in half points, so `Points::from_halves(5)` is two and a half.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Points(i32);

impl Points {
    pub const ZERO: Points = Points(0);
    pub const HALF: Points = Points(1);
    pub const ONE: Points = Points(2);

    pub fn from_halves(halves: i32) -> Self {
        Self(halves)
    }

    pub fn halves(&self) -> i32 {
        self.0
    }

    /// Parse `3`, `2.5`, `2½`, `½`, `.5` or `0.5`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(whole) = text.strip_suffix('½') {
            return Self::parse_whole(whole, true);
        }
        if let Some(whole) = text.strip_suffix(".5") {
            return Self::parse_whole(whole, true);
        }
        Self::parse_whole(text, false)
    }

    fn parse_whole(whole: &str, half: bool) -> Option<Self> {
        let value = if whole.is_empty() {
            if !half {
                return None;
            }
            0
        } else {
            if !whole.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            whole.parse::<i32>().ok()?
        };
        Some(Self(value.checked_mul(2)?.checked_add(i32::from(half))?))
    }

    /// True for 0, ½ and 1: the values a single game can award one side.
    pub fn is_game_value(&self) -> bool {
        (0..=2).contains(&self.0)
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        if abs % 2 == 0 {
            write!(f, "{}{}", sign, abs / 2)
        } else {
            write!(f, "{}{}.5", sign, abs / 2)
        }
    }
}

impl Add for Points {
    type Output = Points;

    fn add(self, rhs: Points) -> Points {
        Points(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Points {
    type Output = Points;

    fn sub(self, rhs: Points) -> Points {
        Points(self.0.saturating_sub(rhs.0))
    }
}
