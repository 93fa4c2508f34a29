//! Direction algebra (C2): the 10-value compass, its bitmask representation,
//! reverse map, cardinal-component predicates, and text conversion.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
    Up,
    Down,
}

pub const ALL_DIRECTIONS: [Direction; 10] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
    Direction::Northeast,
    Direction::Northwest,
    Direction::Southeast,
    Direction::Southwest,
    Direction::Up,
    Direction::Down,
];

/// Cardinals + diagonals, the default `allowedExits` mask for a new room.
pub const CARDINALS_AND_DIAGONALS_MASK: u32 = Direction::North.bit()
    | Direction::South.bit()
    | Direction::East.bit()
    | Direction::West.bit()
    | Direction::Northeast.bit()
    | Direction::Northwest.bit()
    | Direction::Southeast.bit()
    | Direction::Southwest.bit();

impl Direction {
    /// Each direction occupies a unique single bit so exit policies can be
    /// expressed as a mask.
    pub const fn bit(self) -> u32 {
        match self {
            Direction::North => 1 << 0,
            Direction::South => 1 << 1,
            Direction::East => 1 << 2,
            Direction::West => 1 << 3,
            Direction::Northeast => 1 << 4,
            Direction::Northwest => 1 << 5,
            Direction::Southeast => 1 << 6,
            Direction::Southwest => 1 << 7,
            Direction::Up => 1 << 8,
            Direction::Down => 1 << 9,
        }
    }

    pub const fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Northeast => Direction::Southwest,
            Direction::Northwest => Direction::Southeast,
            Direction::Southeast => Direction::Northwest,
            Direction::Southwest => Direction::Northeast,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// The per-axis coordinate delta applied by one step in this direction.
    /// Diagonals combine their two cardinal components.
    pub const fn delta(self) -> (i32, i32, i32) {
        match self {
            Direction::North => (0, -1, 0),
            Direction::South => (0, 1, 0),
            Direction::East => (1, 0, 0),
            Direction::West => (-1, 0, 0),
            Direction::Northeast => (1, -1, 0),
            Direction::Northwest => (-1, -1, 0),
            Direction::Southeast => (1, 1, 0),
            Direction::Southwest => (-1, 1, 0),
            Direction::Up => (0, 0, 1),
            Direction::Down => (0, 0, -1),
        }
    }

    pub const fn is_cardinal(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::South | Direction::East | Direction::West
        )
    }

    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::Northeast
                | Direction::Northwest
                | Direction::Southeast
                | Direction::Southwest
        )
    }

    pub const fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    pub const fn full_name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Northeast => "northeast",
            Direction::Northwest => "northwest",
            Direction::Southeast => "southeast",
            Direction::Southwest => "southwest",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub const fn abbreviation(self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::South => "s",
            Direction::East => "e",
            Direction::West => "w",
            Direction::Northeast => "ne",
            Direction::Northwest => "nw",
            Direction::Southeast => "se",
            Direction::Southwest => "sw",
            Direction::Up => "u",
            Direction::Down => "d",
        }
    }

    /// Parses either the full name or the abbreviation, case-insensitively.
    pub fn parse(text: &str) -> Option<Direction> {
        let lower = text.to_ascii_lowercase();
        ALL_DIRECTIONS
            .into_iter()
            .find(|d| d.full_name() == lower || d.abbreviation() == lower)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_involutive() {
        for d in ALL_DIRECTIONS {
            assert_eq!(d.reverse().reverse(), d);
        }
    }

    #[test]
    fn bits_are_unique() {
        let mut seen = 0u32;
        for d in ALL_DIRECTIONS {
            assert_eq!(seen & d.bit(), 0, "{d:?} collides with a prior bit");
            seen |= d.bit();
        }
    }

    #[test]
    fn parses_full_and_abbreviated_forms() {
        assert_eq!(Direction::parse("north"), Some(Direction::North));
        assert_eq!(Direction::parse("N"), Some(Direction::North));
        assert_eq!(Direction::parse("ne"), Some(Direction::Northeast));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[test]
    fn default_mask_excludes_vertical() {
        assert_eq!(CARDINALS_AND_DIAGONALS_MASK & Direction::Up.bit(), 0);
        assert_eq!(CARDINALS_AND_DIAGONALS_MASK & Direction::Down.bit(), 0);
        assert_ne!(CARDINALS_AND_DIAGONALS_MASK & Direction::North.bit(), 0);
    }
}
