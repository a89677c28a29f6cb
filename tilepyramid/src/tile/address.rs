//! Quadtree tile addresses.
//!
//! A [`TileAddress`] is the path from the root of the tile pyramid down to a
//! node, one child-selector digit per level:
//!
//! ```text
//!          root
//!    ┌────┬──┴─┬────┐
//!    1    2    3    4        1 = top-left     2 = top-right
//!   /|\                      3 = bottom-left  4 = bottom-right
//! 1-1 1-2 ...
//! ```
//!
//! Addresses are small `Copy` values: the digits are packed two bits per
//! level into a `u64`, which caps the pyramid at [`MAX_DEPTH`] levels.
//!
//! # Example
//!
//! ```
//! use tilepyramid::tile::TileAddress;
//!
//! let tile: TileAddress = "1-2-4".parse().unwrap();
//! assert_eq!(tile.depth(), 3);
//! assert_eq!(tile.parent().unwrap().to_string(), "1-2");
//! assert_eq!(tile.position(), (3, 1));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Maximum depth a tile address can reach.
pub const MAX_DEPTH: u8 = 32;

/// Text form of the root address.
pub const ROOT_NAME: &str = "root";

/// Errors produced when building or parsing tile addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileAddressError {
    /// A path segment was not one of the digits 1-4.
    #[error("Invalid tile digit '{0}' (expected 1-4)")]
    InvalidDigit(String),

    /// The address would be deeper than [`MAX_DEPTH`].
    #[error("Tile depth {depth} exceeds maximum of {max}", max = MAX_DEPTH)]
    TooDeep { depth: u32 },

    /// Grid position lies outside the `2^depth` grid.
    #[error("Position ({x}, {y}) is outside the grid at depth {depth}")]
    OutOfGrid { x: u64, y: u64, depth: u8 },
}

/// Address of a node in the tile quadtree.
///
/// The empty digit sequence is the root. Equality, hashing and ordering all
/// follow the digit sequence; ordering is lexicographic so the root sorts
/// before everything and a parent sorts before its children.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileAddress {
    /// Number of digits in the path.
    depth: u8,
    /// Digit `i` (0 = nearest the root) stored as `digit - 1` at bits `2i..2i+2`.
    /// Bits above `2 * depth` are always zero.
    bits: u64,
}

impl TileAddress {
    /// The root of the pyramid (the whole-world overview tile).
    pub const ROOT: TileAddress = TileAddress { depth: 0, bits: 0 };

    /// Number of levels between this tile and the root.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Returns true for the root address.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Returns the parent address, or `None` for the root.
    pub fn parent(&self) -> Option<TileAddress> {
        if self.is_root() {
            return None;
        }
        let depth = self.depth - 1;
        Some(Self {
            depth,
            bits: self.bits & Self::mask(depth),
        })
    }

    /// Returns the child address selected by `digit` (1-4).
    ///
    /// # Panics
    ///
    /// Panics if `digit` is outside 1..=4 or the child would exceed
    /// [`MAX_DEPTH`]. Use [`TileAddress::try_child`] for untrusted input.
    pub fn child(&self, digit: u8) -> TileAddress {
        match self.try_child(digit) {
            Ok(child) => child,
            Err(e) => panic!("cannot address child of {}: {}", self, e),
        }
    }

    /// Fallible form of [`TileAddress::child`].
    pub fn try_child(&self, digit: u8) -> Result<TileAddress, TileAddressError> {
        if !(1..=4).contains(&digit) {
            return Err(TileAddressError::InvalidDigit(digit.to_string()));
        }
        if self.depth >= MAX_DEPTH {
            return Err(TileAddressError::TooDeep {
                depth: u32::from(self.depth) + 1,
            });
        }
        let shift = 2 * u32::from(self.depth);
        Ok(Self {
            depth: self.depth + 1,
            bits: self.bits | (u64::from(digit - 1) << shift),
        })
    }

    /// All four child addresses, in digit order.
    ///
    /// # Panics
    ///
    /// Panics when called on an address already at [`MAX_DEPTH`].
    pub fn children(&self) -> [TileAddress; 4] {
        [self.child(1), self.child(2), self.child(3), self.child(4)]
    }

    /// Iterates the path digits from the root downwards.
    pub fn digits(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.depth).map(move |level| self.digit_at(level))
    }

    /// Returns the digit at `level` (0 = first step below the root).
    fn digit_at(&self, level: u8) -> u8 {
        ((self.bits >> (2 * u32::from(level))) & 0b11) as u8 + 1
    }

    /// Returns true if `other` lies strictly below this tile.
    pub fn is_ancestor_of(&self, other: &TileAddress) -> bool {
        other.depth > self.depth && other.bits & Self::mask(self.depth) == self.bits
    }

    /// Column and row of this tile in the `2^depth` × `2^depth` grid of its level.
    pub fn position(&self) -> (u64, u64) {
        self.digits().fold((0, 0), |(x, y), digit| {
            let quadrant = u64::from(digit - 1);
            ((x << 1) | (quadrant & 1), (y << 1) | (quadrant >> 1))
        })
    }

    /// Builds the address of the tile at column `x`, row `y` of level `depth`.
    pub fn from_position(x: u64, y: u64, depth: u8) -> Result<TileAddress, TileAddressError> {
        if depth > MAX_DEPTH {
            return Err(TileAddressError::TooDeep {
                depth: u32::from(depth),
            });
        }
        let size = 1u128 << depth;
        if u128::from(x) >= size || u128::from(y) >= size {
            return Err(TileAddressError::OutOfGrid { x, y, depth });
        }

        let mut address = Self::ROOT;
        for level in (0..depth).rev() {
            let bx = (x >> level) & 1;
            let by = (y >> level) & 1;
            address = address.try_child((1 + bx + 2 * by) as u8)?;
        }
        Ok(address)
    }

    /// Bit mask covering the digits of the first `depth` levels.
    fn mask(depth: u8) -> u64 {
        if depth >= MAX_DEPTH {
            u64::MAX
        } else {
            (1u64 << (2 * u32::from(depth))) - 1
        }
    }
}

impl Ord for TileAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digits().cmp(other.digits())
    }
}

impl PartialOrd for TileAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(ROOT_NAME);
        }
        for (i, digit) in self.digits().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{}", digit)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TileAddress({})", self)
    }
}

impl FromStr for TileAddress {
    type Err = TileAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == ROOT_NAME {
            return Ok(Self::ROOT);
        }

        s.split('-').try_fold(Self::ROOT, |address, part| {
            let digit = part
                .parse::<u8>()
                .map_err(|_| TileAddressError::InvalidDigit(part.to_string()))?;
            address.try_child(digit).map_err(|e| match e {
                TileAddressError::InvalidDigit(_) => TileAddressError::InvalidDigit(part.to_string()),
                other => other,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn addr(s: &str) -> TileAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_root_properties() {
        let root = TileAddress::ROOT;
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert_eq!(root.parent(), None);
        assert_eq!(root.to_string(), "root");
        assert_eq!(root.position(), (0, 0));
    }

    #[test]
    fn test_child_and_parent() {
        let tile = TileAddress::ROOT.child(2).child(3);
        assert_eq!(tile.depth(), 2);
        assert_eq!(tile.to_string(), "2-3");
        assert_eq!(tile.parent(), Some(TileAddress::ROOT.child(2)));
        assert_eq!(tile.parent().unwrap().parent(), Some(TileAddress::ROOT));
    }

    #[test]
    fn test_children_in_digit_order() {
        let parent = addr("4");
        let names: Vec<String> = parent.children().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["4-1", "4-2", "4-3", "4-4"]);
        for child in parent.children() {
            assert_eq!(child.parent(), Some(parent));
        }
    }

    #[test]
    fn test_try_child_rejects_bad_digit() {
        assert_eq!(
            TileAddress::ROOT.try_child(0),
            Err(TileAddressError::InvalidDigit("0".to_string()))
        );
        assert!(TileAddress::ROOT.try_child(5).is_err());
    }

    #[test]
    #[should_panic(expected = "cannot address child")]
    fn test_child_panics_on_bad_digit() {
        TileAddress::ROOT.child(7);
    }

    #[test]
    fn test_max_depth_enforced() {
        let mut tile = TileAddress::ROOT;
        for _ in 0..MAX_DEPTH {
            tile = tile.child(4);
        }
        assert_eq!(tile.depth(), MAX_DEPTH);
        assert_eq!(
            tile.try_child(1),
            Err(TileAddressError::TooDeep {
                depth: u32::from(MAX_DEPTH) + 1
            })
        );
        // Parent at full depth must clear the topmost digit
        let parent = tile.parent().unwrap();
        assert_eq!(parent.child(4), tile);
    }

    #[test]
    fn test_equality_follows_digits() {
        assert_eq!(addr("1-2"), TileAddress::ROOT.child(1).child(2));
        assert_ne!(addr("1-2"), addr("2-1"));
        // Same packed bits at different depths are different tiles
        assert_ne!(addr("1"), addr("1-1"));
        assert_ne!(TileAddress::ROOT, addr("1"));
    }

    #[test]
    fn test_hash_distinguishes_depth() {
        let set: HashSet<TileAddress> =
            [addr("1"), addr("1-1"), addr("1-1-1"), addr("1"), TileAddress::ROOT]
                .into_iter()
                .collect();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut tiles = vec![addr("2"), addr("1-4"), TileAddress::ROOT, addr("1"), addr("1-1")];
        tiles.sort();
        let names: Vec<String> = tiles.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["root", "1", "1-1", "1-4", "2"]);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(addr("3-1-2").to_string(), "3-1-2");
        assert_eq!(addr("root"), TileAddress::ROOT);
        assert_eq!(addr(""), TileAddress::ROOT);
        assert_eq!(
            "1-9".parse::<TileAddress>(),
            Err(TileAddressError::InvalidDigit("9".to_string()))
        );
        assert_eq!(
            "1--2".parse::<TileAddress>(),
            Err(TileAddressError::InvalidDigit(String::new()))
        );
        assert!("a".parse::<TileAddress>().is_err());
    }

    #[test]
    fn test_is_ancestor_of() {
        assert!(TileAddress::ROOT.is_ancestor_of(&addr("3")));
        assert!(addr("1").is_ancestor_of(&addr("1-2-3")));
        assert!(!addr("1").is_ancestor_of(&addr("2-1")));
        assert!(!addr("1-2").is_ancestor_of(&addr("1-2")));
        assert!(!addr("1-2").is_ancestor_of(&addr("1")));
    }

    #[test]
    fn test_position_quadrants() {
        assert_eq!(addr("1").position(), (0, 0));
        assert_eq!(addr("2").position(), (1, 0));
        assert_eq!(addr("3").position(), (0, 1));
        assert_eq!(addr("4").position(), (1, 1));
        assert_eq!(addr("4-1").position(), (2, 2));
        assert_eq!(addr("2-4").position(), (3, 1));
    }

    #[test]
    fn test_from_position() {
        assert_eq!(TileAddress::from_position(0, 0, 0).unwrap(), TileAddress::ROOT);
        assert_eq!(TileAddress::from_position(3, 1, 2).unwrap(), addr("2-4"));
        assert_eq!(
            TileAddress::from_position(4, 0, 2),
            Err(TileAddressError::OutOfGrid { x: 4, y: 0, depth: 2 })
        );
        assert!(TileAddress::from_position(0, 0, MAX_DEPTH + 1).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_position_roundtrip(depth in 0u8..=20, x in any::<u64>(), y in any::<u64>()) {
                let size = 1u64 << depth;
                let (x, y) = (x % size, y % size);
                let tile = TileAddress::from_position(x, y, depth)?;
                prop_assert_eq!(tile.depth(), depth);
                prop_assert_eq!(tile.position(), (x, y));
            }

            #[test]
            fn test_text_roundtrip(digits in proptest::collection::vec(1u8..=4, 0..20)) {
                let tile = digits.iter().fold(TileAddress::ROOT, |t, d| t.child(*d));
                let parsed: TileAddress = tile.to_string().parse()?;
                prop_assert_eq!(parsed, tile);
                prop_assert_eq!(tile.digits().collect::<Vec<_>>(), digits);
            }
        }
    }
}
