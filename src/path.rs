//! Bit-encoded root-to-node paths.
//!
//! A [`Path`] is the identity of a node: the sequence of left (`0`) and right (`1`) turns taken
//! from the root, packed into a `u64` with the first turn in the most significant of the `depth`
//! significant bits. Since the whole route must fit in 64 bits, no node can sit deeper than
//! [`MAX_DEPTH`]; derivations that would cross that line return `None` instead of truncating.

use std::fmt;

/// Deepest depth a [`Path`] can encode. The root has depth 0, so a tree spans at most
/// `MAX_DEPTH + 1` levels.
pub const MAX_DEPTH: u8 = 64;

/// Which child of a node a step goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    #[inline]
    fn bit(self) -> u64 {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
        }
    }

    #[inline]
    fn from_bit(bit: u64) -> Self {
        if bit & 1 == 0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

/// Root-to-node route plus its number of significant bits.
///
/// Invariant: every bit at position `>= depth` is zero, so derived equality (both fields) is
/// path equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    bits: u64,
    depth: u8,
}

/// Mask selecting the low `n` bits. `n` may be 64.
#[inline]
fn low_mask(n: u8) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

/// splitmix64 finalizer.
#[inline]
fn mix64(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

impl Path {
    pub const ROOT: Path = Path { bits: 0, depth: 0 };

    /// Builds a path from raw parts, rejecting depths past [`MAX_DEPTH`] and stray bits above
    /// `depth`.
    pub fn new(bits: u64, depth: u8) -> Option<Self> {
        if depth > MAX_DEPTH || bits & !low_mask(depth) != 0 {
            return None;
        }
        Some(Self { bits, depth })
    }

    #[inline]
    pub fn root() -> Self {
        Self::ROOT
    }

    #[inline]
    pub fn bits(self) -> u64 {
        self.bits
    }

    #[inline]
    pub fn depth(self) -> u8 {
        self.depth
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self.depth == 0
    }

    #[inline]
    pub fn child(self, dir: Direction) -> Option<Self> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        Some(Self {
            bits: (self.bits << 1) | dir.bit(),
            depth: self.depth + 1,
        })
    }

    #[inline]
    pub fn left(self) -> Option<Self> {
        self.child(Direction::Left)
    }

    #[inline]
    pub fn right(self) -> Option<Self> {
        self.child(Direction::Right)
    }

    /// The root has no parent.
    #[inline]
    pub fn parent(self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            bits: self.bits >> 1,
            depth: self.depth - 1,
        })
    }

    /// The last turn taken to reach this node, `None` for the root.
    #[inline]
    pub fn last_direction(self) -> Option<Direction> {
        (!self.is_root()).then(|| Direction::from_bit(self.bits))
    }

    /// Turns from the root down to this node, first turn first.
    pub fn steps(self) -> impl DoubleEndedIterator<Item = Direction> + ExactSizeIterator {
        let bits = self.bits;
        (0..self.depth)
            .rev()
            .map(move |shift| Direction::from_bit(bits >> shift))
    }

    /// True if `self` is an ancestor of `other` or equal to it.
    pub fn is_prefix_of(self, other: Path) -> bool {
        if self.depth > other.depth {
            return false;
        }
        let shift = u32::from(other.depth - self.depth);
        other.bits.checked_shr(shift).unwrap_or(0) == self.bits
    }

    /// Replays the turns `self` takes below `from` starting at `to` instead.
    ///
    /// Returns `None` if `from` is not a prefix of `self`, or if the result would exceed
    /// [`MAX_DEPTH`].
    pub fn rebase(self, from: Path, to: Path) -> Option<Path> {
        if !from.is_prefix_of(self) {
            return None;
        }
        let offset_depth = self.depth - from.depth;
        let depth = to.depth.checked_add(offset_depth)?;
        if depth > MAX_DEPTH {
            return None;
        }
        let offset = self.bits & low_mask(offset_depth);
        let bits = to.bits.checked_shl(u32::from(offset_depth)).unwrap_or(0) | offset;
        Some(Self { bits, depth })
    }

    /// Bucket index for a table with `capacity` buckets.
    ///
    /// The depth goes into the high byte before mixing so that paths sharing `bits` at different
    /// depths (`L`, `LL`, `LLL`, ...) land in unrelated buckets.
    #[inline]
    pub fn bucket(self, capacity: usize) -> usize {
        debug_assert!(capacity > 0);
        let h = mix64(self.bits ^ (u64::from(self.depth) << 56));
        (h % capacity as u64) as usize
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("Root");
        }
        for dir in self.steps() {
            f.write_str(match dir {
                Direction::Left => "L",
                Direction::Right => "R",
            })?;
        }
        Ok(())
    }
}
