//! Left/right landmark correspondence across the face's vertical midline.
//!
//! Indexed directly by landmark number, so every lookup is O(1) and an
//! unmapped index can be detected when a control table is loaded.

use crate::spline::CurveError;
use crate::types::LANDMARK_COUNT;

/// Mirror pairs of the 68-point iBUG layout.
#[rustfmt::skip]
const IBUG68_PAIRS: [(u8, u8); 29] = [
    // jaw line
    (0, 16), (1, 15), (2, 14), (3, 13), (4, 12), (5, 11), (6, 10), (7, 9),
    // brows
    (17, 26), (18, 25), (19, 24), (20, 23), (21, 22),
    // nostrils
    (31, 35), (32, 34),
    // eyes
    (36, 45), (37, 44), (38, 43), (39, 42), (40, 47), (41, 46),
    // outer lip
    (48, 54), (49, 53), (50, 52), (55, 59), (56, 58),
    // inner lip
    (60, 64), (61, 63), (65, 67),
];

/// Landmarks on the midline; each is its own mirror image.
const IBUG68_MIDLINE: [u8; 10] = [8, 27, 28, 29, 30, 33, 51, 57, 62, 66];

/// Fixed-size landmark → mirror-landmark map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetryTable {
    mirror: [Option<u8>; LANDMARK_COUNT],
}

/// The full iBUG 68-point symmetry table.
pub static IBUG68: SymmetryTable = SymmetryTable::ibug68();

impl SymmetryTable {
    /// Complete, involutive table for the 68-point layout.
    pub const fn ibug68() -> Self {
        let mut mirror = [None; LANDMARK_COUNT];

        let mut i = 0;
        while i < IBUG68_PAIRS.len() {
            let (a, b) = IBUG68_PAIRS[i];
            mirror[a as usize] = Some(b);
            mirror[b as usize] = Some(a);
            i += 1;
        }

        let mut i = 0;
        while i < IBUG68_MIDLINE.len() {
            let m = IBUG68_MIDLINE[i];
            mirror[m as usize] = Some(m);
            i += 1;
        }

        Self { mirror }
    }

    /// Build a partial table; each pair is registered in both directions.
    ///
    /// An index may appear in several pairs only if they all name the same
    /// partner, so the result is always involutive.
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Result<Self, CurveError> {
        let mut mirror = [None; LANDMARK_COUNT];
        for &(a, b) in pairs {
            for index in [a, b] {
                if index >= LANDMARK_COUNT {
                    return Err(CurveError::LandmarkIndexOutOfRange {
                        index,
                        len: LANDMARK_COUNT,
                    });
                }
            }
            for (from, to) in [(a, b), (b, a)] {
                match mirror[from] {
                    Some(existing) if usize::from(existing) != to => {
                        return Err(CurveError::NonInvolutiveMirror(from));
                    }
                    _ => mirror[from] = Some(to as u8),
                }
            }
        }
        Ok(Self { mirror })
    }

    /// One-directional entries, for exercising checks on broken tables.
    #[cfg(test)]
    pub(crate) fn from_entries(entries: &[(usize, usize)]) -> Self {
        let mut mirror = [None; LANDMARK_COUNT];
        for &(from, to) in entries {
            mirror[from] = Some(to as u8);
        }
        Self { mirror }
    }

    /// Mirror image of `index`, or `None` if it has no entry.
    pub fn mirror_of(&self, index: usize) -> Option<usize> {
        self.mirror.get(index).copied().flatten().map(usize::from)
    }

    /// True if mirroring twice returns each of `indices` to itself.
    pub fn is_involutive_on(&self, indices: impl IntoIterator<Item = usize>) -> bool {
        indices
            .into_iter()
            .all(|i| self.mirror_of(i).and_then(|m| self.mirror_of(m)) == Some(i))
    }
}

impl Default for SymmetryTable {
    fn default() -> Self {
        Self::ibug68()
    }
}
