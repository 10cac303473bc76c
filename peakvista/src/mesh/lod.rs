//! Discrete mesh detail levels.

use std::fmt;

/// Level of detail for a terrain mesh.
///
/// Ordered from coarsest to finest so `min` clamps to a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lod {
    /// Every 8th sample: 33×33 vertices.
    Coarse,
    /// Every 4th sample: 65×65 vertices.
    Medium,
    /// Every 2nd sample: 129×129 vertices.
    Fine,
}

impl Lod {
    /// All levels, coarsest first.
    pub const ALL: [Lod; 3] = [Lod::Coarse, Lod::Medium, Lod::Fine];

    /// Sample stride along each axis.
    #[inline]
    pub fn stride(self) -> usize {
        match self {
            Lod::Coarse => 8,
            Lod::Medium => 4,
            Lod::Fine => 2,
        }
    }

    /// Numeric level: 0 coarse, 1 medium, 2 fine.
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Lod::Coarse => 0,
            Lod::Medium => 1,
            Lod::Fine => 2,
        }
    }

    /// Inverse of [`Lod::index`].
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Lod::Coarse),
            1 => Some(Lod::Medium),
            2 => Some(Lod::Fine),
            _ => None,
        }
    }

    /// Vertices along one edge of a tile mesh at this level.
    #[inline]
    pub fn vertices_per_side(self) -> usize {
        super::SAMPLES_PER_SIDE / self.stride() + 1
    }
}

impl fmt::Display for Lod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lod::Coarse => "coarse",
            Lod::Medium => "medium",
            Lod::Fine => "fine",
        };
        write!(f, "{} ({})", name, self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_coarse_to_fine() {
        assert!(Lod::Coarse < Lod::Medium);
        assert!(Lod::Medium < Lod::Fine);
        assert_eq!(Lod::Fine.min(Lod::Medium), Lod::Medium);
    }

    #[test]
    fn test_index_roundtrip() {
        for lod in Lod::ALL {
            assert_eq!(Lod::from_index(lod.index()), Some(lod));
        }
        assert_eq!(Lod::from_index(3), None);
    }

    #[test]
    fn test_vertices_per_side() {
        assert_eq!(Lod::Coarse.vertices_per_side(), 33);
        assert_eq!(Lod::Medium.vertices_per_side(), 65);
        assert_eq!(Lod::Fine.vertices_per_side(), 129);
    }
}
