//! Track geometry: [`Track`], [`Trackdir`], [`DiagDir`] and the bitset types
//! built on top of them.
//!
//! Tiles are diamonds, not squares: the four faces a vehicle can cross are
//! the compass-ordinal directions NE/SE/SW/NW, which is what [`DiagDir`]
//! enumerates. A tile can hold up to six track pieces (`Track`): two full
//! diagonals (`X` runs NE-SW, `Y` runs NW-SE) and four corners that turn
//! between adjacent faces (`Upper` NE-NW, `Lower` SE-SW, `Left` NW-SW,
//! `Right` NE-SE). Travelling a piece in a particular direction gives a
//! `Trackdir`; there are twelve of those (six pieces times two directions),
//! plus two reserved slots kept free in the sixteen-bit trackdir bitmask for
//! pseudo-moves the follower synthesizes (forced depot reverse, dead-end
//! road reverse) without needing a real track geometry of their own.

use enumset::{EnumSet, EnumSetType};

/// One of the six track geometries a tile can carry.
#[derive(Debug, Hash, EnumSetType)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[enumset(repr = "u8")]
pub enum Track {
    /// Full diagonal, NE-SW.
    X,
    /// Full diagonal, NW-SE.
    Y,
    /// Corner piece, NE-NW.
    Upper,
    /// Corner piece, SE-SW.
    Lower,
    /// Corner piece, NW-SW.
    Left,
    /// Corner piece, NE-SE.
    Right,
}

/// Set of [`Track`] present on a tile.
pub type TrackBits = EnumSet<Track>;

/// One of the four faces of a (diamond-shaped) tile a vehicle can cross.
#[derive(Debug, Hash, EnumSetType)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[enumset(repr = "u8")]
pub enum DiagDir {
    Ne,
    Se,
    Sw,
    Nw,
}

impl DiagDir {
    /// The opposite face.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            DiagDir::Ne => DiagDir::Sw,
            DiagDir::Se => DiagDir::Nw,
            DiagDir::Sw => DiagDir::Ne,
            DiagDir::Nw => DiagDir::Se,
        }
    }

    /// Row/column offset when stepping one tile in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            DiagDir::Ne => (1, -1),
            DiagDir::Se => (1, 1),
            DiagDir::Sw => (-1, 1),
            DiagDir::Nw => (-1, -1),
        }
    }

    /// All four directions, in ascending-bit-index order.
    ///
    /// Iterating in this fixed order (rather than e.g. a `HashSet`'s
    /// unspecified order) is what makes successor enumeration and tie-breaks
    /// deterministic, per the engine's determinism requirement.
    pub const ALL: [DiagDir; 4] = [DiagDir::Ne, DiagDir::Se, DiagDir::Sw, DiagDir::Nw];
}

/// A directed track piece: a [`Track`] plus a direction of travel across it.
///
/// Variant names give the entry face then the exit face, e.g. `NeSw` enters
/// a tile at its NE face and leaves at SW (travelling [`Track::X`]).
#[derive(Debug, Hash, EnumSetType)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[enumset(repr = "u16")]
pub enum Trackdir {
    NeSw,
    SwNe,
    NwSe,
    SeNw,
    NwNe,
    NeNw,
    SeSw,
    SwSe,
    NwSw,
    SwNw,
    SeNe,
    NeSe,
    // Two bits of the 16-bit trackdir mask are deliberately left unassigned
    // here (spec: "14 valid values"). They are reserved for the follower's
    // synthesized pseudo-moves (forced depot reverse, dead-end reverse),
    // which reuse an existing track's geometry and therefore never need a
    // `Trackdir` variant of their own; see [`TrackdirBits`].
}

/// Bitset of [`Trackdir`], stored as the full 16-bit mask the engine uses
/// (twelve real trackdirs plus two bits permanently reserved, see
/// [`Trackdir`]'s doc comment).
pub type TrackdirBits = EnumSet<Trackdir>;

impl Trackdir {
    /// The track piece this trackdir travels.
    #[must_use]
    pub const fn track(self) -> Track {
        match self {
            Trackdir::NeSw | Trackdir::SwNe => Track::X,
            Trackdir::NwSe | Trackdir::SeNw => Track::Y,
            Trackdir::NwNe | Trackdir::NeNw => Track::Upper,
            Trackdir::SeSw | Trackdir::SwSe => Track::Lower,
            Trackdir::NwSw | Trackdir::SwNw => Track::Left,
            Trackdir::SeNe | Trackdir::NeSe => Track::Right,
        }
    }

    /// Is this trackdir one of the two fully-diagonal pieces (`X`/`Y`)?
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Trackdir::NeSw | Trackdir::SwNe | Trackdir::NwSe | Trackdir::SeNw
        )
    }

    /// The face this trackdir enters a tile by.
    #[must_use]
    pub const fn entry_face(self) -> DiagDir {
        match self {
            Trackdir::NeSw | Trackdir::NeNw | Trackdir::NeSe => DiagDir::Ne,
            Trackdir::SeNw | Trackdir::SeSw | Trackdir::SeNe => DiagDir::Se,
            Trackdir::SwNe | Trackdir::SwSe | Trackdir::SwNw => DiagDir::Sw,
            Trackdir::NwSe | Trackdir::NwNe | Trackdir::NwSw => DiagDir::Nw,
        }
    }

    /// The diagdir you leave the current tile by when traversing this
    /// trackdir.
    #[must_use]
    pub const fn to_exitdir(self) -> DiagDir {
        match self {
            Trackdir::NeSw | Trackdir::SeSw | Trackdir::NwSw => DiagDir::Sw,
            Trackdir::SwNe | Trackdir::NwNe | Trackdir::SeNe => DiagDir::Ne,
            Trackdir::NwSe | Trackdir::SwSe | Trackdir::NeSe => DiagDir::Se,
            Trackdir::SeNw | Trackdir::NeNw | Trackdir::SwNw => DiagDir::Nw,
        }
    }

    /// Reverses the direction of travel, keeping the same track piece.
    ///
    /// `reverse(reverse(td)) == td` for every value; this is one of the
    /// round-trip laws the search engine's depot/dead-end handling relies on.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Trackdir::NeSw => Trackdir::SwNe,
            Trackdir::SwNe => Trackdir::NeSw,
            Trackdir::NwSe => Trackdir::SeNw,
            Trackdir::SeNw => Trackdir::NwSe,
            Trackdir::NwNe => Trackdir::NeNw,
            Trackdir::NeNw => Trackdir::NwNe,
            Trackdir::SeSw => Trackdir::SwSe,
            Trackdir::SwSe => Trackdir::SeSw,
            Trackdir::NwSw => Trackdir::SwNw,
            Trackdir::SwNw => Trackdir::NwSw,
            Trackdir::SeNe => Trackdir::NeSe,
            Trackdir::NeSe => Trackdir::SeNe,
        }
    }

    /// The natural straight-ahead continuation: the trackdir on the *next*
    /// tile that keeps travelling the same track piece in the same sense.
    ///
    /// Used by the rail cost model's curve penalty: a transition to
    /// anything other than this is a curve.
    #[must_use]
    pub const fn next(self) -> Self {
        self
    }

    /// Does travelling `self` then `other` cross at a right angle?
    ///
    /// True exactly when the two trackdirs use the two different diagonal
    /// tracks (`X`/`Y`) - the classic "90 degree turn" shape a
    /// non-diagonal-capable vehicle must avoid.
    #[must_use]
    pub const fn crosses(self, other: Self) -> bool {
        matches!(
            (self.track(), other.track()),
            (Track::X, Track::Y) | (Track::Y, Track::X)
        )
    }
}

impl DiagDir {
    /// The [`TrackdirBits`] reachable on the tile you land on after exiting
    /// the previous tile via this diagdir, i.e. the trackdirs whose entry
    /// face is the face opposite `self`.
    #[must_use]
    pub fn reaches_trackdirs(self) -> TrackdirBits {
        let entry = self.reverse();
        EnumSet::<Trackdir>::all()
            .iter()
            .filter(|td| td.entry_face() == entry)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_involution() {
        for td in EnumSet::<Trackdir>::all() {
            assert_eq!(td.reverse().reverse(), td);
            assert_ne!(td.reverse(), td);
            assert_eq!(td.reverse().track(), td.track());
        }
    }

    #[test]
    fn reaches_trackdirs_has_three_bits_per_face() {
        for dir in DiagDir::ALL {
            assert_eq!(dir.reaches_trackdirs().len(), 3);
        }
    }

    #[test]
    fn reaches_trackdirs_partition_all_trackdirs() {
        let union: TrackdirBits = DiagDir::ALL
            .iter()
            .flat_map(|d| d.reaches_trackdirs())
            .collect();
        assert_eq!(union, EnumSet::<Trackdir>::all());
    }

    #[test]
    fn entry_and_exit_faces_are_never_equal() {
        for td in EnumSet::<Trackdir>::all() {
            assert_ne!(td.entry_face(), td.to_exitdir());
        }
    }

    #[test]
    fn diagonal_tracks_connect_opposite_faces() {
        for td in EnumSet::<Trackdir>::all().iter().filter(|t| t.is_diagonal()) {
            assert_eq!(td.to_exitdir(), td.entry_face().reverse());
        }
    }

    #[test]
    fn corner_tracks_connect_adjacent_faces() {
        for td in EnumSet::<Trackdir>::all().iter().filter(|t| !t.is_diagonal()) {
            assert_ne!(td.to_exitdir(), td.entry_face().reverse());
        }
    }

    #[test]
    fn diagonal_trackdirs_flagged_correctly() {
        assert!(Trackdir::NeSw.is_diagonal());
        assert!(!Trackdir::NeNw.is_diagonal());
    }

    #[test]
    fn crosses_is_symmetric_and_only_for_diagonals() {
        assert!(Trackdir::NeSw.crosses(Trackdir::NwSe));
        assert!(Trackdir::NwSe.crosses(Trackdir::NeSw));
        assert!(!Trackdir::NeSw.crosses(Trackdir::SwNe));
        assert!(!Trackdir::NeNw.crosses(Trackdir::SeSw));
    }
}
