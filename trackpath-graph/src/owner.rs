//! Tile/vehicle ownership.

/// The owner of a tile or vehicle.
///
/// `None` is used for tiles nobody owns (town-owned roads, unowned water).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Owner {
    Company(u16),
    None,
}

impl Owner {
    /// Whether `self` is allowed to enter/build on a tile owned by `other`.
    ///
    /// Rail forbids crossing owner boundaries outright. Road permits it
    /// when the tile is publicly owned.
    #[must_use]
    pub fn compatible_with(self, other: Owner, public_road_exception: bool) -> bool {
        self == other || (public_road_exception && other == Owner::None)
    }
}
