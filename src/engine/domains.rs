//! Groups the three region-class dependency domains (C6) and the three
//! region-class coherency controllers (C7) the engine drives in
//! lock-step as it resolves and dispatches each access.

use crate::coherency::{interval::IntervalCoherency, point::PointCoherency, tile::TileCoherency};
use crate::domain::{interval::IntervalDomain, point::PointDomain, tile::TileDomain};

#[derive(Default)]
pub struct Domains {
    pub point: PointDomain,
    pub interval: IntervalDomain,
    pub tile: TileDomain,
}

#[derive(Default)]
pub struct Coherencies {
    pub point: PointCoherency,
    pub interval: IntervalCoherency,
    pub tile: TileCoherency,
}
