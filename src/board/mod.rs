//! Board representation and game-state types.
//!
//! Contains the core data structures for provinces, units, adjacency,
//! orders, and the board snapshot.

pub mod adjacency;
pub mod order;
pub mod province;
pub mod state;
pub mod unit;

pub use adjacency::{AdjacencyEntry, AdjacencyGraph};
pub use order::{Location, Order, OrderUnit};
pub use province::{Coast, Power, ProvinceId, ProvinceInfo, Terrain, ALL_POWERS};
pub use state::{BoardState, Phase, Season};
pub use unit::{DislodgedUnit, Unit, UnitType};
