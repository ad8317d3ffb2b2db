//! gridbonk: grid-partitioned 2D AABB collision with swept placement and
//! directional touch tracking.

pub mod types;
pub mod error;
pub mod api;
pub mod collider;
pub mod world;
pub mod narrowphase;

pub use crate::types::*;
pub use crate::error::ColliderError;
pub use crate::api::*;
pub use crate::collider::{Collider, CollisionCallback};
pub use crate::narrowphase::Narrowphase;
pub use crate::world::CollisionWorld;
