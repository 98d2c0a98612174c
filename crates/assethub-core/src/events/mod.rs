//! Domain events emitted by AssetHub operations.
//!
//! Events are dispatched to the lifecycle hook handlers registered on the
//! asset service. `before_*` events can be vetoed by a handler.

pub mod asset;

pub use asset::{AssetEvent, AssetEventKind, AssetRef};
