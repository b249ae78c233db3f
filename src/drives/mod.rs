//! Stock drives
//!
//! Gameplay and debug behaviors built only on the public drive contract:
//! - `magnet`: point, line and rect force fields
//! - `camera`: camera follow within bound regions
//! - `avatar`: keyboard-controlled player movement
//! - `text`, `outline`: debug overlays
//! - `debug`: named late-bound hooks (debug builds only)

pub mod avatar;
pub mod camera;
#[cfg(debug_assertions)]
pub mod debug;
pub mod magnet;
pub mod outline;
pub mod text;

pub use avatar::{AvatarAnim, DAvatar};
pub use camera::DCameraFollow;
#[cfg(debug_assertions)]
pub use debug::{DDebug, DebugHooks};
pub use magnet::{DLineMagnet, DMagnet, DRectMagnet, Field, mag_force};
pub use outline::DGeomOutline;
pub use text::DDebugText;
