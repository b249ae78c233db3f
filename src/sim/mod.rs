//! Simulation core
//!
//! Everything that happens inside a step lives here and knows nothing about
//! windows or graphics APIs:
//! - Fixed timestep only; the integration step is derived from the step rate
//! - Objects are stepped in layer order, drives in list order
//! - Drives may not collide or integrate the world themselves

pub mod collision;
pub mod drive;
pub mod gameobj;
pub mod input;
pub mod limbed;
pub mod mold;
pub mod physics;
pub mod state;
pub mod tick;

pub use collision::{CollProps, CollisionEntry, CollisionRecords, Dispatcher, PushRule, push_rule};
pub use drive::{DrawContext, Drive, DriveSlot, SimCommand, StepContext};
pub use gameobj::{GameObj, ObjId, Tether, ang_to_rotation, rotation_to_ang};
pub use input::{InputEvent, InputState, Key};
pub use limbed::{Limb, LimbSet};
pub use mold::GeomMold;
pub use physics::PhysicsWorld;
pub use state::{Layer, Simulation};
pub use tick::{Frontend, Headless, StepReconciler};
