//! Drives: the behavior units attached to game objects
//!
//! A drive can step (change game state once per physics step), predraw
//! (adjust things like the camera before anything is drawn) and draw. Every
//! hook is optional. Drives on one object run in list order, and a later
//! drive sees whatever earlier drives left behind in the same phase.

use std::fmt;

use super::collision::CollisionRecords;
use super::gameobj::{GameObj, ObjId};
use super::input::InputState;
use super::physics::PhysicsWorld;
use super::state::Layer;
use crate::geometry::Point;
use crate::renderer::{Camera, Canvas};

/// Behavior attached to a `GameObj`
pub trait Drive: fmt::Debug {
    /// Called once per physics step, after the world has been integrated and synced
    fn step(&mut self, _obj: &mut GameObj, _ctx: &mut StepContext<'_>) {}

    /// Called on every object before any object is drawn
    fn predraw(&mut self, _obj: &mut GameObj, _ctx: &mut DrawContext<'_>) {}

    /// Draw with the canvas already placed at the object (and this drive's offsets)
    fn draw(&mut self, _obj: &GameObj, _ctx: &mut DrawContext<'_>) {}
}

/// A drive plus its per-instance switches and placement
#[derive(Debug)]
pub struct DriveSlot {
    pub drive: Box<dyn Drive>,
    /// When false, `predraw` and `draw` are skipped
    pub drawing: bool,
    /// When false, `step` is skipped
    pub stepping: bool,
    /// Extra translation for this drive's drawing, in the object's frame
    pub draw_offset: Option<Point>,
    /// Extra rotation for this drive's drawing, applied after the offset
    pub rot_offset: Option<f64>,
}

impl DriveSlot {
    pub fn new(drive: impl Drive + 'static) -> Self {
        Self::boxed(Box::new(drive))
    }

    pub fn boxed(drive: Box<dyn Drive>) -> Self {
        Self {
            drive,
            drawing: true,
            stepping: true,
            draw_offset: None,
            rot_offset: None,
        }
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.draw_offset = Some(offset);
        self
    }

    pub fn with_rotation(mut self, ang: f64) -> Self {
        self.rot_offset = Some(ang);
        self
    }

    pub fn stepping(mut self, on: bool) -> Self {
        self.stepping = on;
        self
    }

    pub fn drawing(mut self, on: bool) -> Self {
        self.drawing = on;
        self
    }

    pub(crate) fn run_step(&mut self, obj: &mut GameObj, ctx: &mut StepContext<'_>) {
        if self.stepping {
            self.drive.step(obj, ctx);
        }
    }

    pub(crate) fn run_predraw(&mut self, obj: &mut GameObj, ctx: &mut DrawContext<'_>) {
        if self.drawing {
            self.drive.predraw(obj, ctx);
        }
    }

    pub(crate) fn run_draw(&mut self, obj: &GameObj, ctx: &mut DrawContext<'_>) {
        if !self.drawing {
            return;
        }
        let scoped = self.draw_offset.is_some() || self.rot_offset.is_some();
        if scoped {
            ctx.canvas.push();
            if let Some(offset) = self.draw_offset {
                ctx.canvas.translate(offset);
            }
            if let Some(ang) = self.rot_offset {
                ctx.canvas.rotate(ang);
            }
        }
        self.drive.draw(obj, ctx);
        if scoped {
            ctx.canvas.pop();
        }
    }
}

/// Structural changes requested by drives, applied after the step phase
#[derive(Debug)]
pub enum SimCommand {
    Spawn(Layer, GameObj),
    Despawn(ObjId),
}

/// What a drive may touch while stepping
pub struct StepContext<'a> {
    pub world: &'a mut PhysicsWorld,
    /// Collisions found during this step
    pub collisions: &'a CollisionRecords,
    pub input: &'a InputState,
    /// Seconds per step
    pub dt: f64,
    /// Steps completed before this one
    pub step: u64,
    pub(crate) commands: &'a mut Vec<SimCommand>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        world: &'a mut PhysicsWorld,
        collisions: &'a CollisionRecords,
        input: &'a InputState,
        dt: f64,
        step: u64,
        commands: &'a mut Vec<SimCommand>,
    ) -> Self {
        Self {
            world,
            collisions,
            input,
            dt,
            step,
            commands,
        }
    }

    /// Add an object once the step phase is over
    pub fn spawn(&mut self, layer: Layer, obj: GameObj) {
        self.commands.push(SimCommand::Spawn(layer, obj));
    }

    /// Remove an object once the step phase is over
    pub fn despawn(&mut self, id: ObjId) {
        self.commands.push(SimCommand::Despawn(id));
    }
}

/// What a drive may touch while drawing
pub struct DrawContext<'a> {
    pub canvas: &'a mut dyn Canvas,
    pub camera: &'a mut Camera,
    pub world: &'a PhysicsWorld,
    /// Wall-clock seconds since the previous frame
    pub frame_secs: f64,
}
