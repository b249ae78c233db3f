//! Fixed timestep stepping and the run loop
//!
//! Wall-clock time is accumulated and converted into a whole number of
//! fixed-size physics steps. Accumulating (rather than dividing each frame's
//! time on its own) means four 5 ms frames run exactly as many steps as one
//! 20 ms frame.

use std::ops::ControlFlow;

use super::collision::Dispatcher;
use super::drive::{DrawContext, StepContext};
use super::physics::JointGroup;
use super::state::Simulation;
use crate::error::{Result, SimError};
use crate::renderer::{Camera, Canvas};

/// Converts accumulated milliseconds into a step count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReconciler {
    step_rate_hz: u32,
    total_ms: u64,
    total_steps: u64,
}

impl StepReconciler {
    pub fn new(step_rate_hz: u32) -> Self {
        Self {
            step_rate_hz,
            total_ms: 0,
            total_steps: 0,
        }
    }

    /// Account for `elapsed_ms` more wall-clock time and return how many steps
    /// to run now. Zero on a short frame is normal. With a budget the running
    /// total never passes it.
    pub fn advance(&mut self, elapsed_ms: u64, budget: Option<u64>) -> u64 {
        self.total_ms += elapsed_ms;
        let target = self.total_ms * u64::from(self.step_rate_hz) / 1000;
        let mut steps = target.saturating_sub(self.total_steps);
        if let Some(budget) = budget {
            steps = steps.min(budget.saturating_sub(self.total_steps));
        }
        self.total_steps += steps;
        steps
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }
}

/// What the run loop needs from a display and input backend
pub trait Frontend {
    /// False when there is no display; the loop then runs headless
    fn is_open(&self) -> bool;

    /// Wait out the frame cap; milliseconds since the previous call
    fn tick_clock(&mut self) -> u64;

    /// Take this frame's input and apply it. `Break` requests a quit.
    fn process_input(&mut self, sim: &mut Simulation) -> ControlFlow<()>;

    fn draw_frame(&mut self, sim: &mut Simulation);
}

/// No display at all
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Frontend for Headless {
    fn is_open(&self) -> bool {
        false
    }

    fn tick_clock(&mut self) -> u64 {
        0
    }

    fn process_input(&mut self, _sim: &mut Simulation) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    fn draw_frame(&mut self, _sim: &mut Simulation) {}
}

impl Simulation {
    /// Run exactly one physics step.
    ///
    /// Order: rebuild collision records and contacts (dynamic among
    /// themselves, then dynamic against static), integrate one `dt`, drop the
    /// contacts, sync every object with a body, run every object's step
    /// drives, then apply spawns and despawns the drives asked for.
    pub fn step_once(&mut self) {
        self.records.clear();
        let mut group = JointGroup::new();
        let stats = {
            let mut dispatcher = Dispatcher::new(&mut self.world, &mut group, &mut self.records, self.contact_params);
            dispatcher.within(self.dynamic_space);
            dispatcher.between(self.dynamic_space.into(), self.static_space.into());
            dispatcher.finish()
        };
        log::trace!(
            "Step {}: {} pairs, {} contacts, {} joints",
            self.steps_run,
            stats.pairs,
            stats.contacts,
            stats.joints
        );

        let dt = self.settings.dt();
        self.world.quick_step(dt);
        self.world.empty_group(group);

        for obj in self.objects.iter_mut() {
            if obj.body().is_some() || obj.is_limbed() {
                obj.sync(&mut self.world);
            }
        }

        let mut ctx = StepContext::new(
            &mut self.world,
            &self.records,
            &self.input,
            dt,
            self.steps_run,
            &mut self.commands,
        );
        for obj in self.objects.iter_mut() {
            obj.step(&mut ctx);
        }
        self.apply_commands();
        self.steps_run += 1;
    }

    /// Run the game; returns the number of steps run.
    ///
    /// With a closed frontend the budget is run back to back as fast as
    /// possible, and a missing budget is an error. With an open frontend the
    /// loop paces itself on the frontend's clock until quit or until the
    /// budget is spent. A budget of `Some(0)` means no budget.
    pub fn run(&mut self, frontend: &mut dyn Frontend, max_steps: Option<u64>) -> Result<u64> {
        let budget = max_steps.filter(|&n| n > 0);
        if let Err(err) = self.settings.validate() {
            log::error!("Refusing to run: {err}");
            return Err(err);
        }

        if !frontend.is_open() {
            let Some(budget) = budget else {
                log::error!("No display is open and no step budget was given");
                return Err(SimError::HeadlessWithoutBudget);
            };
            log::info!("Running headless for {budget} steps");
            for _ in 0..budget {
                self.step_once();
            }
            log::info!("Headless run finished: {} steps total", self.steps_run);
            return Ok(budget);
        }

        log::info!(
            "Running interactively at {} Hz, budget {:?}",
            self.settings.step_rate_hz,
            budget
        );
        let mut pacer = StepReconciler::new(self.settings.step_rate_hz);
        loop {
            let elapsed = frontend.tick_clock();
            for _ in 0..pacer.advance(elapsed, budget) {
                self.step_once();
            }

            let flow = frontend.process_input(self);
            if frontend.is_open() {
                frontend.draw_frame(self);
            }
            if flow.is_break() {
                log::info!("Quit requested after {} steps", pacer.total_steps());
                break;
            }
            if budget.is_some_and(|b| pacer.total_steps() >= b) {
                break;
            }
        }
        log::info!(
            "Run finished: {} steps in {} ms",
            pacer.total_steps(),
            pacer.total_ms()
        );
        Ok(pacer.total_steps())
    }

    /// Draw one frame: predraw every object, then draw every object with the
    /// canvas shifted so the camera center is at the origin
    pub fn draw(&mut self, canvas: &mut dyn Canvas, camera: &mut Camera, frame_secs: f64) {
        let mut ctx = DrawContext {
            canvas,
            camera,
            world: &self.world,
            frame_secs,
        };
        for obj in self.objects.iter_mut() {
            obj.predraw(&mut ctx);
        }
        ctx.canvas.push();
        ctx.canvas.translate(-ctx.camera.center);
        for obj in self.objects.iter_mut() {
            obj.draw(&mut ctx);
        }
        ctx.canvas.pop();
    }
}
