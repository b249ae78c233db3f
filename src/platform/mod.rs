//! Platform layer
//!
//! The interactive frontend: a canvas to draw on, a frame clock, an input
//! source and per-key bindings. Windowing itself is left to whoever supplies
//! the canvas and the input source.

pub mod clock;
pub mod input;

pub use clock::{Clock, FixedClock, FrameClock};
pub use input::{InputSource, NullInput, ScriptedInput};

use std::collections::HashMap;
use std::fmt;
use std::ops::ControlFlow;

use crate::renderer::{Camera, Canvas};
use crate::settings::SimSettings;
use crate::sim::{Frontend, InputEvent, Key, Simulation};

/// Called when its key goes down; free to change the simulation between steps
pub type KeyHandler = Box<dyn FnMut(&mut Simulation)>;

pub struct Interface<C: Canvas> {
    opened: bool,
    canvas: C,
    pub camera: Camera,
    clock: Box<dyn Clock>,
    input: Box<dyn InputSource>,
    bindings: HashMap<Key, KeyHandler>,
    max_fps: u32,
    frame_secs: f64,
    frames: u64,
}

impl<C: Canvas> fmt::Debug for Interface<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("opened", &self.opened)
            .field("camera", &self.camera)
            .field("bindings", &self.bindings.len())
            .field("max_fps", &self.max_fps)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl<C: Canvas> Interface<C> {
    /// A closed interface; nothing is drawn until `open`
    pub fn new(
        settings: &SimSettings,
        canvas: C,
        clock: impl Clock + 'static,
        input: impl InputSource + 'static,
    ) -> Self {
        Self {
            opened: false,
            canvas,
            camera: Camera::from_settings(settings),
            clock: Box::new(clock),
            input: Box::new(input),
            bindings: HashMap::new(),
            max_fps: settings.max_fps,
            frame_secs: 0.0,
            frames: 0,
        }
    }

    pub fn open(&mut self) {
        if !self.opened {
            self.opened = true;
            let px = self.camera.screen_size();
            log::info!("Interface open: {}x{} px at most {} fps", px.w, px.h, self.max_fps);
        }
    }

    pub fn close(&mut self) {
        if self.opened {
            self.opened = false;
            log::info!("Interface closed after {} frames", self.frames);
        }
    }

    /// Run `handler` whenever `key` goes down; replaces any earlier binding
    pub fn bind(&mut self, key: Key, handler: impl FnMut(&mut Simulation) + 'static) {
        self.bindings.insert(key, Box::new(handler));
    }

    pub fn unbind(&mut self, key: Key) -> bool {
        self.bindings.remove(&key).is_some()
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl<C: Canvas> Frontend for Interface<C> {
    fn is_open(&self) -> bool {
        self.opened
    }

    fn tick_clock(&mut self) -> u64 {
        let ms = self.clock.tick(self.max_fps);
        self.frame_secs = ms as f64 / 1000.0;
        ms
    }

    fn process_input(&mut self, sim: &mut Simulation) -> ControlFlow<()> {
        sim.input.begin_frame();
        let mut quit = false;
        for event in self.input.poll() {
            sim.input.apply(event);
            match event {
                InputEvent::Quit => quit = true,
                InputEvent::KeyDown(key) => {
                    if let Some(handler) = self.bindings.get_mut(&key) {
                        handler(sim);
                    }
                }
                InputEvent::KeyUp(_) => {}
            }
        }
        if quit { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
    }

    fn draw_frame(&mut self, sim: &mut Simulation) {
        sim.draw(&mut self.canvas, &mut self.camera, self.frame_secs);
        self.frames += 1;
    }
}
