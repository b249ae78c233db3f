//! Named debug hooks
//!
//! A `DDebug` drive names a hook instead of holding one. The name is looked
//! up in a shared `DebugHooks` registry every time the drive draws, so hooks
//! can be registered, replaced or removed while the game runs. Debug builds
//! only.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::geometry::Point;
use crate::renderer::colors;
use crate::sim::drive::{DrawContext, Drive};
use crate::sim::gameobj::GameObj;

type Hook = Box<dyn Fn(&GameObj) -> String>;

/// Shared registry of named hooks; clones share the same table
#[derive(Clone, Default)]
pub struct DebugHooks {
    hooks: Rc<RefCell<HashMap<String, Hook>>>,
}

impl fmt::Debug for DebugHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.hooks.borrow().keys().cloned().collect();
        f.debug_struct("DebugHooks").field("names", &names).finish()
    }
}

impl DebugHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, hook: impl Fn(&GameObj) -> String + 'static) {
        self.hooks.borrow_mut().insert(name.into(), Box::new(hook));
    }

    pub fn remove(&self, name: &str) -> bool {
        self.hooks.borrow_mut().remove(name).is_some()
    }

    /// Run the hook called `name`, if one is registered
    pub fn call(&self, name: &str, obj: &GameObj) -> Option<String> {
        self.hooks.borrow().get(name).map(|hook| hook(obj))
    }
}

/// Draws whatever the named hook returns for this object
#[derive(Debug, Clone)]
pub struct DDebug {
    pub hook: String,
    hooks: DebugHooks,
}

impl DDebug {
    pub fn new(hooks: &DebugHooks, hook: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            hooks: hooks.clone(),
        }
    }
}

impl Drive for DDebug {
    fn draw(&mut self, obj: &GameObj, ctx: &mut DrawContext<'_>) {
        match self.hooks.call(&self.hook, obj) {
            Some(text) => ctx.canvas.text(Point::new(0.0, 0.25), &text, colors::RED),
            None => log::trace!("No debug hook named {:?}", self.hook),
        }
    }
}
