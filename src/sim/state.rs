//! Simulation context
//!
//! Everything one running game needs: the physics world, the static and
//! dynamic collision spaces, the layered object collection, this step's
//! collision records and the current input. Stepping and the run loop live
//! in `tick`.

use super::collision::CollisionRecords;
use super::drive::SimCommand;
use super::gameobj::{GameObj, ObjId};
use super::input::InputState;
use super::physics::{ContactParams, PhysicsWorld, SpaceHandle};
use crate::collections::{Identity, LayeredList};
use crate::consts::LAYER_COUNT;
use crate::error::{Result, SimError};
use crate::settings::SimSettings;

/// Top-level draw-order slots of the object collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    /// Non-colliding background imagery
    Background,
    /// Walls and fixtures; collide only with dynamic objects
    Static,
    /// Non-player physics objects
    Dynamic,
    /// The player's object
    Player,
    /// Foreground dynamic objects (dust, sparks)
    Foreground,
    /// Non-colliding close-up imagery
    ForegroundImagery,
    /// Lighting
    Light,
}

impl Layer {
    pub const ALL: [Layer; LAYER_COUNT] = [
        Layer::Background,
        Layer::Static,
        Layer::Dynamic,
        Layer::Player,
        Layer::Foreground,
        Layer::ForegroundImagery,
        Layer::Light,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Layer> {
        Layer::ALL.get(index).copied()
    }
}

/// Which collision space a layer's geoms belong in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpaceKind {
    Static,
    Dynamic,
    None,
}

impl From<Layer> for SpaceKind {
    fn from(layer: Layer) -> Self {
        match layer {
            Layer::Static => SpaceKind::Static,
            Layer::Dynamic | Layer::Player | Layer::Foreground => SpaceKind::Dynamic,
            Layer::Background | Layer::ForegroundImagery | Layer::Light => SpaceKind::None,
        }
    }
}

#[derive(Debug)]
pub struct Simulation {
    pub settings: SimSettings,
    pub world: PhysicsWorld,
    /// Current frame's input, visible to drives while stepping
    pub input: InputState,
    pub(crate) static_space: SpaceHandle,
    pub(crate) dynamic_space: SpaceHandle,
    pub(crate) objects: LayeredList<GameObj>,
    pub(crate) records: CollisionRecords,
    pub(crate) contact_params: ContactParams,
    pub(crate) commands: Vec<SimCommand>,
    pub(crate) steps_run: u64,
}

impl Simulation {
    /// Create the world, both spaces and an empty seven-layer collection
    pub fn init(settings: SimSettings) -> Self {
        let mut world = PhysicsWorld::new(&settings);
        let static_space = world.create_space(None);
        let dynamic_space = world.create_space(None);
        if let Err(err) = settings.validate() {
            log::warn!("Simulation init with unusable settings, run() will refuse: {err}");
        }
        log::info!(
            "Simulation init: {} Hz, {} solver iterations, gravity ({}, {})",
            settings.step_rate_hz,
            settings.solver_iterations,
            settings.gravity.x,
            settings.gravity.y
        );
        Self {
            contact_params: ContactParams::from_settings(&settings),
            settings,
            world,
            input: InputState::new(),
            static_space,
            dynamic_space,
            objects: LayeredList::with_leaves(LAYER_COUNT),
            records: CollisionRecords::new(),
            commands: Vec::new(),
            steps_run: 0,
        }
    }

    /// Destroy every object and clear the world. The context can be reused
    /// afterwards, starting from an empty collection.
    pub fn deinit(&mut self) {
        let mut objects = self.objects.take_all();
        for obj in &mut objects {
            obj.destroy(&mut self.world);
        }
        self.world.clear();
        self.records.clear();
        self.commands.clear();
        self.static_space = self.world.create_space(None);
        self.dynamic_space = self.world.create_space(None);
        log::info!("Simulation deinit: {} objects destroyed after {} steps", objects.len(), self.steps_run);
    }

    pub fn static_space(&self) -> SpaceHandle {
        self.static_space
    }

    pub fn dynamic_space(&self) -> SpaceHandle {
        self.dynamic_space
    }

    /// The space geoms of `layer` should live in, if any
    pub fn space_for(&self, layer: Layer) -> Option<SpaceHandle> {
        match SpaceKind::from(layer) {
            SpaceKind::Static => Some(self.static_space),
            SpaceKind::Dynamic => Some(self.dynamic_space),
            SpaceKind::None => None,
        }
    }

    /// Add an object at the end of `layer`.
    ///
    /// A geom not yet in any space is put in the layer's space.
    pub fn spawn(&mut self, layer: Layer, mut obj: GameObj) -> Result<ObjId> {
        let id = obj.id();
        if let (Some(g), Some(space)) = (obj.geom(), self.space_for(layer)) {
            let placed = self.world.geom(g).is_some_and(|geom| geom.space().is_some());
            if !placed {
                self.world.space_add(space, g.into());
            }
        }
        let Some(node) = self.objects.layer_mut(layer.index()) else {
            obj.destroy(&mut self.world);
            return Err(SimError::UnknownLayer(layer.index()));
        };
        if let Err(mut obj) = node.push(obj) {
            obj.destroy(&mut self.world);
            return Err(SimError::NoLeafLayer);
        }
        log::debug!("Spawned {:?} in {:?}", id, layer);
        Ok(id)
    }

    /// Remove and destroy every object matching `pred`; returns how many
    pub fn despawn_where(&mut self, mut pred: impl FnMut(&GameObj) -> bool) -> usize {
        let mut removed = self.objects.extract_if(|o| pred(o));
        for obj in &mut removed {
            log::debug!("Despawned {:?}", obj.id());
            obj.destroy(&mut self.world);
        }
        removed.len()
    }

    pub fn despawn(&mut self, id: ObjId) -> bool {
        self.despawn_where(|o| o.id() == id) > 0
    }

    pub fn get(&self, id: ObjId) -> Option<&GameObj> {
        self.objects.find(Identity::from(id))
    }

    pub fn get_mut(&mut self, id: ObjId) -> Option<&mut GameObj> {
        self.objects.find_mut(Identity::from(id))
    }

    /// An object together with the world, for changes that write through to
    /// its body or geom
    pub fn get_with_world(&mut self, id: ObjId) -> Option<(&mut GameObj, &mut PhysicsWorld)> {
        let obj = self.objects.find_mut(Identity::from(id))?;
        Some((obj, &mut self.world))
    }

    /// Every object, in draw order
    pub fn objects(&self) -> impl Iterator<Item = &GameObj> {
        self.objects.iter()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut GameObj> {
        self.objects.iter_mut()
    }

    /// Objects in one layer, in draw order
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &GameObj> {
        self.objects.layer(layer.index()).into_iter().flat_map(|node| node.iter())
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Collisions found during the last step
    pub fn collisions(&self) -> &CollisionRecords {
        &self.records
    }

    pub fn steps_run(&self) -> u64 {
        self.steps_run
    }

    /// Apply structural changes drives asked for while stepping
    pub(crate) fn apply_commands(&mut self) {
        for cmd in std::mem::take(&mut self.commands) {
            match cmd {
                SimCommand::Spawn(layer, obj) => {
                    if let Err(e) = self.spawn(layer, obj) {
                        log::warn!("Deferred spawn failed: {e}");
                    }
                }
                SimCommand::Despawn(id) => {
                    self.despawn(id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::sim::collision::CollProps;
    use crate::sim::mold::GeomMold;

    fn ball(sim: &mut Simulation, pos: Point) -> GameObj {
        let geom = GeomMold::default().make_geom(&mut sim.world, Size::new(1.0, 1.0), None, Some(CollProps::default()));
        let body = sim.world.sphere_body(1.0, 0.5);
        GameObj::new(&mut sim.world, pos, 0.0, Some(body), Some(geom))
    }

    #[test]
    fn test_layers_are_ordered() {
        assert_eq!(Layer::ALL.len(), LAYER_COUNT);
        for (i, layer) in Layer::ALL.iter().enumerate() {
            assert_eq!(layer.index(), i);
            assert_eq!(Layer::from_index(i), Some(*layer));
        }
        assert_eq!(Layer::from_index(LAYER_COUNT), None);
    }

    #[test]
    fn test_spawn_places_geom_by_layer() {
        let mut sim = Simulation::init(SimSettings::default());
        let wall = ball(&mut sim, Point::new(0.0, 5.0));
        let wall_geom = wall.geom().unwrap();
        let mover = ball(&mut sim, Point::ZERO);
        let mover_geom = mover.geom().unwrap();
        let backdrop = ball(&mut sim, Point::ZERO);
        let backdrop_geom = backdrop.geom().unwrap();

        sim.spawn(Layer::Static, wall).unwrap();
        let mover_id = sim.spawn(Layer::Player, mover).unwrap();
        sim.spawn(Layer::Background, backdrop).unwrap();

        assert_eq!(sim.world.geom(wall_geom).unwrap().space(), Some(sim.static_space()));
        assert_eq!(sim.world.geom(mover_geom).unwrap().space(), Some(sim.dynamic_space()));
        assert_eq!(sim.world.geom(backdrop_geom).unwrap().space(), None);
        assert_eq!(sim.object_count(), 3);
        assert_eq!(sim.layer(Layer::Player).count(), 1);
        assert!(sim.get(mover_id).is_some());

        // Draw order follows the layers, not spawn order
        let order: Vec<Option<_>> = sim.objects().map(|o| o.geom()).collect();
        assert_eq!(order, vec![Some(backdrop_geom), Some(wall_geom), Some(mover_geom)]);
    }

    #[test]
    fn test_despawn_destroys_resources() {
        let mut sim = Simulation::init(SimSettings::default());
        let obj = ball(&mut sim, Point::ZERO);
        let id = sim.spawn(Layer::Dynamic, obj).unwrap();
        assert_eq!(sim.world.geom_count(), 1);
        assert!(sim.despawn(id));
        assert!(!sim.despawn(id));
        assert_eq!(sim.world.geom_count(), 0);
        assert_eq!(sim.world.body_count(), 0);
        assert!(sim.world.space(sim.dynamic_space()).unwrap().members().is_empty());
    }

    #[test]
    fn test_deinit_clears_everything() {
        let mut sim = Simulation::init(SimSettings::default());
        for i in 0..3 {
            let obj = ball(&mut sim, Point::new(i as f64, 0.0));
            sim.spawn(Layer::Dynamic, obj).unwrap();
        }
        sim.deinit();
        assert_eq!(sim.object_count(), 0);
        assert_eq!(sim.world.body_count(), 0);
        assert!(sim.world.space(sim.dynamic_space()).is_some());
    }
}
