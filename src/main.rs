//! Gyre demo
//!
//! Builds a small scene (a ball above a floor, a magnet, the avatar, a
//! swinging arm and a scatter of crates), runs it headless for a fixed number
//! of steps and logs where everything ended up.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use gyre::drives::{DAvatar, DCameraFollow, DDebugText, DGeomOutline, DMagnet, Field};
use gyre::sim::{CollProps, GameObj, GeomMold, Headless, Layer, Simulation};
use gyre::{Point, Rect, SimSettings, Size};

/// Gyre headless demo
#[derive(Parser)]
#[command(version, about = "Runs the Gyre demo scene headless and logs the final poses")]
struct Cli {
    /// Settings JSON; defaults (with downward gravity) when omitted
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Physics steps to run
    #[arg(long, value_name = "N", default_value_t = 500)]
    steps: u64,

    /// Seed for the crate scatter
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

const CRATES: usize = 5;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => SimSettings::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimSettings {
            gravity: Point::new(0.0, 9.8),
            ..SimSettings::default()
        },
    };

    let mut sim = Simulation::init(settings);
    build_scene(&mut sim, cli.seed)?;

    let steps = sim.run(&mut Headless, Some(cli.steps))?;
    for obj in sim.objects() {
        log::info!("{:?} {:?} at {}", obj.id(), obj.tether(), obj.info());
    }
    log::info!("{steps} steps, {} objects", sim.object_count());
    sim.deinit();
    Ok(())
}

fn build_scene(sim: &mut Simulation, seed: u64) -> anyhow::Result<()> {
    let solid = Some(CollProps::default());

    // Floor, top surface at y = 5
    let floor_geom = GeomMold::Box.make_geom(&mut sim.world, Size::new(12.0, 1.0), None, solid);
    let mut floor = GameObj::new(&mut sim.world, Point::new(0.0, 5.5), 0.0, None, Some(floor_geom));
    floor.add_drive(DGeomOutline::default());
    sim.spawn(Layer::Static, floor)?;

    let ball_mold = GeomMold::default();
    let ball_size = Size::new(1.0, 1.0);
    let ball_geom = ball_mold.make_geom(&mut sim.world, ball_size, None, solid);
    let ball_body = sim.world.create_body(ball_mold.mass(ball_size, 1.0));
    let mut ball = GameObj::new(&mut sim.world, Point::ZERO, 0.0, Some(ball_body), Some(ball_geom));
    ball.add_drive(DGeomOutline::default());
    ball.add_drive(DDebugText::new("ball"));
    sim.spawn(Layer::Dynamic, ball)?;

    let mut magnet = GameObj::untethered(Point::new(3.0, 2.0), 0.0);
    magnet.add_drive(DMagnet::new(Field::new(-2.0).with_radius(3.0).with_loss(0.5)));
    sim.spawn(Layer::Background, magnet)?;

    let avatar_geom = ball_mold.make_geom(&mut sim.world, ball_size, None, Some(CollProps::with_priority(2)));
    let avatar_body = sim.world.sphere_body(1.0, 0.5);
    let mut avatar = GameObj::new(&mut sim.world, Point::new(-2.0, 0.0), 0.0, Some(avatar_body), Some(avatar_geom));
    avatar.add_drive(DAvatar::default());
    let arena = Rect::new(Point::new(0.0, 1.0), Size::new(16.0, 12.0));
    avatar.add_drive(DCameraFollow::bounded(&[arena], sim.settings.viewport, Some(4.0))?);
    #[cfg(debug_assertions)]
    {
        let hooks = gyre::drives::DebugHooks::new();
        hooks.register("pose", |o: &GameObj| o.info());
        avatar.add_drive(gyre::drives::DDebug::new(&hooks, "pose"));
    }
    sim.spawn(Layer::Player, avatar)?;

    // An arm hanging from a fixed pivot
    let dynamic = sim.dynamic_space();
    let mut pivot = GameObj::untethered(Point::new(-4.0, -1.0), 0.0);
    pivot.make_limbed(&mut sim.world, dynamic);
    let arm_size = Size::new(1.5, 0.25);
    let arm_geom = GeomMold::Box.make_geom(&mut sim.world, arm_size, None, solid);
    let arm_body = sim.world.create_body(GeomMold::Box.mass(arm_size, 1.0));
    let mut arm = GameObj::new(&mut sim.world, Point::new(-3.25, -1.0), 0.0, Some(arm_body), Some(arm_geom));
    arm.add_drive(DGeomOutline::default());
    pivot.add_limb(&mut sim.world, arm, Point::ZERO);
    sim.spawn(Layer::Dynamic, pivot)?;

    let mut rng = Pcg32::seed_from_u64(seed);
    for _ in 0..CRATES {
        let size = Size::new(rng.random_range(0.3..0.8), rng.random_range(0.3..0.8));
        let pos = Point::new(rng.random_range(-5.0..5.0), rng.random_range(-3.0..2.0));
        let geom = GeomMold::Box.make_geom(&mut sim.world, size, None, solid);
        let body = sim.world.box_body(0.5, DVec3::new(size.w, size.h, 1.0));
        let mut crate_obj = GameObj::new(&mut sim.world, pos, rng.random(), Some(body), Some(geom));
        crate_obj.add_drive(DGeomOutline::default());
        sim.spawn(Layer::Dynamic, crate_obj)?;
    }
    Ok(())
}
