pub mod asset;
pub mod components;

use glam::{Mat4, Vec3};

use crate::character::CharacterMotionController;
use crate::config::SceneConfig;
use crate::environment::{DayNightController, Environment};
use crate::fireflies::FireflySimulator;
use crate::interaction::HitTarget;
use crate::overlay::timer::{SystemPhase, SystemTimers};
use crate::smoke::SmokeSimulator;

use self::asset::{classify, AssetError, MeshData, SceneGraph};
use self::components::{Bounds, MeshHandle, Transform};

/// Puddle next to the cottage.
const WATER_POSITION: Vec3 = Vec3::new(0.2, 0.03, 0.2);
const WATER_SCALE: Vec3 = Vec3::new(0.8, 1.0, 0.7);
const WATER_RADIUS: f32 = 0.8;
const WATER_COLOR: [f32; 4] = [0.435, 0.702, 0.824, 0.8];

/// Where the scene asset stands.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetStatus {
    Loading,
    Loaded { nodes: usize, characters: usize },
    Failed(String),
}

/// Owns every piece of simulation state. Frame loop and input handlers go
/// through here; nothing else keeps scene globals.
pub struct SceneState {
    /// Renderable scene nodes.
    pub world: hecs::World,
    /// Mesh data referenced by [`MeshHandle`]s.
    pub meshes: Vec<MeshData>,
    /// Bumped whenever `meshes` changes so the renderer knows to re-upload.
    pub mesh_generation: u32,
    pub characters: CharacterMotionController,
    pub day_night: DayNightController,
    pub smoke: SmokeSimulator,
    pub fireflies: FireflySimulator,
    pub house: Option<hecs::Entity>,
    pub asset_status: AssetStatus,
}

impl SceneState {
    pub fn new(config: &SceneConfig, rng: &mut fastrand::Rng) -> Self {
        let mut scene = Self {
            world: hecs::World::new(),
            meshes: Vec::new(),
            mesh_generation: 0,
            characters: CharacterMotionController::new(config.motion),
            day_night: DayNightController::new(),
            smoke: SmokeSimulator::new(config.smoke, rng.fork()),
            fireflies: FireflySimulator::new(config.fireflies, rng),
            house: None,
            asset_status: AssetStatus::Loading,
        };
        scene.spawn_mesh(
            Mat4::from_scale_rotation_translation(
                WATER_SCALE,
                glam::Quat::IDENTITY,
                WATER_POSITION,
            ),
            MeshData::disc(WATER_RADIUS, 32, WATER_COLOR),
        );
        scene
    }

    fn spawn_mesh(&mut self, world: Mat4, mesh: MeshData) -> hecs::Entity {
        let (center, radius) = mesh.bounding_sphere();
        let handle = MeshHandle(self.meshes.len());
        self.meshes.push(mesh);
        self.mesh_generation = self.mesh_generation.wrapping_add(1);
        self.world.spawn((
            Transform::from_matrix(world),
            handle,
            Bounds { center, radius },
        ))
    }

    pub fn environment(&self) -> Environment {
        self.day_night.environment()
    }

    /// Completion of the background asset load. Failures leave an empty
    /// scene with no characters.
    pub fn on_asset_loaded(&mut self, result: Result<SceneGraph, AssetError>, now: f32) {
        let graph = match result {
            Ok(graph) => graph,
            Err(e) => {
                log::error!("Scene asset failed to load: {e}");
                self.asset_status = AssetStatus::Failed(e.to_string());
                return;
            }
        };

        let classification = classify(&graph);
        let placements: Vec<(Vec3, Vec3)> = graph
            .nodes
            .iter()
            .map(|n| (n.translation(), n.facing()))
            .collect();
        let mut entities = vec![None; graph.nodes.len()];
        for (i, node) in graph.nodes.into_iter().enumerate() {
            if let Some(mesh) = node.mesh {
                entities[i] = Some(self.spawn_mesh(node.world, mesh));
            }
        }

        self.house = classification.house.and_then(|i| entities[i]);

        for &(role, i) in &classification.characters {
            let Some(entity) = entities[i] else {
                continue;
            };
            let (position, facing) = placements[i];
            if let Err(e) = self
                .characters
                .bind_character(role, entity, position, facing, Some(position))
            {
                log::warn!("Ignoring {} node: {e}", role.node_name());
            }
        }

        let nodes = entities.iter().flatten().count();
        let characters = self.characters.bound_count();
        if characters == 0 {
            log::warn!("Scene loaded without any characters");
        }
        log::info!(
            "Scene bound: {} mesh nodes, house {}, {} characters",
            nodes,
            if self.house.is_some() { "found" } else { "missing" },
            characters,
        );
        self.asset_status = AssetStatus::Loaded { nodes, characters };

        if self.environment().is_night() {
            log::info!("Already night at load time, starting entrance");
            self.characters.request_entrance_on_bind(now);
        }
    }

    /// Day/night button handler.
    pub fn toggle_day_night(&mut self, now: f32) -> Environment {
        self.day_night
            .toggle(now, &mut self.characters, &mut self.fireflies)
    }

    /// One frame of simulation.
    pub fn tick(&mut self, now: f32, delta: f32, timers: &mut SystemTimers) {
        timers.begin();
        self.smoke.advance();
        timers.end(SystemPhase::Smoke);

        timers.begin();
        if self.environment().is_night() {
            self.fireflies.advance(now);
        }
        timers.end(SystemPhase::Fireflies);

        timers.begin();
        self.characters.advance(now, delta);
        self.sync_character_nodes();
        timers.end(SystemPhase::Characters);
    }

    /// Copy controller positions onto the character nodes.
    fn sync_character_nodes(&mut self) {
        for c in self.characters.characters() {
            if let Ok(transform) = self.world.query_one_mut::<&mut Transform>(c.node) {
                transform.translation = c.position;
            }
        }
    }

    /// Bound characters with their world bounding spheres. The house is
    /// never included.
    pub fn character_targets(&self) -> Vec<HitTarget> {
        self.characters
            .characters()
            .filter_map(|c| {
                let transform = *self.world.get::<&Transform>(c.node).ok()?;
                let bounds = *self.world.get::<&Bounds>(c.node).ok()?;
                let (center, radius) = bounds.world(&transform);
                Some(HitTarget {
                    role: c.role,
                    node: c.node,
                    center,
                    radius,
                })
            })
            .collect()
    }
}
