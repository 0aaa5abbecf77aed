use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::camera::OrbitCamera;
use crate::environment::{DirectionalLight, Lighting, MOON_DISC_POSITION, MOON_DISC_RADIUS};
use crate::scene::components::{MeshHandle, Transform};
use crate::scene::SceneState;

/// Per-frame uniform shared by the mesh and sprite pipelines.
/// Matches `Frame` in both shaders. 256 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    /// Linear sky/fog color.
    pub sky: [f32; 4],
    /// x = fog near, y = fog far.
    pub fog: [f32; 4],
    pub ambient: [f32; 4],
    /// Sun, moon, bottom fill. Unit vectors toward each light.
    pub light_dirs: [[f32; 4]; 3],
    /// Linear radiance; zero for hidden lights.
    pub light_colors: [[f32; 4]; 3],
}

/// sRGB-encoded channel to linear.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_rgb(rgb: [f32; 3]) -> [f32; 4] {
    [
        srgb_to_linear(rgb[0]),
        srgb_to_linear(rgb[1]),
        srgb_to_linear(rgb[2]),
        1.0,
    ]
}

fn light_terms(light: &DirectionalLight) -> ([f32; 4], [f32; 4]) {
    let dir = light.to_light().extend(0.0).to_array();
    let mut color = linear_rgb(light.color);
    let k = if light.visible { light.intensity } else { 0.0 };
    for c in &mut color[..3] {
        *c *= k;
    }
    color[3] = 0.0;
    (dir, color)
}

impl FrameUniform {
    pub fn new(camera: &OrbitCamera, lighting: &Lighting) -> Self {
        let (right, up) = camera.right_up();
        let lights = [&lighting.sun, &lighting.moon, &lighting.bottom].map(light_terms);
        let mut ambient = linear_rgb(lighting.ambient_color);
        for c in &mut ambient[..3] {
            *c *= lighting.ambient_intensity;
        }

        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            camera_pos: camera.eye().extend(1.0).to_array(),
            camera_right: right.extend(0.0).to_array(),
            camera_up: up.extend(0.0).to_array(),
            sky: linear_rgb(lighting.sky),
            fog: [lighting.fog_near, lighting.fog_far, 0.0, 0.0],
            ambient,
            light_dirs: lights.map(|(dir, _)| dir),
            light_colors: lights.map(|(_, color)| color),
        }
    }

    /// Clear color for the sky.
    pub fn clear_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: self.sky[0] as f64,
            g: self.sky[1] as f64,
            b: self.sky[2] as f64,
            a: 1.0,
        }
    }
}

/// Mesh vertex. Stride = 24 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Per-node instance data. Stride = 80 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    /// Linear RGBA.
    pub color: [f32; 4],
}

/// One instance slot per mesh, indexed by [`MeshHandle`].
pub fn build_mesh_instances(scene: &SceneState) -> Vec<MeshInstance> {
    let mut instances: Vec<MeshInstance> = scene
        .meshes
        .iter()
        .map(|m| MeshInstance {
            model: [[0.0; 4]; 4],
            color: m.color,
        })
        .collect();

    for (_entity, (transform, handle)) in scene.world.query::<(&Transform, &MeshHandle)>().iter() {
        if let Some(slot) = instances.get_mut(handle.0) {
            slot.model = transform.matrix().to_cols_array_2d();
        }
    }
    instances
}

/// Sprite shapes understood by `sprite.wgsl`.
pub const SHAPE_PUFF: u32 = 0;
pub const SHAPE_GLOW: u32 = 1;
pub const SHAPE_DISC: u32 = 2;

const SMOKE_SIZE: f32 = 0.1;
const SMOKE_COLOR: [f32; 3] = [0.8, 0.8, 0.8];
const SMOKE_OPACITY: f32 = 0.6;
const FIREFLY_SIZE: f32 = 0.06;
const FIREFLY_COLOR: [f32; 3] = [0.85, 1.0, 0.35];
const MOON_COLOR: [f32; 3] = [0.96, 0.96, 0.86];

/// Camera-facing quad. Stride = 36 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpriteInstance {
    /// World-space center.
    pub position: [f32; 3],
    /// Half-extent in world units.
    pub size: f32,
    /// Linear RGBA.
    pub color: [f32; 4],
    pub shape: u32,
}

impl SpriteInstance {
    fn new(position: Vec3, size: f32, rgb: [f32; 3], alpha: f32, shape: u32) -> Self {
        let [r, g, b, _] = linear_rgb(rgb);
        Self {
            position: position.to_array(),
            size,
            color: [r, g, b, alpha.clamp(0.0, 1.0)],
            shape,
        }
    }
}

/// Smoke puffs, visible fireflies and the moon disc for this frame.
pub fn build_sprites(scene: &SceneState, lighting: &Lighting) -> Vec<SpriteInstance> {
    let mut sprites = Vec::with_capacity(scene.smoke.len() + scene.fireflies.flies().len() + 1);

    let ceiling = scene.smoke.ceiling().max(f32::EPSILON);
    for puff in scene.smoke.puffs() {
        let fade = 1.0 - (puff.position.y / ceiling).clamp(0.0, 1.0) * 0.5;
        sprites.push(SpriteInstance::new(
            puff.position,
            SMOKE_SIZE,
            SMOKE_COLOR,
            SMOKE_OPACITY * fade,
            SHAPE_PUFF,
        ));
    }

    if scene.fireflies.is_visible() {
        for fly in scene.fireflies.flies() {
            sprites.push(SpriteInstance::new(
                fly.position,
                FIREFLY_SIZE,
                FIREFLY_COLOR,
                fly.intensity / 2.0,
                SHAPE_GLOW,
            ));
        }
    }

    if lighting.moon_disc_visible {
        sprites.push(SpriteInstance::new(
            MOON_DISC_POSITION,
            MOON_DISC_RADIUS,
            MOON_COLOR,
            1.0,
            SHAPE_DISC,
        ));
    }
    sprites
}
