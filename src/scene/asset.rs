//! Scene asset import and node classification.
//!
//! The import runs on a background thread; the result comes back through a
//! one-shot callback so the caller decides how it re-enters the frame loop.

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::character::Role;

/// Name of the cottage node. Never clickable.
pub const HOUSE_NODE_NAME: &str = "casita";
/// Character candidates at least this large are assumed to be scenery.
const MAX_CHARACTER_RADIUS: f32 = 2.0;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to import scene '{path}': {message}")]
    Import { path: PathBuf, message: String },

    #[error("scene file '{0}' contains no scenes")]
    NoScene(PathBuf),
}

/// Triangle mesh with a flat base color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// Linear RGBA.
    pub color: [f32; 4],
}

impl MeshData {
    /// Center and radius of the sphere around the bounding box.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        let mut points = self.positions.iter().map(|p| Vec3::from_array(*p));
        let Some(first) = points.next() else {
            return (Vec3::ZERO, 0.0);
        };
        let (min, max) = points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        let center = (min + max) * 0.5;
        let radius = self
            .positions
            .iter()
            .map(|p| Vec3::from_array(*p).distance(center))
            .fold(0.0, f32::max);
        (center, radius)
    }

    /// Flat disc in the XZ plane facing +Y.
    pub fn disc(radius: f32, segments: u32, color: [f32; 4]) -> Self {
        let segments = segments.max(3);
        let mut positions = vec![[0.0, 0.0, 0.0]];
        for i in 0..segments {
            let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
            positions.push([radius * theta.cos(), 0.0, -radius * theta.sin()]);
        }
        let normals = vec![[0.0, 1.0, 0.0]; positions.len()];
        let indices = (0..segments)
            .flat_map(|i| [0, 1 + i, 1 + (i + 1) % segments])
            .collect();
        Self {
            positions,
            normals,
            indices,
            color,
        }
    }
}

/// A node of the imported scene with its transform already flattened.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub world: Mat4,
    pub mesh: Option<MeshData>,
}

impl SceneNode {
    pub fn translation(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }

    /// World-space +Z axis of the node.
    pub fn facing(&self) -> Vec3 {
        self.world.transform_vector3(Vec3::Z).normalize_or_zero()
    }

    pub fn bounding_radius(&self) -> f32 {
        self.mesh.as_ref().map_or(0.0, |m| m.bounding_sphere().1)
    }
}

/// Flattened node list of an imported scene.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub nodes: Vec<SceneNode>,
}

/// Node indices picked out of a [`SceneGraph`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub house: Option<usize>,
    /// At most one node per role.
    pub characters: Vec<(Role, usize)>,
}

/// Find the cottage and the two frogs by node name.
///
/// Frog candidates must be small (radius under 2, or unknown); the smallest
/// candidate per role wins. When nothing passes the size filter any name
/// match is accepted.
pub fn classify(graph: &SceneGraph) -> Classification {
    let mut house = None;
    let mut candidates: Vec<(Role, usize, f32)> = Vec::new();
    let mut named: Vec<(Role, usize)> = Vec::new();

    for (i, node) in graph.nodes.iter().enumerate() {
        if node.mesh.is_none() {
            continue;
        }
        if node.name.eq_ignore_ascii_case(HOUSE_NODE_NAME) {
            house.get_or_insert(i);
            continue;
        }
        let Some(role) = Role::from_node_name(&node.name) else {
            continue;
        };
        named.push((role, i));

        let radius = node.bounding_radius();
        if radius == 0.0 || (radius > 0.0 && radius < MAX_CHARACTER_RADIUS) {
            candidates.push((role, i, radius));
        }
    }

    candidates.sort_by(|a, b| a.2.total_cmp(&b.2));
    let picked: Vec<(Role, usize)> = if candidates.is_empty() {
        named
    } else {
        candidates.into_iter().map(|(role, i, _)| (role, i)).collect()
    };

    let mut characters: Vec<(Role, usize)> = Vec::with_capacity(2);
    for (role, i) in picked {
        if !characters.iter().any(|(r, _)| *r == role) {
            characters.push((role, i));
        }
    }

    Classification { house, characters }
}

/// Import a glTF/GLB file and flatten its default scene.
pub fn load_scene(path: &Path) -> Result<SceneGraph, AssetError> {
    let (document, buffers, _images) =
        gltf::import(path).map_err(|e| AssetError::Import {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::NoScene(path.to_path_buf()))?;

    let mut nodes = Vec::new();
    for node in scene.nodes() {
        collect_node(&node, Mat4::IDENTITY, &buffers, &mut nodes);
    }
    Ok(SceneGraph { nodes })
}

fn collect_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<SceneNode>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    out.push(SceneNode {
        name: node.name().unwrap_or_default().to_string(),
        world,
        mesh: node.mesh().map(|mesh| read_mesh(&mesh, buffers)),
    });
    for child in node.children() {
        collect_node(&child, world, buffers, out);
    }
}

/// Merge all primitives of a mesh into one vertex/index list.
fn read_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> MeshData {
    let mut data = MeshData {
        color: [1.0; 4],
        ..Default::default()
    };

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let base = data.positions.len() as u32;
        let count = positions.len() as u32;

        let mut normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|n| n.collect())
            .unwrap_or_default();
        normals.resize(positions.len(), [0.0, 1.0, 0.0]);

        match reader.read_indices() {
            Some(indices) => data.indices.extend(indices.into_u32().map(|i| base + i)),
            None => data.indices.extend(base..base + count),
        }
        data.positions.extend(positions);
        data.normals.extend(normals);
        data.color = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();
    }
    data
}

/// Import `path` on a background thread and hand the result to `on_done`.
pub fn spawn_loader<F>(path: PathBuf, on_done: F) -> std::io::Result<()>
where
    F: FnOnce(Result<SceneGraph, AssetError>) + Send + 'static,
{
    std::thread::Builder::new()
        .name("scene-loader".into())
        .spawn(move || {
            log::info!("Loading scene asset {}", path.display());
            let started = instant::Instant::now();
            let result = load_scene(&path);
            if let Ok(graph) = &result {
                log::info!(
                    "Imported {} nodes in {:.0}ms",
                    graph.nodes.len(),
                    started.elapsed().as_secs_f64() * 1000.0
                );
            }
            on_done(result);
        })
        .map(|_| ())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Mesh node whose bounding sphere has the given radius.
    pub(crate) fn mesh_node(name: &str, at: Vec3, radius: f32) -> SceneNode {
        let positions = if radius > 0.0 {
            vec![[-radius, 0.0, 0.0], [radius, 0.0, 0.0], [0.0, 0.0, 0.0]]
        } else {
            Vec::new()
        };
        SceneNode {
            name: name.to_string(),
            world: Mat4::from_translation(at),
            mesh: Some(MeshData {
                normals: vec![[0.0, 1.0, 0.0]; positions.len()],
                indices: if positions.is_empty() { Vec::new() } else { vec![0, 1, 2] },
                positions,
                color: [0.3, 0.8, 0.3, 1.0],
            }),
        }
    }

    pub(crate) fn cottage_graph() -> SceneGraph {
        SceneGraph {
            nodes: vec![
                SceneNode {
                    name: "Scene".into(),
                    world: Mat4::IDENTITY,
                    mesh: None,
                },
                mesh_node("Casita", Vec3::ZERO, 3.0),
                mesh_node("arbol", Vec3::new(2.0, 0.0, 2.0), 1.0),
                mesh_node("Ranito", Vec3::new(1.2, 0.05, 0.8), 0.2),
                mesh_node("ranita", Vec3::new(-1.0, 0.05, 1.1), 0.18),
            ],
        }
    }

    #[test]
    fn classifies_house_and_both_frogs() {
        let c = classify(&cottage_graph());
        assert_eq!(c.house, Some(1));
        assert_eq!(c.characters, vec![(Role::Female, 4), (Role::Male, 3)]);
    }

    #[test]
    fn oversized_frog_loses_to_smaller_duplicate() {
        let mut graph = cottage_graph();
        graph
            .nodes
            .push(mesh_node("RANITO", Vec3::new(0.0, 0.0, 3.0), 0.1));
        graph.nodes[3] = mesh_node("ranito", Vec3::ZERO, 5.0);
        let c = classify(&graph);
        assert!(c.characters.contains(&(Role::Male, 5)));
        assert_eq!(c.characters.len(), 2);
    }

    #[test]
    fn falls_back_to_name_match_when_all_frogs_are_large() {
        let graph = SceneGraph {
            nodes: vec![mesh_node("ranita", Vec3::ZERO, 4.0)],
        };
        let c = classify(&graph);
        assert_eq!(c.characters, vec![(Role::Female, 0)]);
        assert_eq!(c.house, None);
    }

    #[test]
    fn nodes_without_meshes_are_ignored() {
        let graph = SceneGraph {
            nodes: vec![SceneNode {
                name: "ranito".into(),
                world: Mat4::IDENTITY,
                mesh: None,
            }],
        };
        assert_eq!(classify(&graph), Classification::default());
    }

    #[test]
    fn house_is_never_a_character() {
        let graph = SceneGraph {
            nodes: vec![mesh_node("casita", Vec3::ZERO, 0.5)],
        };
        let c = classify(&graph);
        assert_eq!(c.house, Some(0));
        assert!(c.characters.is_empty());
    }

    #[test]
    fn bounding_sphere_of_box() {
        let mesh = MeshData {
            positions: vec![[1.0, 1.0, 1.0], [3.0, 1.0, 1.0], [1.0, 1.0, 3.0]],
            ..Default::default()
        };
        let (center, radius) = mesh.bounding_sphere();
        assert_eq!(center, Vec3::new(2.0, 1.0, 2.0));
        assert!((radius - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn disc_is_a_flat_fan() {
        let disc = MeshData::disc(0.8, 32, [0.4, 0.7, 0.8, 0.8]);
        assert_eq!(disc.positions.len(), 33);
        assert_eq!(disc.indices.len(), 96);
        assert!(disc.positions.iter().all(|p| p[1] == 0.0));
        assert!((disc.bounding_sphere().1 - 0.8).abs() < 1e-5);
    }

    #[test]
    fn missing_file_reports_import_error() {
        let err = load_scene(Path::new("definitely/not/here.glb")).unwrap_err();
        assert!(matches!(err, AssetError::Import { .. }));
    }
}
