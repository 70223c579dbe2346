//! Builds per-frame pose snapshots from scene state and writes them as
//! `<output dir>/<frame:04>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use bonesketch_api_core::json::write_json_file;
use bonesketch_api_core::{
    is_reserved_section, BoneRecord, CameraRecord, EdgeRecord, PoseSnapshot, ShapeKeyEntry,
    VertexGroupRecord, VertexRecord, OFFSCREEN,
};
use hashbrown::HashMap;
use indexmap::IndexMap;
use nalgebra::Vector3;

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::projection::screen_coords;
use crate::scene::{transform_point, Armature, CameraObject, Mesh, RenderSettings, SceneSource, SceneState};

/// Outcome of exporting a frame range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(i32, String)>,
}

impl ExportSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Exporter { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Snapshot of one frame's state. Sections whose source is missing are
    /// left out.
    pub fn snapshot(&self, state: &SceneState) -> PoseSnapshot {
        let mut snap = PoseSnapshot::default();
        let project = Projector {
            render: &state.render,
            camera: state.camera.as_ref(),
        };

        match &state.armature {
            Some(armature) => {
                snap.bones = Some(collect_bones(armature, &project));
                snap.vertex_groups =
                    collect_vertex_groups(armature, &state.meshes, &self.config.vertex_groups, &project);
            }
            None => log::warn!("no armature in scene; bones and vertex groups skipped"),
        }

        match &state.camera {
            Some(camera) => snap.camera = Some(camera_record(camera, &state.render)),
            None => log::warn!("no active camera; camera section skipped"),
        }

        if self.config.export_shape_keys {
            if let Some(armature) = &state.armature {
                snap.shape_keys = collect_shape_keys(armature, &state.meshes);
            }
        }
        snap
    }

    /// Directory receiving the snapshots: the configured override, else the
    /// directory of the render output path, else the working directory.
    pub fn output_dir(&self, render: &RenderSettings) -> PathBuf {
        if let Some(dir) = &self.config.output_dir {
            return dir.clone();
        }
        render_output_dir(&render.filepath)
    }

    /// Position `scene` at `frame` and write its snapshot.
    pub fn export_frame<S: SceneSource + ?Sized>(
        &self,
        scene: &mut S,
        frame: i32,
    ) -> Result<PathBuf, ExportError> {
        let state = scene.state_at(frame)?;
        let snapshot = self.snapshot(&state);
        let dir = self.output_dir(&state.render);
        fs::create_dir_all(&dir).map_err(|source| ExportError::OutputDir {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(frame_file_name(frame));
        write_json_file(&path, &snapshot)?;
        Ok(path)
    }

    /// Export every frame of the scene's range. A failing frame is logged and
    /// recorded; the remaining frames are still exported.
    pub fn export_range<S: SceneSource + ?Sized>(
        &self,
        scene: &mut S,
    ) -> Result<ExportSummary, ExportError> {
        let range = scene.frame_range();
        let total = range.total();
        let mut summary = ExportSummary::default();
        for frame in range.frames()? {
            match self.export_frame(scene, frame) {
                Ok(path) => {
                    log::info!("saved frame {frame} / {total} to '{}'", path.display());
                    summary.written.push(path);
                }
                Err(err) => {
                    log::error!("frame {frame}: export failed: {err}");
                    summary.failed.push((frame, err.to_string()));
                }
            }
        }
        Ok(summary)
    }
}

/// `0001.json` style name for a frame number.
pub fn frame_file_name(frame: i32) -> String {
    format!("{frame:04}.json")
}

/// Directory part of a render output path. A path ending in a separator is a
/// directory itself; a leading `//` (relative to the scene file) is read as
/// relative to the working directory.
pub fn render_output_dir(filepath: &str) -> PathBuf {
    let trimmed = filepath.strip_prefix("//").unwrap_or(filepath);
    if trimmed.is_empty() {
        return PathBuf::from(".");
    }
    if trimmed.ends_with('/') || trimmed.ends_with('\\') {
        return PathBuf::from(trimmed);
    }
    match Path::new(trimmed).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

struct Projector<'a> {
    render: &'a RenderSettings,
    camera: Option<&'a CameraObject>,
}

impl Projector<'_> {
    fn pixel(&self, world: &Vector3<f64>) -> [i64; 2] {
        match self.camera {
            Some(camera) => screen_coords(self.render, camera, world),
            None => OFFSCREEN,
        }
    }
}

fn to_array(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

/// Bones in depth-first order from each root, children in declaration order.
fn collect_bones(armature: &Armature, project: &Projector<'_>) -> IndexMap<String, BoneRecord> {
    let world = armature.world();
    let mut out = IndexMap::with_capacity(armature.bones.len());
    let mut stack: Vec<&str> = armature.roots().map(|b| b.name.as_str()).collect();
    stack.reverse();

    while let Some(name) = stack.pop() {
        if out.contains_key(name) {
            log::warn!("bone '{name}' reached twice; parent cycle or duplicate name");
            continue;
        }
        let Some(bone) = armature.bone(name) else {
            continue;
        };
        let head = transform_point(&world, bone.head);
        let tail = transform_point(&world, bone.tail);
        let children: Vec<&str> = armature.children_of(name).map(|c| c.name.as_str()).collect();
        stack.extend(children.iter().rev());
        let record = BoneRecord {
            global_coords: to_array(&head),
            screen_coords: project.pixel(&head),
            tail_global_coords: to_array(&tail),
            tail_screen_coords: project.pixel(&tail),
            children: children.iter().map(|c| c.to_string()).collect(),
        };
        out.insert(name.to_string(), record);
    }
    out
}

fn collect_vertex_groups(
    armature: &Armature,
    meshes: &[Mesh],
    group_names: &[String],
    project: &Projector<'_>,
) -> IndexMap<String, VertexGroupRecord> {
    let mut out = IndexMap::new();
    for group_name in group_names {
        if is_reserved_section(group_name) {
            log::warn!("vertex group '{group_name}' clashes with a snapshot section; skipped");
            continue;
        }
        for mesh in meshes {
            if !mesh.is_deformed_by(armature) || mesh.vertex_groups.is_empty() {
                continue;
            }
            let Some(group) = mesh.group_index(group_name) else {
                log::debug!("mesh '{}' has no vertex group '{group_name}'", mesh.name);
                continue;
            };
            let record = vertex_group_record(mesh, group, project);
            if !record.vertices.is_empty() {
                // a later mesh carrying the same group replaces the earlier one
                out.insert(group_name.clone(), record);
            }
        }
    }
    out
}

fn vertex_group_record(mesh: &Mesh, group: usize, project: &Projector<'_>) -> VertexGroupRecord {
    let world = mesh.world();
    let mut screens: HashMap<usize, [i64; 2]> = HashMap::new();
    let mut vertices = Vec::new();
    for (index, vertex) in mesh.vertices.iter().enumerate() {
        if !vertex.is_member_of(group) {
            continue;
        }
        let global = transform_point(&world, vertex.evaluated_co());
        let screen = project.pixel(&global);
        screens.insert(index, screen);
        vertices.push(VertexRecord {
            vertex_index: index,
            screen_coords: screen,
            global_coords: to_array(&global),
        });
    }

    let edges = mesh
        .edges
        .iter()
        .enumerate()
        .filter_map(|(edge_index, [a, b])| {
            let start = *screens.get(a)?;
            let end = *screens.get(b)?;
            Some(EdgeRecord {
                edge_index,
                screen_coords: [start, end],
            })
        })
        .collect();

    VertexGroupRecord { vertices, edges }
}

fn camera_record(camera: &CameraObject, render: &RenderSettings) -> CameraRecord {
    CameraRecord {
        location: camera.location,
        rotation_euler: camera.rotation_euler,
        focal_length: camera.lens,
        resolution_x: render.scaled_width(),
        resolution_y: render.scaled_height(),
    }
}

/// Shape key weights of the meshes deformed by `armature`. Weights go to the
/// top level until some have been collected; every later mesh nests its own
/// under `shape_keys_<mesh name>`. The basis key is never exported and an
/// empty result leaves the section out.
fn collect_shape_keys(
    armature: &Armature,
    meshes: &[Mesh],
) -> Option<IndexMap<String, ShapeKeyEntry>> {
    let mut out: IndexMap<String, ShapeKeyEntry> = IndexMap::new();
    let keyed = meshes
        .iter()
        .filter(|m| m.is_deformed_by(armature) && !m.shape_keys.is_empty());
    for mesh in keyed {
        let weights = mesh
            .shape_keys
            .iter()
            .filter(|key| key.name != "Basis")
            .map(|key| (key.name.clone(), key.value));
        if out.is_empty() {
            out = weights
                .map(|(name, value)| (name, ShapeKeyEntry::Weight(value)))
                .collect();
        } else {
            out.insert(
                format!("shape_keys_{}", mesh.name),
                ShapeKeyEntry::Mesh(weights.collect()),
            );
        }
    }
    (!out.is_empty()).then_some(out)
}
