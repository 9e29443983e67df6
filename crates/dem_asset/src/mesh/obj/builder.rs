use std::collections::HashMap;

use gfx_maths::*;

use dem_format::{
    scene::{HostScene, Loop, ObjectKind, Polygon, RawJoint, RawMesh, SceneObject},
    ExtractionError,
};
use log::{debug, info};

/// Color of loops in files without vertex colors.
const DEFAULT_COLOR: [f64; 3] = [1.0, 1.0, 1.0];

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ObjVertex {
    pub(crate) position: [f32; 3],
    pub(crate) color: Option<[f32; 3]>,
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ObjFaceIndex {
    pub(crate) vert_i: usize,
    pub(crate) uv_i: Option<usize>,
    pub(crate) normal_i: Option<usize>,
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ObjFace {
    pub(crate) face_i: Vec<ObjFaceIndex>,
}

/// An `o` block. Its faces index the file-global vertex list.
#[derive(Debug, Default)]
pub(crate) struct ObjObject {
    pub(crate) name: String,
    pub(crate) faces: Vec<ObjFace>,
}

#[derive(Debug, Default)]
pub(crate) struct ObjData {
    pub(crate) objects: Vec<ObjObject>,
    pub(crate) vertices: Vec<ObjVertex>,
    pub(crate) uvs: Vec<[f32; 2]>,
    pub(crate) normals: Vec<[f32; 3]>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ObjSettings {
    pub(crate) flip_axis: [bool; 3],
    pub(crate) calculate_normals: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ObjSceneBuilder {
    pub(crate) data: ObjData,
    pub(crate) curr_object: ObjObject,
    pub(crate) settings: ObjSettings,
}

impl ObjSceneBuilder {
    /// Faces before the first `o` belong to an object called `default_name`.
    pub(crate) fn new(default_name: &str, settings: ObjSettings) -> Self {
        Self {
            curr_object: ObjObject {
                name: default_name.to_owned(),
                ..ObjObject::default()
            },
            settings,
            ..Self::default()
        }
    }

    pub(crate) fn set_object(&mut self, name: &str) {
        // DEM names are single tokens
        let name = name.split_whitespace().collect::<Vec<_>>().join("_");
        if name.is_empty() {
            return;
        }

        if self.curr_object.faces.is_empty() {
            self.curr_object.name = name;
        } else {
            let mut object = ObjObject {
                name,
                ..ObjObject::default()
            };
            std::mem::swap(&mut object, &mut self.curr_object);
            self.data.objects.push(object);
        }
    }

    pub(crate) fn push_vertex(&mut self, mut vertex: ObjVertex) {
        // invert vertex if necessary
        for n in 0..3 {
            if self.settings.flip_axis[n] {
                vertex.position[n] = -vertex.position[n];
            }
        }

        self.data.vertices.push(vertex);
    }

    pub(crate) fn push_uv(&mut self, uv: [f32; 2]) {
        self.data.uvs.push(uv);
    }

    pub(crate) fn push_normal(&mut self, mut normal: [f32; 3]) {
        // invert normals if necessary
        for n in 0..3 {
            if self.settings.flip_axis[n] {
                normal[n] = -normal[n];
            }
        }

        self.data.normals.push(normal);
    }

    pub(crate) fn push_face(&mut self, face: ObjFace) {
        self.curr_object.faces.push(face);
    }

    pub(crate) fn build_scene(self) -> ObjScene {
        let mut data = self.data;
        // push the last object, objects without faces are no meshes
        if !self.curr_object.faces.is_empty() {
            data.objects.push(self.curr_object);
        }

        ObjScene {
            data,
            calculate_normals: self.settings.calculate_normals,
        }
    }
}

/// Dense mesh vertex indices for the global vertices an object references,
/// numbered in first reference order.
#[derive(Debug, Default)]
struct VertexMap {
    globals: Vec<usize>,
    locals: HashMap<usize, usize>,
    normals: Vec<Option<[f64; 3]>>,
}

impl VertexMap {
    fn local(&mut self, global: usize) -> usize {
        if let Some(local) = self.locals.get(&global) {
            return *local;
        }

        let local = self.globals.len();
        self.globals.push(global);
        self.locals.insert(global, local);
        self.normals.push(None);
        local
    }
}

/// Wavefront objects exposed to the document builder; every object is a mesh.
#[derive(Debug)]
pub(crate) struct ObjScene {
    data: ObjData,
    calculate_normals: bool,
}

impl ObjScene {
    /// Resolves a 1-based global face index into a loop of `object`.
    fn corner(
        &self,
        object: &ObjObject,
        map: &mut VertexMap,
        polygon: usize,
        index: &ObjFaceIndex,
    ) -> Result<Loop, ExtractionError> {
        let global = index
            .vert_i
            .checked_sub(1)
            .filter(|global| *global < self.data.vertices.len())
            .ok_or_else(|| ExtractionError::VertexOutOfRange {
                object: object.name.clone(),
                polygon,
                vertex: index.vert_i,
                count: self.data.vertices.len(),
            })?;
        let local = map.local(global);

        let uv = match index.uv_i {
            Some(uv_i) => {
                let uv = uv_i
                    .checked_sub(1)
                    .and_then(|i| self.data.uvs.get(i))
                    .ok_or_else(|| host_error(object, format!("invalid uv index {}", uv_i)))?;
                [uv[0] as f64, uv[1] as f64]
            }
            None => [0.0, 0.0],
        };

        // the last corner naming a normal wins
        if let Some(normal_i) = index.normal_i {
            let normal = normal_i
                .checked_sub(1)
                .and_then(|i| self.data.normals.get(i))
                .ok_or_else(|| host_error(object, format!("invalid normal index {}", normal_i)))?;
            map.normals[local] = Some([normal[0] as f64, normal[1] as f64, normal[2] as f64]);
        }

        let color = self.data.vertices[global]
            .color
            .map_or(DEFAULT_COLOR, |c| [c[0] as f64, c[1] as f64, c[2] as f64]);

        Ok(Loop::new(local, uv, color))
    }

    /// calculates normals of the mesh
    // - go through each triangle
    // - - u = v1 - v0
    // - - v = v2 - v0
    // - - face_normal = cross(u, v) (counter clockwise winding)
    // go through each vertex
    // - sum the normals of the faces it is used in and normalize
    fn calculate_normals(positions: &[[f64; 3]], polygons: &[Polygon]) -> Vec<[f64; 3]> {
        let position = |i: usize| -> Vec3 {
            let [x, y, z] = positions[i];
            [x as f32, y as f32, z as f32].into()
        };

        let mut sums: Vec<Vec3> = vec![Vec3::zero(); positions.len()];
        for polygon in polygons {
            for group in polygon.loops.chunks_exact(3) {
                let (v0_i, v1_i, v2_i) = (group[0].vertex, group[1].vertex, group[2].vertex);
                let (v0, v1, v2) = (position(v0_i), position(v1_i), position(v2_i));
                let u: Vec3 = &v1 - &v0;
                let v: Vec3 = &v2 - &v0;
                let normal = u.cross(v);

                sums[v0_i] += normal;
                sums[v1_i] += normal;
                sums[v2_i] += normal;
            }
        }

        sums.into_iter()
            .map(|n| {
                let len = (n.x * n.x + n.y * n.y + n.z * n.z).sqrt();
                if len > 0.0 {
                    [(n.x / len) as f64, (n.y / len) as f64, (n.z / len) as f64]
                } else {
                    [0.0; 3]
                }
            })
            .collect()
    }
}

fn host_error(object: &ObjObject, reason: String) -> ExtractionError {
    ExtractionError::Host {
        object: object.name.clone(),
        reason,
    }
}

impl HostScene for ObjScene {
    fn objects(&self) -> Vec<SceneObject> {
        self.data
            .objects
            .iter()
            .map(|object| SceneObject {
                kind: ObjectKind::Mesh,
                name: object.name.clone(),
            })
            .collect()
    }

    fn mesh(&self, index: usize) -> Result<RawMesh, ExtractionError> {
        let object = &self.data.objects[index];

        let has_uvs = object
            .faces
            .iter()
            .flat_map(|face| &face.face_i)
            .any(|corner| corner.uv_i.is_some());
        if !has_uvs {
            return Err(ExtractionError::MissingUvLayer {
                object: object.name.clone(),
            });
        }

        // triangulate polygons for convex shapes, every triangle becomes its own polygon
        let mut map = VertexMap::default();
        let mut polygons = Vec::new();
        for (polygon, face) in object.faces.iter().enumerate() {
            let corners = face
                .face_i
                .iter()
                .map(|index| self.corner(object, &mut map, polygon, index))
                .collect::<Result<Vec<_>, _>>()?;

            for i in 2..corners.len() {
                debug!("Create triangle between {}, {}, {}", 0, i - 1, i);
                polygons.push(Polygon::from(vec![corners[0], corners[i - 1], corners[i]]));
            }
        }

        let vertices: Vec<&ObjVertex> = map
            .globals
            .iter()
            .map(|global| &self.data.vertices[*global])
            .collect();
        if !vertices.iter().any(|vertex| vertex.color.is_some()) {
            info!("Mesh `{}` had no vertex colors, adding them", object.name);
        }

        let positions: Vec<[f64; 3]> = vertices
            .iter()
            .map(|v| [v.position[0] as f64, v.position[1] as f64, v.position[2] as f64])
            .collect();

        let has_normals = map.normals.iter().any(Option::is_some);
        let normals = if has_normals && !self.calculate_normals {
            map.normals
                .into_iter()
                .map(|normal| normal.unwrap_or_default())
                .collect()
        } else {
            debug!("Calculating normals of `{}`", object.name);
            Self::calculate_normals(&positions, &polygons)
        };

        Ok(RawMesh {
            positions,
            normals,
            polygons,
        })
    }

    fn joint(&self, index: usize) -> Result<RawJoint, ExtractionError> {
        Err(ExtractionError::Host {
            object: self.data.objects[index].name.clone(),
            reason: "Wavefront files have no joints".into(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::obj::parser::{parse_lines, ParserError};

    fn scene(source: &str, settings: ObjSettings) -> Result<ObjScene, ParserError> {
        parse_lines(source.as_bytes(), "crate", settings)
    }

    const QUAD: &str = "\
v 0 0 0 1 0 0
v 1 0 0 0 1 0
v 1 1 0 0 0 1
v 0 1 0 1 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_fan_triangulation() -> Result<(), Box<dyn std::error::Error>> {
        let mesh = scene(QUAD, ObjSettings::default())?.mesh(0)?;

        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 4]);
        let corners: Vec<Vec<usize>> = mesh
            .polygons
            .iter()
            .map(|p| p.loops.iter().map(|l| l.vertex).collect())
            .collect();
        assert_eq!(corners, vec![vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(mesh.polygons[1].loops[2].uv, [0.0, 1.0]);
        assert_eq!(mesh.polygons[0].loops[1].color, [0.0, 1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_missing_uv_layer() -> Result<(), ParserError> {
        let scene = scene("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", ObjSettings::default())?;
        assert_eq!(
            scene.mesh(0),
            Err(ExtractionError::MissingUvLayer {
                object: "crate".into()
            })
        );
        Ok(())
    }

    #[test]
    fn test_default_color_and_calculated_normals() -> Result<(), Box<dyn std::error::Error>> {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2/1 3/1\n";
        let mesh = scene(source, ObjSettings::default())?.mesh(0)?;

        assert!(mesh
            .polygons
            .iter()
            .flat_map(|p| &p.loops)
            .all(|l| l.color == DEFAULT_COLOR));
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
        Ok(())
    }

    #[test]
    fn test_global_indices() -> Result<(), Box<dyn std::error::Error>> {
        let source = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
f 1/1 2/1 3/1
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 6/1 5/1 4/1
f 1/1 5/1 6/1
";
        let scene = scene(source, ObjSettings::default())?;
        assert_eq!(scene.mesh(0)?.positions.len(), 3);

        // renumbered in first reference order, shared vertex 1 included
        let second = scene.mesh(1)?;
        assert_eq!(
            second.positions,
            vec![[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]]
        );
        let corners: Vec<Vec<usize>> = second
            .polygons
            .iter()
            .map(|p| p.loops.iter().map(|l| l.vertex).collect())
            .collect();
        assert_eq!(corners, vec![vec![0, 1, 2], vec![3, 1, 0]]);
        Ok(())
    }

    #[test]
    fn test_vertices_before_object() -> Result<(), Box<dyn std::error::Error>> {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\no Tri\nf 1/1 2/1 3/1\n";
        let scene = scene(source, ObjSettings::default())?;

        let objects = scene.objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name, "Tri");

        let mesh = scene.mesh(0)?;
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.polygons.len(), 1);
        Ok(())
    }

    #[test]
    fn test_vertex_out_of_range() -> Result<(), ParserError> {
        let source = "v 0 0 0\nv 1 0 0\nvt 0 0\nf 1/1 2/1 9/1\n";
        let scene = scene(source, ObjSettings::default())?;
        assert_eq!(
            scene.mesh(0),
            Err(ExtractionError::VertexOutOfRange {
                object: "crate".into(),
                polygon: 0,
                vertex: 9,
                count: 2,
            })
        );
        Ok(())
    }

    #[test]
    fn test_no_joints() -> Result<(), ParserError> {
        let scene = scene(QUAD, ObjSettings::default())?;
        assert!(scene.joint(0).is_err());
        Ok(())
    }
}
