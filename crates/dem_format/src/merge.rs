use crate::{error::ExtractionError, record::Vertex, scene::RawMesh};

/// Builds one vertex per mesh vertex and patches uv and color in from the loops.
///
/// Loops are visited in polygon order, then loop order. A vertex shared by
/// several loops keeps the values of the last one; seam vertices are not split.
pub fn merge_vertices(object: &str, mesh: &RawMesh) -> Result<Vec<Vertex>, ExtractionError> {
    if mesh.positions.len() != mesh.normals.len() {
        return Err(ExtractionError::AttributeCountMismatch {
            object: object.to_owned(),
            positions: mesh.positions.len(),
            normals: mesh.normals.len(),
        });
    }

    let mut vertices: Vec<Vertex> = mesh
        .positions
        .iter()
        .zip(&mesh.normals)
        .enumerate()
        .map(|(i, (position, normal))| Vertex {
            i,
            position: *position,
            normal: *normal,
            ..Vertex::default()
        })
        .collect();

    let count = vertices.len();
    for (polygon_i, polygon) in mesh.polygons.iter().enumerate() {
        for corner in &polygon.loops {
            let vertex = vertices.get_mut(corner.vertex).ok_or_else(|| {
                ExtractionError::VertexOutOfRange {
                    object: object.to_owned(),
                    polygon: polygon_i,
                    vertex: corner.vertex,
                    count,
                }
            })?;
            vertex.uv = corner.uv;
            vertex.color = corner.color;
        }
    }

    Ok(vertices)
}
