use crate::{record::Triangle, scene::Polygon};

/// Cuts a polygon into triangles by consuming its loops three at a time.
///
/// Loop `k` of each group lands in slot `k` of the triangle, and every
/// triangle carries the polygon's index. Loops left over after the last full
/// group are dropped, so hosts hand in polygons that are already triangulated.
pub fn triangulate(index: usize, polygon: &Polygon) -> impl Iterator<Item = Triangle> + '_ {
    polygon
        .loops
        .chunks_exact(3)
        .map(move |group| Triangle {
            i: index,
            indices: [group[0].vertex, group[1].vertex, group[2].vertex],
        })
}

/// Number of loops [`triangulate`] ignores.
pub fn dropped_loops(polygon: &Polygon) -> usize {
    polygon.loops.len() % 3
}
