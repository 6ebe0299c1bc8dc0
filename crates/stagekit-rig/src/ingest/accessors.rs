//! glTF accessor reading utilities.
//!
//! Only what the stage needs: position bounds and morph target names.
//! Vertex data is read through the gltf crate's primitive reader.

use glam::Vec3;

use crate::graph::Aabb;

/// Bounds declared by a POSITION accessor's `min`/`max`, if present.
pub fn declared_bounds(accessor: &gltf::Accessor) -> Option<Aabb> {
    let min = vec3_from_json(&accessor.min()?)?;
    let max = vec3_from_json(&accessor.max()?)?;
    Some(Aabb::new(min, max))
}

fn vec3_from_json(value: &gltf::json::Value) -> Option<Vec3> {
    let array = value.as_array()?;
    if array.len() < 3 {
        return None;
    }
    let mut out = [0.0f32; 3];
    for (slot, v) in out.iter_mut().zip(array) {
        *slot = v.as_f64()? as f32;
    }
    Some(Vec3::from_array(out))
}

/// Bounds of a primitive's POSITION attribute.
///
/// Uses the accessor's declared min/max and falls back to reading the
/// vertices when they are missing.
pub fn primitive_bounds(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
) -> Option<Aabb> {
    let accessor = primitive.get(&gltf::Semantic::Positions)?;
    if let Some(bounds) = declared_bounds(&accessor) {
        return Some(bounds);
    }
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    Aabb::from_points(reader.read_positions()?.map(Vec3::from_array))
}

/// Morph target names from `mesh.extras.targetNames`, padded with index
/// names up to `count`.
pub fn morph_target_names(mesh: &gltf::Mesh, count: usize) -> Vec<String> {
    let mut names: Vec<String> = mesh
        .extras()
        .as_ref()
        .and_then(|extras| serde_json::from_str::<serde_json::Value>(extras.get()).ok())
        .and_then(|value| {
            value.get("targetNames").and_then(|v| v.as_array()).map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(String::from))
                    .collect()
            })
        })
        .unwrap_or_default();

    names.truncate(count);
    for i in names.len()..count {
        names.push(i.to_string());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_from_json() {
        let v = vec3_from_json(&serde_json::json!([1.0, -2.5, 3])).unwrap();
        assert_eq!(v, Vec3::new(1.0, -2.5, 3.0));
        assert!(vec3_from_json(&serde_json::json!([1.0, 2.0])).is_none());
        assert!(vec3_from_json(&serde_json::json!("nope")).is_none());
    }

    /// A single triangle whose POSITION accessor has no min/max.
    fn undeclared_triangle() -> (gltf::Gltf, Vec<u8>) {
        let positions: [[f32; 3]; 3] = [[-1.0, 0.0, 0.0], [1.0, 2.0, 0.5], [0.0, -0.5, -0.5]];
        let bytes: Vec<u8> = positions
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let json = serde_json::json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": bytes.len()}],
            "bufferViews": [{"buffer": 0, "byteLength": bytes.len()}],
            "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}]
        });
        let gltf =
            gltf::Gltf::from_slice_without_validation(&serde_json::to_vec(&json).unwrap()).unwrap();
        (gltf, bytes)
    }

    #[test]
    fn test_bounds_fall_back_to_vertices() {
        let (gltf, bytes) = undeclared_triangle();
        let primitive = gltf.meshes().next().unwrap().primitives().next().unwrap();
        let accessor = primitive.get(&gltf::Semantic::Positions).unwrap();
        assert!(declared_bounds(&accessor).is_none());

        let bounds = primitive_bounds(&primitive, &[gltf::buffer::Data(bytes)]).unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -0.5, -0.5));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_bounds_without_buffer_data() {
        let (gltf, _) = undeclared_triangle();
        let primitive = gltf.meshes().next().unwrap().primitives().next().unwrap();
        assert!(primitive_bounds(&primitive, &[]).is_none());
    }
}
