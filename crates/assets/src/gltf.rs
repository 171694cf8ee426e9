use crate::{AssetError, MeshData};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;
const GLB_CHUNK_BIN: u32 = 0x004E_4942;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

const MODE_TRIANGLES: u32 = 4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    buffers: Vec<BufferDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferDef {
    uri: Option<String>,
    byte_length: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct MeshDef {
    name: Option<String>,
    primitives: Vec<PrimitiveDef>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveDef {
    attributes: BTreeMap<String, usize>,
    indices: Option<usize>,
    #[serde(default = "default_mode")]
    mode: u32,
}

fn default_mode() -> u32 {
    MODE_TRIANGLES
}

/// Load a `.gltf` or `.glb` file and merge its triangle primitives into one mesh.
///
/// The container is detected from the file's magic bytes, not its extension.
/// External buffer URIs are percent-decoded and resolved next to the model file.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let (doc, bin_chunk) = if bytes.starts_with(GLB_MAGIC) {
        let (json, bin) = split_glb(&bytes)?;
        (serde_json::from_slice::<Document>(json)?, bin)
    } else {
        (serde_json::from_slice::<Document>(&bytes)?, None)
    };

    let buffers = resolve_buffers(&doc, base_dir, bin_chunk)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".into());
    let mesh = flatten(&doc, &buffers, name)?;

    if mesh.indices.is_empty() {
        return Err(AssetError::NoTriangles(path.to_path_buf()));
    }

    tracing::debug!(
        "imported {} ({} vertices, {} triangles)",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Split a GLB container into its JSON chunk and optional BIN chunk.
fn split_glb(bytes: &[u8]) -> Result<(&[u8], Option<&[u8]>), AssetError> {
    if bytes.len() < 12 {
        return Err(AssetError::Glb("truncated header".into()));
    }
    let version = read_u32(bytes, 4);
    if version != 2 {
        return Err(AssetError::Glb(format!("unsupported version {version}")));
    }
    let total = (read_u32(bytes, 8) as usize).min(bytes.len());

    let mut offset = 12;
    let mut json = None;
    let mut bin = None;
    while offset + 8 <= total {
        let len = read_u32(bytes, offset) as usize;
        let kind = read_u32(bytes, offset + 4);
        let start = offset + 8;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= total)
            .ok_or_else(|| AssetError::Glb("chunk runs past end of file".into()))?;
        match kind {
            GLB_CHUNK_JSON if json.is_none() => json = Some(&bytes[start..end]),
            GLB_CHUNK_BIN if bin.is_none() => bin = Some(&bytes[start..end]),
            _ => tracing::debug!("skipping GLB chunk {kind:#x}"),
        }
        offset = end;
    }

    let json = json.ok_or_else(|| AssetError::Glb("missing JSON chunk".into()))?;
    Ok((json, bin))
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn resolve_buffers(
    doc: &Document,
    base_dir: &Path,
    bin_chunk: Option<&[u8]>,
) -> Result<Vec<Vec<u8>>, AssetError> {
    doc.buffers
        .iter()
        .enumerate()
        .map(|(i, def)| {
            let data = match (&def.uri, bin_chunk) {
                (Some(uri), _) if uri.starts_with("data:") => {
                    return Err(AssetError::UnsupportedUri(truncate_uri(uri)));
                }
                (Some(uri), _) => std::fs::read(base_dir.join(decode_uri(uri)?))?,
                (None, Some(bin)) if i == 0 => bin.to_vec(),
                (None, _) => return Err(AssetError::MissingBuffer(i)),
            };
            if data.len() < def.byte_length {
                return Err(AssetError::MissingBuffer(i));
            }
            Ok(data)
        })
        .collect()
}

fn truncate_uri(uri: &str) -> String {
    uri.chars().take(32).collect()
}

/// Undo `%XX` escapes in a relative buffer URI.
fn decode_uri(uri: &str) -> Result<String, AssetError> {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| AssetError::UnsupportedUri(truncate_uri(uri)))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| AssetError::UnsupportedUri(truncate_uri(uri)))
}

fn flatten(doc: &Document, buffers: &[Vec<u8>], name: String) -> Result<MeshData, AssetError> {
    let mut mesh = MeshData {
        name,
        ..MeshData::default()
    };

    for (mesh_index, def) in doc.meshes.iter().enumerate() {
        for primitive in &def.primitives {
            if primitive.mode != MODE_TRIANGLES {
                tracing::warn!(
                    "mesh {} ({}): skipping primitive with mode {}",
                    mesh_index,
                    def.name.as_deref().unwrap_or("unnamed"),
                    primitive.mode
                );
                continue;
            }
            let Some(&position_accessor) = primitive.attributes.get("POSITION") else {
                tracing::warn!("mesh {mesh_index}: primitive without POSITION skipped");
                continue;
            };

            let positions = read_vec3(doc, buffers, position_accessor)?;
            let indices = match primitive.indices {
                Some(a) => read_indices(doc, buffers, a)?,
                None => (0..positions.len() as u32).collect(),
            };
            if let Some(bad) = indices.iter().find(|i| **i as usize >= positions.len()) {
                return Err(AssetError::Accessor {
                    index: primitive.indices.unwrap_or(position_accessor),
                    reason: format!("index {bad} exceeds {} vertices", positions.len()),
                });
            }
            let normals = match primitive.attributes.get("NORMAL") {
                Some(&a) => read_vec3(doc, buffers, a)?,
                None => face_normals(&positions, &indices),
            };
            if normals.len() != positions.len() {
                return Err(AssetError::Accessor {
                    index: position_accessor,
                    reason: "NORMAL count differs from POSITION count".into(),
                });
            }

            let base = mesh.positions.len() as u32;
            mesh.positions.extend(positions);
            mesh.normals.extend(normals);
            mesh.indices.extend(indices.iter().map(|i| i + base));
        }
    }

    Ok(mesh)
}

/// Byte slice for each element of an accessor, honoring the view's stride.
fn accessor_elements<'a>(
    doc: &Document,
    buffers: &'a [Vec<u8>],
    index: usize,
    elem_size: usize,
) -> Result<Vec<&'a [u8]>, AssetError> {
    let err = |reason: &str| AssetError::Accessor {
        index,
        reason: reason.to_string(),
    };
    let accessor = doc.accessors.get(index).ok_or_else(|| err("not found"))?;
    let view_index = accessor
        .buffer_view
        .ok_or_else(|| err("sparse or empty accessors are not supported"))?;
    let view = doc
        .buffer_views
        .get(view_index)
        .ok_or_else(|| err("buffer view not found"))?;
    let buffer = buffers
        .get(view.buffer)
        .ok_or_else(|| err("buffer not found"))?;

    let stride = view.byte_stride.unwrap_or(elem_size);
    if stride < elem_size {
        return Err(err("byte stride is smaller than one element"));
    }
    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .filter(|end| *end <= buffer.len())
        .ok_or_else(|| err("buffer view exceeds buffer"))?;
    let start = view
        .byte_offset
        .checked_add(accessor.byte_offset)
        .ok_or_else(|| err("accessor offset overflows"))?;

    // The last element bounds every other one, so the slicing below stays in range.
    if let Some(last) = accessor.count.checked_sub(1) {
        last.checked_mul(stride)
            .and_then(|o| o.checked_add(start))
            .and_then(|at| at.checked_add(elem_size))
            .filter(|end| *end <= view_end)
            .ok_or_else(|| err("elements exceed buffer view"))?;
    }

    Ok((0..accessor.count)
        .map(|i| {
            let at = start + i * stride;
            &buffer[at..at + elem_size]
        })
        .collect())
}

fn read_vec3(doc: &Document, buffers: &[Vec<u8>], index: usize) -> Result<Vec<[f32; 3]>, AssetError> {
    let accessor = doc.accessors.get(index).ok_or(AssetError::Accessor {
        index,
        reason: "not found".into(),
    })?;
    if accessor.component_type != COMPONENT_F32 || accessor.kind != "VEC3" {
        return Err(AssetError::Accessor {
            index,
            reason: format!(
                "expected float VEC3, got component {} type {}",
                accessor.component_type, accessor.kind
            ),
        });
    }

    let elements = accessor_elements(doc, buffers, index, 12)?;
    Ok(elements
        .into_iter()
        .map(|e| {
            let f = |o: usize| f32::from_le_bytes([e[o], e[o + 1], e[o + 2], e[o + 3]]);
            [f(0), f(4), f(8)]
        })
        .collect())
}

fn read_indices(doc: &Document, buffers: &[Vec<u8>], index: usize) -> Result<Vec<u32>, AssetError> {
    let accessor = doc.accessors.get(index).ok_or(AssetError::Accessor {
        index,
        reason: "not found".into(),
    })?;
    if accessor.kind != "SCALAR" {
        return Err(AssetError::Accessor {
            index,
            reason: format!("indices must be SCALAR, got {}", accessor.kind),
        });
    }

    let size = match accessor.component_type {
        COMPONENT_U8 => 1,
        COMPONENT_U16 => 2,
        COMPONENT_U32 => 4,
        other => {
            return Err(AssetError::Accessor {
                index,
                reason: format!("unsupported index component type {other}"),
            });
        }
    };

    let elements = accessor_elements(doc, buffers, index, size)?;
    Ok(elements
        .into_iter()
        .map(|e| match size {
            1 => e[0] as u32,
            2 => u16::from_le_bytes([e[0], e[1]]) as u32,
            _ => u32::from_le_bytes([e[0], e[1], e[2], e[3]]),
        })
        .collect())
}

/// Smooth vertex normals from accumulated face normals. Degenerate vertices point up.
fn face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![[0.0f32; 3]; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| positions[i as usize]);
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        for &i in tri {
            let slot = &mut acc[i as usize];
            for axis in 0..3 {
                slot[axis] += n[axis];
            }
        }
    }

    acc.into_iter()
        .map(|n| {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if len > f32::EPSILON {
                [n[0] / len, n[1] / len, n[2] / len]
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Buffer holding one triangle in the XY plane plus u16 indices.
    fn triangle_buffer() -> Vec<u8> {
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin.extend_from_slice(&[0, 0]);
        bin
    }

    fn triangle_json(uri: Option<&str>) -> String {
        let buffer = match uri {
            Some(u) => format!(r#"{{"uri":"{u}","byteLength":44}}"#),
            None => r#"{"byteLength":44}"#.to_string(),
        };
        format!(
            r#"{{
  "asset": {{"version": "2.0"}},
  "buffers": [{buffer}],
  "bufferViews": [
    {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
    {{"buffer": 0, "byteOffset": 36, "byteLength": 6}}
  ],
  "accessors": [
    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}},
    {{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}}
  ],
  "meshes": [{{"name": "hull", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}]
}}"#
        )
    }

    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::new();
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&GLB_CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&GLB_CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out
    }

    #[test]
    fn gltf_with_external_buffer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ship.bin"), triangle_buffer()).unwrap();
        let path = dir.path().join("ship.gltf");
        std::fs::write(&path, triangle_json(Some("ship.bin"))).unwrap();

        let mesh = load_mesh(&path).unwrap();
        assert_eq!(mesh.name, "ship");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_normals_are_computed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ship.bin"), triangle_buffer()).unwrap();
        let path = dir.path().join("ship.gltf");
        std::fs::write(&path, triangle_json(Some("ship.bin"))).unwrap();

        let mesh = load_mesh(&path).unwrap();
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
    }

    #[test]
    fn glb_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ship.glb");
        std::fs::write(&path, glb(&triangle_json(None), &triangle_buffer())).unwrap();

        let mesh = load_mesh(&path).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn glb_with_bad_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ship.glb");
        let mut bytes = glb(&triangle_json(None), &triangle_buffer());
        bytes[4] = 1;
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(load_mesh(&path), Err(AssetError::Glb(_))));
    }

    #[test]
    fn bundled_ship_model_imports() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../models/ship.gltf");
        let mesh = load_mesh(path).unwrap();
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.triangle_count(), 6);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_mesh("/nonexistent/models/ship.gltf").unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[test]
    fn missing_external_buffer_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ship.gltf");
        std::fs::write(&path, triangle_json(Some("gone.bin"))).unwrap();
        assert!(matches!(load_mesh(&path), Err(AssetError::Io(_))));
    }

    #[test]
    fn data_uri_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ship.gltf");
        std::fs::write(
            &path,
            triangle_json(Some("data:application/octet-stream;base64,AAAA")),
        )
        .unwrap();
        assert!(matches!(
            load_mesh(&path),
            Err(AssetError::UnsupportedUri(_))
        ));
    }

    #[test]
    fn document_without_meshes_has_no_triangles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.gltf");
        std::fs::write(&path, r#"{"asset":{"version":"2.0"}}"#).unwrap();
        assert!(matches!(load_mesh(&path), Err(AssetError::NoTriangles(_))));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gltf");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_mesh(&path), Err(AssetError::Json(_))));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut bin = triangle_buffer();
        bin[40] = 9;
        std::fs::write(dir.path().join("ship.bin"), bin).unwrap();
        let path = dir.path().join("ship.gltf");
        std::fs::write(&path, triangle_json(Some("ship.bin"))).unwrap();
        assert!(matches!(
            load_mesh(&path),
            Err(AssetError::Accessor { .. })
        ));
    }

    fn load_edited(edit: impl Fn(String) -> String) -> Result<MeshData, AssetError> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ship.bin"), triangle_buffer()).unwrap();
        let path = dir.path().join("ship.gltf");
        let json = triangle_json(Some("ship.bin"));
        let edited = edit(json.clone());
        assert_ne!(edited, json, "edit did not apply");
        std::fs::write(&path, edited).unwrap();
        load_mesh(&path)
    }

    #[test]
    fn overflowing_view_offset_is_rejected() {
        let result = load_edited(|j| {
            j.replace(r#""byteOffset": 36"#, r#""byteOffset": 18446744073709551615"#)
        });
        assert!(matches!(result, Err(AssetError::Accessor { index: 1, .. })));
    }

    #[test]
    fn overflowing_accessor_offset_is_rejected() {
        let result = load_edited(|j| {
            j.replace(
                r#"{"bufferView": 0, "componentType""#,
                r#"{"bufferView": 0, "byteOffset": 18446744073709551615, "componentType""#,
            )
        });
        assert!(matches!(result, Err(AssetError::Accessor { index: 0, .. })));
    }

    #[test]
    fn zero_stride_with_huge_count_is_rejected() {
        let result = load_edited(|j| {
            j.replace(
                r#""byteOffset": 0, "byteLength": 36}"#,
                r#""byteOffset": 0, "byteLength": 36, "byteStride": 0}"#,
            )
            .replace(
                r#""componentType": 5126, "count": 3"#,
                r#""componentType": 5126, "count": 4000000000"#,
            )
        });
        assert!(matches!(result, Err(AssetError::Accessor { index: 0, .. })));
    }

    #[test]
    fn count_past_view_end_is_rejected() {
        let result = load_edited(|j| {
            j.replace(
                r#""componentType": 5126, "count": 3"#,
                r#""componentType": 5126, "count": 18446744073709551615"#,
            )
        });
        assert!(matches!(result, Err(AssetError::Accessor { index: 0, .. })));
    }

    #[test]
    fn percent_encoded_buffer_uri_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ship hull.bin"), triangle_buffer()).unwrap();
        let path = dir.path().join("ship.gltf");
        std::fs::write(&path, triangle_json(Some("ship%20hull.bin"))).unwrap();

        let mesh = load_mesh(&path).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn uri_decoding() {
        assert_eq!(decode_uri("a%20b%2Fc.bin").unwrap(), "a b/c.bin");
        assert_eq!(decode_uri("plain.bin").unwrap(), "plain.bin");
        assert!(matches!(decode_uri("bad%zz.bin"), Err(AssetError::UnsupportedUri(_))));
        assert!(matches!(decode_uri("cut%2"), Err(AssetError::UnsupportedUri(_))));
        assert!(matches!(decode_uri("%ff"), Err(AssetError::UnsupportedUri(_))));
    }
}
