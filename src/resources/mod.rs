use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
};

use anyhow::{Context as _, anyhow, bail};
use cgmath::SquareMatrix;

use crate::{
    data_structures::model::ModelVertex,
    resources::texture::{decode_image, load_binary, load_image, load_string},
    scene::{Colour, GeometryData},
};

/**
 * This module contains all logic for loading mesh/textures/etc. from external files.
 *
 * Loaders return plain CPU data. Turning it into GPU resources is left to the
 * renderer, which picks it up from the scene on the next frame.
 */
pub mod mesh;
pub mod texture;

/// One drawable piece of a loaded mesh file, already in the file's model space.
#[derive(Clone, Debug)]
pub struct LoadedPart {
    pub name: String,
    pub geometry: GeometryData,
    pub colour: Colour,
    pub opacity: f32,
    /// Index into [`LoadedModel::images`].
    pub image: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadedModel {
    pub name: String,
    pub parts: Vec<LoadedPart>,
    pub images: Vec<image::RgbaImage>,
}

/// Loads a mesh file, choosing the parser by extension (`glb`, `gltf`, `obj`).
pub async fn load_model(file_name: &str) -> anyhow::Result<LoadedModel> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "glb" | "gltf" => load_model_gltf(file_name).await,
        "obj" => load_model_obj(file_name).await,
        _ => bail!("unsupported mesh format: {}", file_name),
    }
}

/// Resolves `uri` relative to the directory of `file_name`.
fn sibling(file_name: &str, uri: &str) -> String {
    match file_name.rfind('/') {
        Some(idx) => format!("{}/{}", &file_name[..idx], uri),
        None => uri.to_string(),
    }
}

pub async fn load_model_obj(file_name: &str) -> anyhow::Result<LoadedModel> {
    let obj_text: String = load_string(file_name).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let path = sibling(file_name, &p);
            async move {
                match load_string(&path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("Material library {} could not be read: {:#}", path, e);
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await
    .with_context(|| format!("parsing {}", file_name))?;

    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("{} is rendered without materials: {}", file_name, e);
        Vec::new()
    });

    let mut images = Vec::new();
    let mut material_images: HashMap<usize, Option<usize>> = HashMap::new();
    for (idx, m) in obj_materials.iter().enumerate() {
        let image = match &m.diffuse_texture {
            Some(texture) => match load_image(&sibling(file_name, texture)).await {
                Ok(img) => {
                    images.push(img);
                    Some(images.len() - 1)
                }
                Err(e) => {
                    log::warn!("Diffuse texture of {} not loaded: {:#}", m.name, e);
                    None
                }
            },
            None => None,
        };
        material_images.insert(idx, image);
    }

    let parts = models
        .iter()
        .map(|model| {
            let material = model.mesh.material_id.and_then(|id| obj_materials.get(id));
            let colour = material
                .and_then(|m| m.diffuse)
                .map(|[r, g, b]| Colour::new(r, g, b))
                .unwrap_or(Colour::WHITE);
            let opacity = material.and_then(|m| m.dissolve).unwrap_or(1.0);
            let image = model
                .mesh
                .material_id
                .and_then(|id| material_images.get(&id).copied().flatten());
            LoadedPart {
                name: model.name.clone(),
                geometry: mesh::obj_geometry(model),
                colour,
                opacity,
                image,
            }
        })
        .collect();

    Ok(LoadedModel {
        name: file_name.to_string(),
        parts,
        images,
    })
}

pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<LoadedModel> {
    let gltf_text = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_text);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)
        .with_context(|| format!("parsing {}", file_name))?;

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow!("{} references a missing binary chunk", file_name))?;
                buffer_data.push(blob.into());
            }
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    bail!("{}: embedded data URIs are not supported", file_name);
                }
                let bin = load_binary(&sibling(file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Load base colour images, keyed by glTF image index
    let mut images = Vec::new();
    let mut image_slots: HashMap<usize, usize> = HashMap::new();
    for material in gltf.materials() {
        let Some(info) = material.pbr_metallic_roughness().base_color_texture() else {
            continue;
        };
        let source = info.texture().source();
        if image_slots.contains_key(&source.index()) {
            continue;
        }
        let decoded = match source.source() {
            gltf::image::Source::View { view, mime_type } => {
                let start = view.offset();
                let end = start + view.length();
                buffer_data
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(start..end))
                    .ok_or_else(|| anyhow!("image view out of bounds"))
                    .and_then(|bytes| decode_image(bytes, Some(mime_type)))
            }
            gltf::image::Source::Uri { uri, .. } => load_image(&sibling(file_name, uri)).await,
        };
        match decoded {
            Ok(img) => {
                images.push(img);
                image_slots.insert(source.index(), images.len() - 1);
            }
            Err(e) => log::warn!(
                "Base colour texture of material {:?} in {} not loaded: {:#}",
                material.name(),
                file_name,
                e
            ),
        }
    }

    let mut parts = Vec::new();
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow!("{} contains no scene", file_name))?;
    for node in scene.nodes() {
        collect_parts(
            &node,
            cgmath::Matrix4::identity(),
            &buffer_data,
            &image_slots,
            &mut parts,
        );
    }

    Ok(LoadedModel {
        name: file_name.to_string(),
        parts,
        images,
    })
}

/// Walks the node hierarchy and flattens every triangle primitive into the
/// model space of the file.
fn collect_parts(
    node: &gltf::Node,
    parent: cgmath::Matrix4<f32>,
    buffer_data: &[Vec<u8>],
    image_slots: &HashMap<usize, usize>,
    parts: &mut Vec<LoadedPart>,
) {
    let world = parent * cgmath::Matrix4::from(node.transform().matrix());
    if let Some(gltf_mesh) = node.mesh() {
        for primitive in gltf_mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping non-triangle primitive {} of mesh {:?}",
                    primitive.index(),
                    gltf_mesh.name()
                );
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let mut vertices: Vec<ModelVertex> = positions
                .map(|position| ModelVertex {
                    position,
                    ..Default::default()
                })
                .collect();
            if let Some(normals) = reader.read_normals() {
                vertices
                    .iter_mut()
                    .zip(normals)
                    .for_each(|(vertex, normal)| vertex.normal = normal);
            }
            if let Some(tex_coords) = reader.read_tex_coords(0) {
                vertices
                    .iter_mut()
                    .zip(tex_coords.into_f32())
                    .for_each(|(vertex, uv)| vertex.tex_coords = uv);
            }
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };

            let mut geometry = GeometryData { vertices, indices };
            if !geometry.has_normals() {
                geometry.compute_normals();
            }
            mesh::bake_transform(&mut geometry, world);

            let material = primitive.material();
            let pbr = material.pbr_metallic_roughness();
            let [r, g, b, a] = pbr.base_color_factor();
            let image = pbr
                .base_color_texture()
                .and_then(|info| image_slots.get(&info.texture().source().index()).copied());
            parts.push(LoadedPart {
                name: gltf_mesh
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("mesh {}", gltf_mesh.index())),
                geometry,
                colour: Colour::from_linear([r, g, b]),
                opacity: a,
                image,
            });
        }
    }
    for child in node.children() {
        collect_parts(&child, world, buffer_data, image_slots, parts);
    }
}
