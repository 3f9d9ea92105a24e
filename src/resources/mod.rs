//! Loading models and textures from the `assets/` directory (or `{origin}/assets/`
//! in the browser) into GPU resources.

use std::io::{BufReader, Cursor};

use anyhow::{Context as _, bail};
use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Point3, SquareMatrix, Vector3, Vector4};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        bounds::Aabb,
        model::{self, ModelVertex},
        texture::{Texture, linear_to_srgb8, srgb8_to_linear},
    },
    resources::texture::{diffuse_layout, load_binary, load_texture},
};

pub mod texture;

/// A model ready to draw plus its model-space bounds.
#[derive(Debug)]
pub struct LoadedModel {
    pub model: model::Model,
    pub bounds: Aabb,
}

/// Load a binary or JSON glTF file.
///
/// Every mesh primitive reachable from the default scene is flattened into one
/// [`model::Mesh`] with its node transform baked into the vertices. Materials
/// honour the base colour texture and factor; primitives without a material
/// use a trailing white default.
pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<LoadedModel> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_reader = BufReader::new(Cursor::new(gltf_bytes));
    let gltf = gltf::Gltf::from_reader(gltf_reader)
        .with_context(|| format!("{file_name} is not a glTF file"))?;

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.into()),
                None => bail!("{file_name} references a binary chunk it does not have"),
            },
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }
    log::debug!("{file_name}: {} buffer(s) loaded", buffer_data.len());

    // Load materials
    let layout = diffuse_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let factor = pbr.base_color_factor();
        let name = material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{file_name}#material{}", materials.len()));

        let diffuse_texture = match pbr.base_color_texture() {
            Some(info) => {
                let image = match info.texture().source().source() {
                    gltf::image::Source::View { view, mime_type } => {
                        let data = buffer_data
                            .get(view.buffer().index())
                            .and_then(|b| b.get(view.offset()..view.offset() + view.length()))
                            .with_context(|| format!("image view of {name} is out of range"))?;
                        decode_image(data, mime_type.split('/').next_back())?
                    }
                    gltf::image::Source::Uri { uri, mime_type } => {
                        if factor == [1.0; 4] {
                            let texture = load_texture(
                                uri,
                                device,
                                queue,
                                mime_type.and_then(|mt| mt.split('/').next_back()),
                            )
                            .await?;
                            materials.push(model::Material::new(device, &name, texture, &layout));
                            continue;
                        }
                        let data = load_binary(uri).await?;
                        decode_image(&data, mime_type.and_then(|mt| mt.split('/').next_back()))?
                    }
                };
                let mut rgba = image.to_rgba8();
                tint(&mut rgba, factor);
                Texture::from_rgba(device, queue, &rgba, Some(&name))
            }
            None => Texture::solid(device, queue, factor_to_srgb8(factor), &name),
        };
        materials.push(model::Material::new(device, &name, diffuse_texture, &layout));
    }
    let default_material = materials.len();
    materials.push(model::Material::new(
        device,
        "default",
        Texture::solid(device, queue, [255; 4], "default"),
        &layout,
    ));

    // Flatten the node hierarchy
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("{file_name} has no scene"))?;
    let mut meshes = Vec::new();
    let mut bounds: Option<Aabb> = None;
    let mut stack: Vec<(gltf::Node, Matrix4<f32>)> = scene
        .nodes()
        .map(|node| (node, Matrix4::identity()))
        .collect();
    while let Some((node, parent)) = stack.pop() {
        let world = parent * Matrix4::from(node.transform().matrix());
        stack.extend(node.children().map(|child| (child, world)));

        let Some(mesh) = node.mesh() else { continue };
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "{file_name}: skipping {:?} primitive of mesh {}",
                    primitive.mode(),
                    mesh.index()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                log::warn!("{file_name}: primitive without positions in mesh {}", mesh.index());
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_default();
            let tex_coords: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect())
                .unwrap_or_default();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let vertices = bake_vertices(&positions, &normals, &tex_coords, world);
            let primitive_bounds = Aabb::from_points(vertices.iter().map(|v| Point3::from(v.position)));
            bounds = match (bounds, primitive_bounds) {
                (Some(a), Some(b)) => Some(a.union(b)),
                (a, b) => a.or(b),
            };

            let mesh_name = format!("{}#{}", mesh.name().unwrap_or(file_name), primitive.index());
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{mesh_name} Vertex Buffer")),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{mesh_name} Index Buffer")),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            meshes.push(model::Mesh {
                name: mesh_name,
                vertex_buffer,
                index_buffer,
                num_elements: indices.len() as u32,
                material: primitive.material().index().unwrap_or(default_material),
            });
        }
    }

    let Some(bounds) = bounds else {
        bail!("{file_name} contains no triangle geometry");
    };
    log::debug!(
        "{file_name}: {} mesh(es), {} material(s), bounds {:?}",
        meshes.len(),
        materials.len(),
        bounds
    );

    Ok(LoadedModel {
        model: model::Model { meshes, materials },
        bounds,
    })
}

fn decode_image(data: &[u8], format: Option<&str>) -> anyhow::Result<image::DynamicImage> {
    let img = match format.and_then(image::ImageFormat::from_extension) {
        Some(fmt) => image::load_from_memory_with_format(data, fmt)?,
        None => image::load_from_memory(data)?,
    };
    Ok(img)
}

/// Transform positions and normals into model space. Missing normals point up,
/// missing texture coordinates are zero.
pub(crate) fn bake_vertices(
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    world: Matrix4<f32>,
) -> Vec<ModelVertex> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    let normal_matrix = linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear);

    positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let position = world * Vector4::new(p[0], p[1], p[2], 1.0);
            let normal = normals
                .get(i)
                .map(|n| normal_matrix * Vector3::from(*n))
                .filter(|n| n.magnitude2() > 0.0)
                .map(|n| n.normalize())
                .unwrap_or(Vector3::unit_y());
            ModelVertex {
                position: position.truncate().into(),
                tex_coords: tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                normal: normal.into(),
            }
        })
        .collect()
}

/// Multiply straight-alpha sRGB pixels by a linear base colour factor.
pub(crate) fn tint(img: &mut image::RgbaImage, factor: [f32; 4]) {
    if factor == [1.0; 4] {
        return;
    }
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let linear = srgb8_to_linear(pixel[c]) as f32 * factor[c];
            pixel[c] = linear_to_srgb8(linear);
        }
        pixel[3] = (f32::from(pixel[3]) * factor[3]).round().clamp(0.0, 255.0) as u8;
    }
}

fn factor_to_srgb8(factor: [f32; 4]) -> [u8; 4] {
    [
        linear_to_srgb8(factor[0]),
        linear_to_srgb8(factor[1]),
        linear_to_srgb8(factor[2]),
        (factor[3].clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_transforms_are_baked() {
        let world = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0))
            * Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let vertices = bake_vertices(
            &[[1.0, 1.0, 1.0]],
            &[[1.0, 1.0, 0.0]],
            &[],
            world,
        );
        assert_eq!(vertices[0].position, [3.0, 3.0, 4.0]);
        assert_eq!(vertices[0].tex_coords, [0.0, 0.0]);
        // Normals use the inverse transpose, so stretching X flattens them in X
        let n = Vector3::from(vertices[0].normal);
        assert!((n.magnitude() - 1.0).abs() < 1e-5);
        assert!(n.y > n.x);
    }

    #[test]
    fn missing_normals_point_up() {
        let vertices = bake_vertices(&[[0.0; 3], [1.0, 0.0, 0.0]], &[], &[[0.5, 0.5]], Matrix4::identity());
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[0].tex_coords, [0.5, 0.5]);
        assert_eq!(vertices[1].tex_coords, [0.0, 0.0]);
    }

    #[test]
    fn tinting_with_white_is_identity() {
        let mut img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 120, 250, 200]));
        let before = img.clone();
        tint(&mut img, [1.0; 4]);
        assert_eq!(img, before);
    }

    #[test]
    fn tinting_scales_channels() {
        let mut img = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        tint(&mut img, [1.0, 0.0, 1.0, 0.5]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 255, 128]);
    }

    #[test]
    fn solid_factor_is_encoded_as_srgb() {
        assert_eq!(factor_to_srgb8([1.0, 0.0, 0.0, 1.0]), [255, 0, 0, 255]);
    }
}
