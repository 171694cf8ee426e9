use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use skyship_assets::MeshData;
use skyship_common::Viewport;
use skyship_render::RenderView;
use skyship_sim::SceneView;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SHIP_COLOR: [f32; 4] = [0.75, 0.78, 0.85, 1.0];
const EXHAUST_COLOR: [f32; 4] = [1.0, 0.75, 0.2, 1.0];

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl Uniforms {
    fn new(view_proj: Mat4, model: Mat4, color: [f32; 4]) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

/// GPU-resident ship mesh.
struct ShipMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// A uniform buffer and the bind group exposing it.
struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&Uniforms::new(
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                [1.0; 4],
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    fn write(&self, queue: &wgpu::Queue, uniforms: &Uniforms) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniforms));
    }
}

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    ship_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,
    ship_uniforms: UniformSlot,
    particle_uniforms: UniformSlot,
    ship_mesh: Option<ShipMesh>,
    particle_buffer: wgpu::Buffer,
    particle_capacity: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
        particle_capacity: usize,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let depth_stencil = || {
            Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            })
        };
        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        // Ship pipeline
        let ship_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ship_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHIP_SHADER.into()),
        });

        let ship_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ship_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ship_shader,
                entry_point: Some("vs_ship"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &ship_shader,
                entry_point: Some("fs_ship"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Imported models do not reliably agree on winding.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: depth_stencil(),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Particle pipeline
        let particle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particle_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PARTICLE_SHADER.into()),
        });

        let particle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particle_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &particle_shader,
                entry_point: Some("vs_particle"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &particle_shader,
                entry_point: Some("fs_particle"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: depth_stencil(),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Particle positions (pre-allocated, rewritten in place when dirty)
        let particle_capacity = particle_capacity.max(1) as u32;
        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle_buffer"),
            size: particle_capacity as u64 * std::mem::size_of::<[f32; 3]>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let ship_uniforms = UniformSlot::new(device, &bind_group_layout, "ship_uniforms");
        let particle_uniforms = UniformSlot::new(device, &bind_group_layout, "particle_uniforms");
        let depth_texture = Self::create_depth_texture(device, viewport);

        Self {
            ship_pipeline,
            particle_pipeline,
            ship_uniforms,
            particle_uniforms,
            ship_mesh: None,
            particle_buffer,
            particle_capacity,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, viewport: Viewport) {
        self.depth_texture = Self::create_depth_texture(device, viewport);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn has_ship_mesh(&self) -> bool {
        self.ship_mesh.is_some()
    }

    /// Upload the ship's triangles. Empty meshes are skipped.
    pub fn set_ship_mesh(&mut self, device: &wgpu::Device, mesh: &MeshData) {
        if mesh.indices.is_empty() {
            tracing::warn!("ship mesh {} has no triangles; nothing to draw", mesh.name);
            return;
        }
        let vertices: Vec<Vertex> = mesh
            .positions
            .iter()
            .zip(&mesh.normals)
            .map(|(p, n)| Vertex {
                position: *p,
                normal: *n,
            })
            .collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ship_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ship_index_buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.ship_mesh = Some(ShipMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        });
        tracing::debug!("uploaded ship mesh ({} vertices)", vertices.len());
    }

    /// Render one frame: ship (if loaded) and particle trail.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &SceneView<'_>,
        camera: &RenderView,
    ) {
        let vp = camera.view_projection();

        let ship_model = scene.ship.map(|t| t.model_matrix());
        if let Some(model) = ship_model {
            self.ship_uniforms
                .write(queue, &Uniforms::new(vp, model, SHIP_COLOR));
        }
        self.particle_uniforms.write(
            queue,
            &Uniforms::new(
                vp,
                Mat4::from_translation(scene.particle_origin),
                EXHAUST_COLOR,
            ),
        );

        let particle_count = (scene.particles.len() as u32).min(self.particle_capacity);
        if scene.particles_dirty && particle_count > 0 {
            queue.write_buffer(
                &self.particle_buffer,
                0,
                bytemuck::cast_slice(&scene.particles[..particle_count as usize]),
            );
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.06,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let (Some(mesh), Some(_)) = (&self.ship_mesh, ship_model) {
                pass.set_pipeline(&self.ship_pipeline);
                pass.set_bind_group(0, &self.ship_uniforms.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }

            if particle_count > 0 {
                pass.set_pipeline(&self.particle_pipeline);
                pass.set_bind_group(0, &self.particle_uniforms.bind_group, &[]);
                pass.set_vertex_buffer(0, self.particle_buffer.slice(..));
                pass.draw(0..particle_count, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, viewport: Viewport) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: viewport.width(),
                height: viewport.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_is_tightly_packed() {
        // Two mat4 plus one vec4; WGSL uniform alignment is 16 bytes.
        assert_eq!(std::mem::size_of::<Uniforms>(), 144);
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
    }

    #[test]
    fn vertex_stride_matches_attributes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn shaders_declare_entry_points() {
        assert!(shaders::SHIP_SHADER.contains("fn vs_ship"));
        assert!(shaders::SHIP_SHADER.contains("fn fs_ship"));
        assert!(shaders::PARTICLE_SHADER.contains("fn vs_particle"));
        assert!(shaders::PARTICLE_SHADER.contains("fn fs_particle"));
    }
}
