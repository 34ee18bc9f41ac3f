//! SDF-based WebGPU render pipeline
//!
//! Draws the whole scene in the fragment shader from two storage buffers:
//! projected nodes (screen-space discs) and parent edges (screen-space
//! segments). Projection happens CPU-side in [`super::camera`] so pointer
//! picking and rendering can never disagree.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use super::camera::Camera;
use crate::settings::Settings;
use crate::sim::SimState;
use crate::theme::Theme;

/// Maximum nodes uploaded per frame (history caps are well below this)
const MAX_NODES: usize = 128;
/// Maximum parent edges uploaded per frame
const MAX_EDGES: usize = 512;

/// Bob animation amplitude in world units
const BOB_AMPLITUDE: f32 = 0.35;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2], // offset 0
    time: f32,            // offset 8
    node_count: u32,      // offset 12
    edge_count: u32,      // offset 16
    starfield: u32,       // offset 20
    theme: u32,           // offset 24 - palette index
    motion: f32,          // offset 28 - pulse scale (0 = reduced motion)
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct NodeData {
    pos: [f32; 2], // screen px
    radius_px: f32,
    depth: f32,
    kind: u32,
    selected: u32,
    pulse_phase: f32,
    _pad: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct EdgeData {
    a: [f32; 2], // child endpoint, screen px
    b: [f32; 2], // parent endpoint, screen px
    alpha: f32,
    _pad: [f32; 3],
}

// ============================================================================
// SCENE RENDER STATE
// ============================================================================

pub struct SceneRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    nodes_buffer: wgpu::Buffer,
    edges_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
}

impl SceneRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scene-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                time: 0.0,
                node_count: 0,
                edge_count: 0,
                starfield: 1,
                theme: 0,
                motion: 1.0,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let nodes_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nodes"),
            size: (std::mem::size_of::<NodeData>() * MAX_NODES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let edges_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("edges"),
            size: (std::mem::size_of::<EdgeData>() * MAX_EDGES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: nodes_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: edges_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            nodes_buffer,
            edges_buffer,
            bind_group,
            size: (width, height),
        }
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Update GPU buffers from simulation state and render
    pub fn render(
        &mut self,
        state: &SimState,
        settings: &Settings,
        camera: &Camera,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // time is ms since page load from requestAnimationFrame
        let elapsed = (time / 1000.0) as f32;
        let resolution = (self.size.0 as f32, self.size.1 as f32);
        let motion = settings.motion_scale();

        let mut nodes_data = vec![
            NodeData {
                pos: [0.0; 2],
                radius_px: 0.0,
                depth: 0.0,
                kind: 0,
                selected: 0,
                pulse_phase: 0.0,
                _pad: 0,
            };
            MAX_NODES
        ];
        let mut screens: HashMap<u64, (Vec2, f32)> = HashMap::new();
        let mut node_count = 0usize;

        for block in state.history.iter() {
            if node_count >= MAX_NODES {
                break;
            }
            let mut pos = block.pos;
            // Transient float animation; never written back to the model.
            pos.y += (elapsed * 1.3 + block.id as f32 * 2.39).sin() * BOB_AMPLITUDE * motion;

            let Some(projected) = camera.project(pos, resolution) else {
                continue;
            };
            screens.insert(block.id, (projected.screen, projected.depth));

            let kind = match block.kind {
                crate::sim::BlockKind::Normal => 0,
                crate::sim::BlockKind::Gold => 1,
                crate::sim::BlockKind::Anomaly => 2,
            };
            nodes_data[node_count] = NodeData {
                pos: [projected.screen.x, projected.screen.y],
                radius_px: camera.block_radius_px(block, &projected),
                depth: projected.depth,
                kind,
                selected: state.selection.is_selected(block.id) as u32,
                pulse_phase: block.id as f32 * 2.39,
                _pad: 0,
            };
            node_count += 1;
        }

        let mut edges_data = vec![
            EdgeData {
                a: [0.0; 2],
                b: [0.0; 2],
                alpha: 0.0,
                _pad: [0.0; 3],
            };
            MAX_EDGES
        ];
        let mut edge_count = 0usize;

        for block in state.history.iter() {
            let Some(&(child, depth)) = screens.get(&block.id) else {
                continue;
            };
            for parent_id in &block.parents {
                if edge_count >= MAX_EDGES {
                    break;
                }
                // Edges to evicted or culled parents are simply not drawn.
                let Some(&(parent, _)) = screens.get(parent_id) else {
                    continue;
                };
                edges_data[edge_count] = EdgeData {
                    a: [child.x, child.y],
                    b: [parent.x, parent.y],
                    alpha: (1.0 - depth / 250.0).clamp(0.15, 0.8),
                    _pad: [0.0; 3],
                };
                edge_count += 1;
            }
        }

        let globals = Globals {
            resolution: [resolution.0, resolution.1],
            time: elapsed,
            node_count: node_count as u32,
            edge_count: edge_count as u32,
            starfield: settings.starfield as u32,
            theme: match state.theme {
                Theme::Kaspa => 0,
                Theme::Sui => 1,
            },
            motion,
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.queue
            .write_buffer(&self.nodes_buffer, 0, bytemuck::cast_slice(&nodes_data));
        self.queue
            .write_buffer(&self.edges_buffer, 0, bytemuck::cast_slice(&edges_data));

        // Render
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
