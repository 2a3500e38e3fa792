//! Compiled compute programs implementing the evaluator traits.

use std::borrow::Cow;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::emit::{emit_compute_2d, emit_compute_3d, EmitConfig, ShaderObject};
use crate::error::{Error, Result};
use crate::eval::{check_batch, ScratchPool, Sdf2, Sdf3};
use crate::math::{Aabb2, Aabb3};
use crate::shape::{Shape2, Shape3};

/// Program state shared by the 2D and 3D evaluators.
struct Program {
  ctx: Arc<crate::gpu::GpuContext>,
  pipeline: wgpu::ComputePipeline,
  bind_layout: wgpu::BindGroupLayout,
  /// Shader-object buffers, uploaded once at compile time.
  object_buffers: Vec<(u32, wgpu::Buffer)>,
  invoc_x: u32,
  source: String,
}

impl Program {
  fn compile(
    ctx: Arc<crate::gpu::GpuContext>,
    source: String,
    objects: &[ShaderObject],
    invoc_x: u32,
  ) -> Result<Self> {
    let device = &ctx.device;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("sdfkit compute"),
      source: wgpu::ShaderSource::Glsl {
        shader: Cow::Borrowed(source.as_str()),
        stage: naga::ShaderStage::Compute,
        defines: naga::FastHashMap::default(),
      },
    });
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
      label: Some("sdfkit compute pipeline"),
      layout: None,
      module: &module,
      entry_point: "main",
      compilation_options: wgpu::PipelineCompilationOptions::default(),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
      return Err(Error::ShaderCompile {
        log: err.to_string(),
        generated_source: source,
      });
    }

    let bind_layout = pipeline.get_bind_group_layout(0);

    let object_buffers = objects
      .iter()
      .map(|obj| {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
          label: Some("sdfkit shader object"),
          contents: &obj.data,
          usage: wgpu::BufferUsages::STORAGE,
        });
        (obj.binding, buffer)
      })
      .collect();

    log::debug!(
      "compiled compute program ({} bytes of source, {} shader objects)",
      source.len(),
      objects.len()
    );

    Ok(Self {
      ctx,
      pipeline,
      bind_layout,
      object_buffers,
      invoc_x,
      source,
    })
  }

  /// Upload `input`, dispatch one invocation per element (padded to the
  /// workgroup size), and read back `count` distances.
  fn dispatch(&self, input: &[u8], count: usize, out: &mut [f32]) -> Result<()> {
    let device = &self.ctx.device;
    let padded = count.div_ceil(self.invoc_x as usize) * self.invoc_x as usize;
    let out_bytes = (padded * std::mem::size_of::<f32>()) as u64;

    let in_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("sdfkit positions"),
      contents: input,
      usage: wgpu::BufferUsages::STORAGE,
    });
    let out_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("sdfkit distances"),
      size: out_bytes,
      usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
      mapped_at_creation: false,
    });
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("sdfkit readback"),
      size: out_bytes,
      usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let mut entries = vec![
      wgpu::BindGroupEntry {
        binding: 0,
        resource: in_buffer.as_entire_binding(),
      },
      wgpu::BindGroupEntry {
        binding: 1,
        resource: out_buffer.as_entire_binding(),
      },
    ];
    for (binding, buffer) in &self.object_buffers {
      entries.push(wgpu::BindGroupEntry {
        binding: *binding,
        resource: buffer.as_entire_binding(),
      });
    }
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("sdfkit bind group"),
      layout: &self.bind_layout,
      entries: &entries,
    });

    let groups = (padded / self.invoc_x as usize) as u32;
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
      label: Some("sdfkit dispatch"),
    });
    {
      let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("sdfkit compute pass"),
        timestamp_writes: None,
      });
      pass.set_pipeline(&self.pipeline);
      pass.set_bind_group(0, &bind_group, &[]);
      pass.dispatch_workgroups(groups, 1, 1);
    }
    encoder.copy_buffer_to_buffer(&out_buffer, 0, &staging, 0, out_bytes);
    self.ctx.queue.submit([encoder.finish()]);
    log::trace!("dispatched {groups} workgroups for {count} points");

    let slice = staging.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |v| {
      sender.send(v).ok();
    });
    device.poll(wgpu::Maintain::Wait);
    pollster::block_on(receiver.receive())
      .ok_or_else(|| Error::BackendUnavailable("readback channel dropped".into()))?
      .map_err(|e| Error::BackendUnavailable(format!("buffer map failed: {e:?}")))?;

    {
      let mapped = slice.get_mapped_range();
      let floats: &[f32] = bytemuck::cast_slice(&mapped[..]);
      out.copy_from_slice(&floats[..count]);
    }
    staging.unmap();
    Ok(())
  }
}

/// GPU evaluator for a 3D expression. Compiles once, dispatches per
/// call.
pub struct GpuSdf3 {
  program: Program,
  bounds: Aabb3,
}

impl GpuSdf3 {
  pub fn new(ctx: Arc<crate::gpu::GpuContext>, shape: &Shape3) -> Result<Self> {
    Self::with_config(ctx, shape, &EmitConfig::default())
  }

  pub fn with_config(
    ctx: Arc<crate::gpu::GpuContext>,
    shape: &Shape3,
    cfg: &EmitConfig,
  ) -> Result<Self> {
    let mut source = String::new();
    let (_, objects) = emit_compute_3d(&mut source, shape, cfg);
    let program = Program::compile(ctx, source, &objects, cfg.invoc_x)?;
    Ok(Self {
      program,
      bounds: shape.bounds(),
    })
  }

  /// The generated GLSL, for diagnostics.
  pub fn source(&self) -> &str {
    &self.program.source
  }
}

impl Sdf3 for GpuSdf3 {
  fn evaluate(
    &mut self,
    positions: &[Vec3],
    distances: &mut [f32],
    _scratch: &mut ScratchPool,
  ) -> Result<()> {
    check_batch(positions.len(), distances.len())?;
    let padded = positions.len().div_ceil(self.program.invoc_x as usize)
      * self.program.invoc_x as usize;
    let mut host: Vec<[f32; 4]> = Vec::with_capacity(padded);
    host.extend(positions.iter().map(|p| [p.x, p.y, p.z, 0.0]));
    host.resize(padded, [0.0; 4]);
    self
      .program
      .dispatch(bytemuck::cast_slice(&host), positions.len(), distances)
  }

  fn bounds(&self) -> Aabb3 {
    self.bounds
  }
}

/// GPU evaluator for a 2D expression.
pub struct GpuSdf2 {
  program: Program,
  bounds: Aabb2,
}

impl GpuSdf2 {
  pub fn new(ctx: Arc<crate::gpu::GpuContext>, shape: &Shape2) -> Result<Self> {
    Self::with_config(ctx, shape, &EmitConfig::default())
  }

  pub fn with_config(
    ctx: Arc<crate::gpu::GpuContext>,
    shape: &Shape2,
    cfg: &EmitConfig,
  ) -> Result<Self> {
    let mut source = String::new();
    let (_, objects) = emit_compute_2d(&mut source, shape, cfg);
    let program = Program::compile(ctx, source, &objects, cfg.invoc_x)?;
    Ok(Self {
      program,
      bounds: shape.bounds(),
    })
  }

  pub fn source(&self) -> &str {
    &self.program.source
  }
}

impl Sdf2 for GpuSdf2 {
  fn evaluate(
    &mut self,
    positions: &[Vec2],
    distances: &mut [f32],
    _scratch: &mut ScratchPool,
  ) -> Result<()> {
    check_batch(positions.len(), distances.len())?;
    let padded = positions.len().div_ceil(self.program.invoc_x as usize)
      * self.program.invoc_x as usize;
    let mut host: Vec<[f32; 2]> = Vec::with_capacity(padded);
    host.extend(positions.iter().map(|p| [p.x, p.y]));
    host.resize(padded, [0.0; 2]);
    self
      .program
      .dispatch(bytemuck::cast_slice(&host), positions.len(), distances)
  }

  fn bounds(&self) -> Aabb2 {
    self.bounds
  }
}
