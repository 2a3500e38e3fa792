//! wgpu compute backend.
//!
//! [`GpuContext`] owns the adapter, device and queue; evaluators compile
//! their program once at construction and dispatch per call. Hosts
//! without a usable compute adapter fail with
//! [`Error::BackendUnavailable`] and the CPU paths remain available.

pub mod eval;

pub use eval::{GpuSdf2, GpuSdf3};

use crate::error::{Error, Result};

/// Shared device and queue for GPU evaluation.
///
/// wgpu resources created from one context must stay with that context;
/// evaluators hold the context behind an `Arc` and submit from whichever
/// thread owns them.
pub struct GpuContext {
  pub(crate) device: wgpu::Device,
  pub(crate) queue: wgpu::Queue,
}

impl GpuContext {
  /// Acquire an adapter and device. Prefers a real adapter and falls
  /// back to a software one; fails with `BackendUnavailable` when
  /// neither exists or compute shaders are not supported.
  pub fn new() -> Result<Self> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      backends: wgpu::Backends::all(),
      ..Default::default()
    });

    let adapter = pollster::block_on(async {
      let direct = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
          power_preference: wgpu::PowerPreference::LowPower,
          compatible_surface: None,
          force_fallback_adapter: false,
        })
        .await;
      match direct {
        Some(a) => Some(a),
        None => {
          instance
            .request_adapter(&wgpu::RequestAdapterOptions {
              power_preference: wgpu::PowerPreference::LowPower,
              compatible_surface: None,
              force_fallback_adapter: true,
            })
            .await
        }
      }
    })
    .ok_or_else(|| Error::BackendUnavailable("no suitable adapter found".into()))?;

    let downlevel = adapter.get_downlevel_capabilities();
    if !downlevel
      .flags
      .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
    {
      return Err(Error::BackendUnavailable(format!(
        "adapter {:?} does not support compute shaders",
        adapter.get_info().name
      )));
    }

    log::debug!(
      "gpu evaluator on {:?} ({:?})",
      adapter.get_info().name,
      adapter.get_info().backend
    );

    let (device, queue) = pollster::block_on(adapter.request_device(
      &wgpu::DeviceDescriptor {
        label: Some("sdfkit gpu evaluator"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_defaults(),
      },
      None,
    ))
    .map_err(|e| Error::BackendUnavailable(format!("request_device failed: {e}")))?;

    Ok(Self { device, queue })
  }
}
