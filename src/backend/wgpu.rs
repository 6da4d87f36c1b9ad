use std::borrow::Cow;

use encase::{ShaderType, UniformBuffer};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    BindGroupDescriptor, BindGroupEntry, Buffer, BufferDescriptor, BufferUsages,
    CommandEncoderDescriptor, ComputePassDescriptor, ComputePipeline, ComputePipelineDescriptor,
    Device, DeviceDescriptor, Features, Instance, Limits, Maintain, MapMode, PowerPreference, Queue,
    RequestAdapterOptions, ShaderModuleDescriptor,
};

use super::{Backend, MergeBackend};
use crate::color::Rgba8;
use crate::hdr::CycleContext;
use crate::image::Image;
use crate::merge::Exposures;

/// Rows handled by one workgroup; must match `@workgroup_size` in the shader.
const ROWS_PER_WORKGROUP: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no adapters")]
    NoAdapterFound,

    #[error("device request error: {0}")]
    RequestDeviceError(#[from] wgpu::RequestDeviceError),

    #[error("buffer map error: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("readback channel closed before the buffer was mapped")]
    ReadbackDisconnected,

    #[error("image of {size} bytes exceeds the storage buffer limit of {limit} bytes")]
    BufferTooLarge { size: u64, limit: u64 },

    #[error("uniform encoding error: {0}")]
    Uniform(#[from] encase::internal::Error),
}

#[derive(Debug, ShaderType)]
struct MergeParams {
    pub width: u32,
    pub height: u32,
    pub offset_top_mid: i32,
    pub offset_left_mid: i32,
    pub offset_top_hi: i32,
    pub offset_left_hi: i32,
}

/// Merges rows on the GPU, one compute invocation per row.
pub struct WgpuBackend {
    device: Device,
    queue: Queue,
    pipeline_table: WgpuShaderTable,
}

pub struct WgpuShaderTable {
    merge_row: ComputePipeline,
}

impl WgpuShaderTable {
    pub fn new(device: &Device) -> Self {
        Self {
            merge_row: create_compute_pipeline(
                device,
                "merge_row",
                "Merge Row",
                include_str!("./wgsl/merge.wgsl"),
            ),
        }
    }
}

#[inline]
fn create_compute_pipeline(
    device: &Device,
    entry_point: &'static str,
    label: &'static str,
    data: &'static str,
) -> ComputePipeline {
    let module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(data)),
    });

    device.create_compute_pipeline(&ComputePipelineDescriptor {
        label: Some(label),
        layout: None,
        module: &module,
        entry_point,
        compilation_options: Default::default(),
    })
}

impl WgpuBackend {
    pub async fn new() -> Result<Self, Error> {
        let instance = Instance::default();

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await
            .ok_or(Error::NoAdapterFound)?;

        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: None,
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_defaults(),
                },
                None,
            )
            .await?;

        Ok(Self {
            pipeline_table: WgpuShaderTable::new(&device),
            device,
            queue,
        })
    }

    fn upload(&self, image: &Image, label: &'static str) -> Buffer {
        self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some(label),
            contents: image.as_bytes(),
            usage: BufferUsages::STORAGE,
        })
    }
}

impl Backend for WgpuBackend {
    type Error = Error;

    fn name(&self) -> &'static str {
        "wgpu"
    }
}

impl MergeBackend for WgpuBackend {
    fn merge(
        &self,
        ctx: &CycleContext,
        exposures: &Exposures<'_>,
        output: &mut Image,
    ) -> Result<(), Self::Error> {
        let size = output.as_bytes().len() as u64;
        let limit = self.device.limits().max_storage_buffer_binding_size as u64;
        if size > limit {
            return Err(Error::BufferTooLarge { size, limit });
        }

        let params = MergeParams {
            width: ctx.width as u32,
            height: ctx.height as u32,
            offset_top_mid: ctx.mid.offset.top,
            offset_left_mid: ctx.mid.offset.left,
            offset_top_hi: ctx.hi.offset.top,
            offset_left_hi: ctx.hi.offset.left,
        };
        let mut uniform = UniformBuffer::new(Vec::<u8>::new());
        uniform.write(&params)?;

        let params_buffer = self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Merge Params"),
            contents: &uniform.into_inner(),
            usage: BufferUsages::UNIFORM,
        });

        let low = self.upload(exposures.low, "Low Exposure");
        let mid = self.upload(exposures.mid, "Mid Exposure");
        let hi = self.upload(exposures.hi, "High Exposure");

        let merged = self.device.create_buffer(&BufferDescriptor {
            label: Some("Merged"),
            size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging = self.device.create_buffer(&BufferDescriptor {
            label: Some("Merged Readback"),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let pipeline = &self.pipeline_table.merge_row;
        let bind_group_layout = pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: low.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: mid.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: hi.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 3,
                    resource: merged.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 4,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: None });

        {
            let mut cpass = encoder.begin_compute_pass(&ComputePassDescriptor {
                label: None,
                timestamp_writes: None,
            });

            cpass.set_pipeline(pipeline);
            cpass.set_bind_group(0, &bind_group, &[]);
            cpass.insert_debug_marker("compute merge::merge_row");
            cpass.dispatch_workgroups(ctx.height.div_ceil(ROWS_PER_WORKGROUP) as u32, 1, 1);
        }

        encoder.copy_buffer_to_buffer(&merged, 0, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging.slice(..);
        let (sender, receiver) = flume::bounded(1);
        buffer_slice.map_async(MapMode::Read, move |v| {
            let _ = sender.send(v);
        });

        // Blocks until the submission above, including the copy, has finished.
        self.device.poll(Maintain::wait()).panic_on_timeout();

        pollster::block_on(receiver.recv_async()).map_err(|_| Error::ReadbackDisconnected)??;

        {
            let data = buffer_slice.get_mapped_range();
            output
                .pixels_mut()
                .copy_from_slice(bytemuck::cast_slice::<u8, Rgba8>(&data[..]));
        }
        staging.unmap();

        Ok(())
    }
}
