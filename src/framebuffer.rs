//! Offscreen render targets for the post-processing pipeline.
//!
//! A [`FrameBuffer`] groups the texture attachments a render pass writes into
//! and later passes sample from. Which attachments exist is fixed by the
//! [`FrameBufferKind`] at creation time and never changes afterwards; resizing
//! is always release-and-recreate, handled by the pipeline controller.
//!
//! Attachments are created with both `RENDER_ATTACHMENT` and `TEXTURE_BINDING`
//! usage so one pass can write them and the next can sample them. Reading an
//! attachment that is the render target of the *same* pass is undefined; the
//! pass planner is responsible for never producing such a binding.

use crate::gpu::GpuContext;

/// Format of the HDR color, bright-pass, and position attachments.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Format of the normal attachment; normals are stored as `n * 0.5 + 0.5`.
/// Keeps the geometry buffer within the default 32-byte-per-sample limit.
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgb10a2Unorm;
/// Format of the albedo attachment.
pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Format of the single-channel ambient-occlusion attachments.
pub const OCCLUSION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;
/// Format of every depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The attachment layout a [`FrameBuffer`] owns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrameBufferKind {
    /// One HDR color attachment plus depth: the plain scene capture target.
    Color,
    /// Depth attachment only, for depth-prepass effects (motion blur, depth view).
    DepthOnly,
    /// The geometry buffer: hdr scene, hdr bright-pass, position, normal,
    /// albedo, plus depth.
    Geometry,
    /// Two HDR color attachments used alternately by iterative blurs. Never a
    /// scene target, so it carries no depth.
    PingPong,
    /// One single-channel occlusion attachment, no depth.
    Occlusion,
}

impl FrameBufferKind {
    /// Color attachment formats, in attachment-index order.
    pub const fn color_formats(self) -> &'static [wgpu::TextureFormat] {
        match self {
            FrameBufferKind::Color => &[HDR_FORMAT],
            FrameBufferKind::DepthOnly => &[],
            FrameBufferKind::Geometry => &[
                HDR_FORMAT,    // scene color
                HDR_FORMAT,    // bright pass
                HDR_FORMAT,    // world position
                NORMAL_FORMAT, // encoded world normal
                ALBEDO_FORMAT, // albedo
            ],
            FrameBufferKind::PingPong => &[HDR_FORMAT, HDR_FORMAT],
            FrameBufferKind::Occlusion => &[OCCLUSION_FORMAT],
        }
    }

    /// Whether this kind owns a depth attachment.
    pub const fn has_depth(self) -> bool {
        matches!(
            self,
            FrameBufferKind::Color | FrameBufferKind::DepthOnly | FrameBufferKind::Geometry
        )
    }
}

/// Errors from frame buffer creation.
///
/// Allocation failures are fatal: they abort startup or the effect switch
/// that triggered reallocation. They are never retried.
#[derive(Debug)]
pub enum FrameBufferError {
    /// The driver reported an error while allocating an attachment.
    Allocation(String),
}

impl std::fmt::Display for FrameBufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameBufferError::Allocation(msg) => {
                write!(f, "frame buffer allocation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for FrameBufferError {}

struct Attachments {
    color: Vec<(wgpu::Texture, wgpu::TextureView)>,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

/// An offscreen render target with a fixed attachment set.
pub struct FrameBuffer {
    kind: FrameBufferKind,
    width: u32,
    height: u32,
    // None once released; every accessor treats that as a caller bug.
    attachments: Option<Attachments>,
}

impl FrameBuffer {
    /// Allocates a frame buffer of the given kind.
    ///
    /// All attachments are created inside an out-of-memory error scope;
    /// any allocation failure surfaces as [`FrameBufferError::Allocation`].
    pub fn new(
        gpu: &GpuContext,
        width: u32,
        height: u32,
        kind: FrameBufferKind,
    ) -> Result<Self, FrameBufferError> {
        gpu.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color = kind
            .color_formats()
            .iter()
            .enumerate()
            .map(|(i, &format)| {
                let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("{:?} FrameBuffer Color {}", kind, i)),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                (texture, view)
            })
            .collect();

        let depth = kind.has_depth().then(|| {
            let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("{:?} FrameBuffer Depth", kind)),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });

        if let Some(error) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(FrameBufferError::Allocation(error.to_string()));
        }

        Ok(Self {
            kind,
            width,
            height,
            attachments: Some(Attachments { color, depth }),
        })
    }

    /// The attachment layout this buffer was created with.
    pub fn kind(&self) -> FrameBufferKind {
        self.kind
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Destroys the GPU resources. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(attachments) = self.attachments.take() {
            for (texture, _) in &attachments.color {
                texture.destroy();
            }
            if let Some((texture, _)) = &attachments.depth {
                texture.destroy();
            }
        }
    }

    /// True if [`release`](Self::release) has been called.
    pub fn is_released(&self) -> bool {
        self.attachments.is_none()
    }

    fn attachments(&self) -> &Attachments {
        self.attachments
            .as_ref()
            .expect("frame buffer used after release")
    }

    /// View of the color attachment at `index`.
    pub fn color_view(&self, index: usize) -> &wgpu::TextureView {
        &self.attachments().color[index].1
    }

    /// Views of every color attachment, in attachment order.
    pub fn color_views(&self) -> Vec<&wgpu::TextureView> {
        self.attachments().color.iter().map(|(_, v)| v).collect()
    }

    /// View of the depth attachment.
    ///
    /// # Panics
    ///
    /// Panics if this kind has no depth attachment.
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self
            .attachments()
            .depth
            .as_ref()
            .expect("frame buffer kind has no depth attachment")
            .1
    }

    /// Copies this buffer's depth attachment into `target`'s depth attachment.
    ///
    /// Used after the deferred composite so forward-rendered overlays are
    /// depth-tested against the deferred scene. Both buffers must have depth
    /// attachments of the same size.
    pub fn copy_depth_to(&self, encoder: &mut wgpu::CommandEncoder, target: &FrameBuffer) {
        let src = &self
            .attachments()
            .depth
            .as_ref()
            .expect("depth copy source has no depth attachment")
            .0;
        let dst = &target
            .attachments()
            .depth
            .as_ref()
            .expect("depth copy target has no depth attachment")
            .0;
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: src,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::DepthOnly,
            },
            wgpu::TexelCopyTextureInfo {
                texture: dst,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::DepthOnly,
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_layouts() {
        assert_eq!(FrameBufferKind::Color.color_formats().len(), 1);
        assert!(FrameBufferKind::Color.has_depth());

        assert_eq!(FrameBufferKind::DepthOnly.color_formats().len(), 0);
        assert!(FrameBufferKind::DepthOnly.has_depth());

        assert_eq!(FrameBufferKind::Geometry.color_formats().len(), 5);
        assert!(FrameBufferKind::Geometry.has_depth());

        assert_eq!(FrameBufferKind::PingPong.color_formats().len(), 2);
        assert!(!FrameBufferKind::PingPong.has_depth());

        assert_eq!(FrameBufferKind::Occlusion.color_formats().len(), 1);
        assert!(!FrameBufferKind::Occlusion.has_depth());
    }

    #[test]
    fn geometry_buffer_formats() {
        let formats = FrameBufferKind::Geometry.color_formats();
        assert_eq!(formats[0], HDR_FORMAT);
        assert_eq!(formats[1], HDR_FORMAT);
        assert_eq!(formats[2], HDR_FORMAT);
        assert_eq!(formats[3], NORMAL_FORMAT);
        assert_eq!(formats[4], ALBEDO_FORMAT);
    }

    #[test]
    fn geometry_buffer_fits_default_attachment_budget() {
        // wgpu's default max_color_attachment_bytes_per_sample is 32.
        let bytes: u32 = FrameBufferKind::Geometry
            .color_formats()
            .iter()
            .map(|f| match f {
                wgpu::TextureFormat::Rgba16Float => 8,
                wgpu::TextureFormat::Rgb10a2Unorm | wgpu::TextureFormat::Rgba8Unorm => 4,
                other => panic!("unaccounted format {:?}", other),
            })
            .sum();
        assert!(bytes <= 32, "geometry buffer uses {} bytes per sample", bytes);
    }

    #[test]
    fn occlusion_is_single_channel() {
        assert_eq!(
            FrameBufferKind::Occlusion.color_formats(),
            &[OCCLUSION_FORMAT][..]
        );
    }
}
