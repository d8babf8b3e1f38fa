//! Common types shared between backends

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferUsage(u32);

impl BufferUsage {
    pub const VERTEX: Self = Self(1 << 0);
    pub const INDEX: Self = Self(1 << 1);
    pub const UNIFORM: Self = Self(1 << 2);
    pub const COPY_DST: Self = Self(1 << 3);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Buffer descriptor
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    pub usage: BufferUsage,
}

/// Index element size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

/// Vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
}

impl VertexFormat {
    pub fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u64,
}

/// Vertex buffer layout
#[derive(Debug, Clone)]
pub struct VertexBufferLayout {
    pub array_stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

/// Preview vertex: position, normal, UV
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub const fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    pub fn layout() -> VertexBufferLayout {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    format: VertexFormat::Float32x3,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    format: VertexFormat::Float32x3,
                    offset: 12,
                },
                VertexAttribute {
                    location: 2,
                    format: VertexFormat::Float32x2,
                    offset: 24,
                },
            ],
        }
    }
}

/// Cull mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Compare function for depth testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Depth test and write state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub compare: CompareFunction,
    pub write: bool,
}

impl DepthState {
    pub const OPAQUE: Self = Self {
        compare: CompareFunction::LessEqual,
        write: true,
    };
    /// Tested but not written, for blended geometry
    pub const READ_ONLY: Self = Self {
        compare: CompareFunction::LessEqual,
        write: false,
    };
    pub const DISABLED: Self = Self {
        compare: CompareFunction::Always,
        write: false,
    };
}

impl Default for DepthState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    Src,
    OneMinusSrc,
    SrcAlpha,
    OneMinusSrcAlpha,
    Dst,
    OneMinusDst,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Blend component state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub operation: BlendOperation,
}

impl BlendComponent {
    const fn new(src_factor: BlendFactor, dst_factor: BlendFactor) -> Self {
        Self {
            src_factor,
            dst_factor,
            operation: BlendOperation::Add,
        }
    }
}

impl Default for BlendComponent {
    fn default() -> Self {
        Self::new(BlendFactor::One, BlendFactor::Zero)
    }
}

/// Blend state; `None` at the use site means blending is off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

impl BlendState {
    pub fn alpha_blending() -> Self {
        Self {
            color: BlendComponent::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
            alpha: BlendComponent::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
        }
    }

    pub fn additive() -> Self {
        Self {
            color: BlendComponent::new(BlendFactor::SrcAlpha, BlendFactor::One),
            alpha: BlendComponent::new(BlendFactor::Zero, BlendFactor::One),
        }
    }

    pub fn premultiplied() -> Self {
        Self {
            color: BlendComponent::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
            alpha: BlendComponent::new(BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
        }
    }

    pub fn multiply() -> Self {
        Self {
            color: BlendComponent::new(BlendFactor::Dst, BlendFactor::Zero),
            alpha: BlendComponent::new(BlendFactor::DstAlpha, BlendFactor::Zero),
        }
    }
}

/// Render target description for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTarget {
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
}

impl FrameTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
