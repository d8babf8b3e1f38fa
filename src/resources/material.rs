//! Material definitions: shader, uniforms, textures and fixed-function state

use super::assets::{ShaderId, TextureId};
use crate::backend::types::{BlendState, CullMode, DepthState};
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::collections::BTreeMap;

/// Value of a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Colour blending preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    AlphaBlend,
    Additive,
    Premultiplied,
    Multiply,
}

impl BlendMode {
    /// Backend blend state, `None` for opaque
    pub fn blend_state(&self) -> Option<BlendState> {
        match self {
            BlendMode::Opaque => None,
            BlendMode::AlphaBlend => Some(BlendState::alpha_blending()),
            BlendMode::Additive => Some(BlendState::additive()),
            BlendMode::Premultiplied => Some(BlendState::premultiplied()),
            BlendMode::Multiply => Some(BlendState::multiply()),
        }
    }

    pub fn is_blended(&self) -> bool {
        !matches!(self, BlendMode::Opaque)
    }
}

/// Draw order bucket; lower queues draw first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderQueue(pub i32);

impl RenderQueue {
    pub const BACKGROUND: Self = Self(1000);
    pub const GEOMETRY: Self = Self(2000);
    pub const ALPHA_TEST: Self = Self(2450);
    pub const TRANSPARENT: Self = Self(3000);
    pub const OVERLAY: Self = Self(4000);

    /// Queues past this value are sorted back-to-front
    pub const TRANSPARENT_THRESHOLD: i32 = 2500;

    pub fn is_transparent(&self) -> bool {
        self.0 > Self::TRANSPARENT_THRESHOLD
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::GEOMETRY
    }
}

/// GPU state bundle bound before drawing
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub shader: ShaderId,
    uniforms: BTreeMap<String, UniformValue>,
    textures: BTreeMap<String, TextureId>,
    pub blend: BlendMode,
    pub depth: Option<DepthState>,
    pub cull: CullMode,
    render_queue: Option<RenderQueue>,
}

impl Material {
    pub fn new(name: &str, shader: ShaderId) -> Self {
        Self {
            name: name.to_string(),
            shader,
            uniforms: BTreeMap::new(),
            textures: BTreeMap::new(),
            blend: BlendMode::Opaque,
            depth: None,
            cull: CullMode::Back,
            render_queue: None,
        }
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_depth(mut self, depth: DepthState) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }

    pub fn with_render_queue(mut self, queue: RenderQueue) -> Self {
        self.render_queue = Some(queue);
        self
    }

    pub fn with_uniform(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.set_uniform(name, value);
        self
    }

    pub fn with_texture(mut self, name: &str, texture: TextureId) -> Self {
        self.set_texture(name, texture);
        self
    }

    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.uniforms.insert(name.to_string(), value.into());
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    /// Uniforms in name order
    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn set_texture(&mut self, name: &str, texture: TextureId) {
        self.textures.insert(name.to_string(), texture);
    }

    pub fn textures(&self) -> impl Iterator<Item = (&str, TextureId)> {
        self.textures.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn set_render_queue(&mut self, queue: Option<RenderQueue>) {
        self.render_queue = queue;
    }

    /// Explicit queue, otherwise `TRANSPARENT` for blended and `GEOMETRY` for opaque
    pub fn render_queue(&self) -> RenderQueue {
        self.render_queue.unwrap_or(if self.blend.is_blended() {
            RenderQueue::TRANSPARENT
        } else {
            RenderQueue::GEOMETRY
        })
    }

    /// Explicit depth state, otherwise read-only for blended materials
    pub fn depth_state(&self) -> DepthState {
        self.depth.unwrap_or(if self.blend.is_blended() {
            DepthState::READ_ONLY
        } else {
            DepthState::OPAQUE
        })
    }

    pub fn is_transparent(&self) -> bool {
        self.render_queue().is_transparent()
    }

    // Preset materials

    /// Flat colour; alpha below one switches to alpha blending
    pub fn unlit_color(shader: ShaderId, color: Vec4) -> Self {
        let blend = if color.w < 1.0 {
            BlendMode::AlphaBlend
        } else {
            BlendMode::Opaque
        };
        Self::new("unlit", shader)
            .with_uniform("color", color)
            .with_blend(blend)
    }

    pub fn additive_glow(shader: ShaderId, color: Vec3) -> Self {
        Self::new("glow", shader)
            .with_uniform("color", color.extend(1.0))
            .with_blend(BlendMode::Additive)
            .with_cull(CullMode::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn shader() -> ShaderId {
        ShaderId::from(KeyData::from_ffi(1))
    }

    #[test]
    fn queue_follows_blend_mode() {
        let opaque = Material::new("a", shader());
        assert_eq!(opaque.render_queue(), RenderQueue::GEOMETRY);
        assert!(!opaque.is_transparent());

        let blended = Material::new("b", shader()).with_blend(BlendMode::AlphaBlend);
        assert_eq!(blended.render_queue(), RenderQueue::TRANSPARENT);
        assert!(blended.is_transparent());

        let overlay = blended.with_render_queue(RenderQueue::ALPHA_TEST);
        assert!(!overlay.is_transparent());
    }

    #[test]
    fn depth_defaults() {
        let opaque = Material::new("a", shader());
        assert!(opaque.depth_state().write);
        let blended = Material::new("b", shader()).with_blend(BlendMode::Additive);
        assert!(!blended.depth_state().write);
        let forced = blended.with_depth(DepthState::OPAQUE);
        assert!(forced.depth_state().write);
    }

    #[test]
    fn uniforms_sorted_by_name() {
        let m = Material::new("m", shader())
            .with_uniform("tint", Vec3::ONE)
            .with_uniform("alpha", 0.5)
            .with_uniform("count", 3);
        let names: Vec<_> = m.uniforms().map(|(n, _)| n).collect();
        assert_eq!(names, ["alpha", "count", "tint"]);
        assert_eq!(m.uniform("count"), Some(&UniformValue::Int(3)));
    }

    #[test]
    fn unlit_color_picks_blend() {
        let solid = Material::unlit_color(shader(), Vec4::ONE);
        assert_eq!(solid.blend, BlendMode::Opaque);
        let faded = Material::unlit_color(shader(), Vec4::new(1.0, 1.0, 1.0, 0.5));
        assert_eq!(faded.blend, BlendMode::AlphaBlend);
        assert_eq!(BlendMode::Opaque.blend_state(), None);
    }
}
