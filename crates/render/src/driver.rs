use crate::context::RenderContext;
use crate::device::GraphicsDevice;
use crate::error::RenderResult;
use crate::pipeline::render_frame;
use glam::UVec2;
use skymirror_common::DemoConfig;
use skymirror_scene::{AnimationClock, SceneAnimator, SceneState};

/// Owns the clock, the animation, and the render context, and turns wall
/// clock deltas into rendered frames.
#[derive(Debug)]
pub struct FrameDriver {
    clock: AnimationClock,
    animator: SceneAnimator,
    context: RenderContext,
    state: SceneState,
}

impl FrameDriver {
    pub fn new(config: &DemoConfig, screen_size: UVec2) -> Self {
        let animator = SceneAnimator::new(config);
        let state = animator.sample(0.0);
        let mut context = RenderContext::new(config, screen_size);
        context.update(&state);
        tracing::info!(
            "frame driver ready: screen {}x{}, reflection {}x{}",
            context.screen_size().x,
            context.screen_size().y,
            context.reflection_size().x,
            context.reflection_size().y
        );
        Self {
            clock: AnimationClock::new(config.scene.time_scale),
            animator,
            context,
            state,
        }
    }

    /// Advance scene time by `dt` seconds and refresh the context.
    pub fn advance(&mut self, dt: f32) -> &SceneState {
        let time = self.clock.advance(dt);
        self.state = self.animator.sample(time);
        self.context.update(&self.state);
        &self.state
    }

    /// Render the current state without advancing time.
    pub fn render<D: GraphicsDevice + ?Sized>(&self, device: &mut D) -> RenderResult<()> {
        render_frame(&self.context, device)
    }

    /// Advance, then render.
    pub fn frame<D: GraphicsDevice + ?Sized>(&mut self, dt: f32, device: &mut D) -> RenderResult<()> {
        self.advance(dt);
        self.render(device)
    }

    pub fn set_screen_size(&mut self, size: UVec2) {
        self.context.set_screen_size(size);
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut AnimationClock {
        &mut self.clock
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }
}
