use crate::device::{
    CullFace, DrawCall, DrawKind, GraphicsDevice, RasterState, RenderTarget,
};
use crate::error::{RenderError, RenderResult};
use glam::UVec2;
use std::fmt::Write as _;

/// A device operation as observed by [`CommandRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    BindTarget { target: RenderTarget, size: UVec2 },
    Clear { target: RenderTarget },
    Draw {
        target: RenderTarget,
        kind: DrawKind,
        state: RasterState,
    },
}

/// In-memory graphics device.
///
/// Tracks state the way a real context does and records every bind, clear,
/// and draw instead of rasterizing. Used by tests and by the CLI's frame
/// trace.
#[derive(Debug)]
pub struct CommandRecorder {
    screen_size: UVec2,
    reflection_size: UVec2,
    bound: RenderTarget,
    depth_test: bool,
    culling: bool,
    cull_face: CullFace,
    fail_on: Option<DrawKind>,
    commands: Vec<Command>,
    draw_calls: Vec<(RenderTarget, DrawCall)>,
}

impl CommandRecorder {
    /// Starts bound to the screen, depth test and culling off, back faces
    /// selected for culling.
    pub fn new(screen_size: UVec2, reflection_size: UVec2) -> Self {
        Self {
            screen_size,
            reflection_size,
            bound: RenderTarget::Screen,
            depth_test: false,
            culling: false,
            cull_face: CullFace::Back,
            fail_on: None,
            commands: Vec::new(),
            draw_calls: Vec::new(),
        }
    }

    /// Make every draw of `kind` fail with [`RenderError::DrawFailed`].
    pub fn failing_on(mut self, kind: DrawKind) -> Self {
        self.fail_on = Some(kind);
        self
    }

    pub fn bound_target(&self) -> RenderTarget {
        self.bound
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Draws with their full uniform values, in issue order.
    pub fn draw_calls(&self) -> &[(RenderTarget, DrawCall)] {
        &self.draw_calls
    }

    /// Drain recorded commands and draws, keeping device state.
    pub fn take_commands(&mut self) -> Vec<Command> {
        self.draw_calls.clear();
        std::mem::take(&mut self.commands)
    }

    pub fn set_screen_size(&mut self, size: UVec2) {
        self.screen_size = size;
    }

    /// Human-readable listing, one command per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (i, command) in self.commands.iter().enumerate() {
            let _ = match command {
                Command::BindTarget { target, size } => {
                    writeln!(out, "{i:3} bind  {target:?} {}x{}", size.x, size.y)
                }
                Command::Clear { target } => writeln!(out, "{i:3} clear {target:?}"),
                Command::Draw {
                    target,
                    kind,
                    state,
                } => {
                    let cull = match state.cull {
                        Some(face) => format!("{face:?}"),
                        None => "off".to_string(),
                    };
                    writeln!(
                        out,
                        "{i:3} draw  {kind:?} -> {target:?} depth={} cull={cull}",
                        if state.depth_test { "on" } else { "off" }
                    )
                }
            };
        }
        out
    }

    fn raster_state(&self) -> RasterState {
        RasterState {
            depth_test: self.depth_test,
            cull: self.culling.then_some(self.cull_face),
        }
    }
}

impl GraphicsDevice for CommandRecorder {
    fn bind_target(&mut self, target: RenderTarget) -> RenderResult<()> {
        self.bound = target;
        self.commands.push(Command::BindTarget {
            target,
            size: self.target_size(target),
        });
        Ok(())
    }

    fn target_size(&self, target: RenderTarget) -> UVec2 {
        match target {
            RenderTarget::Screen => self.screen_size,
            RenderTarget::Reflection => self.reflection_size,
        }
    }

    fn clear(&mut self) -> RenderResult<()> {
        self.commands.push(Command::Clear {
            target: self.bound,
        });
        Ok(())
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn set_culling(&mut self, enabled: bool) {
        self.culling = enabled;
    }

    fn cull_face(&self) -> CullFace {
        self.cull_face
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.cull_face = face;
    }

    fn draw(&mut self, call: &DrawCall) -> RenderResult<()> {
        let kind = call.kind();
        if kind == DrawKind::Mirror && self.bound == RenderTarget::Reflection {
            return Err(RenderError::InvalidDraw {
                kind,
                target: self.bound,
            });
        }
        if self.fail_on == Some(kind) {
            return Err(RenderError::DrawFailed {
                kind,
                reason: "injected failure".to_string(),
            });
        }
        self.commands.push(Command::Draw {
            target: self.bound,
            kind,
            state: self.raster_state(),
        });
        self.draw_calls.push((self.bound, call.clone()));
        Ok(())
    }
}
