//! The two-pass mirror pipeline.
//!
//! A frame renders the scene from the mirrored camera into the offscreen
//! reflection target, renders it again from the real camera to the screen,
//! and finally draws the mirror quad sampling the offscreen image at each
//! fragment's screen position.

use crate::context::{CameraState, RenderContext, SceneTransforms};
use crate::cull::CullFaceGuard;
use crate::device::{CullFace, DrawCall, GraphicsDevice, MirrorUniforms, RenderTarget};
use crate::error::RenderResult;
use glam::{Vec2, Vec4};

/// Texture coordinate the mirror samples for a fragment at `frag_coord`.
///
/// Same arithmetic as the mirror fragment shader. Both framebuffer and
/// texture origins are top-left, so no flip is needed.
pub fn screen_uv(frag_coord: Vec2, screen_size: Vec2) -> Vec2 {
    frag_coord / screen_size
}

/// Where the mirror origin lands in the reflection texture this frame, or
/// `None` when it is behind the camera.
pub fn mirror_center_uv(ctx: &RenderContext) -> Option<Vec2> {
    let clip = ctx.projection * ctx.camera.view * ctx.mirror_model * Vec4::W;
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    let size = ctx.screen_size().as_vec2();
    let frag_coord = Vec2::new(ndc.x + 1.0, 1.0 - ndc.y) * 0.5 * size;
    Some(screen_uv(frag_coord, size))
}

/// Clear the bound target, then draw the sky and the object as seen by
/// `camera`.
pub fn draw_scene<D: GraphicsDevice + ?Sized>(
    ctx: &RenderContext,
    camera: &CameraState,
    device: &mut D,
) -> RenderResult<()> {
    let transforms = SceneTransforms::compute(ctx.projection, camera.view, ctx.model);

    device.clear()?;

    device.set_depth_test(false);
    device.set_culling(false);
    device.draw(&DrawCall::Skybox {
        view_projection_inverse: transforms.skybox_view_projection_inverse,
    })?;

    device.set_depth_test(true);
    device.set_culling(true);
    device.draw(&DrawCall::Object(ctx.object_uniforms(camera, &transforms)))
}

/// Renders the mirrored scene into the reflection target.
pub struct MirrorPass;

impl MirrorPass {
    /// The real camera reflected across the mirror plane.
    pub fn reflected_camera(ctx: &RenderContext) -> CameraState {
        ctx.camera.reflected(ctx.mirror_reflection())
    }

    /// Render the scene from the reflected camera into the offscreen target
    /// and leave the screen bound afterwards, also when a draw fails.
    ///
    /// Reflection flips triangle winding, so front faces are culled for the
    /// duration of the pass only.
    pub fn render_reflection<D: GraphicsDevice + ?Sized>(
        ctx: &RenderContext,
        device: &mut D,
    ) -> RenderResult<()> {
        let camera = Self::reflected_camera(ctx);
        device.bind_target(RenderTarget::Reflection)?;
        tracing::trace!(
            "reflection pass from {} at {}x{}",
            camera.position,
            ctx.reflection_size().x,
            ctx.reflection_size().y
        );
        let drawn = {
            let mut flipped = CullFaceGuard::new(device, CullFace::Front);
            draw_scene(ctx, &camera, &mut *flipped)
        };
        let restored = device.bind_target(RenderTarget::Screen);
        drawn.and(restored)
    }
}

/// Draw the mirror quad on the screen target, sampling the reflection.
pub fn draw_mirror<D: GraphicsDevice + ?Sized>(
    ctx: &RenderContext,
    device: &mut D,
) -> RenderResult<()> {
    let view_projection = ctx.projection * ctx.camera.view;
    device.draw(&DrawCall::Mirror(MirrorUniforms {
        model_view_projection: view_projection * ctx.mirror_model,
        screen_size: ctx.screen_size().as_vec2(),
        distortion_strength: ctx.distortion_strength,
    }))
}

/// One full frame: reflection pass, main pass, mirror composite.
pub fn render_frame<D: GraphicsDevice + ?Sized>(
    ctx: &RenderContext,
    device: &mut D,
) -> RenderResult<()> {
    MirrorPass::render_reflection(ctx, device)?;
    draw_scene(ctx, &ctx.camera, device)?;
    draw_mirror(ctx, device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DrawKind, RasterState};
    use crate::recorder::{Command, CommandRecorder};
    use glam::{UVec2, Vec3};
    use skymirror_common::DemoConfig;
    use skymirror_scene::SceneAnimator;

    fn context_at(time: f32) -> RenderContext {
        let config = DemoConfig::default();
        let mut ctx = RenderContext::new(&config, UVec2::new(800, 600));
        ctx.update(&SceneAnimator::new(&config).sample(time));
        ctx
    }

    fn recorder_for(ctx: &RenderContext) -> CommandRecorder {
        CommandRecorder::new(ctx.screen_size(), ctx.reflection_size())
    }

    #[test]
    fn screen_center_samples_texture_center() {
        let uv = screen_uv(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0));
        assert_eq!(uv, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn screen_corners_map_to_texture_corners() {
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(screen_uv(Vec2::ZERO, size), Vec2::ZERO);
        assert_eq!(screen_uv(size, size), Vec2::ONE);
    }

    #[test]
    fn mirror_center_sits_below_view_target() {
        let ctx = context_at(0.0);
        let uv = mirror_center_uv(&ctx).unwrap();
        assert!(uv.x > 0.0 && uv.x < 1.0, "{uv}");
        assert!(uv.y > 0.5 && uv.y < 1.0, "{uv}");
    }

    #[test]
    fn mirror_center_behind_camera_has_no_uv() {
        let mut ctx = context_at(0.0);
        ctx.camera =
            CameraState::look_at(Vec3::new(0.0, -6.0, 10.0), Vec3::new(0.0, -6.0, 20.0));
        assert_eq!(mirror_center_uv(&ctx), None);
    }

    #[test]
    fn frame_command_stream() {
        let ctx = context_at(1.5);
        let mut device = recorder_for(&ctx);
        render_frame(&ctx, &mut device).unwrap();

        let no_depth = RasterState {
            depth_test: false,
            cull: None,
        };
        let expected = vec![
            Command::BindTarget {
                target: RenderTarget::Reflection,
                size: UVec2::new(160, 120),
            },
            Command::Clear {
                target: RenderTarget::Reflection,
            },
            Command::Draw {
                target: RenderTarget::Reflection,
                kind: DrawKind::Skybox,
                state: no_depth,
            },
            Command::Draw {
                target: RenderTarget::Reflection,
                kind: DrawKind::Object,
                state: RasterState {
                    depth_test: true,
                    cull: Some(CullFace::Front),
                },
            },
            Command::BindTarget {
                target: RenderTarget::Screen,
                size: UVec2::new(800, 600),
            },
            Command::Clear {
                target: RenderTarget::Screen,
            },
            Command::Draw {
                target: RenderTarget::Screen,
                kind: DrawKind::Skybox,
                state: no_depth,
            },
            Command::Draw {
                target: RenderTarget::Screen,
                kind: DrawKind::Object,
                state: RasterState {
                    depth_test: true,
                    cull: Some(CullFace::Back),
                },
            },
            Command::Draw {
                target: RenderTarget::Screen,
                kind: DrawKind::Mirror,
                state: RasterState {
                    depth_test: true,
                    cull: Some(CullFace::Back),
                },
            },
        ];
        assert_eq!(device.commands(), expected.as_slice());
    }

    #[test]
    fn cull_face_restored_after_reflection_pass() {
        let ctx = context_at(0.0);
        let mut device = recorder_for(&ctx);
        assert_eq!(device.cull_face(), CullFace::Back);
        MirrorPass::render_reflection(&ctx, &mut device).unwrap();
        assert_eq!(device.cull_face(), CullFace::Back);
    }

    #[test]
    fn cull_face_and_target_restored_when_reflection_draw_fails() {
        let ctx = context_at(0.0);
        for kind in [DrawKind::Skybox, DrawKind::Object] {
            let mut device = recorder_for(&ctx).failing_on(kind);
            assert!(MirrorPass::render_reflection(&ctx, &mut device).is_err());
            assert_eq!(device.cull_face(), CullFace::Back, "after failing {kind:?}");
            assert_eq!(
                device.bound_target(),
                RenderTarget::Screen,
                "after failing {kind:?}"
            );
            assert!(matches!(
                device.commands().last(),
                Some(Command::BindTarget {
                    target: RenderTarget::Screen,
                    ..
                })
            ));
        }
    }

    #[test]
    fn reflected_pass_uses_mirrored_camera() {
        let ctx = context_at(3.0);
        let mut device = recorder_for(&ctx);
        MirrorPass::render_reflection(&ctx, &mut device).unwrap();

        let reflected = MirrorPass::reflected_camera(&ctx);
        let object = device
            .draw_calls()
            .iter()
            .find_map(|(target, call)| match call {
                DrawCall::Object(u) if *target == RenderTarget::Reflection => Some(u.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(object.camera_position, reflected.position);

        // Mirror plane sits at y = -6 by default, camera orbits at y = 0.
        assert!((reflected.position.y - -12.0).abs() < 1e-3);
    }

    #[test]
    fn object_uniforms_carry_lights() {
        let ctx = context_at(0.0);
        let mut device = recorder_for(&ctx);
        render_frame(&ctx, &mut device).unwrap();
        let (_, call) = device
            .draw_calls()
            .iter()
            .find(|(t, c)| *t == RenderTarget::Screen && c.kind() == DrawKind::Object)
            .unwrap();
        let DrawCall::Object(uniforms) = call else {
            panic!("expected object draw");
        };
        assert_eq!(uniforms.light_count, 2);
        assert_eq!(uniforms.light_positions[1], Vec3::new(-5.0, 0.0, 2.0));
        assert_eq!(uniforms.camera_position, ctx.camera.position);
    }

    #[test]
    fn mirror_uses_screen_size() {
        let ctx = context_at(0.0);
        let mut device = recorder_for(&ctx);
        render_frame(&ctx, &mut device).unwrap();
        let mirror = device
            .draw_calls()
            .iter()
            .find_map(|(_, call)| match call {
                DrawCall::Mirror(u) => Some(u.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(mirror.screen_size, Vec2::new(800.0, 600.0));
    }

    #[test]
    fn mirror_projects_with_main_camera() {
        let ctx = context_at(2.0);
        let mut device = recorder_for(&ctx);
        render_frame(&ctx, &mut device).unwrap();
        let main = SceneTransforms::compute(ctx.projection, ctx.camera.view, ctx.model);
        let mirror = device
            .draw_calls()
            .iter()
            .find_map(|(_, call)| match call {
                DrawCall::Mirror(u) => Some(u.model_view_projection),
                _ => None,
            })
            .unwrap();
        assert!(mirror.abs_diff_eq(main.view_projection * ctx.mirror_model, 1e-5));
    }
}
