use crate::device::{CullFace, GraphicsDevice};
use std::ops::{Deref, DerefMut};

/// Sets the cull face for as long as the guard lives.
///
/// The previous face is restored on drop, so early returns, `?`, and
/// unwinding all leave the device as they found it. Render through the
/// guard while it is alive.
pub struct CullFaceGuard<'a, D: GraphicsDevice + ?Sized> {
    device: &'a mut D,
    previous: CullFace,
}

impl<'a, D: GraphicsDevice + ?Sized> CullFaceGuard<'a, D> {
    pub fn new(device: &'a mut D, face: CullFace) -> Self {
        let previous = device.cull_face();
        device.set_cull_face(face);
        Self { device, previous }
    }

    /// Flip whichever face is currently culled.
    pub fn flipped(device: &'a mut D) -> Self {
        let face = device.cull_face().flipped();
        Self::new(device, face)
    }

    pub fn previous(&self) -> CullFace {
        self.previous
    }
}

impl<D: GraphicsDevice + ?Sized> Deref for CullFaceGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.device
    }
}

impl<D: GraphicsDevice + ?Sized> DerefMut for CullFaceGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.device
    }
}

impl<D: GraphicsDevice + ?Sized> Drop for CullFaceGuard<'_, D> {
    fn drop(&mut self) {
        self.device.set_cull_face(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::CommandRecorder;
    use glam::UVec2;

    fn recorder() -> CommandRecorder {
        CommandRecorder::new(UVec2::new(800, 600), UVec2::new(160, 120))
    }

    #[test]
    fn restores_on_scope_exit() {
        let mut device = recorder();
        {
            let guard = CullFaceGuard::new(&mut device, CullFace::Front);
            assert_eq!(guard.cull_face(), CullFace::Front);
            assert_eq!(guard.previous(), CullFace::Back);
        }
        assert_eq!(device.cull_face(), CullFace::Back);
    }

    #[test]
    fn flipped_inverts_current_face() {
        let mut device = recorder();
        device.set_cull_face(CullFace::Front);
        {
            let guard = CullFaceGuard::flipped(&mut device);
            assert_eq!(guard.cull_face(), CullFace::Back);
        }
        assert_eq!(device.cull_face(), CullFace::Front);
    }

    #[test]
    fn restores_on_early_return() {
        fn bail(device: &mut CommandRecorder, fail: bool) -> Result<(), &'static str> {
            let _guard = CullFaceGuard::new(device, CullFace::Front);
            if fail {
                return Err("bail");
            }
            Ok(())
        }
        let mut device = recorder();
        assert!(bail(&mut device, true).is_err());
        assert_eq!(device.cull_face(), CullFace::Back);
    }

    #[test]
    fn restores_on_panic() {
        let mut device = recorder();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = CullFaceGuard::new(&mut device, CullFace::Front);
            panic!("draw exploded");
        }));
        assert!(result.is_err());
        assert_eq!(device.cull_face(), CullFace::Back);
    }

    #[test]
    fn nested_guards_unwind_in_order() {
        let mut device = recorder();
        {
            let mut outer = CullFaceGuard::new(&mut device, CullFace::Front);
            {
                let inner = CullFaceGuard::new(&mut *outer, CullFace::Back);
                assert_eq!(inner.cull_face(), CullFace::Back);
            }
            assert_eq!(outer.cull_face(), CullFace::Front);
        }
        assert_eq!(device.cull_face(), CullFace::Back);
    }
}
