use bytemuck::{Pod, Zeroable};
use formation::ObjectClass;
use glam::Vec3;
use treeconfig::SceneColors;

/// Per-object record uploaded to the instance buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub position: [f32; 3],
    pub scale: f32,
    /// Euler angles in radians, XYZ order.
    pub rotation: [f32; 3],
    /// [`ObjectClass::id`].
    pub class_id: u32,
    pub color: [f32; 4],
    /// Index within the class. For photos, the slot in the displayed list.
    pub slot: u32,
    pub _padding: [u32; 3],
}

impl InstanceRaw {
    pub fn class(&self) -> Option<ObjectClass> {
        match self.class_id {
            0 => Some(ObjectClass::Ornament),
            1 => Some(ObjectClass::Gift),
            2 => Some(ObjectClass::Photo),
            _ => None,
        }
    }
}

const PHOTO_TINT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const GIFT_LIFT: f32 = 0.25;

/// Tint for an object given its assembled height fraction (0 = base, 1 = apex).
pub(crate) fn tint(class: ObjectClass, colors: &SceneColors, height: f32) -> [f32; 4] {
    let bottom = Vec3::from(colors.bottom.to_unit());
    let top = Vec3::from(colors.top.to_unit());
    match class {
        ObjectClass::Ornament => {
            let c = bottom.lerp(top, height.clamp(0.0, 1.0));
            [c.x, c.y, c.z, 1.0]
        }
        ObjectClass::Gift => {
            let c = bottom.lerp(Vec3::ONE, GIFT_LIFT);
            [c.x, c.y, c.z, 1.0]
        }
        ObjectClass::Photo => PHOTO_TINT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 64);
        let raw = InstanceRaw::zeroed();
        assert_eq!(bytemuck::bytes_of(&raw).len(), 64);
        assert_eq!(raw.class(), Some(ObjectClass::Ornament));
    }

    #[test]
    fn ornaments_follow_the_gradient() {
        let colors = SceneColors::default();
        let base = tint(ObjectClass::Ornament, &colors, 0.0);
        let apex = tint(ObjectClass::Ornament, &colors, 1.0);
        let bottom = colors.bottom.to_unit();
        let top = colors.top.to_unit();
        for channel in 0..3 {
            assert!((base[channel] - bottom[channel]).abs() < 1e-6);
            assert!((apex[channel] - top[channel]).abs() < 1e-6);
        }
        assert_eq!(tint(ObjectClass::Photo, &colors, 0.5), PHOTO_TINT);
    }
}
