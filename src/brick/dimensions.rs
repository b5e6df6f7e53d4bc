//! Physical brick dimensions.
//!
//! One voxel maps to one stud horizontally and one brick level vertically:
//! - Stud pitch: 8 mm
//! - Brick height: 9.6 mm (without the stud)

/// Height of one brick level in meters
pub const BRICK_HEIGHT_METERS: f32 = 0.0096;

/// Height in centimeters of a stack of `levels` bricks
pub fn stack_height_cm(levels: i32) -> f32 {
    levels.max(0) as f32 * BRICK_HEIGHT_METERS * 100.0
}
