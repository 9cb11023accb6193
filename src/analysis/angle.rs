//! Joint angle from three pixel points.

use crate::pose::PixelPoint;

/// Interior angle at vertex `b` between rays b→a and b→c, in degrees within [0, 180].
///
/// Computed as the difference of the two ray headings (atan2), folded so that
/// reflex results come back as `360 - angle`.
pub fn calculate_angle(a: PixelPoint, b: PixelPoint, c: PixelPoint) -> f32 {
    let heading_a = ((a.y - b.y) as f32).atan2((a.x - b.x) as f32);
    let heading_c = ((c.y - b.y) as f32).atan2((c.x - b.x) as f32);

    let angle = (heading_c - heading_a).to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
