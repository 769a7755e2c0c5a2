//! # Packets
//!
//! The fixed-layout sampled-state record delivered to clients: position, pressure,
//! orientation, button state and timing for one point in time. Exactly one packet -
//! the most recent one - is retained; clients polling slower than the hardware event
//! rate observe only the latest sample.

bitflags::bitflags! {
    /// Bitmask selecting which fields of a [`Packet`] are populated or requested.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct Pkt: u32 {
        const CONTEXT = 0x0001;
        const STATUS = 0x0002;
        const TIME = 0x0004;
        const CHANGED = 0x0008;
        const SERIAL_NUMBER = 0x0010;
        const CURSOR = 0x0020;
        const BUTTONS = 0x0040;
        const X = 0x0080;
        const Y = 0x0100;
        const Z = 0x0200;
        const NORMAL_PRESSURE = 0x0400;
        const TANGENT_PRESSURE = 0x0800;
        const ORIENTATION = 0x1000;
        const ROTATION = 0x2000;
    }
}

bitflags::bitflags! {
    /// Per-packet status bits.
    #[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
    pub struct Status: u32 {
        /// The cursor is leaving detectable range of the tablet.
        const PROXIMITY = 0x0001;
        const QUEUE_ERR = 0x0002;
        const MARGIN = 0x0004;
        const GRAB = 0x0008;
        /// The cursor is operating in its inverted orientation (eraser end down).
        const INVERT = 0x0010;
    }
}

/// Pen attitude, in tenths of a degree.
///
/// Azimuth is the clockwise rotation of the cursor about the surface normal;
/// altitude is the angle above the surface, negated when the cursor is
/// inverted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Orientation {
    pub azimuth: i32,
    pub altitude: i32,
    pub twist: i32,
}

/// Pen rotation about its three axes. Reported as always-zero by this driver;
/// present for layout compatibility with the emulated API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rotation {
    pub pitch: i32,
    pub roll: i32,
    pub yaw: i32,
}

/// One sample of tablet state.
///
/// `cursor` is the slot index of the reporting cursor in the
/// [registry](crate::registry::Registry) at the moment the packet was
/// published.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Packet {
    pub context: u32,
    pub status: Status,
    pub time: u32,
    pub changed: Pkt,
    pub serial: u32,
    pub cursor: u32,
    pub buttons: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub normal_pressure: u32,
    pub tangent_pressure: u32,
    pub orientation: Orientation,
    pub rotation: Rotation,
}

/// Azimuth angle, in tenths of a degree, from the raw tilt-X and tilt-Y axis
/// values.
///
/// The angle is `atan2(y, x)` rotated a quarter turn so that positive tilt-X
/// maps to 90.0°, wrapped into `(0°, 360°]` when the rotation lands at or
/// below zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn azimuth_tenth_degrees(x: i32, y: i32) -> i32 {
    use std::f64::consts::{FRAC_PI_2, PI};
    let mut angle = f64::from(y).atan2(f64::from(x));
    angle += FRAC_PI_2;
    if angle <= 0.0 {
        angle += 2.0 * PI;
    }

    (0.5 + angle * 1800.0 / PI) as i32
}

/// Altitude angle, in tenths of a degree, from the raw tilt axis values.
/// Inverted cursors (erasers) report a negated altitude.
#[must_use]
pub fn altitude_tenth_degrees(x: i32, y: i32, inverted: bool) -> i32 {
    let altitude = 1000 - 15 * x.abs().max(y.abs());
    if inverted {
        -altitude
    } else {
        altitude
    }
}

#[cfg(test)]
mod tests {
    use super::{altitude_tenth_degrees, azimuth_tenth_degrees};

    #[test]
    fn azimuth_cardinal_directions() {
        // atan2(0, +x) = 0, plus the quarter-turn offset.
        assert_eq!(azimuth_tenth_degrees(10, 0), 900);
        assert_eq!(azimuth_tenth_degrees(0, 5), 1800);
        assert_eq!(azimuth_tenth_degrees(-5, 0), 2700);
        // atan2(-y, 0) lands exactly on the wrap boundary.
        assert_eq!(azimuth_tenth_degrees(0, -5), 3600);
    }

    #[test]
    fn azimuth_of_untilted_pen() {
        // atan2(0, 0) is 0 by convention, so no wrap occurs.
        assert_eq!(azimuth_tenth_degrees(0, 0), 900);
    }

    #[test]
    fn azimuth_is_tenth_degrees() {
        // 45° diagonal: 90° + 45° = 135.0° => 1350.
        assert_eq!(azimuth_tenth_degrees(7, 7), 1350);
    }

    #[test]
    fn altitude_scales_with_steeper_tilt() {
        assert_eq!(altitude_tenth_degrees(0, 0, false), 1000);
        assert_eq!(altitude_tenth_degrees(10, 0, false), 850);
        assert_eq!(altitude_tenth_degrees(10, -20, false), 700);
    }

    #[test]
    fn altitude_sign_follows_inversion() {
        // Whenever the uninverted value is non-negative, inversion flips it ≤ 0.
        for (x, y) in [(0, 0), (5, 5), (64, 64), (-64, 0)] {
            let upright = altitude_tenth_degrees(x, y, false);
            let inverted = altitude_tenth_degrees(x, y, true);
            assert!(upright >= 0);
            assert!(inverted <= 0);
            assert_eq!(upright, -inverted);
        }
    }
}
