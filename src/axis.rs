//! # Axes
//!
//! Range and resolution descriptors for the continuous channels a tablet reports -
//! position, pressure, tilt. These are the capability half of the story; the sampled
//! values themselves travel inside [packets](crate::packet).

/// Interpretation of an axis's native coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::IntoStaticStr)]
pub enum Unit {
    #[default]
    None,
    Inches,
    Centimeters,
    /// Angular axes; full circle = 3600 tenths of a degree.
    Circle,
}

impl Unit {
    /// Numeric tag used on the emulated query surface.
    #[must_use]
    pub fn tag(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Inches => 1,
            Self::Centimeters => 2,
            Self::Circle => 3,
        }
    }
}

/// Convert an integer into the 16.16 fixed-point encoding the emulated API
/// uses for axis resolutions.
#[must_use]
pub fn fix32(value: u32) -> u32 {
    value << 16
}

/// Range and resolution of one continuous input channel.
///
/// `resolution` is already in the emulated API's encoding: either a raw
/// hardware value passed through from the extension, or a [`fix32`] count of
/// units per physical unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Axis {
    pub min: i32,
    pub max: i32,
    pub unit: Unit,
    pub resolution: u32,
}

#[cfg(test)]
mod tests {
    use super::fix32;

    #[test]
    fn fix32_is_shifted_integer() {
        assert_eq!(fix32(1), 0x1_0000);
        assert_eq!(fix32(3600), 3600 << 16);
    }
}
