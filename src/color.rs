// src/color.rs

//! Defines the 16-bit RGB colour type and the colour table built from the
//! engine's palette.
//!
//! The table is allocated once, in one batch, when the window is built. A
//! palette entry the display cannot represent is fatal.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::FrontendError;
use crate::platform::backends::{Driver, Pixel};

/// An RGB colour in the display's native 16-bit-per-channel range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb16 {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb16 {
    pub const fn new(red: u16, green: u16, blue: u16) -> Self {
        Self { red, green, blue }
    }

    /// Scales normalised components to `0..=65535`, clamping to `[0, 1]`
    /// first and rounding to the nearest step.
    pub fn from_normalized(red: f32, green: f32, blue: f32) -> Self {
        Self {
            red: scale_component(red),
            green: scale_component(green),
            blue: scale_component(blue),
        }
    }

    /// Expands an 8-bit colour by byte replication (`0xab` → `0xabab`).
    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        let widen = |c: u8| (u16::from(c) << 8) | u16::from(c);
        Self::new(widen(rgb[0]), widen(rgb[1]), widen(rgb[2]))
    }

    /// High byte of each channel.
    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.red >> 8) as u8,
            (self.green >> 8) as u8,
            (self.blue >> 8) as u8,
        ]
    }

    pub fn to_normalized(self) -> [f32; 3] {
        [
            f32::from(self.red) / 65535.0,
            f32::from(self.green) / 65535.0,
            f32::from(self.blue) / 65535.0,
        ]
    }
}

fn scale_component(c: f32) -> u16 {
    // NaN clamps to 0.
    let c = if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) };
    (c * 65535.0).round() as u16
}

/// One allocated palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourEntry {
    pub rgb: Rgb16,
    pub pixel: Pixel,
}

/// The engine palette, resolved to display pixels. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ColourTable {
    entries: Vec<ColourEntry>,
}

impl ColourTable {
    /// Allocates every colour of a flat `[r, g, b, r, g, b, …]` palette of
    /// normalised floats in a single driver request.
    ///
    /// Fails on the first colour the display refused.
    pub fn allocate<D: Driver + ?Sized>(
        driver: &mut D,
        palette: &[f32],
    ) -> Result<Self, FrontendError> {
        if palette.len() % 3 != 0 {
            warn!(
                "Palette has {} trailing component(s) beyond the last full triple; ignoring them",
                palette.len() % 3
            );
        }
        let requested: Vec<Rgb16> = palette
            .chunks_exact(3)
            .map(|c| Rgb16::from_normalized(c[0], c[1], c[2]))
            .collect();

        let granted = driver.alloc_colours(&requested);

        let mut entries = Vec::with_capacity(requested.len());
        for (index, rgb) in requested.iter().enumerate() {
            match granted.get(index).copied().flatten() {
                Some(pixel) => entries.push(ColourEntry { rgb: *rgb, pixel }),
                None => {
                    let [red, green, blue] = rgb.to_rgb8();
                    return Err(FrontendError::ColourAllocation {
                        index,
                        red,
                        green,
                        blue,
                    });
                }
            }
        }
        debug!("Allocated {} palette colours", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColourEntry> {
        self.entries.get(index)
    }

    /// Display pixel for a palette index.
    pub fn pixel(&self, index: usize) -> Option<Pixel> {
        self.entries.get(index).map(|e| e.pixel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::backends::headless::HeadlessDriver;

    #[test]
    fn components_round_to_nearest_step() {
        let c = Rgb16::from_normalized(0.5, 1.0, 0.0);
        assert_eq!(c, Rgb16::new(32768, 65535, 0));
        // 0.1 * 65535 = 6553.5
        assert_eq!(Rgb16::from_normalized(0.1, 0.0, 0.0).red, 6554);
    }

    #[test]
    fn out_of_range_components_are_clamped() {
        let c = Rgb16::from_normalized(-0.25, 1.5, f32::NAN);
        assert_eq!(c, Rgb16::new(0, 65535, 0));
    }

    #[test]
    fn eight_bit_conversion_replicates_bytes() {
        let c = Rgb16::from_rgb8([0xdc, 0x00, 0xff]);
        assert_eq!(c, Rgb16::new(0xdcdc, 0x0000, 0xffff));
        assert_eq!(c.to_rgb8(), [0xdc, 0x00, 0xff]);
    }

    #[test_log::test]
    fn table_keeps_requested_values_and_granted_pixels() {
        let mut driver = HeadlessDriver::new();
        let palette = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.25, 0.5, 0.75];
        let table = ColourTable::allocate(&mut driver, &palette).unwrap();

        assert_eq!(table.len(), 3);
        for (i, triple) in palette.chunks_exact(3).enumerate() {
            let entry = table.get(i).unwrap();
            assert_eq!(entry.rgb.red, (triple[0] * 65535.0).round() as u16);
            assert_eq!(entry.rgb.green, (triple[1] * 65535.0).round() as u16);
            assert_eq!(entry.rgb.blue, (triple[2] * 65535.0).round() as u16);
        }
        assert_eq!(table.pixel(0), Some(0x00ff_ffff));
        assert_eq!(table.pixel(1), Some(0x0000_0000));
        assert_eq!(table.pixel(3), None);
    }

    #[test_log::test]
    fn trailing_partial_triple_is_ignored() {
        let mut driver = HeadlessDriver::new();
        let table = ColourTable::allocate(&mut driver, &[0.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test_log::test]
    fn refused_colour_is_fatal_and_names_the_index() {
        let mut driver = HeadlessDriver::new().with_colour_capacity(2);
        let palette = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0];
        let err = ColourTable::allocate(&mut driver, &palette).unwrap_err();
        match err {
            FrontendError::ColourAllocation {
                index,
                red,
                green,
                blue,
            } => {
                assert_eq!(index, 2);
                assert_eq!((red, green, blue), (0xff, 0x00, 0x00));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
