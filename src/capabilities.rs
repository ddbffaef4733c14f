// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cover/calibrator capabilities.
//!
//! A cover/calibrator unit may have a motorised dust cover, a flat-field
//! light, or both. Commands aimed at a part the unit lacks are answered
//! with not-implemented and leave the device untouched.
//!
//! Capabilities come from configuration, either as one of the presets or
//! through [`CapabilitiesBuilder`].

use std::time::Duration;

/// Default maximum brightness of the flat-field light.
pub const DEFAULT_MAX_BRIGHTNESS: u32 = 255;

/// What a cover/calibrator unit is able to do.
///
/// # Examples
///
/// ```
/// use alpaca_hub::Capabilities;
///
/// // Cover and light, 8-bit brightness
/// let full = Capabilities::default();
/// assert!(full.cover && full.calibrator);
/// assert_eq!(full.max_brightness, 255);
///
/// // Light panel without a cover
/// let panel = Capabilities::flat_panel();
/// assert!(!panel.cover);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
// Each boolean is an independent hardware feature.
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Has a motorised cover.
    pub cover: bool,

    /// Has a flat-field light.
    pub calibrator: bool,

    /// Highest accepted `Brightness`.
    pub max_brightness: u32,

    /// The cover can stop part-way to act as an adjustable aperture.
    pub adjustable_aperture: bool,

    /// Time the light needs to stabilise after switching on. Zero means
    /// the light is ready immediately.
    pub warmup: Duration,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

impl Capabilities {
    /// Cover and light.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            cover: true,
            calibrator: true,
            max_brightness: DEFAULT_MAX_BRIGHTNESS,
            adjustable_aperture: false,
            warmup: Duration::ZERO,
        }
    }

    /// Light only, no cover.
    #[must_use]
    pub const fn flat_panel() -> Self {
        Self {
            cover: false,
            ..Self::full()
        }
    }

    /// Cover only, no light.
    #[must_use]
    pub const fn dust_cover() -> Self {
        Self {
            calibrator: false,
            max_brightness: 0,
            ..Self::full()
        }
    }

    /// Returns `true` if `brightness` is an accepted light level.
    #[must_use]
    pub fn accepts_brightness(&self, brightness: i64) -> bool {
        (0..=i64::from(self.max_brightness)).contains(&brightness)
    }
}

/// Builder for custom capabilities.
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    inner: Capabilities,
}

impl CapabilitiesBuilder {
    /// Starts from [`Capabilities::full`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a cover is fitted.
    #[must_use]
    pub fn cover(mut self, present: bool) -> Self {
        self.inner.cover = present;
        self
    }

    /// Sets whether a light is fitted.
    #[must_use]
    pub fn calibrator(mut self, present: bool) -> Self {
        self.inner.calibrator = present;
        self
    }

    /// Sets the maximum brightness.
    #[must_use]
    pub fn max_brightness(mut self, max: u32) -> Self {
        self.inner.max_brightness = max;
        self
    }

    /// Enables the adjustable aperture.
    #[must_use]
    pub fn with_adjustable_aperture(mut self) -> Self {
        self.inner.adjustable_aperture = true;
        self
    }

    /// Sets the light warm-up time.
    #[must_use]
    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.inner.warmup = warmup;
        self
    }

    /// Builds the capabilities.
    #[must_use]
    pub fn build(self) -> Capabilities {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let full = Capabilities::full();
        assert!(full.cover && full.calibrator);
        assert!(!full.adjustable_aperture);

        let panel = Capabilities::flat_panel();
        assert!(!panel.cover && panel.calibrator);
        assert_eq!(panel.max_brightness, 255);

        let cover = Capabilities::dust_cover();
        assert!(cover.cover && !cover.calibrator);
    }

    #[test]
    fn brightness_range() {
        let caps = CapabilitiesBuilder::new().max_brightness(100).build();
        assert!(caps.accepts_brightness(0));
        assert!(caps.accepts_brightness(100));
        assert!(!caps.accepts_brightness(101));
        assert!(!caps.accepts_brightness(-1));
    }

    #[test]
    fn builder_pattern() {
        let caps = CapabilitiesBuilder::new()
            .cover(false)
            .max_brightness(4095)
            .with_adjustable_aperture()
            .warmup(Duration::from_secs(3))
            .build();

        assert!(!caps.cover);
        assert!(caps.calibrator);
        assert_eq!(caps.max_brightness, 4095);
        assert!(caps.adjustable_aperture);
        assert_eq!(caps.warmup, Duration::from_secs(3));
    }
}
