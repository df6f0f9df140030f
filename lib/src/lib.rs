#![warn(clippy::match_same_arms)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::unnecessary_wraps)]

#[macro_use]
mod util;
mod config;
mod consts;
mod device;
mod errors;
mod scale;
mod xrandr;

use std::fmt;

pub use crate::config::CubiclightConfig;
use crate::consts::*;
pub use crate::device::BacklightDevice;
pub use crate::errors::CubiclightError;
use crate::errors::*;
pub use crate::scale::ScaleModel;
pub use crate::xrandr::{
    DisplayClient, OutputId, PropertyId, PropertyValue, ScreenRoot, XRandrClient,
};

make_log_macro!(debug, "cubiclight");

/// Used to construct [`Cubiclight`]
#[derive(Default)]
pub struct CubiclightBuilder<'a> {
    display: Option<&'a str>,
    config: Option<CubiclightConfig>,
}

impl<'a> CubiclightBuilder<'a> {
    /// Create a new [`CubiclightBuilder`].
    pub fn new() -> Self {
        CubiclightBuilder::default()
    }

    /// Defaults to `$DISPLAY`.
    pub fn with_display(mut self, display: &'a str) -> Self {
        self.display = Some(display);
        self
    }

    /// Defaults to [`CubiclightConfig::new()`].
    pub fn with_config(mut self, config: CubiclightConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Connect, find the backlight device and return the constructed
    /// [`Cubiclight`] instance.
    pub fn build(self) -> Result<Cubiclight> {
        let config = match self.config {
            Some(config) => config,
            None => CubiclightConfig::new()?,
        };

        let client = XRandrClient::connect(self.display)?;
        Cubiclight::with_client(client, &config)
    }
}

/// One discovered backlight and the notch scale fitted to its range.
pub struct Cubiclight<C = XRandrClient> {
    client: C,
    property: PropertyId,
    device: BacklightDevice,
    scale: ScaleModel,
    /// Notch nearest to the raw level found at discovery.
    level: i32,
    to_zero: bool,
}

impl<C: DisplayClient> Cubiclight<C> {
    /// Check the server, discover the device and seed the notch scale.
    pub fn with_client(client: C, config: &CubiclightConfig) -> Result<Self> {
        let (major, minor) = client.protocol_version()?;
        if major != RANDR_MAJOR || minor < RANDR_MINOR {
            return Err(CubiclightError::UnsupportedRandr(major, minor));
        }

        let property = client
            .backlight_property()?
            .ok_or(CubiclightError::BacklightUnsupported)?;

        if config.device_index != 0 {
            debug!(
                "device index {} requested, but discovery always takes the first match",
                config.device_index
            );
        }

        let device = device::discover(&client, property)?;
        let scale = ScaleModel::new(config.notches, device.min, device.max)?;
        let level = scale.notch_index(device.level)?;
        debug!("raw level {} is notch {}/{}", device.level, level, config.notches);

        Ok(Cubiclight {
            client,
            property,
            device,
            scale,
            level,
            to_zero: config.to_zero,
        })
    }

    pub fn device(&self) -> &BacklightDevice {
        &self.device
    }

    /// Current state of the device on both scales.
    pub fn status(&self) -> Status {
        Status {
            level: self.device.level,
            min: self.device.min,
            max: self.device.max,
            notch: self.level,
            notches: self.scale.notch_count(),
        }
    }

    /// Raw level for every notch, darkest first.
    pub fn scale_levels(&self) -> Vec<i32> {
        (0..=self.scale.notch_count())
            .map(|notch| self.scale.raw_level(notch as i32))
            .collect()
    }

    /// One notch brighter. Already at the top notch is a no-op.
    pub fn increment(&self) -> Result<()> {
        if self.level >= self.scale.notch_count() as i32 {
            debug!("already at the top notch");
            return Ok(());
        }

        self.set_notch(self.level + 1)
    }

    /// One notch darker. Stops at notch 1 unless stepping to zero was
    /// allowed, so a plain decrement never blacks out the panel.
    pub fn decrement(&self) -> Result<()> {
        if self.level < 2 && !self.to_zero {
            debug!("refusing to leave notch 1 without to_zero");
            return Ok(());
        }
        if self.level < 1 {
            return Ok(());
        }

        self.set_notch(self.level - 1)
    }

    /// Jump to a notch. The index is taken as-is; values outside the scale
    /// map through the same cubic and are not guaranteed monotonic there.
    pub fn set_notch(&self, notch: i32) -> Result<()> {
        self.set_raw(self.scale.raw_level(notch))
    }

    /// Write a raw hardware level. Skips the protocol request when the
    /// device is already at the requested level.
    pub fn set_raw(&self, raw: i32) -> Result<()> {
        if raw == self.device.level {
            debug!("device already at {raw}, not writing");
            return Ok(());
        }

        self.client
            .set_property_value(self.device.output, self.property, raw)
    }
}

/// Snapshot of the device state, formatted like `96 (0..937) level 10/20`.
#[derive(Clone, Copy, Debug)]
pub struct Status {
    pub level: i32,
    pub min: i32,
    pub max: i32,
    pub notch: i32,
    pub notches: u32,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}..{}) level {}/{}",
            self.level, self.min, self.max, self.notch, self.notches
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xrandr::testing::FakeClient;

    fn controller(client: FakeClient, notches: u32, to_zero: bool) -> Cubiclight<FakeClient> {
        let config = CubiclightConfig {
            notches,
            to_zero,
            device_index: 0,
        };
        Cubiclight::with_client(client, &config).unwrap()
    }

    #[test]
    fn increment_moves_one_notch_up() {
        let light = controller(FakeClient::single_output(0, 0, 255), 20, false);
        light.increment().unwrap();
        assert_eq!(light.client.writes.borrow().as_slice(), &[(10, 1)]);
    }

    #[test]
    fn increment_at_the_top_is_a_noop() {
        let light = controller(FakeClient::single_output(255, 0, 255), 20, false);
        light.increment().unwrap();
        assert!(light.client.writes.borrow().is_empty());
    }

    #[test]
    fn decrement_stops_at_notch_one() {
        let light = controller(FakeClient::single_output(1, 0, 255), 20, false);
        light.decrement().unwrap();
        assert!(light.client.writes.borrow().is_empty());
    }

    #[test]
    fn decrement_reaches_zero_when_allowed() {
        let light = controller(FakeClient::single_output(1, 0, 255), 20, true);
        light.decrement().unwrap();
        assert_eq!(light.client.writes.borrow().as_slice(), &[(10, 0)]);
    }

    #[test]
    fn matching_raw_level_issues_no_write() {
        let light = controller(FakeClient::single_output(128, 0, 255), 20, false);
        light.set_raw(128).unwrap();
        assert!(light.client.writes.borrow().is_empty());

        light.set_raw(64).unwrap();
        assert_eq!(light.client.writes.borrow().as_slice(), &[(10, 64)]);
    }

    #[test]
    fn set_notch_writes_the_forward_mapped_level() {
        let light = controller(FakeClient::single_output(0, 0, 255), 20, false);
        light.set_notch(20).unwrap();
        assert_eq!(light.client.writes.borrow().as_slice(), &[(10, 255)]);
    }

    #[test]
    fn scale_dump_is_linear_for_a_matching_range() {
        let light = controller(FakeClient::single_output(0, 0, 20), 20, false);
        assert_eq!(light.scale_levels(), (0..=20).collect::<Vec<i32>>());
    }

    #[test]
    fn old_randr_is_rejected() {
        let client = FakeClient {
            version: (1, 1),
            ..FakeClient::single_output(0, 0, 255)
        };
        let config = CubiclightConfig::default();

        assert!(matches!(
            Cubiclight::with_client(client, &config),
            Err(CubiclightError::UnsupportedRandr(1, 1))
        ));
    }

    #[test]
    fn missing_property_name_is_its_own_error() {
        let client = FakeClient {
            property: None,
            ..FakeClient::single_output(0, 0, 255)
        };
        let config = CubiclightConfig::default();

        assert!(matches!(
            Cubiclight::with_client(client, &config),
            Err(CubiclightError::BacklightUnsupported)
        ));
    }

    #[test]
    fn status_formats_both_scales() {
        let status = Status {
            level: 96,
            min: 0,
            max: 937,
            notch: 10,
            notches: 20,
        };
        assert_eq!(status.to_string(), "96 (0..937) level 10/20");
    }
}
