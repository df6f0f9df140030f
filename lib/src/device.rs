use crate::errors::*;
use crate::xrandr::{DisplayClient, OutputId, PropertyId};

make_log_macro!(debug, "device");

/// One display output with a controllable backlight.
#[derive(Clone, Copy, Debug)]
pub struct BacklightDevice {
    pub output: OutputId,
    /// Raw level at discovery time. Used once to seed the notch index and
    /// never refreshed afterwards.
    pub level: i32,
    pub min: i32,
    pub max: i32,
}

/// Scan every screen's outputs in server order and return the first one that
/// exposes a usable backlight property. Outputs failing any probe are
/// skipped; systems with several backlights are not disambiguated.
pub fn discover<C: DisplayClient>(client: &C, property: PropertyId) -> Result<BacklightDevice> {
    for root in client.screens() {
        for output in client.outputs(root)? {
            if let Some(device) = probe(client, output, property)? {
                debug!(
                    "output {} backlight {} ({}..{})",
                    device.output, device.level, device.min, device.max
                );
                return Ok(device);
            }
        }
    }

    Err(CubiclightError::NoDevice)
}

/// A candidate must hold exactly one 32-bit INTEGER value and advertise
/// exactly two range bounds. Anything else disqualifies the output.
fn probe<C: DisplayClient>(
    client: &C,
    output: OutputId,
    property: PropertyId,
) -> Result<Option<BacklightDevice>> {
    let Some(value) = client.property_value(output, property)? else {
        return Ok(None);
    };

    if !value.is_integer || value.count != 1 || value.format != 32 {
        debug!("output {output}: backlight property has an unusable shape");
        return Ok(None);
    }

    let Some(range) = client.property_range(output, property)? else {
        return Ok(None);
    };

    match range[..] {
        [min, max] => Ok(Some(BacklightDevice {
            output,
            level: value.value,
            min,
            max,
        })),
        _ => {
            debug!("output {output}: expected two range bounds, got {}", range.len());
            Ok(None)
        }
    }
}
