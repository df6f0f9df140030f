use crate::consts::*;
use crate::errors::*;
use crate::util::*;

use serde::Deserialize;
use serde::Deserializer;
use smart_default::SmartDefault;

make_log_macro!(debug, "config");

/// Settings for one invocation. Built once, passed by reference everywhere.
#[derive(Deserialize, Clone, Debug, SmartDefault)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct CubiclightConfig {
    /// Number of notches between dark and full brightness.
    #[default(DEFAULT_NOTCHES)]
    #[serde(deserialize_with = "deserialize_notches")]
    pub notches: u32,

    /// Allow stepping all the way down to the device minimum, which on many
    /// panels turns the backlight off entirely.
    #[default(false)]
    pub to_zero: bool,

    /// Preferred device index. Accepted for compatibility; discovery always
    /// takes the first backlight-capable output.
    #[default(0)]
    pub device_index: usize,
}

fn deserialize_notches<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let notches: u32 = Deserialize::deserialize(deserializer)?;
    debug!("{:?}", notches);

    if notches == 0 {
        return Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Unsigned(0),
            &"a notch count of at least 1",
        ));
    }

    Ok(notches)
}

impl CubiclightConfig {
    pub fn new() -> Result<Self> {
        if let Some(config_path) = find_file("config", None, Some("toml")) {
            debug!("loading {}", config_path.display());
            deserialize_toml_file(config_path)
        } else {
            Ok(CubiclightConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CubiclightConfig::default();
        assert_eq!(config.notches, 20);
        assert!(!config.to_zero);
        assert_eq!(config.device_index, 0);
    }

    #[test]
    fn zero_notches_rejected_at_parse_time() {
        assert!(toml::from_str::<CubiclightConfig>("notches = 0").is_err());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: CubiclightConfig = toml::from_str("to_zero = true").unwrap();
        assert_eq!(config.notches, 20);
        assert!(config.to_zero);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<CubiclightConfig>("steps = 10").is_err());
    }
}
