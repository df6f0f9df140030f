use x11rb::connection::Connection as _;
use x11rb::errors::ReplyError;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt as _, PropMode};
use x11rb::rust_connection::RustConnection;

use crate::consts::*;
use crate::errors::*;

make_log_macro!(debug, "xrandr");

pub type ScreenRoot = u32;
pub type OutputId = u32;
pub type PropertyId = u32;

/// Shape of one fetched output property, as the server reported it.
#[derive(Clone, Copy, Debug)]
pub struct PropertyValue {
    pub is_integer: bool,
    pub count: u32,
    pub format: u8,
    /// First 32-bit item, or 0 when the data is not 32-bit-wide.
    pub value: i32,
}

/// The display-server operations the rest of the crate needs. Kept narrow so
/// tests can substitute a scripted server.
pub trait DisplayClient {
    /// RandR version reported by the server.
    fn protocol_version(&self) -> Result<(u32, u32)>;

    /// Handle for the backlight property, if the server knows the name at all.
    fn backlight_property(&self) -> Result<Option<PropertyId>>;

    /// Root windows of all screens, in server order.
    fn screens(&self) -> Vec<ScreenRoot>;

    /// Outputs attached to a screen, in server order. A screen whose
    /// resources cannot be listed yields no outputs.
    fn outputs(&self, root: ScreenRoot) -> Result<Vec<OutputId>>;

    /// Valid values advertised for a ranged property. `None` when the output
    /// does not answer or the property is not range-constrained.
    fn property_range(&self, output: OutputId, property: PropertyId) -> Result<Option<Vec<i32>>>;

    /// Current value of a property. `None` when the output does not answer.
    fn property_value(
        &self,
        output: OutputId,
        property: PropertyId,
    ) -> Result<Option<PropertyValue>>;

    /// Replace a 32-bit integer property. The request is checked; a
    /// server-side error here is fatal.
    fn set_property_value(&self, output: OutputId, property: PropertyId, value: i32) -> Result<()>;
}

/// RandR-backed client over a blocking X connection.
pub struct XRandrClient {
    conn: RustConnection,
    roots: Vec<ScreenRoot>,
}

impl XRandrClient {
    /// Connect to the named display, or to `$DISPLAY` when `None`.
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen) = x11rb::connect(display)?;
        let roots = conn.setup().roots.iter().map(|screen| screen.root).collect();
        debug!("connected, default screen {screen}");
        Ok(XRandrClient { conn, roots })
    }
}

/// A server-side error on a per-output request does not poison the scan;
/// only transport failures propagate.
fn soft<T>(reply: std::result::Result<T, ReplyError>) -> Result<Option<T>> {
    match reply {
        Ok(value) => Ok(Some(value)),
        Err(ReplyError::X11Error(e)) => {
            debug!("request failed: {e:?}");
            Ok(None)
        }
        Err(ReplyError::ConnectionError(e)) => Err(e.into()),
    }
}

impl DisplayClient for XRandrClient {
    fn protocol_version(&self) -> Result<(u32, u32)> {
        let reply = self
            .conn
            .randr_query_version(RANDR_MAJOR, RANDR_MINOR)?
            .reply()?;
        Ok((reply.major_version, reply.minor_version))
    }

    fn backlight_property(&self) -> Result<Option<PropertyId>> {
        let reply = self
            .conn
            .intern_atom(true, BACKLIGHT_PROPERTY.as_bytes())?
            .reply()?;
        Ok((reply.atom != x11rb::NONE).then_some(reply.atom))
    }

    fn screens(&self) -> Vec<ScreenRoot> {
        self.roots.clone()
    }

    fn outputs(&self, root: ScreenRoot) -> Result<Vec<OutputId>> {
        let reply = soft(self.conn.randr_get_screen_resources(root)?.reply())?;
        Ok(reply.map(|r| r.outputs).unwrap_or_default())
    }

    fn property_range(&self, output: OutputId, property: PropertyId) -> Result<Option<Vec<i32>>> {
        let Some(reply) = soft(self.conn.randr_query_output_property(output, property)?.reply())?
        else {
            return Ok(None);
        };
        if !reply.range {
            return Ok(None);
        }
        Ok(Some(reply.valid_values))
    }

    fn property_value(
        &self,
        output: OutputId,
        property: PropertyId,
    ) -> Result<Option<PropertyValue>> {
        let cookie =
            self.conn
                .randr_get_output_property(output, property, AtomEnum::ANY, 0, 4, false, false)?;
        let Some(reply) = soft(cookie.reply())? else {
            return Ok(None);
        };
        let value = if reply.format == 32 && reply.data.len() >= 4 {
            i32::from_ne_bytes([reply.data[0], reply.data[1], reply.data[2], reply.data[3]])
        } else {
            0
        };
        Ok(Some(PropertyValue {
            is_integer: reply.type_ == u32::from(AtomEnum::INTEGER),
            count: reply.num_items,
            format: reply.format,
            value,
        }))
    }

    fn set_property_value(
        &self,
        output: OutputId,
        property: PropertyId,
        value: i32,
    ) -> Result<()> {
        self.conn
            .randr_change_output_property(
                output,
                property,
                AtomEnum::INTEGER.into(),
                32,
                PropMode::REPLACE,
                1,
                &value.to_ne_bytes(),
            )?
            .check()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    /// Scripted display server. Outputs answer from fixed tables; writes are
    /// recorded instead of sent anywhere.
    pub(crate) struct FakeClient {
        pub version: (u32, u32),
        pub property: Option<PropertyId>,
        pub screens: Vec<(ScreenRoot, Vec<OutputId>)>,
        pub values: Vec<(OutputId, PropertyValue)>,
        pub ranges: Vec<(OutputId, Vec<i32>)>,
        pub writes: RefCell<Vec<(OutputId, i32)>>,
    }

    impl FakeClient {
        pub fn single_output(level: i32, min: i32, max: i32) -> Self {
            FakeClient {
                version: (1, 6),
                property: Some(77),
                screens: vec![(1, vec![10])],
                values: vec![(
                    10,
                    PropertyValue {
                        is_integer: true,
                        count: 1,
                        format: 32,
                        value: level,
                    },
                )],
                ranges: vec![(10, vec![min, max])],
                writes: RefCell::new(Vec::new()),
            }
        }
    }

    impl DisplayClient for FakeClient {
        fn protocol_version(&self) -> Result<(u32, u32)> {
            Ok(self.version)
        }

        fn backlight_property(&self) -> Result<Option<PropertyId>> {
            Ok(self.property)
        }

        fn screens(&self) -> Vec<ScreenRoot> {
            self.screens.iter().map(|(root, _)| *root).collect()
        }

        fn outputs(&self, root: ScreenRoot) -> Result<Vec<OutputId>> {
            Ok(self
                .screens
                .iter()
                .find(|(r, _)| *r == root)
                .map(|(_, outputs)| outputs.clone())
                .unwrap_or_default())
        }

        fn property_range(
            &self,
            output: OutputId,
            _property: PropertyId,
        ) -> Result<Option<Vec<i32>>> {
            Ok(self
                .ranges
                .iter()
                .find(|(o, _)| *o == output)
                .map(|(_, range)| range.clone()))
        }

        fn property_value(
            &self,
            output: OutputId,
            _property: PropertyId,
        ) -> Result<Option<PropertyValue>> {
            Ok(self
                .values
                .iter()
                .find(|(o, _)| *o == output)
                .map(|(_, value)| *value))
        }

        fn set_property_value(
            &self,
            output: OutputId,
            _property: PropertyId,
            value: i32,
        ) -> Result<()> {
            self.writes.borrow_mut().push((output, value));
            Ok(())
        }
    }
}
