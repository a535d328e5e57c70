//! Alarm status triple.
//!
//! Each component is a closed enumeration carried on the wire as a single
//! decimal digit. Conversions from raw digits are range-checked; anything
//! outside an enumeration's range is an [`ProtocolError::InvalidEnumValue`].

use std::fmt;

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::ProtocolError;

/// Alarm arming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ArmState {
    /// Not armed
    #[default]
    Disarmed = 0,
    /// Armed, no intrusion
    Armed = 1,
    /// Armed and triggered
    Alert = 2,
}

/// How the alarm was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ArmMethod {
    /// Not armed
    #[default]
    None = 0,
    /// Armed with occupants inside
    Stay = 1,
    /// Armed with the premises empty
    Away = 2,
}

/// Aggregate sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SensorState {
    /// No sensor triggered
    #[default]
    NoneTriggered = 0,
    /// Exactly one sensor triggered
    OneTriggered = 1,
    /// More than one sensor triggered
    MultipleTriggered = 2,
    /// Sensor bus unreachable
    Offline = 3,
}

macro_rules! wire_enum {
    ($ty:ident, $kind:literal, [$($variant:ident = $value:literal),+ $(,)?]) => {
        impl $ty {
            /// Largest valid wire value.
            pub const MAX: u8 = {
                let mut max = 0;
                $(if $value > max { max = $value; })+
                max
            };

            /// Wire value.
            pub fn to_u8(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<i8> for $ty {
            type Error = ProtocolError;

            fn try_from(value: i8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(ProtocolError::InvalidEnumValue {
                        kind: $kind,
                        value: i16::from(other),
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_u8())
            }
        }
    };
}

wire_enum!(ArmState, "arm state", [Disarmed = 0, Armed = 1, Alert = 2]);
wire_enum!(ArmMethod, "arm method", [None = 0, Stay = 1, Away = 2]);
wire_enum!(SensorState, "sensor state", [
    NoneTriggered = 0,
    OneTriggered = 1,
    MultipleTriggered = 2,
    Offline = 3,
]);

/// Complete alarm status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct Status {
    /// Arming state
    pub state: ArmState,
    /// Arming method
    pub method: ArmMethod,
    /// Sensor state
    pub sensor: SensorState,
}

impl Status {
    /// Build a status from its three components.
    pub const fn new(state: ArmState, method: ArmMethod, sensor: SensorState) -> Self {
        Self { state, method, sensor }
    }

    /// Build a status from three raw wire digits.
    ///
    /// Fails on the first component outside its range.
    pub fn from_digits(state: i8, method: i8, sensor: i8) -> Result<Self, ProtocolError> {
        Ok(Self {
            state: ArmState::try_from(state)?,
            method: ArmMethod::try_from(method)?,
            sensor: SensorState::try_from(sensor)?,
        })
    }

    /// Every valid status, in wire order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=ArmState::MAX as i8).flat_map(|s| {
            (0..=ArmMethod::MAX as i8).flat_map(move |m| {
                (0..=SensorState::MAX as i8).filter_map(move |x| Self::from_digits(s, m, x).ok())
            })
        })
    }
}
