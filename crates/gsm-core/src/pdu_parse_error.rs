use core::fmt;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PduParseErr {
    BufferEnded { field: Option<&'static str> },
    InvalidValue { field: &'static str, value: u64 },
    InconsistentLength { expected: usize, found: usize },
    Inconsistency { field: &'static str, reason: &'static str },
    NotImplemented { field: Option<&'static str> },
}

impl fmt::Display for PduParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PduParseErr::BufferEnded { field } => write!(f, "buffer ended while reading {}", field.unwrap_or("?")),
            PduParseErr::InvalidValue { field, value } => write!(f, "invalid value {} for {}", value, field),
            PduParseErr::InconsistentLength { expected, found } => {
                write!(f, "inconsistent length, expected {} found {}", expected, found)
            }
            PduParseErr::Inconsistency { field, reason } => write!(f, "inconsistent {}: {}", field, reason),
            PduParseErr::NotImplemented { field } => write!(f, "not implemented: {}", field.unwrap_or("?")),
        }
    }
}

impl std::error::Error for PduParseErr {}

/// Checks whether a value matches an expected value. If not, returns PduParseErr::InvalidValue
#[macro_export]
macro_rules! expect_value {
    ($value:ident, $expected:expr) => {
        $crate::expect_value!(@inner $value, $expected, stringify!($value))
    };
    ($value:expr, $expected:expr, $field:expr) => {
        $crate::expect_value!(@inner $value, $expected, $field)
    };

    (@inner $value:expr, $expected:expr, $field:expr) => {{
        let val = $value;
        if val == $expected {
            Ok(())
        } else {
            Err($crate::PduParseErr::InvalidValue {
                field: $field,
                value: val.into(),
            })
        }
    }};
}

/// Reads a bit field from a MsgBuf into a local of the same name, propagating BufferEnded
#[macro_export]
macro_rules! let_field {
    ($buf:expr, $ident:ident, $bits:expr) => {
        let $ident = $buf.read_field($bits, stringify!($ident))?;
    };
}
