//! Record data encoding.
//!
//! Anything handed to `put` is normalized into the byte payload that travels
//! to the stream. Byte sequences pass through untouched; everything else is
//! rendered as text and encoded as UTF-8.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error_handling::EncodeError;

/// Conversion into the byte payload of a record.
///
/// Implemented for byte containers (returned unchanged), strings, scalars
/// (via their `Display` text), JSON values and platform strings. Platform
/// strings are the only inputs that can fail, when they are not valid Unicode.
pub trait IntoRecordData {
    /// Consumes `self` and returns the record payload.
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError>;
}

/// Encodes `data` into a record payload.
///
/// # Examples
///
/// ```
/// use kinesis_producer::encode_data;
///
/// assert_eq!(encode_data(1).unwrap(), b"1");
/// assert_eq!(encode_data("1").unwrap(), b"1");
/// assert_eq!(encode_data(b"1".to_vec()).unwrap(), b"1");
/// ```
pub fn encode_data<D: IntoRecordData>(data: D) -> Result<Vec<u8>, EncodeError> {
    data.into_record_data()
}

impl IntoRecordData for Vec<u8> {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self)
    }
}

impl IntoRecordData for &[u8] {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.to_vec())
    }
}

impl IntoRecordData for &Vec<u8> {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.clone())
    }
}

impl<const N: usize> IntoRecordData for [u8; N] {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.to_vec())
    }
}

impl<const N: usize> IntoRecordData for &[u8; N] {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.to_vec())
    }
}

impl IntoRecordData for String {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.into_bytes())
    }
}

impl IntoRecordData for &String {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl IntoRecordData for &str {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl IntoRecordData for Cow<'_, str> {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        Ok(self.into_owned().into_bytes())
    }
}

macro_rules! encode_via_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoRecordData for $ty {
                fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
                    Ok(self.to_string().into_bytes())
                }
            }
        )*
    };
}

encode_via_display!(
    bool, char, i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize, f32, f64,
);

// A lone `u8` is a number, not a byte: render it like the other integers.
encode_via_display!(u8);

impl IntoRecordData for serde_json::Value {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        match self {
            serde_json::Value::String(text) => Ok(text.into_bytes()),
            other => Ok(other.to_string().into_bytes()),
        }
    }
}

impl IntoRecordData for &OsStr {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        self.to_str()
            .map(|text| text.as_bytes().to_vec())
            .ok_or_else(|| EncodeError::InvalidUtf8(self.to_string_lossy().into_owned()))
    }
}

impl IntoRecordData for OsString {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        self.into_string()
            .map(String::into_bytes)
            .map_err(|raw| EncodeError::InvalidUtf8(raw.to_string_lossy().into_owned()))
    }
}

impl IntoRecordData for &Path {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        self.as_os_str().into_record_data()
    }
}

impl IntoRecordData for PathBuf {
    fn into_record_data(self) -> Result<Vec<u8>, EncodeError> {
        self.into_os_string().into_record_data()
    }
}
