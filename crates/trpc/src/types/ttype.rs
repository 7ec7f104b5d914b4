// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field type tags and message kinds.

use std::fmt;

/// Wire-level type tag of a field.
///
/// Several IDL spellings share one tag: `i08` is [`TType::Byte`], and
/// `utf7`/`binary` are [`TType::String`]. Encoding-specific distinctions
/// between those spellings live in the codecs, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TType {
    Stop = 0,
    Void = 1,
    Bool = 2,
    Byte = 3,
    Double = 4,
    I16 = 6,
    I32 = 8,
    I64 = 10,
    String = 11,
    Struct = 12,
    Map = 13,
    Set = 14,
    List = 15,
    Utf8 = 16,
    Utf16 = 17,
}

impl TType {
    /// Alias of [`TType::Byte`].
    pub const I08: TType = TType::Byte;
    /// Alias of [`TType::String`].
    pub const UTF7: TType = TType::String;
    /// Alias of [`TType::String`]; binary payloads are strings at the tag level.
    pub const BINARY: TType = TType::String;

    /// Convert from a raw tag value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stop),
            1 => Some(Self::Void),
            2 => Some(Self::Bool),
            3 => Some(Self::Byte),
            4 => Some(Self::Double),
            6 => Some(Self::I16),
            8 => Some(Self::I32),
            10 => Some(Self::I64),
            11 => Some(Self::String),
            12 => Some(Self::Struct),
            13 => Some(Self::Map),
            14 => Some(Self::Set),
            15 => Some(Self::List),
            16 => Some(Self::Utf8),
            17 => Some(Self::Utf16),
            _ => None,
        }
    }

    /// Raw tag value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Upper-case tag name used in error messages and shape descriptions.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::Void => "VOID",
            Self::Bool => "BOOL",
            Self::Byte => "BYTE",
            Self::Double => "DOUBLE",
            Self::I16 => "I16",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::String => "STRING",
            Self::Struct => "STRUCT",
            Self::Map => "MAP",
            Self::Set => "SET",
            Self::List => "LIST",
            Self::Utf8 => "UTF8",
            Self::Utf16 => "UTF16",
        }
    }

    /// True for LIST, SET and MAP.
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map)
    }

    /// True for the three string-like tags.
    pub fn is_string(self) -> bool {
        matches!(self, Self::String | Self::Utf8 | Self::Utf16)
    }
}

impl fmt::Display for TType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of an RPC message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageType {
    Call = 1,
    Reply = 2,
    Exception = 3,
    Oneway = 4,
}

impl MessageType {
    /// Convert from i32
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Call),
            2 => Some(Self::Reply),
            3 => Some(Self::Exception),
            4 => Some(Self::Oneway),
            _ => None,
        }
    }

    /// Convert to i32
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// CALL and ONEWAY are the request kinds.
    pub fn is_request(self) -> bool {
        matches!(self, Self::Call | Self::Oneway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_share_tags() {
        assert_eq!(TType::I08, TType::Byte);
        assert_eq!(TType::UTF7, TType::String);
        assert_eq!(TType::BINARY, TType::String);
        assert_eq!(TType::BINARY.name(), "STRING");
        assert_eq!(TType::I08.to_string(), "BYTE");
    }

    #[test]
    fn tag_values_roundtrip() {
        for raw in 0u8..=20 {
            if let Some(tag) = TType::from_u8(raw) {
                assert_eq!(tag.as_u8(), raw);
            }
        }
        assert_eq!(TType::from_u8(5), None);
        assert_eq!(TType::from_u8(12), Some(TType::Struct));
    }

    #[test]
    fn message_type_conversion() {
        assert_eq!(MessageType::from_i32(1), Some(MessageType::Call));
        assert_eq!(MessageType::from_i32(4), Some(MessageType::Oneway));
        assert_eq!(MessageType::from_i32(9), None);
        assert_eq!(MessageType::Exception.as_i32(), 3);
        assert!(MessageType::Oneway.is_request());
        assert!(!MessageType::Reply.is_request());
    }
}
