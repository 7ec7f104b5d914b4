// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process protocol over crossbeam channels.
//!
//! Messages travel as frames instead of bytes. Struct frames carry
//! `(id, ttype, value)` triples so the reader decodes them against its own
//! type spec, the same way a byte codec would: unknown ids are skipped and
//! tag mismatches are rejected.

use super::{MessageHeader, Protocol, ProtocolError, ProtocolResult, Transport};
use crate::payload::{check_field, DecodeError, Payload};
use crate::types::{FieldSpec, MessageType, TType, TypeShape, Value};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
enum Frame {
    Begin(MessageHeader),
    End,
    Struct(WireStruct),
}

#[derive(Debug)]
struct WireStruct {
    name: String,
    fields: Vec<WireField>,
}

#[derive(Debug)]
struct WireField {
    id: i16,
    ttype: TType,
    value: WireValue,
}

#[derive(Debug)]
enum WireValue {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Struct(WireStruct),
    List(Vec<WireValue>),
    Set(Vec<WireValue>),
    Map(Vec<(WireValue, WireValue)>),
}

/// One end of an in-memory connection.
///
/// Writes are buffered until [`Transport::flush`]. Reads block until a
/// frame arrives, the peer closes, or the optional read timeout elapses.
#[derive(Debug)]
pub struct MemoryProtocol {
    tx: Option<Sender<Frame>>,
    rx: Receiver<Frame>,
    outbox: Vec<Frame>,
    read_timeout: Option<Duration>,
}

impl MemoryProtocol {
    /// Two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = channel::unbounded();
        let (b_tx, b_rx) = channel::unbounded();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(tx: Sender<Frame>, rx: Receiver<Frame>) -> Self {
        Self {
            tx: Some(tx),
            rx,
            outbox: Vec::new(),
            read_timeout: None,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    /// True if no frame is waiting to be read.
    pub fn is_idle(&self) -> bool {
        self.rx.is_empty()
    }

    /// Frames flushed by the peer and not yet read.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    fn push(&mut self, frame: Frame) -> ProtocolResult<()> {
        if self.tx.is_none() {
            return Err(ProtocolError::Closed);
        }
        self.outbox.push(frame);
        Ok(())
    }

    fn next_frame(&mut self) -> ProtocolResult<Frame> {
        if self.tx.is_none() {
            return Err(ProtocolError::Closed);
        }
        match self.read_timeout {
            Some(timeout) => self.rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => ProtocolError::TimedOut,
                RecvTimeoutError::Disconnected => ProtocolError::Closed,
            }),
            None => self.rx.recv().map_err(|_| ProtocolError::Closed),
        }
    }
}

impl Transport for MemoryProtocol {
    fn flush(&mut self) -> ProtocolResult<()> {
        let tx = self.tx.as_ref().ok_or(ProtocolError::Closed)?;
        for frame in self.outbox.drain(..) {
            tx.send(frame).map_err(|_| ProtocolError::Closed)?;
        }
        Ok(())
    }

    /// Drops unflushed output and disconnects the sending side.
    fn close(&mut self) -> ProtocolResult<()> {
        self.outbox.clear();
        self.tx = None;
        Ok(())
    }
}

impl Protocol for MemoryProtocol {
    fn write_message_begin(
        &mut self,
        name: &str,
        kind: MessageType,
        seqid: i32,
    ) -> ProtocolResult<()> {
        self.push(Frame::Begin(MessageHeader::new(name, kind, seqid)))
    }

    fn write_message_end(&mut self) -> ProtocolResult<()> {
        self.push(Frame::End)
    }

    fn read_message_begin(&mut self) -> ProtocolResult<MessageHeader> {
        match self.next_frame()? {
            Frame::Begin(header) => Ok(header),
            other => Err(unexpected("message begin", &other)),
        }
    }

    fn read_message_end(&mut self) -> ProtocolResult<()> {
        match self.next_frame()? {
            Frame::End => Ok(()),
            other => Err(unexpected("message end", &other)),
        }
    }

    fn write_struct(&mut self, value: &Payload) -> ProtocolResult<()> {
        let wire = encode_struct(value)?;
        self.push(Frame::Struct(wire))
    }

    fn read_struct(&mut self, value: &mut Payload) -> ProtocolResult<()> {
        match self.next_frame()? {
            Frame::Struct(wire) => decode_struct(wire, value),
            other => Err(unexpected("struct", &other)),
        }
    }

    fn skip(&mut self, ttype: TType) -> ProtocolResult<()> {
        match (ttype, self.next_frame()?) {
            (TType::Struct, Frame::Struct(wire)) => {
                log::trace!("[memory] skipped struct {}", wire.name);
                Ok(())
            }
            (ttype, other) => Err(unexpected(ttype.name(), &other)),
        }
    }
}

fn unexpected(expected: &str, found: &Frame) -> ProtocolError {
    let found = match found {
        Frame::Begin(h) => format!("message begin '{}'", h.name),
        Frame::End => "message end".to_string(),
        Frame::Struct(s) => format!("struct {}", s.name),
    };
    ProtocolError::InvalidData(format!("expected {}, found {}", expected, found))
}

fn encode_struct(payload: &Payload) -> ProtocolResult<WireStruct> {
    let ty = payload.struct_type();
    let mut fields = Vec::with_capacity(ty.spec().len());
    for field in ty.spec().iter() {
        let value = payload.get(&field.name)?;
        if value.is_null() {
            continue;
        }
        check_field(ty.name(), field, value)?;
        fields.push(WireField {
            id: field.id,
            ttype: field.ttype(),
            value: encode_value(value)?,
        });
    }
    Ok(WireStruct {
        name: ty.name().to_string(),
        fields,
    })
}

fn encode_value(value: &Value) -> ProtocolResult<WireValue> {
    let wire = match value {
        Value::Null => {
            return Err(ProtocolError::InvalidData(
                "unset value inside a container".to_string(),
            ))
        }
        Value::Bool(v) => WireValue::Bool(*v),
        Value::Byte(v) => WireValue::Byte(*v),
        Value::I16(v) => WireValue::I16(*v),
        Value::I32(v) => WireValue::I32(*v),
        Value::I64(v) => WireValue::I64(*v),
        Value::Double(v) => WireValue::Double(*v),
        Value::String(v) => WireValue::String(v.clone()),
        Value::Binary(v) => WireValue::Binary(v.clone()),
        Value::Struct(p) => WireValue::Struct(encode_struct(p)?),
        Value::List(items) => WireValue::List(encode_all(items)?),
        Value::Set(items) => WireValue::Set(encode_all(items)?),
        Value::Map(entries) => WireValue::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((encode_value(k)?, encode_value(v)?)))
                .collect::<ProtocolResult<_>>()?,
        ),
    };
    Ok(wire)
}

fn encode_all(items: &[Value]) -> ProtocolResult<Vec<WireValue>> {
    items.iter().map(encode_value).collect()
}

fn decode_struct(wire: WireStruct, target: &mut Payload) -> ProtocolResult<()> {
    let ty = target.struct_type().clone();
    for wf in wire.fields {
        let Some(field) = ty.spec().get(wf.id) else {
            log::trace!("[memory] {}: skipping unknown field id {}", ty.name(), wf.id);
            continue;
        };
        if wf.ttype != field.ttype() {
            return Err(mismatch(ty.name(), field, &wf.value));
        }
        let value = decode_value(wf.value, &field.shape, ty.name(), field)?;
        target.set(&field.name, value)?;
    }
    Ok(())
}

fn mismatch(struct_name: &str, field: &FieldSpec, found: &WireValue) -> ProtocolError {
    ProtocolError::Decode(DecodeError::new(struct_name, field, found.to_string()))
}

/// Renders like the equivalent [`Value`]. Nested structs have no type on
/// the wire and show their field ids instead of names.
impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scalar = match self {
            Self::Bool(v) => Value::Bool(*v),
            Self::Byte(v) => Value::Byte(*v),
            Self::I16(v) => Value::I16(*v),
            Self::I32(v) => Value::I32(*v),
            Self::I64(v) => Value::I64(*v),
            Self::Double(v) => Value::Double(*v),
            Self::String(v) => Value::String(v.clone()),
            Self::Binary(v) => Value::Binary(v.clone()),
            Self::Struct(s) => {
                write!(f, "{}(", s.name)?;
                for (i, wf) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", wf.id, wf.value)?;
                }
                return f.write_str(")");
            }
            Self::List(items) => return write_items(f, "[", items, "]"),
            Self::Set(items) => return write_items(f, "{", items, "}"),
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                return f.write_str("}");
            }
        };
        fmt::Display::fmt(&scalar, f)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, items: &[WireValue], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

fn decode_value(
    wire: WireValue,
    shape: &TypeShape,
    struct_name: &str,
    field: &FieldSpec,
) -> ProtocolResult<Value> {
    let value = match (shape.ttype(), wire) {
        (TType::Bool, WireValue::Bool(v)) => Value::Bool(v),
        (TType::Byte, WireValue::Byte(v)) => Value::Byte(v),
        (TType::I16, WireValue::I16(v)) => Value::I16(v),
        (TType::I32, WireValue::I32(v)) => Value::I32(v),
        (TType::I64, WireValue::I64(v)) => Value::I64(v),
        (TType::Double, WireValue::Double(v)) => Value::Double(v),
        (t, WireValue::String(v)) if t.is_string() => Value::String(v),
        (t, WireValue::Binary(v)) if t.is_string() => Value::Binary(v),
        (TType::Struct, WireValue::Struct(nested)) => {
            let ty = shape.struct_type().ok_or_else(|| {
                ProtocolError::InvalidData(format!(
                    "field '{}' of '{}' has no struct type to decode into",
                    field.name, struct_name
                ))
            })?;
            let mut payload = ty.new_instance();
            decode_struct(nested, &mut payload)?;
            Value::from(payload)
        }
        (TType::List, WireValue::List(items)) => {
            Value::List(decode_items(items, shape, struct_name, field)?)
        }
        (TType::Set, WireValue::Set(items)) => {
            Value::Set(decode_items(items, shape, struct_name, field)?)
        }
        (TType::Map, WireValue::Map(entries)) => {
            let (key_shape, value_shape) = shape.entry().ok_or_else(|| {
                ProtocolError::InvalidData(format!("MAP field '{}' has no entry shapes", field.name))
            })?;
            let entries = entries
                .into_iter()
                .map(|(k, v)| {
                    Ok((
                        decode_value(k, key_shape, struct_name, field)?,
                        decode_value(v, value_shape, struct_name, field)?,
                    ))
                })
                .collect::<ProtocolResult<_>>()?;
            Value::Map(entries)
        }
        (_, other) => return Err(mismatch(struct_name, field, &other)),
    };
    Ok(value)
}

fn decode_items(
    items: Vec<WireValue>,
    shape: &TypeShape,
    struct_name: &str,
    field: &FieldSpec,
) -> ProtocolResult<Vec<Value>> {
    let item_shape = shape.item().ok_or_else(|| {
        ProtocolError::InvalidData(format!("container field '{}' has no item shape", field.name))
    })?;
    items
        .into_iter()
        .map(|item| decode_value(item, item_shape, struct_name, field))
        .collect()
}
