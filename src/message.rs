//! Message handles passed to and returned by the dispatcher.

use std::io::{BufReader, Cursor, Read};

use pgp::armor::Dearmor;
use pgp::composed::CleartextSignedMessage;
use pgp::packet::{Packet, PacketParser, PublicKeyEncryptedSessionKey};

use crate::error::{Error, Result};
use crate::internal::normalize_line_endings;

const MESSAGE_HEADER: &str = "-----BEGIN PGP MESSAGE-----";

/// An encrypted or signed OpenPGP message, kept in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    data: Vec<u8>,
}

impl Message {
    /// Wrap an ASCII-armored message.
    pub fn from_armored(armored: &str) -> Result<Self> {
        if !armored.trim_start().starts_with(MESSAGE_HEADER) {
            return Err(Error::MalformedArmor(
                "missing PGP MESSAGE header".to_string(),
            ));
        }
        Ok(Self {
            data: armored.as_bytes().to_vec(),
        })
    }

    /// Wrap a message in armored or binary form.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_armored(&self) -> bool {
        self.data.starts_with(b"-----BEGIN PGP")
    }

    /// The armored text, if this message is armored.
    pub fn armored(&self) -> Option<&str> {
        if self.is_armored() {
            std::str::from_utf8(&self.data).ok()
        } else {
            None
        }
    }

    /// The armored text, or an error for binary messages.
    pub fn to_armored(&self) -> Result<String> {
        self.armored()
            .map(str::to_string)
            .ok_or_else(|| Error::MalformedArmor("message is not armored".to_string()))
    }

    /// Key IDs (upper-case hex) of the recipients this message was encrypted for.
    pub fn encrypted_for(&self) -> Result<Vec<String>> {
        let data = if self.is_armored() {
            let mut buf = Vec::new();
            BufReader::new(Dearmor::new(Cursor::new(&self.data))).read_to_end(&mut buf)?;
            buf
        } else {
            self.data.clone()
        };

        let mut key_ids = Vec::new();
        for packet in PacketParser::new(Cursor::new(&data)) {
            // A parse error means we reached the encrypted payload
            let Ok(packet) = packet else { break };
            if let Packet::PublicKeyEncryptedSessionKey(pkesk) = packet {
                match pkesk {
                    PublicKeyEncryptedSessionKey::V3 { id, .. } => {
                        key_ids.push(format!("{}", id).to_uppercase());
                    }
                    PublicKeyEncryptedSessionKey::V6 {
                        fingerprint: Some(fp),
                        ..
                    } => key_ids.push(format!("{}", fp).to_uppercase()),
                    // anonymous or unknown recipient
                    _ => continue,
                }
            }
        }
        Ok(key_ids)
    }
}

/// A cleartext-signed message: readable text followed by its signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleartextMessage {
    armored: String,
    text: String,
}

impl CleartextMessage {
    /// Parse a `-----BEGIN PGP SIGNED MESSAGE-----` block.
    pub fn from_armored(armored: &str) -> Result<Self> {
        let (msg, _headers) = CleartextSignedMessage::from_string(armored)
            .map_err(|e| Error::Parse(e.to_string()))?;
        Ok(Self {
            armored: armored.to_string(),
            text: normalize_line_endings(&msg.signed_text()),
        })
    }

    /// The signed text with CRLF line endings normalized to LF.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn armored(&self) -> &str {
        &self.armored
    }

    pub(crate) fn parse(&self) -> Result<CleartextSignedMessage> {
        CleartextSignedMessage::from_string(&self.armored)
            .map(|(msg, _headers)| msg)
            .map_err(|e| Error::Parse(e.to_string()))
    }
}

/// Input accepted by [`verify_clear_signed`](crate::Dispatcher::verify_clear_signed).
///
/// Only [`Payload::Cleartext`] is valid there; the other variants exist so a
/// wrong argument is reported as an input error instead of a type mismatch
/// somewhere deeper.
#[derive(Debug, Clone)]
pub enum Payload {
    Cleartext(CleartextMessage),
    Message(Message),
    Text(String),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Cleartext(_) => "cleartext message",
            Payload::Message(_) => "message",
            Payload::Text(_) => "string",
        }
    }
}

impl From<CleartextMessage> for Payload {
    fn from(msg: CleartextMessage) -> Self {
        Payload::Cleartext(msg)
    }
}

impl From<Message> for Payload {
    fn from(msg: Message) -> Self {
        Payload::Message(msg)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}
