//! Known instruction signatures and how their operands are rewritten.
//!
//! A [`Signature`] is a literal 16-byte window around one instruction. The bytes
//! before the operand are the preserved opcode; the replacement written at a match
//! is that opcode followed by the newly encoded operand. Replacements can be
//! shorter than the signature, the remaining matched bytes are left alone.

use crate::codec::{LeBytes, WIDTH};
use crate::config::PatchPlan;
use crate::error::{CodecError, PatchError, Result};
use serde::Serialize;
use std::fmt;

/// Encoding of the operand that follows a signature's opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandKind {
    /// One-byte immediate, e.g. a shift count
    U8,
    /// 32-bit little-endian immediate
    U32,
    /// 32-bit IEEE-754 constant
    F32,
}

impl OperandKind {
    /// Encoded width in bytes
    pub fn width(self) -> usize {
        match self {
            OperandKind::U8 => 1,
            OperandKind::U32 | OperandKind::F32 => WIDTH,
        }
    }
}

/// A decoded or to-be-encoded operand
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperandValue {
    /// One-byte immediate
    U8(u8),
    /// 32-bit immediate
    U32(u32),
    /// 32-bit float constant
    F32(f32),
}

impl OperandValue {
    /// The operand's encoding
    pub fn kind(self) -> OperandKind {
        match self {
            OperandValue::U8(_) => OperandKind::U8,
            OperandValue::U32(_) => OperandKind::U32,
            OperandValue::F32(_) => OperandKind::F32,
        }
    }

    /// Encode the operand as it is stored in the module
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            OperandValue::U8(value) => vec![value],
            OperandValue::U32(value) => value.to_bytes().to_vec(),
            OperandValue::F32(value) => value.to_bytes().to_vec(),
        }
    }

    /// Decode an operand of `kind` from the start of `bytes`
    pub fn decode(kind: OperandKind, bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        match kind {
            OperandKind::U8 => bytes
                .first()
                .map(|byte| OperandValue::U8(*byte))
                .ok_or(CodecError::TooShort {
                    expected: 1,
                    actual: 0,
                }),
            OperandKind::U32 => u32::from_bytes(bytes).map(OperandValue::U32),
            OperandKind::F32 => f32::from_bytes(bytes).map(OperandValue::F32),
        }
    }
}

impl fmt::Display for OperandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandValue::U8(value) => write!(f, "{value}"),
            OperandValue::U32(value) => write!(f, "{value:#x}"),
            OperandValue::F32(value) => write!(f, "{value}"),
        }
    }
}

/// Chooses the new operand for a plan, or `None` to leave matches untouched
pub type OperandFn = fn(&PatchPlan) -> Option<OperandValue>;

/// A known byte signature and the rule producing its replacement
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    /// Short name used in reports
    pub name: &'static str,
    /// The instruction the signature contains
    pub description: &'static str,
    /// Literal bytes to search for
    pub pattern: &'static [u8],
    /// Offset of the operand inside the pattern; bytes before it are kept
    pub operand_offset: usize,
    /// Encoding of the operand
    pub operand: OperandKind,
    value: OperandFn,
}

impl Signature {
    /// Describe a new signature
    pub const fn new(
        name: &'static str,
        description: &'static str,
        pattern: &'static [u8],
        operand_offset: usize,
        operand: OperandKind,
        value: OperandFn,
    ) -> Self {
        Self {
            name,
            description,
            pattern,
            operand_offset,
            operand,
            value,
        }
    }

    /// Bytes preserved at the start of every replacement
    pub fn opcode(&self) -> &'static [u8] {
        &self.pattern[..self.operand_offset.min(self.pattern.len())]
    }

    /// New operand for `plan`, or `None` when this signature is not applied
    pub fn operand_for(&self, plan: &PatchPlan) -> Option<OperandValue> {
        (self.value)(plan)
    }

    /// Bytes to write at each match: the opcode followed by the encoded operand.
    ///
    /// Returns `Ok(None)` when the plan does not apply this signature.
    pub fn replacement(&self, plan: &PatchPlan) -> Result<Option<Vec<u8>>> {
        let Some(value) = self.operand_for(plan) else {
            return Ok(None);
        };

        if value.kind() != self.operand {
            return Err(PatchError::OperandMismatch {
                signature: self.name,
            });
        }

        let mut bytes = self.opcode().to_vec();
        bytes.extend(value.to_bytes());
        Ok(Some(bytes))
    }

    /// Decode the operand currently stored in `matched` bytes
    pub fn decode_operand(&self, matched: &[u8]) -> std::result::Result<OperandValue, CodecError> {
        let operand = matched.get(self.operand_offset..).unwrap_or_default();
        OperandValue::decode(self.operand, operand)
    }
}

/// `mov edi, 32h`: the sync delay itself
pub const SYNC_DELAY: Signature = Signature::new(
    "sync delay",
    "mov edi, 32h",
    &[
        0xBF, 0x32, 0x00, 0x00, 0x00, 0x80, 0x7D, 0x00, 0x00, 0x0F, 0x84, 0x2C, 0x01, 0x00, 0x00,
        0x48,
    ],
    1,
    OperandKind::U32,
    |plan| Some(OperandValue::U32(plan.delay)),
);

/// `shr rdi, 2`: sync delay divided by the divisor in the first player branch
pub const SYNC_DELAY_SHIFT: Signature = Signature::new(
    "sync delay shift",
    "shr rdi, 2",
    &[
        0x48, 0xC1, 0xEF, 0x02, 0xE9, 0x9C, 0x00, 0x00, 0x00, 0x45, 0x84, 0xF6, 0x0F, 0x84, 0x93,
        0x00,
    ],
    3,
    OperandKind::U8,
    |plan| Some(OperandValue::U8(plan.shift)),
);

/// `mov eax, 0Ch`: the divided delay the compiler folded into a constant
pub const DIVIDED_SYNC_DELAY: Signature = Signature::new(
    "divided sync delay",
    "mov eax, 0Ch",
    &[
        0xB8, 0x0C, 0x00, 0x00, 0x00, 0x48, 0x0F, 0x42, 0xF8, 0x49, 0x8B, 0x1C, 0x24, 0x44, 0x0F,
        0xB7,
    ],
    1,
    OperandKind::U32,
    |plan| Some(OperandValue::U32(plan.divided_delay)),
);

/// `1225.0f`: lowest sync delay distance, applied only when opted in
pub const LOWEST_SYNC_DISTANCE: Signature = Signature::new(
    "lowest sync delay distance",
    "1225.0f constant",
    &[
        0x00, 0x20, 0x99, 0x44, 0x56, 0xEE, 0xB4, 0x44, 0x00, 0x80, 0xD4, 0x44, 0x00, 0xA8, 0xF6,
        0x45,
    ],
    0,
    OperandKind::F32,
    |plan| plan.constant.map(OperandValue::F32),
);

/// The four signatures of the server-state module, in patch order
pub const KNOWN_SIGNATURES: [Signature; 4] = [
    SYNC_DELAY,
    SYNC_DELAY_SHIFT,
    DIVIDED_SYNC_DELAY,
    LOWEST_SYNC_DISTANCE,
];
