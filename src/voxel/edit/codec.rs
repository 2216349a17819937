//! Save codes: the whole store as one line of text.
//!
//! Every voxel becomes seven parenthesized fields with no separator
//! between voxels:
//!
//! ```text
//! (x)(y)(z)(#rrggbb)(sx)(sy)(sz)
//! ```
//!
//! Decoding scans left to right for that shape. Each free field takes the
//! shortest run of characters (no line breaks) that still lets the rest of
//! the group match; the color field is exactly `#` plus six hex digits.
//! Text between groups that does not form a group is skipped.

use std::fmt::Write;
use std::ops::Range;

use thiserror::Error;

use crate::core::types::Vec3;
use crate::render::VoxelRenderer;
use crate::voxel::store::VoxelStore;
use crate::voxel::voxel::{Color, VoxelRecord};

/// Fields per voxel group
const GROUP_FIELDS: usize = 7;

/// Index of the `#rrggbb` field within a group
const COLOR_FIELD: usize = 3;

const FIELD_NAMES: [&str; GROUP_FIELDS] = ["x", "y", "z", "color", "sx", "sy", "sz"];

/// Why a save code was rejected. Nothing is ever partially decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("no voxel groups found")]
    NoMatches,

    #[error("voxel {record}: field {field} is not a finite number: {text:?}")]
    InvalidNumber {
        record: usize,
        field: &'static str,
        text: String,
    },

    #[error("voxel {record}: scale {field} is negative: {value}")]
    NegativeScale {
        record: usize,
        field: &'static str,
        value: f32,
    },

    /// Raised when loading into a grid that has no cell for a position
    #[error("voxel {record}: {field} = {value} is outside the grid")]
    OutOfRange {
        record: usize,
        field: &'static str,
        value: f32,
    },
}

/// Encode records in the given order
pub fn encode(records: &[VoxelRecord]) -> String {
    let mut out = String::with_capacity(records.len() * 24);
    for r in records {
        // Writing to a String cannot fail
        let _ = write!(
            out,
            "({})({})({})({})({})({})({})",
            r.position.x, r.position.y, r.position.z,
            r.color,
            r.scale.x, r.scale.y, r.scale.z,
        );
    }
    out
}

/// Encode a store in its iteration order
pub fn encode_store<R: VoxelRenderer>(store: &VoxelStore<R>) -> String {
    encode(&store.snapshot_all())
}

/// Decode a save code into records.
///
/// Fails if no group matches or if any matched numeric field is not a
/// finite number (or a scale component is negative).
pub fn decode(text: &str) -> Result<Vec<VoxelRecord>, CodecError> {
    let groups = scan(text);
    if groups.is_empty() {
        return Err(CodecError::NoMatches);
    }

    groups
        .iter()
        .enumerate()
        .map(|(record, spans)| parse_group(text, record, spans))
        .collect()
}

fn parse_group(
    text: &str,
    record: usize,
    spans: &[Range<usize>; GROUP_FIELDS],
) -> Result<VoxelRecord, CodecError> {
    let number = |field: usize| -> Result<f32, CodecError> {
        let raw = &text[spans[field].clone()];
        match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(CodecError::InvalidNumber {
                record,
                field: FIELD_NAMES[field],
                text: raw.to_string(),
            }),
        }
    };

    let position = Vec3::new(number(0)?, number(1)?, number(2)?);
    let scale = Vec3::new(number(4)?, number(5)?, number(6)?);

    for (axis, value) in scale.to_array().into_iter().enumerate() {
        if value < 0.0 {
            return Err(CodecError::NegativeScale {
                record,
                field: FIELD_NAMES[4 + axis],
                value,
            });
        }
    }

    // The color span was matched as exactly six hex digits
    let color = Color::from_hex_digits(&text[spans[COLOR_FIELD].clone()]).unwrap_or_default();

    Ok(VoxelRecord::new(position, color, scale))
}

/// Find every group, left to right, non-overlapping.
fn scan(text: &str) -> Vec<[Range<usize>; GROUP_FIELDS]> {
    let bytes = text.as_bytes();
    let mut matcher = GroupMatcher {
        bytes,
        failed: vec![false; (bytes.len() + 1) * GROUP_FIELDS],
        spans: std::array::from_fn(|_| 0..0),
    };

    let mut groups = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] == b'(' {
            if let Some(end) = matcher.match_field(pos, 0) {
                groups.push(matcher.spans.clone());
                pos = end;
                continue;
            }
        }
        pos += 1;
    }
    groups
}

/// Backtracking matcher for one group.
///
/// Whether the fields `field..` can match starting at `pos` does not depend
/// on how earlier fields matched, so failures are remembered across the
/// whole scan. That keeps malformed input from going exponential.
struct GroupMatcher<'a> {
    bytes: &'a [u8],
    /// Indexed by `pos * GROUP_FIELDS + field`
    failed: Vec<bool>,
    spans: [Range<usize>; GROUP_FIELDS],
}

impl GroupMatcher<'_> {
    /// Match fields `field..` at `pos`; returns the end of the group
    fn match_field(&mut self, pos: usize, field: usize) -> Option<usize> {
        if field == GROUP_FIELDS {
            return Some(pos);
        }
        let memo = pos * GROUP_FIELDS + field;
        if self.failed[memo] {
            return None;
        }

        let result = if self.bytes.get(pos) != Some(&b'(') {
            None
        } else if field == COLOR_FIELD {
            self.match_color(pos + 1)
        } else {
            self.match_free(pos + 1, field)
        };

        if result.is_none() {
            self.failed[memo] = true;
        }
        result
    }

    /// `#` + six hex digits + `)`
    fn match_color(&mut self, start: usize) -> Option<usize> {
        let digits = self.bytes.get(start + 1..start + 7)?;
        if self.bytes[start] != b'#'
            || !digits.iter().all(u8::is_ascii_hexdigit)
            || self.bytes.get(start + 7) != Some(&b')')
        {
            return None;
        }
        self.spans[COLOR_FIELD] = start + 1..start + 7;
        self.match_field(start + 8, COLOR_FIELD + 1)
    }

    /// Shortest run up to a `)` that lets the remaining fields match
    fn match_free(&mut self, start: usize, field: usize) -> Option<usize> {
        for end in start..self.bytes.len() {
            match self.bytes[end] {
                b'\n' | b'\r' => return None,
                b')' => {
                    if let Some(group_end) = self.match_field(end + 1, field + 1) {
                        self.spans[field] = start..end;
                        return Some(group_end);
                    }
                }
                _ => {}
            }
        }
        None
    }
}
