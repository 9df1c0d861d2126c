//! Unix `compress` (`.Z`) LZW decompression.
//!
//! Legacy ODB++ archives store some members with an extra `.Z` layer.
//!
//! Stream layout:
//! - 2 magic bytes `1F 9D`
//! - 1 flags byte: bits 0-4 = maximum code width (9..=16), bit 7 = block
//!   mode (code 256 clears the table), bits 5-6 reserved
//! - LSB-first codes starting at 9 bits wide
//!
//! Whenever the code width grows, and after every clear code, the encoder
//! skipped ahead to the next multiple of `bits` bytes counted from the last
//! width change. The decoder must skip the same padding.

use super::Decompressor;
use crate::error::{OdbError, Result};

const MAGIC: [u8; 2] = [0x1f, 0x9d];
const CLEAR_CODE: u32 = 256;
const TABLE_SIZE: usize = 1 << 16;

/// Decompressor for Unix compress streams.
pub struct UnixLzwDecompressor;

impl Decompressor for UnixLzwDecompressor {
    fn decompress(&self, source: &[u8]) -> Result<Vec<u8>> {
        unlzw(source)
    }
}

fn corrupt(reason: &str) -> OdbError {
    OdbError::Decompression(format!("LZW: {}", reason))
}

/// Advance `next` to the next `bits`-byte group boundary measured from `mark`.
///
/// Returns `false` when the boundary lies beyond the input; the encoder only
/// emits padding before more codes, so the stream simply ends there. A clear
/// code may pad up to exactly the end of input (`may_reach_end`).
fn skip_padding(next: &mut usize, mark: usize, bits: u32, len: usize, may_reach_end: bool) -> bool {
    let rem = (*next - mark) % bits as usize;
    if rem != 0 {
        let rem = bits as usize - rem;
        let available = len - *next;
        if rem > available || (rem == available && !may_reach_end) {
            return false;
        }
        *next += rem;
    }
    true
}

/// Expand a complete Unix compress stream.
pub fn unlzw(data: &[u8]) -> Result<Vec<u8>> {
    let len = data.len();
    if len < 3 {
        return Err(corrupt("input shorter than the header"));
    }
    if data[..2] != MAGIC {
        return Err(corrupt("bad magic bytes"));
    }
    let flags = data[2];
    if flags & 0x60 != 0 {
        return Err(corrupt("reserved flag bits set"));
    }
    let mut max_bits = u32::from(flags & 0x1f);
    if !(9..=16).contains(&max_bits) {
        return Err(corrupt("maximum code width out of range"));
    }
    // 9 never meant 9
    if max_bits == 9 {
        max_bits = 10;
    }
    let block_mode = flags & 0x80 != 0;

    let mut bits: u32 = 9;
    let mut mask: u32 = 0x1ff;
    let mut end: u32 = if block_mode { 256 } else { 255 };

    if len == 3 {
        return Ok(Vec::new());
    }
    if len == 4 {
        return Err(corrupt("stream ended in the middle of a code"));
    }

    // The first code is a literal and creates no table entry.
    let mut buf: u32 = u32::from(data[3]) | (u32::from(data[4]) << 8);
    let mut prev = buf & mask;
    let mut last = prev;
    buf >>= bits;
    let mut left: u32 = 16 - bits;
    if prev > 255 {
        return Err(corrupt("first code must be a literal"));
    }

    let mut prefix = vec![0u16; TABLE_SIZE];
    let mut suffix = vec![0u8; TABLE_SIZE];
    let mut stack: Vec<u8> = Vec::with_capacity(256);
    let mut out = Vec::with_capacity(len * 3);
    out.push(last as u8);

    let mut mark = 3usize;
    let mut next = 5usize;
    while next < len {
        if end >= mask && bits < max_bits {
            if !skip_padding(&mut next, mark, bits, len, false) {
                break;
            }
            buf = 0;
            left = 0;
            mark = next;
            bits += 1;
            mask = (mask << 1) | 1;
        }

        buf |= u32::from(data[next]) << left;
        next += 1;
        left += 8;
        if left < bits {
            if next == len {
                return Err(corrupt("stream ended in the middle of a code"));
            }
            buf |= u32::from(data[next]) << left;
            next += 1;
            left += 8;
        }
        let mut code = buf & mask;
        buf >>= bits;
        left -= bits;

        if code == CLEAR_CODE && block_mode {
            if !skip_padding(&mut next, mark, bits, len, true) {
                break;
            }
            buf = 0;
            left = 0;
            mark = next;
            bits = 9;
            mask = 0x1ff;
            end = 255;
            continue;
        }

        let current = code;
        stack.clear();

        // KwKwK: the code being defined right now
        if code > end {
            if code != end + 1 || prev > end {
                return Err(corrupt("invalid code"));
            }
            stack.push(last as u8);
            code = prev;
        }

        while code >= 256 {
            stack.push(suffix[code as usize]);
            code = u32::from(prefix[code as usize]);
        }
        stack.push(code as u8);
        last = code;

        if end < mask {
            end += 1;
            prefix[end as usize] = prev as u16;
            suffix[end as usize] = last as u8;
        }
        prev = current;

        out.extend(stack.iter().rev());
    }

    Ok(out)
}
