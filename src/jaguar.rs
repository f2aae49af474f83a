//! LZSS decoder for sprite and graphic lumps
//!
//! This is the simpler of the two lump codecs, inherited unchanged from the
//! Jaguar port.  Tokens are gated by flag bytes, one flag byte per eight
//! tokens, consumed LSB first: a clear flag passes one literal byte through,
//! a set flag is a 16-bit back reference with a 12-bit offset and a 4-bit
//! length nibble (copy length = nibble + 1).  A zero length nibble
//! terminates the stream.
//!
//! Only the decoder exists; the original tooling never re-encodes these
//! lumps, and neither do we.

use crate::Error;

/// Decompress one lump.  Back references address the bytes already
/// produced, and overlapping copies read bytes as they are written.
pub fn expand(ibuf: &[u8],expected_size: usize) -> Result<Vec<u8>,Error> {
    let mut ans: Vec<u8> = Vec::with_capacity(expected_size);
    let mut ptr: usize = 0;
    let mut next = |ptr: &mut usize| -> Result<u8,Error> {
        match ibuf.get(*ptr) {
            Some(val) => {
                *ptr += 1;
                Ok(*val)
            },
            None => Err(Error::InputExhausted)
        }
    };
    let mut flags: u8 = 0;
    let mut flag_count: u8 = 0;
    loop {
        if flag_count == 0 {
            flags = next(&mut ptr)?;
        }
        flag_count = (flag_count + 1) & 7;
        if flags & 1 != 0 {
            let hi = next(&mut ptr)? as usize;
            let lo = next(&mut ptr)? as usize;
            let offset = (hi << 4) | (lo >> 4);
            let len = (lo & 0xf) + 1;
            if len == 1 {
                break;
            }
            let src = match ans.len().checked_sub(offset + 1) {
                Some(s) => s,
                None => return Err(Error::BadBackReference)
            };
            for i in 0..len {
                if ans.len() >= expected_size {
                    return Err(Error::OutputOverflow);
                }
                let val = ans[src + i];
                ans.push(val);
            }
        } else {
            if ans.len() >= expected_size {
                return Err(Error::OutputOverflow);
            }
            ans.push(next(&mut ptr)?);
        }
        flags >>= 1;
    }
    Ok(ans)
}

#[test]
fn literals_then_terminator() {
    // flags 0b100: two literals then the stop token
    let dat = [0x04,0x41,0x42,0x00,0x00];
    assert_eq!(expand(&dat,2).unwrap(),b"AB".to_vec());
}

#[test]
fn overlapping_copy() {
    // "AB" then an 8-byte copy starting one byte back
    let dat = [0x0c,0x41,0x42,0x00,0x17,0x00,0x00];
    assert_eq!(expand(&dat,10).unwrap(),b"ABABABABAB".to_vec());
}

#[test]
fn bad_back_reference() {
    // copy of length 2 from an offset with no history behind it
    let dat = [0x01,0x0f,0xf1,0x00,0x00];
    assert!(matches!(expand(&dat,16),Err(Error::BadBackReference)));
}

#[test]
fn truncated() {
    assert!(matches!(expand(&[0x00],4),Err(Error::InputExhausted)));
}
