//! Adaptive-tree compression for Doom 64 lumps
//!
//! This is the codec the N64 port applies to map, demo, texture, and flat
//! lumps (the game code calls it "Deflate", though it shares nothing with
//! zlib).  Literals, match codes, and the terminator all come from one
//! 629-symbol adaptive prefix tree; match distances are completed by a
//! fixed-width extra-bits field selected by a six-bucket length table.
//!
//! * This transforms buffers, not files (lumps are small and already sliced
//!   by the archive directory)
//! * `expand` accepts any stream the original console code produces, and
//!   `compress` produces streams the original console code accepts
//! * The stream has no header; the archive directory carries the
//!   decompressed size and hands it to `expand`

use crate::tools::adaptive_tree::{self,AdaptiveTree};
use crate::tools::bitstream::{BitReader,BitWriter};
use crate::tools::window::Window;
use crate::Error;

/// sliding window size, 0x558f
const WIN_SIZE: usize = 21903;
/// how far back the encoder searches for matches
const SEARCH_DEPTH: usize = 1024;
/// shortest and longest encodable match runs
const MIN_MATCH: usize = 3;
const MAX_MATCH: usize = 64;
/// number of input bytes emitted as raw literals to prime the window
const PRELUDE: usize = 14;

/// symbol payload of the end-of-stream terminator; literals sit below it
/// and match codes above it
const END_SYMBOL: u16 = 256;
const MATCH_BASE: u16 = 257;
/// match codes per length bucket (one for each run length 3..=64)
const BUCKET_SPAN: u16 = 62;

/// width of the extra-bits field for each length bucket
const EXTRA_BITS: [u16;6] = [4, 6, 8, 10, 12, 14];
/// cumulative base distance for each length bucket
const BUCKET_BASE: [usize;6] = [0, 16, 80, 336, 1360, 5456];

/// pull one symbol out of the stream and keep the tree in step
fn read_symbol(tree: &mut AdaptiveTree,reader: &mut BitReader) -> Result<u16,Error> {
    let mut node = adaptive_tree::ROOT;
    while !AdaptiveTree::is_leaf(node) {
        node = tree.child(node,reader.read_bit()?);
    }
    let symbol = AdaptiveTree::symbol_for(node);
    if symbol >= adaptive_tree::SYMBOL_COUNT {
        return Err(Error::InvalidSymbol);
    }
    tree.update(symbol);
    Ok(symbol)
}

/// emit the code for one symbol and keep the tree in step
fn write_symbol(tree: &mut AdaptiveTree,writer: &mut BitWriter,symbol: u16) {
    for bit in tree.code(symbol) {
        writer.write_bit(bit);
    }
    tree.update(symbol);
}

fn push_limited(ans: &mut Vec<u8>,limit: usize,val: u8) -> Result<(),Error> {
    if ans.len() >= limit {
        return Err(Error::OutputOverflow);
    }
    ans.push(val);
    Ok(())
}

/// Main decompression function.  The caller supplies the decompressed size
/// from the archive directory; producing more than that many bytes means
/// the stream is corrupt.
pub fn expand(ibuf: &[u8],expected_size: usize) -> Result<Vec<u8>,Error> {
    let mut reader = BitReader::create(ibuf);
    let mut tree = AdaptiveTree::create();
    let mut window = Window::create(WIN_SIZE);
    let mut ans = Vec::with_capacity(expected_size);
    loop {
        let symbol = read_symbol(&mut tree,&mut reader)?;
        if symbol == END_SYMBOL {
            break;
        }
        if symbol < END_SYMBOL {
            push_limited(&mut ans,expected_size,symbol as u8)?;
            window.push(symbol as u8);
        } else {
            let run = (symbol - MATCH_BASE) as usize;
            let bucket = run / BUCKET_SPAN as usize;
            let len = run % BUCKET_SPAN as usize + MIN_MATCH;
            let extra = reader.read_bits(EXTRA_BITS[bucket])? as usize;
            let dist = BUCKET_BASE[bucket] + extra + len;
            // the copy must stream through the window one byte at a time:
            // when dist < len the source overtakes bytes this same copy
            // produced, giving run-length repetition
            let mut src = window.rewind(dist);
            for _i in 0..len {
                let val = window.get(src);
                push_limited(&mut ans,expected_size,val)?;
                window.push(val);
                src = (src + 1) % WIN_SIZE;
            }
        }
    }
    Ok(ans)
}

/// Search the window for the longest run matching the input at `pos`.
/// Only the `SEARCH_DEPTH` most recently written positions are candidates
/// and the scan never reaches behind window position zero, so no candidate
/// wraps.  Returns the match start; ties prefer the most recent start.
fn find_match(window: &Window,ibuf: &[u8],pos: usize) -> Option<(usize,usize)> {
    let head = window.head();
    let max_len = MAX_MATCH.min(ibuf.len() - pos);
    if max_len < MIN_MATCH || head < MIN_MATCH {
        return None;
    }
    let floor = head.saturating_sub(SEARCH_DEPTH + MAX_MATCH);
    let mut best: Option<(usize,usize)> = None;
    for start in (floor..=head - MIN_MATCH).rev() {
        let mut len = 0;
        while len < max_len && len < head - start
            && window.get(start + len) == ibuf[pos + len] {
            len += 1;
        }
        // the match must end inside the search depth
        if start + SEARCH_DEPTH < head && len < head - SEARCH_DEPTH - start {
            continue;
        }
        if len >= MIN_MATCH && len > best.map_or(0,|(l,_s)| l) {
            best = Some((len,start));
            if len == max_len {
                break;
            }
        }
    }
    best
}

/// Main compression function.  Cannot fail; incompressible input simply
/// grows by the literal coding overhead.
pub fn compress(ibuf: &[u8]) -> Vec<u8> {
    let mut writer = BitWriter::create();
    let mut tree = AdaptiveTree::create();
    let mut window = Window::create(WIN_SIZE);
    let mut pos: usize = 0;
    // seed the window before any match search can pay off
    while pos < PRELUDE.min(ibuf.len()) {
        write_symbol(&mut tree,&mut writer,ibuf[pos] as u16);
        window.push(ibuf[pos]);
        pos += 1;
    }
    while pos < ibuf.len() {
        if let Some((len,start)) = find_match(&window,ibuf,pos) {
            if emit_match(&mut tree,&mut writer,&mut window,ibuf,pos,len,start) {
                pos += len;
                continue;
            }
        }
        write_symbol(&mut tree,&mut writer,ibuf[pos] as u16);
        window.push(ibuf[pos]);
        pos += 1;
    }
    write_symbol(&mut tree,&mut writer,END_SYMBOL);
    writer.to_bytes()
}

/// Encode one match if the codec's arithmetic can represent it faithfully.
/// The replay mirrors the decoder's copy, window writes included, and any
/// discrepancy falls back to a literal.  Returns whether the match was
/// emitted.
fn emit_match(
    tree: &mut AdaptiveTree,
    writer: &mut BitWriter,
    window: &mut Window,
    ibuf: &[u8],
    pos: usize,
    len: usize,
    start: usize
) -> bool {
    let dist = window.distance(start);
    let mut bucket: Option<usize> = None;
    for b in 0..EXTRA_BITS.len() {
        if dist <= BUCKET_BASE[b] + len + (1usize << EXTRA_BITS[b]) - 1 {
            bucket = Some(b);
            break;
        }
    }
    let bucket = match bucket {
        Some(b) => b,
        // distance not representable in any bucket
        None => return false
    };
    let extra = dist - BUCKET_BASE[bucket] - len;
    if extra >= 1usize << EXTRA_BITS[bucket] {
        return false;
    }
    // replay the copy the decoder will perform
    let mut src = window.rewind(dist);
    let mut dst = window.head();
    for i in 0..len {
        let val = window.get(src);
        if val != ibuf[pos + i] {
            return false;
        }
        window.put(dst,val);
        src = (src + 1) % WIN_SIZE;
        dst = (dst + 1) % WIN_SIZE;
    }
    let symbol = MATCH_BASE + bucket as u16 * BUCKET_SPAN + (len - MIN_MATCH) as u16;
    write_symbol(tree,writer,symbol);
    writer.write_bits(extra as u32,EXTRA_BITS[bucket]);
    for i in 0..len {
        window.push(ibuf[pos + i]);
    }
    true
}

#[cfg(test)]
fn xorshift32(state: &mut u32) -> u32 {
    *state ^= *state << 13;
    *state ^= *state >> 17;
    *state ^= *state << 5;
    *state
}

#[cfg(test)]
fn round_trip(dat: &[u8]) {
    let compressed = compress(dat);
    let expanded = expand(&compressed,dat.len()).expect("expansion failed");
    assert_eq!(dat.to_vec(),expanded);
}

#[test]
fn empty_input() {
    // an empty lump is just the terminator under the initial tree,
    // zero-padded to a byte boundary
    assert_eq!(compress(&[]),hex::decode("ba80").unwrap());
    assert_eq!(expand(&hex::decode("ba80").unwrap(),0).unwrap(),Vec::<u8>::new());
}

#[test]
fn single_literal() {
    let compressed = compress(b"A");
    // 'A' holds its initial 9-bit code, 0x5b is those bits MSB-aligned
    assert_eq!(compressed[0],0x5b);
    assert_eq!(compressed.len(),3);
    round_trip(b"A");
}

#[test]
fn prelude_only() {
    // exactly 14 bytes: all literals, no match search happens
    round_trip(b"wretched maple");
}

#[test]
fn long_run() {
    // a run forces self-referential copies where the source overlaps
    // the bytes being produced
    round_trip(&[b'Z';300]);
}

#[test]
fn mixed_text() {
    round_trip("I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes());
}

#[test]
fn pseudorandom_8k() {
    let mut state: u32 = 1;
    let dat: Vec<u8> = (0..8192).map(|_i| xorshift32(&mut state) as u8).collect();
    let compressed = compress(&dat);
    // random bytes cannot beat the 9-bit minimum literal cost
    assert!(compressed.len() > dat.len());
    let expanded = expand(&compressed,dat.len()).expect("expansion failed");
    assert_eq!(dat,expanded);
}

#[test]
fn incompressible_large() {
    let mut state: u32 = 0xdeadbeef;
    let dat: Vec<u8> = (0..30000).map(|_i| xorshift32(&mut state) as u8).collect();
    round_trip(&dat);
}

#[test]
fn compressible_large() {
    // long enough to rescale the tree several times over
    let mut dat = Vec::new();
    for i in 0..3000u32 {
        dat.extend_from_slice(b"BLOOD");
        dat.extend_from_slice(&i.to_le_bytes());
    }
    let compressed = compress(&dat);
    assert!(compressed.len() < dat.len());
    let expanded = expand(&compressed,dat.len()).expect("expansion failed");
    assert_eq!(dat,expanded);
}

#[test]
fn truncated_stream() {
    assert!(matches!(expand(&[],5),Err(Error::InputExhausted)));
    let compressed = compress(b"truncation casualty");
    assert!(matches!(
        expand(&compressed[0..1],19),
        Err(Error::InputExhausted) | Err(Error::OutputOverflow)
    ));
}

#[test]
fn undersized_output() {
    let compressed = compress(b"abc");
    assert!(matches!(expand(&compressed,2),Err(Error::OutputOverflow)));
}

#[test]
fn determinism() {
    let compressed = compress(b"the same bytes in, the same bytes out");
    assert_eq!(
        expand(&compressed,37).unwrap(),
        expand(&compressed,37).unwrap()
    );
}
