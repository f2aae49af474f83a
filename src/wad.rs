//! Doom 64 WAD archive driver
//!
//! The archive is a 12-byte header (`IWAD`/`PWAD` magic, lump count,
//! directory offset, both little endian), the lump data, and a directory of
//! 16-byte entries: file position, decompressed size, and an 8-byte
//! NUL-padded name.  A set high bit on the first name byte marks the lump
//! as compressed; the stored length of a compressed lump is recovered from
//! the next entry's file position.  Which codec applies is decided by name
//! hints: everything between the `T_START`/`T_END` markers plus `MAP*` and
//! `DEMO*` lumps uses the adaptive-tree codec, other compressed lumps the
//! Jaguar codec.

use nom::branch::alt;
use nom::bytes::complete::{tag,take};
use nom::number::complete::le_u32;
use crate::{deflate,jaguar,Error};

const HEADER_LEN: usize = 12;
const DIR_ENTRY_LEN: usize = 16;
const NAME_LEN: usize = 8;
/// high bit of the first name byte marks a compressed lump
const COMPRESS_FLAG: u8 = 0x80;

/// lump codecs, selected by entry-name hints
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
enum Codec {
    Deflate,
    Jaguar
}

pub struct Lump {
    /// name with the compression bit already stripped
    pub name: [u8;NAME_LEN],
    pub compressed: bool,
    /// decompressed size as recorded in the directory
    pub size: u32,
    /// stored bytes, compressed or not according to `compressed`
    pub data: Vec<u8>
}

impl Lump {
    pub fn create(name: &str,data: Vec<u8>) -> Self {
        let mut name8 = [0u8;NAME_LEN];
        name8[0..name.len()].copy_from_slice(name.as_bytes());
        Self {
            name: name8,
            compressed: false,
            size: data.len() as u32,
            data
        }
    }
    pub fn marker(name: &str) -> Self {
        Self::create(name,Vec::new())
    }
    /// name bytes up to the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        match self.name.iter().position(|b| *b == 0) {
            Some(end) => &self.name[0..end],
            None => &self.name
        }
    }
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).to_string()
    }
    fn padded_len(&self) -> usize {
        (self.data.len() + 3) & !3
    }
}

pub struct Wad {
    pub magic: [u8;4],
    pub lumps: Vec<Lump>
}

impl Wad {
    pub fn create() -> Self {
        Self {
            magic: *b"IWAD",
            lumps: Vec::new()
        }
    }
    /// Read an archive from a buffer.  Stored lengths of compressed lumps
    /// are recovered from consecutive directory positions, so entries are
    /// assumed to sit in file order, as they do in the retail archives.
    pub fn parse(buf: &[u8]) -> Result<Self,Error> {
        let (magic,count,dir_ofs) = parse_header(buf)
            .map_err(|_| Error::FileFormatMismatch)?
            .1;
        let count = count as usize;
        let dir_ofs = dir_ofs as usize;
        match count.checked_mul(DIR_ENTRY_LEN).and_then(|n| n.checked_add(dir_ofs)) {
            Some(end) if end <= buf.len() => {},
            _ => return Err(Error::BadDirectory)
        }
        let mut table = &buf[dir_ofs..];
        let mut parsed_table = Vec::with_capacity(count);
        for _i in 0..count {
            let (t,entry) = parse_entry(table).map_err(|_| Error::BadDirectory)?;
            table = t;
            parsed_table.push(entry);
        }
        let mut lumps = Vec::with_capacity(count);
        for (i,(filepos,size,name)) in parsed_table.iter().copied().enumerate() {
            let filepos = filepos as usize;
            let mut name = name;
            let compressed = name[0] & COMPRESS_FLAG != 0;
            name[0] &= !COMPRESS_FLAG;
            let stored = match compressed {
                true => {
                    let end = match parsed_table.get(i+1) {
                        Some(next) => next.0 as usize,
                        None => dir_ofs
                    };
                    match end.checked_sub(filepos) {
                        Some(stored) => stored,
                        None => return Err(Error::BadDirectory)
                    }
                },
                false => size as usize
            };
            if filepos + stored > buf.len() {
                return Err(Error::BadDirectory);
            }
            lumps.push(Lump {
                name,
                compressed,
                size,
                data: buf[filepos..filepos+stored].to_vec()
            });
        }
        Ok(Self { magic, lumps })
    }
    /// Write the archive to a buffer, aligning every lump's data to a
    /// four-byte boundary as the game requires.
    pub fn write(&self) -> Vec<u8> {
        let mut dir_ofs = HEADER_LEN;
        for lump in &self.lumps {
            dir_ofs += lump.padded_len();
        }
        let mut ans = Vec::with_capacity(dir_ofs + self.lumps.len()*DIR_ENTRY_LEN);
        ans.extend_from_slice(&self.magic);
        ans.extend_from_slice(&(self.lumps.len() as u32).to_le_bytes());
        ans.extend_from_slice(&(dir_ofs as u32).to_le_bytes());
        for lump in &self.lumps {
            ans.extend_from_slice(&lump.data);
            ans.resize(ans.len() + lump.padded_len() - lump.data.len(),0);
        }
        let mut filepos = HEADER_LEN;
        for lump in &self.lumps {
            ans.extend_from_slice(&(filepos as u32).to_le_bytes());
            ans.extend_from_slice(&lump.size.to_le_bytes());
            let mut name = lump.name;
            if lump.compressed {
                name[0] |= COMPRESS_FLAG;
            }
            ans.extend_from_slice(&name);
            filepos += lump.padded_len();
        }
        ans
    }
    /// Decompress every compressed lump in place and clear its marker bit.
    pub fn expand_all(&mut self) -> Result<(),Error> {
        let mut in_textures = false;
        let mut expanded = 0;
        for lump in &mut self.lumps {
            match lump.name_bytes() {
                b"T_START" => in_textures = true,
                b"T_END" => in_textures = false,
                _ => {}
            }
            if !lump.compressed {
                continue;
            }
            let codec = codec_for(in_textures,lump.name_bytes());
            log::debug!(
                "expanding {} with {:?} ({} -> {} bytes)",
                lump.display_name(),codec,lump.data.len(),lump.size
            );
            lump.data = match codec {
                Codec::Deflate => deflate::expand(&lump.data,lump.size as usize)?,
                Codec::Jaguar => jaguar::expand(&lump.data,lump.size as usize)?
            };
            lump.compressed = false;
            lump.size = lump.data.len() as u32;
            expanded += 1;
        }
        log::info!("expanded {} of {} lumps",expanded,self.lumps.len());
        Ok(())
    }
    /// Compress every eligible lump in place and set its marker bit.
    /// Only the adaptive-tree lump types are eligible; the Jaguar codec has
    /// no encoder, so sprite and graphic lumps stay stored raw.
    pub fn compress_all(&mut self) {
        let mut in_textures = false;
        let mut compressed = 0;
        for lump in &mut self.lumps {
            match lump.name_bytes() {
                b"T_START" => in_textures = true,
                b"T_END" => in_textures = false,
                _ => {}
            }
            if lump.compressed || lump.data.is_empty() {
                continue;
            }
            if codec_for(in_textures,lump.name_bytes()) != Codec::Deflate {
                continue;
            }
            let packed = deflate::compress(&lump.data);
            log::debug!(
                "compressing {} ({} -> {} bytes)",
                lump.display_name(),lump.data.len(),packed.len()
            );
            lump.size = lump.data.len() as u32;
            lump.data = packed;
            lump.compressed = true;
            compressed += 1;
        }
        log::info!("compressed {} of {} lumps",compressed,self.lumps.len());
    }
}

fn parse_header(buf: &[u8]) -> nom::IResult<&[u8],([u8;4],u32,u32)> {
    let (rest,magic) = alt((tag("IWAD"),tag("PWAD")))(buf)?;
    let (rest,count) = le_u32(rest)?;
    let (rest,dir_ofs) = le_u32(rest)?;
    Ok((rest,(magic.try_into().unwrap(),count,dir_ofs)))
}

fn parse_entry(table: &[u8]) -> nom::IResult<&[u8],(u32,u32,[u8;NAME_LEN])> {
    let (t,filepos) = le_u32(table)?;
    let (t,size) = le_u32(t)?;
    let (t,name) = take(NAME_LEN)(t)?;
    Ok((t,(filepos,size,name.try_into().unwrap())))
}

fn codec_for(in_textures: bool,name: &[u8]) -> Codec {
    if in_textures || name.starts_with(b"MAP") || name.starts_with(b"DEMO") {
        Codec::Deflate
    } else {
        Codec::Jaguar
    }
}

#[cfg(test)]
fn sample_wad() -> Wad {
    let mut wad = Wad::create();
    wad.lumps.push(Lump::marker("T_START"));
    wad.lumps.push(Lump::create("CEIL",b"abcabcabcabcabcabcabcabcabc".to_vec()));
    wad.lumps.push(Lump::marker("T_END"));
    wad.lumps.push(Lump::create("MAP01",vec![7;200]));
    wad.lumps.push(Lump::create("SYMBOLS",b"left alone".to_vec()));
    wad
}

#[test]
fn directory_round_trip() {
    let wad = sample_wad();
    let buf = wad.write();
    let parsed = Wad::parse(&buf).expect("parse failed");
    assert_eq!(parsed.lumps.len(),5);
    assert_eq!(parsed.lumps[1].display_name(),"CEIL");
    assert_eq!(parsed.lumps[1].data,wad.lumps[1].data);
    assert_eq!(parsed.lumps[3].size,200);
    assert_eq!(buf,parsed.write());
}

#[test]
fn compress_expand_round_trip() {
    let mut wad = sample_wad();
    let plain = wad.write();
    wad.compress_all();
    assert!(wad.lumps[1].compressed);
    assert!(wad.lumps[3].compressed);
    // no Jaguar encoder, graphics stay raw
    assert!(!wad.lumps[4].compressed);
    let packed = wad.write();
    let mut wad = Wad::parse(&packed).expect("parse failed");
    wad.expand_all().expect("expansion failed");
    assert_eq!(wad.write(),plain);
}

#[test]
fn lump_alignment() {
    let buf = sample_wad().write();
    let parsed = Wad::parse(&buf).expect("parse failed");
    let dir_ofs = u32::from_le_bytes(buf[8..12].try_into().unwrap()) as usize;
    assert_eq!(dir_ofs % 4,0);
    for i in 0..parsed.lumps.len() {
        let e = dir_ofs + i*16;
        let filepos = u32::from_le_bytes(buf[e..e+4].try_into().unwrap());
        assert_eq!(filepos % 4,0);
    }
}

#[test]
fn rejects_garbage() {
    assert!(matches!(Wad::parse(b"WAD2"),Err(Error::FileFormatMismatch)));
    assert!(matches!(
        Wad::parse(b"IWAD\xff\xff\xff\xff\x0c\x00\x00\x00"),
        Err(Error::BadDirectory)
    ));
}
