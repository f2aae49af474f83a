use assert_cmd::prelude::*; // Add methods on commands
use std::path::PathBuf;
use std::process::Command; // Run programs
use tempfile;
use wad64::wad::{Lump,Wad};
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// A small archive with one lump for each codec path: a texture and a map
/// (adaptive-tree codec), a graphic (Jaguar codec, never re-encoded), and
/// the marker lumps that separate the regions.
fn sample_wad() -> Wad {
    let mut wad = Wad::create();
    wad.lumps.push(Lump::marker("S_START"));
    wad.lumps.push(Lump::create("SARGA1",b"sprite pixels that stay raw".to_vec()));
    wad.lumps.push(Lump::marker("S_END"));
    wad.lumps.push(Lump::marker("T_START"));
    wad.lumps.push(Lump::create("CASFL98",b"speckled firewall ".repeat(40)));
    wad.lumps.push(Lump::marker("T_END"));
    let mut map = Vec::new();
    for i in 0..600u32 {
        map.extend_from_slice(&(i % 31).to_le_bytes());
    }
    wad.lumps.push(Lump::create("MAP01",map));
    wad.lumps.push(Lump::marker("ENDOFWAD"));
    wad
}

fn run(subcommand: &str,path_in: &PathBuf,path_out: &PathBuf) -> STDRESULT {
    let mut cmd = Command::cargo_bin("wad64")?;
    cmd.arg(subcommand)
        .arg("-i").arg(path_in)
        .arg("-o").arg(path_out)
        .assert()
        .success();
    Ok(())
}

#[test]
fn compress_expand_invertibility() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let plain_path = temp_dir.path().join("plain.wad");
    let packed_path = temp_dir.path().join("packed.wad");
    let out_path = temp_dir.path().join("round.wad");
    std::fs::write(&plain_path,sample_wad().write())?;
    run("compress",&plain_path,&packed_path)?;
    run("expand",&packed_path,&out_path)?;
    let plain = std::fs::read(&plain_path)?;
    let round = std::fs::read(&out_path)?;
    assert_eq!(plain,round);
    Ok(())
}

#[test]
fn compression_marks_lumps() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let plain_path = temp_dir.path().join("plain.wad");
    let packed_path = temp_dir.path().join("packed.wad");
    std::fs::write(&plain_path,sample_wad().write())?;
    run("compress",&plain_path,&packed_path)?;
    let packed = Wad::parse(&std::fs::read(&packed_path)?)?;
    let by_name = |name: &str| {
        packed.lumps.iter().find(|l| l.display_name() == name).unwrap()
    };
    assert!(by_name("CASFL98").compressed);
    assert!(by_name("MAP01").compressed);
    assert!(!by_name("SARGA1").compressed);
    assert!(by_name("CASFL98").data.len() < by_name("CASFL98").size as usize);
    Ok(())
}

#[test]
fn padding_aligns_lumps() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("unaligned.wad");
    let out_path = temp_dir.path().join("aligned.wad");
    // hand-built archive with a 3-byte lump and an unaligned directory
    let mut buf = Vec::new();
    buf.extend_from_slice(b"IWAD");
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&15u32.to_le_bytes());
    buf.extend_from_slice(b"abc");
    buf.extend_from_slice(&12u32.to_le_bytes());
    buf.extend_from_slice(&3u32.to_le_bytes());
    buf.extend_from_slice(b"DATA\0\0\0\0");
    std::fs::write(&in_path,&buf)?;
    run("pad",&in_path,&out_path)?;
    let aligned = std::fs::read(&out_path)?;
    let dir_ofs = u32::from_le_bytes(aligned[8..12].try_into().unwrap()) as usize;
    assert_eq!(dir_ofs % 4,0);
    assert_eq!(dir_ofs,16);
    let parsed = Wad::parse(&aligned)?;
    assert_eq!(parsed.lumps[0].data,b"abc".to_vec());
    Ok(())
}
