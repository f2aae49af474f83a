use clap::{arg,crate_version,Command};
use wad64::wad::Wad;

const RCH: &str = "unreachable was reached";

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    let long_help =
"Examples:
---------
Expand:        `wad64 expand -i DOOM64.WAD -o DOOM64_decomp.WAD`
Compress:      `wad64 compress -i DOOM64_decomp.WAD -o DOOM64_comp.WAD`
Pad:           `wad64 pad -i DOOM64.WAD -o DOOM64_pad.WAD`";

    let mut main_cmd = Command::new("wad64")
        .about("Compress and expand Doom 64 WAD archives")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!(-v --verbose "show per-lump activity").global(true));
    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("decompress every compressed lump"));
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("compress every eligible lump"));
    main_cmd = main_cmd.subcommand(Command::new("pad")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("realign lump data to four-byte boundaries"));

    let matches = main_cmd.get_matches();

    let level = match matches.get_flag("verbose") {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut wad = Wad::parse(&std::fs::read(path_in)?)?;
        wad.expand_all()?;
        std::fs::write(path_out,wad.write())?;
    }

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let mut wad = Wad::parse(&std::fs::read(path_in)?)?;
        wad.compress_all();
        std::fs::write(path_out,wad.write())?;
    }

    if let Some(cmd) = matches.subcommand_matches("pad") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let wad = Wad::parse(&std::fs::read(path_in)?)?;
        std::fs::write(path_out,wad.write())?;
    }

    Ok(())
}
