use clap::Parser;
use clap_num::maybe_hex;
use lazy_static::lazy_static;

#[derive(Parser, Debug)]
#[command(author,version,about,long_about=None)]
pub struct Args {
    /// Program file to load (.prog/.prg, .bas, .hex/.dmp)
    pub file: String,

    /// Disassemble the address range START END (END exclusive; hex ok with '0x')
    #[arg(short, long, num_args = 2, value_names = ["START", "END"], value_parser=maybe_hex::<u32>)]
    pub disasm: Option<Vec<u32>>,

    /// Disassemble every binary region of the loaded program
    #[arg(short, long)]
    pub list: bool,

    /// Save the loaded program to this file (format chosen by extension)
    #[arg(short, long)]
    pub output: Option<String>,

    /// PROG container version to write (1 or 2)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=2))]
    pub prog_version: u32,

    /// Set the top RAM address (BASIC programs may not grow past it)
    #[arg(long,value_parser=maybe_hex::<u16>, default_value_t=0x7fff_u16)]
    pub ram_top: u16,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

lazy_static! {
    pub static ref ARGS: Args = if cfg!(test) {
        // manually set parameters for running tests
        Args::parse_from(["test", "test"])
    } else {
        Args::parse()
    };
}

pub fn init() { lazy_static::initialize(&ARGS) }
pub fn disasm_window() -> Option<(u32, u32)> {
    ARGS.disasm
        .as_ref()
        .and_then(|v| if v.len() == 2 { Some((v[0], v[1])) } else { None })
}
