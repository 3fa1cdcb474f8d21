use std::path::PathBuf;

use clap::Parser;
use uxsd::CompileOptions;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// The schema file
    pub input: PathBuf,

    /// Where to write the generated parser (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Allow a XML Document Type Definition (DTD) to occur
    #[arg(long)]
    pub allow_dtd: bool,

    /// Largest finite maxOccurs that is unrolled into automaton states
    #[arg(long, default_value_t = CompileOptions::DEFAULT_MAX_UNROLLED_OCCURS)]
    pub max_unrolled_occurs: u64,

    /// Only check whether the output is up to date with the schema; exit with 1 if it is not
    #[arg(long, requires = "output")]
    pub check: bool,

    /// Also write the automaton of every type as Graphviz files into this directory
    #[arg(long, value_name = "DIR")]
    pub dot: Option<PathBuf>,

    /// Log more (repeat for even more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            max_unrolled_occurs: self.max_unrolled_occurs,
        }
    }
}
