use clap::{ArgGroup, Parser};
use prettysize::size_tool::{SizeCommand, SizeTool, SysvSizes};
use prettysize::{linker, Config, Report, Result};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "prettysize",
    version,
    about = "format the output of size in a friendly usable way",
    group(ArgGroup::new("layout").required(true).args(["config", "linker"]))
)]
struct Args {
    /// path to the JSON memory layout config (pre-generated with -g)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// path to the linkerscript to use for calculations
    #[arg(short, long, value_name = "LINKER")]
    linker: Option<PathBuf>,

    /// generate a JSON config from the linkerscript instead of a report
    #[arg(short = 'g', long, requires = "linker", conflicts_with = "config")]
    gen_config: bool,

    /// the path to the 'size' command
    #[arg(short, long, default_value = "size")]
    size: String,

    /// prints the output of size as well
    #[arg(short, long)]
    verbose: bool,

    /// show all memory regions (including unused)
    #[arg(short = 'a', long)]
    show_all: bool,

    /// do not abbreviate byte counts into human-readable format
    #[arg(short = 'N', long)]
    no_abbrev: bool,

    /// the width of the bargraph, in characters
    #[arg(short, long, default_value_t = 10)]
    width: usize,

    /// the file to process
    file: PathBuf,
}

fn load_layout(args: &Args) -> Result<Config> {
    match (&args.config, &args.linker) {
        (Some(path), None) => Config::from_json_file(path),
        (None, Some(path)) => linker::parse(&std::fs::read_to_string(path)?),
        // clap enforces exactly one source flag
        _ => unreachable!("argument group guarantees one layout source"),
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_layout(args)?;

    if args.gen_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let tool = SizeCommand::new(&args.size);
    let output = tool.measure(&args.file)?;
    if args.verbose {
        println!("{output}");
        let rule = output.lines().map(str::len).max().unwrap_or(0);
        println!("{}", "-".repeat(rule));
    }

    let sizes = SysvSizes::parse(&output)?;
    let mut report = Report::new(config.usage(&sizes));
    report.width = args.width;
    report.abbreviated = !args.no_abbrev;
    report.show_all = args.show_all;
    println!("{report}");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("prettysize: {e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
