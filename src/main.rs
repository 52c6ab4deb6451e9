use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use numeric_output_checker::{CheckError, CheckerConfig, Host, NumericOutputChecker, OutputChecker};

/// Compare expected and actual example output the way a doctest runner would.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// File with the expected output (`-` for stdin)
    want: PathBuf,
    /// File with the actual output (`-` for stdin)
    got: PathBuf,
    /// Option directive, e.g. "+FLOAT_CMP +FIX +ELLIPSIS"
    #[arg(short, long, default_value = "")]
    options: String,
    /// JSON checker configuration (tolerances, boundaries, markers)
    #[arg(long)]
    config: Option<PathBuf>,
    /// More logging; repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only report through the exit status
    #[arg(short, long)]
    quiet: bool,
}

fn read_input(path: &Path) -> Result<String, CheckError> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn run(args: &Args) -> Result<bool, CheckError> {
    if args.want.as_path() == Path::new("-") && args.got.as_path() == Path::new("-") {
        return Err(CheckError::Parse("only one input may be read from stdin".into()));
    }

    let config = match &args.config {
        Some(path) => CheckerConfig::from_path(path)?,
        None => CheckerConfig::default(),
    };
    let checker = NumericOutputChecker::with_config(config)?;
    let flags = checker.options(&args.options)?;
    tracing::debug!(options = ?checker.host().registry().names_of(flags), "comparing");

    let want = read_input(&args.want)?;
    let got = read_input(&args.got)?;

    if checker.check_output(&want, &got, flags) {
        if !args.quiet {
            println!("ok");
        }
        return Ok(true);
    }
    if !args.quiet {
        print!("{}", checker.output_difference(&want, &got, flags));
    }
    Ok(false)
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    let level = match (args.quiet, args.verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::WARN,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    }
}
