//! Pyaot CLI: compile one annotated Python file to a native object file.

use clap::Parser as ClapParser;
use env_logger::Env;
use log::LevelFilter;

use pyaot_cli::cli::Cli;
use pyaot_cli::colors::{gray, red, status_label};
use pyaot_cli::config::PyaotConfig;
use pyaot_cli::driver;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp(None);
    let _ = builder.try_init();
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("{} {err}", red("error:"));
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = PyaotConfig::load(cli.config.as_deref()).unwrap_or_else(|e| fail(e));
    let request = cli.into_request(&config).unwrap_or_else(|e| fail(e));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match driver::run(&request, &mut out) {
        Ok(path) => eprintln!(
            "{} {} {}",
            status_label("Compiled"),
            request.input.display(),
            gray(&format!("-> {}", path.display()))
        ),
        Err(e) => fail(e),
    }
}
