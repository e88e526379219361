//! Command-line flags and their merge with `pyaot.toml`.

use clap::Parser as ClapParser;
use std::path::PathBuf;

use crate::config::PyaotConfig;
use crate::driver::{default_output, parse_opt_level, BuildRequest, DriverError};

#[derive(ClapParser, Debug)]
#[command(
    name = "pyaot",
    version,
    about = "Compile an annotated Python subset to a native object file"
)]
pub struct Cli {
    /// Path to the .py source file
    #[arg()]
    pub input: PathBuf,

    /// Output object file (default: input path with a .o extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the parsed syntax tree
    #[arg(long)]
    pub show_syntax: bool,

    /// Print the translated IR
    #[arg(long)]
    pub show_ir: bool,

    /// Print the Cranelift IR of every function
    #[arg(long)]
    pub show_clif: bool,

    /// Print every intermediate form
    #[arg(long)]
    pub show_all: bool,

    /// Print the syntax tree and IR as JSON
    #[arg(long)]
    pub json: bool,

    /// Target triple (default: host)
    #[arg(long)]
    pub target: Option<String>,

    /// Cranelift optimisation level: none, speed or speed_and_size
    #[arg(long)]
    pub opt_level: Option<String>,

    /// Config file (default: nearest pyaot.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Flags win over config values.
    pub fn into_request(self, config: &PyaotConfig) -> Result<BuildRequest, DriverError> {
        let diag = &config.diagnostics;
        let output = match self.output {
            Some(path) => path,
            None => default_output(&self.input, config.build.output_dir.as_deref()),
        };
        let opt_level = match self.opt_level.as_deref().or(config.build.opt_level.as_deref()) {
            Some(level) => parse_opt_level(level)?,
            None => Default::default(),
        };
        Ok(BuildRequest {
            input: self.input,
            output,
            show_syntax: self.show_syntax || self.show_all || diag.show_syntax,
            show_ir: self.show_ir || self.show_all || diag.show_ir,
            show_clif: self.show_clif || self.show_all || diag.show_clif,
            json: self.json || diag.json,
            target: self.target.or_else(|| config.build.target.clone()),
            opt_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyaot_codegen::OptLevel;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pyaot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn show_all_enables_every_dump() {
        let req = cli(&["prog.py", "--show-all"]).into_request(&PyaotConfig::default()).unwrap();
        assert!(req.show_syntax && req.show_ir && req.show_clif);
        assert!(!req.json);
        assert_eq!(req.output, PathBuf::from("prog.o"));
    }

    #[test]
    fn flags_override_config() {
        let config = PyaotConfig::parse(
            "[build]\nopt_level = \"none\"\ntarget = \"aarch64-unknown-linux-gnu\"\noutput_dir = \"out\"\n",
        )
        .unwrap();
        let req = cli(&["prog.py", "--opt-level", "speed_and_size"]).into_request(&config).unwrap();
        assert_eq!(req.opt_level, OptLevel::SpeedAndSize);
        assert_eq!(req.target.as_deref(), Some("aarch64-unknown-linux-gnu"));
        assert_eq!(req.output, PathBuf::from("out/prog.o"));

        let req = cli(&["prog.py", "-o", "x.o"]).into_request(&config).unwrap();
        assert_eq!(req.opt_level, OptLevel::None);
        assert_eq!(req.output, PathBuf::from("x.o"));
    }

    #[test]
    fn config_diagnostics_apply() {
        let config = PyaotConfig::parse("[diagnostics]\nshow_ir = true\njson = true\n").unwrap();
        let req = cli(&["prog.py"]).into_request(&config).unwrap();
        assert!(req.show_ir && req.json);
        assert!(!req.show_clif);
    }

    #[test]
    fn verbosity_counts() {
        assert_eq!(cli(&["prog.py", "-vv"]).verbose, 2);
    }

    #[test]
    fn bad_opt_level_rejected() {
        let err = cli(&["prog.py", "--opt-level", "max"]).into_request(&PyaotConfig::default());
        assert!(matches!(err, Err(DriverError::InvalidOptLevel(_))));
    }
}
