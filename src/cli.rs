use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "runpad", about = "Terminal code editor backed by a remote execution service", version)]
#[command(group(ArgGroup::new("mode").args(["run", "list_languages", "template", "health"]).multiple(false)))]
pub struct Cli {
    /// Source file to open in the editor.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Language key (python, c, cpp, java, javascript, go, rust, php).
    ///
    /// Defaults to the file extension, then DEFAULT_LANGUAGE.
    #[arg(short = 'l', long = "lang")]
    pub lang: Option<String>,

    /// Execute FILE once without opening the editor and print the result.
    #[arg(short = 'r', long, value_name = "FILE")]
    pub run: Option<PathBuf>,

    /// Standard input passed to the program in --run mode.
    #[arg(long, default_value = "")]
    pub stdin: String,

    /// Base URL of the execution service (overrides API_URL).
    #[arg(long = "api-url")]
    pub api_url: Option<String>,

    /// List supported languages.
    #[arg(long = "list-languages", visible_alias = "ll")]
    pub list_languages: bool,

    /// Print the starter template for a language.
    #[arg(long, value_name = "LANG")]
    pub template: Option<String>,

    /// Query the execution service health endpoint.
    #[arg(long)]
    pub health: bool,

    /// Log verbosity (overrides RUNPAD_LOG).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevel>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Whether this invocation opens the interactive editor.
    pub fn is_editor(&self) -> bool {
        self.run.is_none() && !self.list_languages && self.template.is_none() && !self.health
    }
}
