use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "rgma")]
#[command(version)]
#[command(about = "A Rust GMA addon extractor with HTTP URL support", long_about = None)]
#[command(after_help = "Examples:\n  \
  rgma addon.gma -d out          extract all files of addon.gma into out/\n  \
  rgma -p addon.gma lua/init.lua send one file's contents to stdout\n  \
  rgma -v https://example.com/addon.gma   show metadata and files of a remote addon")]
pub struct Cli {
    /// GMA file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to send to stdout in pipe mode (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with addon metadata
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Refuse entries that would land outside the extraction directory
    #[arg(long = "confine")]
    pub confine: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter; `RUST_LOG` takes precedence.
    pub fn log_filter(&self) -> &'static str {
        if self.is_very_quiet() {
            "error"
        } else if self.is_quiet() {
            "warn"
        } else {
            "info"
        }
    }
}
