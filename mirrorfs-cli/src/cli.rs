/*!
The `cli` module provides the data type used for parsing the command line
arguments this binary accepts.
*/

use std::path::PathBuf;
use structopt::StructOpt;

/// Struct for holding the options the user has selected.
#[derive(Debug, StructOpt)]
#[structopt(
    name = "mirrorfs",
    about = "Read-only, persistently-caching mirror filesystem",
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Opt {
    /// Directory the cache is stored in. Created if it does not exist.
    #[structopt(long = "cache-dir")]
    pub cache_dir: PathBuf,
    /// Directory being mirrored; the origin root.
    #[structopt(long = "target-dir")]
    pub target_dir: PathBuf,
    /// Where to mount the filesystem.
    #[structopt(name = "MOUNTPOINT")]
    pub mountpoint: PathBuf,
    /// Run in the foreground instead of daemonizing.
    #[structopt(short = "d", long = "debug")]
    pub debug: bool,
    /// Raises log verbosity; repeatable. Overridden by RUST_LOG if set.
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    pub verbose: u8,
    /// Name of the control-surface root directory, mirrored alongside the
    /// origin tree.
    #[structopt(long = "control-name", default_value = ".control")]
    pub control_name: String,
}

impl Opt {
    /// The default log level implied by `-v`/`-d` when `RUST_LOG` is unset.
    pub fn default_log_directive(&self) -> &'static str {
        match self.verbose {
            0 if self.debug => "mirrorfs=debug",
            0 => "mirrorfs=info",
            1 => "mirrorfs=debug",
            _ => "mirrorfs=trace",
        }
    }
}
