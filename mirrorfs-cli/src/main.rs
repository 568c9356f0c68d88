/*!
The `mirrorfs` binary wires a `RealOrigin`, a `CacheEngine`, and the
`fuser`-based glue in [`fs`] together and mounts the result.
*/
mod cli;
mod errno;
mod fs;
mod inode;

use anyhow::{Context, Result};
use cli::Opt;
use fs::MirrorFs;
use fuser::MountOption;
use mirrorfs_core::{CacheEngine, RealOrigin};
use std::fs as stdfs;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(opt.default_log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    stdfs::create_dir_all(&opt.cache_dir)
        .with_context(|| format!("creating cache directory {:?}", opt.cache_dir))?;
    if !opt.target_dir.is_dir() {
        anyhow::bail!("target directory {:?} does not exist", opt.target_dir);
    }

    let origin = RealOrigin::new(opt.target_dir.clone());
    let engine = CacheEngine::new(opt.cache_dir.clone(), origin);
    let filesystem = MirrorFs::new(engine, opt.control_name.clone());

    let mut mount_options = vec![MountOption::RO, MountOption::FSName("mirrorfs".to_string())];
    if opt.debug {
        mount_options.push(MountOption::AutoUnmount);
    }

    // The engine relies on the mount being driven single-threaded;
    // `fuser::mount2` dispatches requests serially from the calling thread,
    // which gives us that for free.
    fuser::mount2(filesystem, &opt.mountpoint, &mount_options)
        .with_context(|| format!("mounting mirrorfs at {:?}", opt.mountpoint))?;

    Ok(())
}
