//! Where to find the tools and tables this crate reads.
use crate::util::{MOUNT_BIN, PROC_MODULES, PROC_MOUNTS, SYSCTL_BIN, ZFS_BIN, ZPOOL_BIN};
use std::{env, path::PathBuf};

/// Environment variable overriding [`Config::zfs`]
pub const ZFS_ENV: &str = "ZFSCMDS_ZFS";

/// Environment variable overriding [`Config::zpool`]
pub const ZPOOL_ENV: &str = "ZFSCMDS_ZPOOL";

/// Environment variable overriding [`Config::mount`]
pub const MOUNT_ENV: &str = "ZFSCMDS_MOUNT";

/// Environment variable overriding [`Config::sysctl`]
pub const SYSCTL_ENV: &str = "ZFSCMDS_SYSCTL";

/// Environment variable overriding [`Config::mounts_path`]
pub const MOUNTS_PATH_ENV: &str = "ZFSCMDS_MOUNTS_PATH";

/// Environment variable overriding [`Config::modules_path`]
pub const MODULES_PATH_ENV: &str = "ZFSCMDS_MODULES_PATH";

/// Paths to external binaries and kernel tables.
///
/// Bare names are looked up in `PATH` when executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The `zfs` binary
    pub zfs: PathBuf,

    /// The `zpool` binary
    pub zpool: PathBuf,

    /// The `mount` binary, FreeBSD only.
    pub mount: PathBuf,

    /// The `sysctl` binary, FreeBSD only.
    pub sysctl: PathBuf,

    /// The mount table, Linux only.
    pub mounts_path: PathBuf,

    /// The loaded module list, Linux only.
    pub modules_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zfs: ZFS_BIN.into(),
            zpool: ZPOOL_BIN.into(),
            mount: MOUNT_BIN.into(),
            sysctl: SYSCTL_BIN.into(),
            mounts_path: PROC_MOUNTS.into(),
            modules_path: PROC_MODULES.into(),
        }
    }
}

impl Config {
    /// The defaults, with any `ZFSCMDS_*` environment overrides applied.
    ///
    /// Empty values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for (key, field) in [
            (ZFS_ENV, &mut config.zfs),
            (ZPOOL_ENV, &mut config.zpool),
            (MOUNT_ENV, &mut config.mount),
            (SYSCTL_ENV, &mut config.sysctl),
            (MOUNTS_PATH_ENV, &mut config.mounts_path),
            (MODULES_PATH_ENV, &mut config.modules_path),
        ] {
            if let Some(value) = env_override(key) {
                log::debug!("{key} overrides {} with {}", field.display(), value.display());
                *field = value;
            }
        }
        config
    }
}

fn env_override(key: &str) -> Option<PathBuf> {
    let value = env::var_os(key)?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(value))
}
