//! Information about the running system: which platform it is, what is mounted
//! where, and whether the ZFS kernel module is loaded.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use zfscmds::system::System;
//! let system = System::detect().unwrap();
//! if let Some(dataset) = system.dataset_for_mountpoint("/home").unwrap() {
//!     println!("/home is {dataset}");
//! }
//! ```
use crate::{
    command::{MainCommand, ZfsCommand},
    config::Config,
    error::{Result, ZfsError},
    executor::{BoxedExecutor, HostExecutor, Output},
    util::ZFS_FSTYPE,
    zfs::Zfs,
    zpool::Zpool,
};
use nix::sys::utsname::uname;
use std::{fmt, fs, io, path::PathBuf};

mod freebsd;
mod linux;

pub use freebsd::parse_mount_p;
pub use linux::{parse_proc_modules, parse_proc_mounts};

/// Supported platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    FreeBsd,
}

impl Platform {
    /// Platform for a `uname -s` style system name.
    pub fn from_sysname(sysname: &str) -> Option<Self> {
        match sysname {
            "Linux" => Some(Self::Linux),
            "FreeBSD" => Some(Self::FreeBsd),
            _ => None,
        }
    }

    /// Platform of the running kernel.
    ///
    /// # Errors
    ///
    /// - [`ZfsError::UnsupportedPlatform`] if it's neither Linux nor FreeBSD
    pub fn detect() -> Result<Self> {
        let uts = uname().map_err(|e| ZfsError::unavailable("uname", io::Error::from(e)))?;
        let sysname = uts.sysname().to_string_lossy();
        let platform = Self::from_sysname(&sysname)
            .ok_or_else(|| ZfsError::UnsupportedPlatform(sysname.to_string()))?;
        log::debug!("detected platform {platform}");
        Ok(platform)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Linux => "Linux",
            Self::FreeBsd => "FreeBSD",
        })
    }
}

/// One row of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Dataset name for ZFS, otherwise usually a device.
    pub source: String,

    /// Where it's mounted, with escapes decoded.
    pub mountpoint: String,

    /// Filesystem type, such as `zfs`.
    pub fstype: String,

    /// Mount options, such as `rw`.
    pub options: Vec<String>,
}

impl MountEntry {
    pub fn is_zfs(&self) -> bool {
        self.fstype == ZFS_FSTYPE
    }
}

/// The running system, as seen through one platforms mount table and module
/// list.
///
/// Select this once with [`System::detect`] and pass it where needed.
#[derive(Clone)]
pub struct System {
    platform: Platform,
    config: Config,
    executor: BoxedExecutor,
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("platform", &self.platform)
            .field("config", &self.config)
            .finish()
    }
}

impl System {
    pub fn new(platform: Platform, config: Config) -> Self {
        Self::with_executor(platform, config, HostExecutor::new().as_executor())
    }

    /// `executor` runs every command, `mount` and `sysctl` included.
    pub fn with_executor(platform: Platform, config: Config, executor: BoxedExecutor) -> Self {
        Self {
            platform,
            config,
            executor,
        }
    }

    /// The running system, configured from the environment.
    ///
    /// See [`Config::from_env`]
    pub fn detect() -> Result<Self> {
        Ok(Self::new(Platform::detect()?, Config::from_env()))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `zfs` using this systems configuration.
    pub fn zfs(&self) -> Zfs {
        Zfs::with_executor(self.config.clone(), self.executor.clone())
    }

    /// `zpool` using this systems configuration.
    pub fn zpool(&self) -> Zpool {
        Zpool::with_executor(self.config.clone(), self.executor.clone())
    }

    /// Current mount table, read fresh every call.
    ///
    /// # Errors
    ///
    /// - [`ZfsError::Unavailable`] if the table can't be read.
    pub fn mount_table(&self) -> Result<Vec<MountEntry>> {
        match self.platform {
            Platform::Linux => {
                let path = &self.config.mounts_path;
                let table = fs::read_to_string(path)
                    .map_err(|e| ZfsError::unavailable(path.display(), e))?;
                Ok(parse_proc_mounts(&table))
            }
            Platform::FreeBsd => {
                let out = self.execute(&ZfsCommand::tool(MainCommand::Mount).flag("-p"))?;
                if !out.is_success() {
                    return Err(ZfsError::unavailable(
                        self.config.mount.display(),
                        io::Error::new(io::ErrorKind::Other, out.stderr.trim().to_owned()),
                    ));
                }
                Ok(parse_mount_p(&out.stdout))
            }
        }
    }

    /// ZFS dataset mounted exactly at `mountpoint`.
    ///
    /// The first matching ZFS entry wins. Non-ZFS mounts are ignored.
    pub fn dataset_for_mountpoint(&self, mountpoint: &str) -> Result<Option<String>> {
        Ok(self
            .mount_table()?
            .into_iter()
            .find(|e| e.is_zfs() && e.mountpoint == mountpoint)
            .map(|e| e.source))
    }

    /// Where the ZFS `dataset` is mounted.
    pub fn mountpoint_for_dataset(&self, dataset: &str) -> Result<Option<PathBuf>> {
        Ok(self
            .mount_table()?
            .into_iter()
            .find(|e| e.is_zfs() && e.source == dataset)
            .map(|e| PathBuf::from(e.mountpoint)))
    }

    /// Whether the ZFS kernel module is loaded.
    ///
    /// # Errors
    ///
    /// - [`ZfsError::Unavailable`] if the module list or `sysctl` is.
    pub fn zfs_module_loaded(&self) -> Result<bool> {
        match self.platform {
            Platform::Linux => {
                let path = &self.config.modules_path;
                let modules = fs::read_to_string(path)
                    .map_err(|e| ZfsError::unavailable(path.display(), e))?;
                let loaded = parse_proc_modules(&modules).any(|m| m == "zfs");
                Ok(loaded)
            }
            Platform::FreeBsd => {
                let cmd = ZfsCommand::tool(MainCommand::Sysctl).target("vfs.zfs.version.spa");
                Ok(self.execute(&cmd)?.is_success())
            }
        }
    }

    /// Run `command`, returning its output whatever the exit code.
    fn execute(&self, command: &ZfsCommand) -> Result<Output> {
        let program = command.main_command().program(&self.config);
        self.executor.execute(program, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{executor::tests::write_script, fakes::FakeExecutor};
    use std::sync::Arc;
    use tempfile::TempDir;

    const PROC_MOUNTS: &str = "\
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
rpool/ROOT/ubuntu / zfs rw,relatime,xattr,posixacl 0 0
/dev/sda1 /boot/efi vfat rw,relatime 0 0
rpool/data /data zfs rw,relatime 0 0
rpool/data2 /data2 zfs rw,relatime 0 0
rpool/home/alice /home/alice\\040smith zfs rw,relatime 0 0
tmpfs /mnt/tmp tmpfs rw 0 0
";

    fn linux_system(mounts: &str, modules: &str) -> (System, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            mounts_path: dir.path().join("mounts"),
            modules_path: dir.path().join("modules"),
            ..Config::default()
        };
        fs::write(&config.mounts_path, mounts).unwrap();
        fs::write(&config.modules_path, modules).unwrap();
        (System::new(Platform::Linux, config), dir)
    }

    #[test]
    fn platform_names() {
        assert_eq!(Platform::from_sysname("Linux"), Some(Platform::Linux));
        assert_eq!(Platform::from_sysname("FreeBSD"), Some(Platform::FreeBsd));
        assert_eq!(Platform::from_sysname("Darwin"), None);
        assert_eq!(Platform::FreeBsd.to_string(), "FreeBSD");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn detect_linux() -> anyhow::Result<()> {
        assert_eq!(Platform::detect()?, Platform::Linux);
        Ok(())
    }

    #[test]
    fn linux_dataset_for_mountpoint() -> anyhow::Result<()> {
        let (system, _dir) = linux_system(PROC_MOUNTS, "");
        assert_eq!(system.dataset_for_mountpoint("/")?.as_deref(), Some("rpool/ROOT/ubuntu"));
        assert_eq!(system.dataset_for_mountpoint("/data")?.as_deref(), Some("rpool/data"));
        assert_eq!(
            system.dataset_for_mountpoint("/home/alice smith")?.as_deref(),
            Some("rpool/home/alice")
        );
        assert_eq!(system.dataset_for_mountpoint("/dat")?, None);
        assert_eq!(system.dataset_for_mountpoint("/boot/efi")?, None);
        assert_eq!(system.dataset_for_mountpoint("/home/alice")?, None);
        Ok(())
    }

    #[test]
    fn linux_mountpoint_for_dataset() -> anyhow::Result<()> {
        let (system, _dir) = linux_system(PROC_MOUNTS, "");
        assert_eq!(
            system.mountpoint_for_dataset("rpool/data")?,
            Some(PathBuf::from("/data"))
        );
        assert_eq!(
            system.mountpoint_for_dataset("rpool/home/alice")?,
            Some(PathBuf::from("/home/alice smith"))
        );
        assert_eq!(system.mountpoint_for_dataset("rpool/dat")?, None);
        assert_eq!(system.mountpoint_for_dataset("tmpfs")?, None);
        Ok(())
    }

    #[test]
    fn resolution_is_repeatable_and_first_wins() -> anyhow::Result<()> {
        let mounts = "a/one /x zfs rw 0 0\na/two /x zfs rw 0 0\n";
        let (system, _dir) = linux_system(mounts, "");
        let first = system.dataset_for_mountpoint("/x")?;
        assert_eq!(first.as_deref(), Some("a/one"));
        assert_eq!(system.dataset_for_mountpoint("/x")?, first);
        Ok(())
    }

    #[test]
    fn metacharacters_match_literally() -> anyhow::Result<()> {
        let mounts = "pool/a.b /mnt/a.b zfs rw 0 0\npool/a+b /mnt/(x)* zfs rw 0 0\n";
        let (system, _dir) = linux_system(mounts, "");
        assert_eq!(system.dataset_for_mountpoint("/mnt/a?b")?, None);
        assert_eq!(system.dataset_for_mountpoint("/mnt/(x)*")?.as_deref(), Some("pool/a+b"));
        assert_eq!(system.mountpoint_for_dataset("pool/a.b")?, Some("/mnt/a.b".into()));
        Ok(())
    }

    #[test]
    fn missing_table_is_unavailable() {
        let config = Config {
            mounts_path: "/nonexistent/mounts".into(),
            modules_path: "/nonexistent/modules".into(),
            ..Config::default()
        };
        let system = System::new(Platform::Linux, config);
        assert!(matches!(
            system.dataset_for_mountpoint("/"),
            Err(ZfsError::Unavailable { .. })
        ));
        assert!(matches!(system.zfs_module_loaded(), Err(ZfsError::Unavailable { .. })));
    }

    #[test]
    fn linux_module_loaded() -> anyhow::Result<()> {
        let (system, _dir) = linux_system(
            "",
            "zfs 3907584 6 - Live 0x0000000000000000 (POE)\nspl 118784 1 zfs, Live 0x0000000000000000 (OE)\n",
        );
        assert!(system.zfs_module_loaded()?);

        let (system, _dir) = linux_system("", "zfs_extra 1 0 - Live 0x0\nspl 1 0 - Live 0x0\n");
        assert!(!system.zfs_module_loaded()?);
        Ok(())
    }

    fn freebsd_system(dir: &TempDir, mount_body: &str) -> System {
        let config = Config {
            mount: write_script(dir, "mount", mount_body),
            ..Config::default()
        };
        System::new(Platform::FreeBsd, config)
    }

    #[test]
    fn freebsd_mount_table() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mount = r#"[ "$1" = "-p" ] || exit 64
printf 'zroot/ROOT/default\t/\tzfs\trw\t0\t0\n'
printf 'devfs\t/dev\tdevfs\trw\t0\t0\n'
printf 'zroot/media\t/mnt/My Media\tzfs\trw,noatime\t0\t0\n'"#;
        let system = freebsd_system(&dir, mount);

        assert_eq!(system.dataset_for_mountpoint("/")?.as_deref(), Some("zroot/ROOT/default"));
        assert_eq!(
            system.dataset_for_mountpoint("/mnt/My Media")?.as_deref(),
            Some("zroot/media")
        );
        assert_eq!(system.dataset_for_mountpoint("/dev")?, None);
        assert_eq!(
            system.mountpoint_for_dataset("zroot/media")?,
            Some(PathBuf::from("/mnt/My Media"))
        );
        Ok(())
    }

    fn fake_freebsd(handler: fn(&ZfsCommand) -> Output) -> (System, Arc<FakeExecutor>) {
        let fake = FakeExecutor::new();
        fake.set_handler(handler);
        let system = System::with_executor(
            Platform::FreeBsd,
            Config::default(),
            fake.clone().as_executor(),
        );
        (system, fake)
    }

    #[test]
    fn freebsd_mount_goes_through_executor() -> anyhow::Result<()> {
        let (system, fake) =
            fake_freebsd(|_| Output::with_stdout("zroot/ROOT/default\t/\tzfs\trw\t0\t0\n"));
        assert_eq!(system.dataset_for_mountpoint("/")?.as_deref(), Some("zroot/ROOT/default"));
        assert_eq!(fake.programs(), ["mount"]);
        assert_eq!(fake.args(), [vec!["-p"]]);
        Ok(())
    }

    #[test]
    fn freebsd_failing_mount_is_unavailable() {
        let (system, _fake) = fake_freebsd(|_| Output::failure(1, "broken\n"));
        assert!(matches!(system.mount_table(), Err(ZfsError::Unavailable { .. })));
    }

    #[test]
    fn freebsd_module_loaded() -> anyhow::Result<()> {
        let (system, fake) = fake_freebsd(|cmd| {
            if cmd.targets() == ["vfs.zfs.version.spa"] {
                Output::with_stdout("5000\n")
            } else {
                Output::failure(1, "unknown oid\n")
            }
        });
        assert!(system.zfs_module_loaded()?);
        assert_eq!(fake.programs(), ["sysctl"]);

        let (system, _fake) = fake_freebsd(|_| Output::failure(1, "unknown oid\n"));
        assert!(!system.zfs_module_loaded()?);
        Ok(())
    }
}
