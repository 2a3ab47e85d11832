//! Interface to the `zfs` command.
//!
//! Every method validates its arguments before anything is executed, runs a
//! single `zfs` process and returns its standard output unparsed.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use zfscmds::{config::Config, zfs::*};
//! let zfs = Zfs::new(Config::default());
//!
//! zfs.create_dataset("pool/test1", &CreateOptions::default()).unwrap();
//! zfs.snapshot("pool/test1", "s1", &SnapshotOptions::default()).unwrap();
//! zfs.clone("pool/test1@s1", "pool/test2", &CloneOptions::default()).unwrap();
//! assert!(zfs.is_clone("pool/test2").unwrap());
//! ```
use crate::{
    command::{
        column_selection, depth_arg, list_arg, property_assignments, property_selection, require,
        require_each, ZfsCommand,
    },
    config::Config,
    error::{text::PROPERTY_EQUALS, Result, ZfsError},
    executor::{BoxedExecutor, HostExecutor},
};
use std::fmt;

/// Property assignments, passed as `-o name=value` in order.
pub type Properties = Vec<(String, String)>;

/// Dataset types understood by `-t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetType {
    Filesystem,
    Volume,
    Snapshot,
    Bookmark,
    All,
}

impl DatasetType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Volume => "volume",
            Self::Snapshot => "snapshot",
            Self::Bookmark => "bookmark",
            Self::All => "all",
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `zfs create` options for filesystems
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// `-p`
    pub create_parent: bool,

    /// `-u`, don't mount the new filesystem.
    pub unmounted: bool,

    pub properties: Properties,
}

/// `zfs create -V` options
#[derive(Debug, Clone, Default)]
pub struct VolumeOptions {
    /// `-p`
    pub create_parent: bool,

    /// `-s`, don't reserve space.
    pub sparse: bool,

    /// `-b`
    pub blocksize: Option<String>,

    pub properties: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// `-p`
    pub create_parent: bool,

    pub properties: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotOptions {
    /// `-r`, snapshot all descendent datasets too.
    pub recursive: bool,

    pub properties: Properties,
}

/// `zfs get` options
///
/// `scripting` defaults to true, everything else to off.
#[derive(Debug, Clone)]
pub struct GetOptions {
    /// `-r`
    pub recursive: bool,

    /// `-d`, must not be negative.
    pub depth: Option<i64>,

    /// `-H`
    pub scripting: bool,

    /// `-p`
    pub parsable: bool,

    /// `-o`, empty for the tools default. `"all"` must be alone.
    pub columns: Vec<String>,

    /// `-t`
    pub types: Vec<DatasetType>,

    /// `-s`, such as `local` or `inherited`.
    pub sources: Vec<String>,

    /// Properties to get, [`None`] for all of them.
    ///
    /// An empty list is rejected, as is `"all"` together with anything else.
    pub properties: Option<Vec<String>>,

    /// Extra environment for the `zfs` process.
    pub env: Vec<(String, String)>,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            depth: None,
            scripting: true,
            parsable: false,
            columns: Vec::new(),
            types: Vec::new(),
            sources: Vec::new(),
            properties: None,
            env: Vec::new(),
        }
    }
}

/// `zfs list` options
///
/// `scripting` defaults to true, everything else to off.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// `-r`
    pub recursive: bool,

    /// `-d`, must not be negative.
    pub depth: Option<i64>,

    /// `-H`
    pub scripting: bool,

    /// `-p`
    pub parsable: bool,

    /// `-o`
    pub columns: Vec<String>,

    /// `-t`
    pub types: Vec<DatasetType>,

    /// `-s`, one per property.
    pub sort_ascending: Vec<String>,

    /// `-S`, one per property.
    pub sort_descending: Vec<String>,

    /// Extra environment for the `zfs` process.
    pub env: Vec<(String, String)>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            depth: None,
            scripting: true,
            parsable: false,
            columns: Vec::new(),
            types: Vec::new(),
            sort_ascending: Vec::new(),
            sort_descending: Vec::new(),
            env: Vec::new(),
        }
    }
}

/// `zfs destroy` options for filesystems and volumes
#[derive(Debug, Clone, Default)]
pub struct DestroyOptions {
    /// `-r`
    pub recursive_children: bool,

    /// `-R`
    pub recursive_dependents: bool,

    /// `-f`
    pub force_unmount: bool,

    /// `-n`
    pub dry_run: bool,

    /// `-p`
    pub parsable: bool,

    /// `-v`
    pub verbose: bool,
}

/// `zfs destroy` options for snapshots
#[derive(Debug, Clone, Default)]
pub struct DestroySnapshotOptions {
    /// `-r`
    pub recursive_descendents: bool,

    /// `-R`
    pub recursive_clones: bool,

    /// `-n`
    pub dry_run: bool,

    /// `-p`
    pub parsable: bool,

    /// `-v`
    pub verbose: bool,

    /// `-d`, defer destruction while held or cloned.
    pub defer: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RollbackOptions {
    /// `-r`, destroy snapshots newer than the target.
    pub destroy_between: bool,

    /// `-R`, also destroy clones of those snapshots.
    pub destroy_more_recent: bool,

    /// `-f`
    pub force_unmount: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    /// `-p`
    pub create_parents: bool,

    /// `-u`
    pub dont_remount: bool,

    /// `-f`
    pub force_unmount: bool,

    /// `-r`, snapshots only.
    pub recursive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InheritOptions {
    /// `-r`
    pub recursive: bool,

    /// `-S`, revert to the received value.
    pub revert: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpgradeOptions {
    /// `-r`
    pub recursive: bool,

    /// `-V`
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    /// `-v`, report progress.
    pub verbose: bool,

    /// `-O`, overlay mount.
    pub overlay: bool,

    /// `-o`, temporary mount options.
    pub options: Vec<String>,
}

/// What `zfs upgrade` acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeTarget {
    /// `-a`
    All,
    Filesystem(String),
}

/// What `zfs mount` and `zfs unmount` act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountTarget {
    /// `-a`
    All,

    /// A filesystem, or for unmount also a mountpoint.
    Filesystem(String),
}

/// Wraps the `zfs` command.
///
/// Not [`Clone`], [`Zfs::clone`] is `zfs clone`. Build another handle with
/// [`Zfs::with_executor`] or [`crate::system::System::zfs`] instead.
pub struct Zfs {
    config: Config,
    executor: BoxedExecutor,
}

impl fmt::Debug for Zfs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zfs").field("config", &self.config).finish()
    }
}

impl Zfs {
    /// Run commands on this host.
    pub fn new(config: Config) -> Self {
        Self::with_executor(config, HostExecutor::new().as_executor())
    }

    /// Run commands through `executor`.
    pub fn with_executor(config: Config, executor: BoxedExecutor) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn run(&self, command: ZfsCommand) -> Result<String> {
        command.run(&self.config, self.executor.as_ref())
    }

    /// `zfs create [-pu] [-o property=value]... filesystem`
    ///
    /// # Errors
    ///
    /// - If `filesystem` or a property name is empty
    /// - If a property name contains `=`
    /// - If the command fails
    pub fn create_dataset(&self, filesystem: &str, opts: &CreateOptions) -> Result<String> {
        require(filesystem, "filesystem name")?;
        property_assignments(&opts.properties)?;
        self.run(
            ZfsCommand::zfs("create")
                .flag_if(opts.create_parent, "-p")
                .flag_if(opts.unmounted, "-u")
                .properties(&opts.properties)
                .target(filesystem),
        )
    }

    /// `zfs create [-ps] [-b blocksize] -V size [-o property=value]... volume`
    ///
    /// `size` is passed through as is, such as `"10G"`.
    pub fn create_volume(&self, volume: &str, size: &str, opts: &VolumeOptions) -> Result<String> {
        require(volume, "volume name")?;
        require(size, "volume size")?;
        property_assignments(&opts.properties)?;
        let mut cmd = ZfsCommand::zfs("create")
            .flag_if(opts.create_parent, "-p")
            .flag_if(opts.sparse, "-s");
        if let Some(bs) = &opts.blocksize {
            require(bs, "block size")?;
            cmd = cmd.option("-b", bs.as_str());
        }
        self.run(
            cmd.option("-V", size)
                .properties(&opts.properties)
                .target(volume),
        )
    }

    /// `zfs clone [-p] [-o property=value]... snapshot filesystem`
    pub fn clone(&self, snapshot: &str, filesystem: &str, opts: &CloneOptions) -> Result<String> {
        require(snapshot, "snapshot name")?;
        require(filesystem, "filesystem name")?;
        property_assignments(&opts.properties)?;
        self.run(
            ZfsCommand::zfs("clone")
                .flag_if(opts.create_parent, "-p")
                .properties(&opts.properties)
                .target(snapshot)
                .target(filesystem),
        )
    }

    /// `zfs snapshot [-r] [-o property=value]... filesystem@snapname`
    pub fn snapshot(&self, filesystem: &str, snapname: &str, opts: &SnapshotOptions) -> Result<String> {
        require(filesystem, "filesystem name")?;
        require(snapname, "snapshot name")?;
        property_assignments(&opts.properties)?;
        self.run(
            ZfsCommand::zfs("snapshot")
                .flag_if(opts.recursive, "-r")
                .properties(&opts.properties)
                .target(format!("{filesystem}@{snapname}")),
        )
    }

    /// `zfs get [-r|-d depth] [-Hp] [-o field[,field]...] [-t type[,type]...]
    /// [-s source[,source]...] all | property[,property]... target`
    ///
    /// # Errors
    ///
    /// - If `target` is empty
    /// - If `depth` is negative
    /// - If `properties` is empty, or mixes `"all"` with other properties
    /// - If `columns` mixes `"all"` with other columns
    /// - If a source is empty
    /// - If the command fails
    pub fn get(&self, target: &str, opts: &GetOptions) -> Result<String> {
        require(target, "target name")?;
        let selected = property_selection(opts.properties.as_deref())?;
        let depth = depth_arg(opts.depth)?;
        let columns = column_selection(&opts.columns)?;
        require_each(&opts.sources, "property source")?;

        let mut cmd = ZfsCommand::zfs("get")
            .flag_if(opts.recursive, "-r")
            .flag_if(opts.scripting, "-H")
            .flag_if(opts.parsable, "-p");
        if let Some(types) = list_arg(&opts.types.iter().map(|t| t.as_str()).collect::<Vec<_>>()) {
            cmd = cmd.option("-t", types);
        }
        if let Some(sources) = list_arg(&opts.sources) {
            cmd = cmd.option("-s", sources);
        }
        if let Some(depth) = depth {
            cmd = cmd.option("-d", depth);
        }
        if let Some(columns) = columns {
            cmd = cmd.option("-o", columns);
        }
        self.run(cmd.target(selected).target(target).envs(&opts.env))
    }

    /// `zfs list [-r|-d depth] [-Hp] [-o property[,property]...]
    /// [-t type[,type]...] [-s property]... [-S property]... target`
    pub fn list(&self, target: &str, opts: &ListOptions) -> Result<String> {
        require(target, "target name")?;
        let depth = depth_arg(opts.depth)?;
        let columns = column_selection(&opts.columns)?;

        let mut cmd = ZfsCommand::zfs("list")
            .flag_if(opts.recursive, "-r")
            .flag_if(opts.scripting, "-H")
            .flag_if(opts.parsable, "-p");
        if let Some(types) = list_arg(&opts.types.iter().map(|t| t.as_str()).collect::<Vec<_>>()) {
            cmd = cmd.option("-t", types);
        }
        for prop in &opts.sort_ascending {
            require(prop, "sort property")?;
            cmd = cmd.option("-s", prop.as_str());
        }
        for prop in &opts.sort_descending {
            require(prop, "sort property")?;
            cmd = cmd.option("-S", prop.as_str());
        }
        if let Some(depth) = depth {
            cmd = cmd.option("-d", depth);
        }
        if let Some(columns) = columns {
            cmd = cmd.option("-o", columns);
        }
        self.run(cmd.target(target).envs(&opts.env))
    }

    /// `zfs destroy [-fnpRrv] filesystem|volume`
    pub fn destroy(&self, target: &str, opts: &DestroyOptions) -> Result<String> {
        require(target, "target name")?;
        self.run(
            ZfsCommand::zfs("destroy")
                .flag_if(opts.recursive_children, "-r")
                .flag_if(opts.recursive_dependents, "-R")
                .flag_if(opts.force_unmount, "-f")
                .flag_if(opts.dry_run, "-n")
                .flag_if(opts.parsable, "-p")
                .flag_if(opts.verbose, "-v")
                .target(target),
        )
    }

    /// `zfs destroy [-dnpRrv] snapshot[%snapname][,...]`
    pub fn destroy_snapshot(&self, snapshot: &str, opts: &DestroySnapshotOptions) -> Result<String> {
        require(snapshot, "snapshot name")?;
        self.run(
            ZfsCommand::zfs("destroy")
                .flag_if(opts.recursive_descendents, "-r")
                .flag_if(opts.recursive_clones, "-R")
                .flag_if(opts.dry_run, "-n")
                .flag_if(opts.parsable, "-p")
                .flag_if(opts.verbose, "-v")
                .flag_if(opts.defer, "-d")
                .target(snapshot),
        )
    }

    /// `zfs rollback [-rRf] snapshot`
    pub fn rollback(&self, snapshot: &str, opts: &RollbackOptions) -> Result<String> {
        require(snapshot, "snapshot name")?;
        self.run(
            ZfsCommand::zfs("rollback")
                .flag_if(opts.destroy_between, "-r")
                .flag_if(opts.destroy_more_recent, "-R")
                .flag_if(opts.force_unmount, "-f")
                .target(snapshot),
        )
    }

    /// `zfs promote clone-filesystem`
    pub fn promote(&self, clone: &str) -> Result<String> {
        require(clone, "clone name")?;
        self.run(ZfsCommand::zfs("promote").target(clone))
    }

    /// `zfs rename [-pufr] source destination`
    ///
    /// Which flag combinations are valid is left to `zfs`.
    pub fn rename(&self, source: &str, destination: &str, opts: &RenameOptions) -> Result<String> {
        require(source, "source name")?;
        require(destination, "destination name")?;
        self.run(
            ZfsCommand::zfs("rename")
                .flag_if(opts.create_parents, "-p")
                .flag_if(opts.dont_remount, "-u")
                .flag_if(opts.force_unmount, "-f")
                .flag_if(opts.recursive, "-r")
                .target(source)
                .target(destination),
        )
    }

    /// `zfs set property=value target`
    pub fn set(&self, target: &str, property: &str, value: &str) -> Result<String> {
        require(target, "target name")?;
        require(property, "property name")?;
        if property.contains('=') {
            return Err(ZfsError::invalid(PROPERTY_EQUALS));
        }
        self.run(
            ZfsCommand::zfs("set")
                .target(format!("{property}={value}"))
                .target(target),
        )
    }

    /// `zfs inherit [-rS] property target`
    pub fn inherit(&self, property: &str, target: &str, opts: &InheritOptions) -> Result<String> {
        require(property, "property name")?;
        require(target, "target name")?;
        self.run(
            ZfsCommand::zfs("inherit")
                .flag_if(opts.recursive, "-r")
                .flag_if(opts.revert, "-S")
                .target(property)
                .target(target),
        )
    }

    /// `zfs upgrade [-v]`
    ///
    /// Lists filesystems not at the newest version, or with `supported` the
    /// versions this system supports.
    pub fn upgrade_list(&self, supported: bool) -> Result<String> {
        self.run(ZfsCommand::zfs("upgrade").flag_if(supported, "-v"))
    }

    /// `zfs upgrade [-r] [-V version] -a | filesystem`
    pub fn upgrade(&self, target: &UpgradeTarget, opts: &UpgradeOptions) -> Result<String> {
        let mut cmd = ZfsCommand::zfs("upgrade").flag_if(opts.recursive, "-r");
        if let UpgradeTarget::All = target {
            cmd = cmd.flag("-a");
        }
        if let Some(version) = &opts.version {
            require(version, "version")?;
            cmd = cmd.option("-V", version.as_str());
        }
        if let UpgradeTarget::Filesystem(fs) = target {
            require(fs, "filesystem name")?;
            cmd = cmd.target(fs.as_str());
        }
        self.run(cmd)
    }

    /// `zfs mount`, listing mounted ZFS filesystems.
    pub fn mount_list(&self) -> Result<String> {
        self.run(ZfsCommand::zfs("mount"))
    }

    /// `zfs mount [-vO] [-o option[,option]...] -a | filesystem`
    pub fn mount(&self, target: &MountTarget, opts: &MountOptions) -> Result<String> {
        require_each(&opts.options, "mount option")?;
        let mut cmd = ZfsCommand::zfs("mount")
            .flag_if(opts.verbose, "-v")
            .flag_if(opts.overlay, "-O")
            .flag_if(matches!(target, MountTarget::All), "-a");
        if let Some(options) = list_arg(&opts.options) {
            cmd = cmd.option("-o", options);
        }
        if let MountTarget::Filesystem(fs) = target {
            require(fs, "filesystem name")?;
            cmd = cmd.target(fs.as_str());
        }
        self.run(cmd)
    }

    /// `zfs unmount [-f] -a | filesystem|mountpoint`
    pub fn unmount(&self, target: &MountTarget, force: bool) -> Result<String> {
        let mut cmd = ZfsCommand::zfs("unmount")
            .flag_if(force, "-f")
            .flag_if(matches!(target, MountTarget::All), "-a");
        if let MountTarget::Filesystem(fs) = target {
            require(fs, "filesystem name")?;
            cmd = cmd.target(fs.as_str());
        }
        self.run(cmd)
    }

    /// Whether `target` exists as a dataset of type `kind`.
    ///
    /// Any failure of `zfs list` counts as not existing.
    ///
    /// # Errors
    ///
    /// - If `target` is empty
    /// - If `zfs` couldn't be run at all
    pub fn dataset_exists(&self, target: &str, kind: DatasetType) -> Result<bool> {
        let opts = ListOptions {
            types: vec![kind],
            ..Default::default()
        };
        match self.list(target, &opts) {
            Ok(_) => Ok(true),
            Err(ZfsError::CommandFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether `name` is an existing snapshot.
    ///
    /// Names without an `@` are never snapshots, and `zfs` isn't run.
    pub fn is_snapshot(&self, name: &str) -> Result<bool> {
        if !name.contains('@') {
            return Ok(false);
        }
        self.dataset_exists(name, DatasetType::Snapshot)
    }

    /// Whether `dataset` is a clone, going by its `origin` property.
    ///
    /// # Errors
    ///
    /// - If `dataset` is empty
    /// - If `dataset` doesn't exist or the command otherwise fails
    pub fn is_clone(&self, dataset: &str) -> Result<bool> {
        let origin = self.origin(dataset)?;
        Ok(origin.is_some())
    }

    /// The snapshot `dataset` was cloned from, if any.
    pub fn origin(&self, dataset: &str) -> Result<Option<String>> {
        let opts = GetOptions {
            columns: vec!["value".into()],
            properties: Some(vec!["origin".into()]),
            ..Default::default()
        };
        let out = self.get(dataset, &opts)?;
        Ok(match out.split_whitespace().next() {
            None | Some("-") => None,
            Some(origin) => Some(origin.to_owned()),
        })
    }
}
