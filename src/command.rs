//! Building `zfs`/`zpool` argument vectors.
//!
//! The tools are strict positional parsers, so a [`ZfsCommand`] always
//! renders as `subcommand [flags...] [properties...] [targets...]`, whatever
//! order the builder methods were called in.
//!
//! The system tools the mount resolver needs, `mount` and `sysctl`, go through
//! the same builder without a subcommand.
use crate::{
    config::Config,
    error::{text::*, CommandFailure, Result, ZfsError},
    executor::Executor,
};
use std::{fmt, path::Path};

/// The executed binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainCommand {
    Zfs,
    Zpool,

    /// FreeBSD `mount`
    Mount,

    /// FreeBSD `sysctl`
    Sysctl,
}

impl MainCommand {
    pub fn name(self) -> &'static str {
        match self {
            Self::Zfs => "zfs",
            Self::Zpool => "zpool",
            Self::Mount => "mount",
            Self::Sysctl => "sysctl",
        }
    }

    /// Configured path of this binary.
    pub fn program(self, config: &Config) -> &Path {
        match self {
            Self::Zfs => &config.zfs,
            Self::Zpool => &config.zpool,
            Self::Mount => &config.mount,
            Self::Sysctl => &config.sysctl,
        }
    }
}

impl fmt::Display for MainCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One invocation of `zfs`, `zpool` or a supporting system tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZfsCommand {
    main: MainCommand,
    subcommand: String,
    flags: Vec<String>,
    properties: Vec<String>,
    targets: Vec<String>,
    env: Vec<(String, String)>,
}

impl ZfsCommand {
    pub fn new(main: MainCommand, subcommand: &str) -> Self {
        Self {
            main,
            subcommand: subcommand.into(),
            flags: Vec::new(),
            properties: Vec::new(),
            targets: Vec::new(),
            env: Vec::new(),
        }
    }

    /// `zfs <subcommand>`
    pub fn zfs(subcommand: &str) -> Self {
        Self::new(MainCommand::Zfs, subcommand)
    }

    /// `zpool <subcommand>`
    pub fn zpool(subcommand: &str) -> Self {
        Self::new(MainCommand::Zpool, subcommand)
    }

    /// A tool without subcommands, such as `mount`.
    pub fn tool(main: MainCommand) -> Self {
        Self::new(main, "")
    }

    /// Append an option token, such as `-r`.
    pub fn flag(mut self, flag: &str) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// Append `flag` only if `cond` is true.
    pub fn flag_if(self, cond: bool, flag: &str) -> Self {
        if cond {
            self.flag(flag)
        } else {
            self
        }
    }

    /// Append an option taking a value, such as `-d 1`.
    pub fn option(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self.flags.push(value.into());
        self
    }

    /// Append `-o name=value`.
    pub fn property(mut self, name: &str, value: &str) -> Self {
        self.properties.push("-o".into());
        self.properties.push(format!("{name}={value}"));
        self
    }

    /// Append `-o name=value` for each pair.
    pub fn properties<'a, I>(self, properties: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        properties
            .into_iter()
            .fold(self, |cmd, (name, value)| cmd.property(name, value))
    }

    /// Append a positional target.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    /// Set an environment variable for the child process only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set every pair in `env` for the child process.
    pub fn envs<'a, I>(self, env: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        env.into_iter()
            .fold(self, |cmd, (key, value)| cmd.env(key.as_str(), value.as_str()))
    }

    pub fn main_command(&self) -> MainCommand {
        self.main
    }

    pub fn subcommand(&self) -> &str {
        &self.subcommand
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Environment overrides, in the order they were added.
    pub fn env_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The full argument vector, excluding the binary itself.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(
            1 + self.flags.len() + self.properties.len() + self.targets.len(),
        );
        if !self.subcommand.is_empty() {
            args.push(self.subcommand.clone());
        }
        args.extend(self.flags.iter().cloned());
        args.extend(self.properties.iter().cloned());
        args.extend(self.targets.iter().cloned());
        args
    }

    /// Run the command, returning its standard output verbatim.
    ///
    /// # Errors
    ///
    /// - [`ZfsError::CommandFailed`] if the tool exits non-zero.
    /// - [`ZfsError::Unavailable`] if the tool couldn't be started.
    pub fn run(&self, config: &Config, executor: &dyn Executor) -> Result<String> {
        let output = executor.execute(self.main.program(config), self)?;
        if output.is_success() {
            return Ok(output.stdout);
        }
        log::debug!(
            "{} {} failed on {:?}: {}",
            self.main,
            self.subcommand,
            self.targets,
            output.stderr.trim()
        );
        Err(ZfsError::CommandFailed(Box::new(CommandFailure {
            command: self.main.name().into(),
            subcommand: self.subcommand.clone(),
            targets: self.targets.clone(),
            args: self.args(),
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })))
    }
}

impl fmt::Display for ZfsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.main, self.args().join(" "))
    }
}

/// Reject an empty required identifier.
pub(crate) fn require(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ZfsError::invalid(format!("{what} {EMPTY}")));
    }
    Ok(())
}

/// Reject an empty entry in a list argument.
pub(crate) fn require_each<S: AsRef<str>>(values: &[S], what: &str) -> Result<()> {
    values.iter().try_for_each(|v| require(v.as_ref(), what))
}

/// Validate `-o name=value` assignments.
pub(crate) fn property_assignments(properties: &[(String, String)]) -> Result<()> {
    for (name, _) in properties {
        require(name, "property name")?;
        if name.contains('=') {
            return Err(ZfsError::invalid(PROPERTY_EQUALS));
        }
    }
    Ok(())
}

/// Validate a `-d depth` argument.
pub(crate) fn depth_arg(depth: Option<i64>) -> Result<Option<String>> {
    match depth {
        Some(d) if d < 0 => Err(ZfsError::invalid(NEGATIVE_DEPTH)),
        Some(d) => Ok(Some(d.to_string())),
        None => Ok(None),
    }
}

/// The `all | property[,property]...` positional argument.
///
/// [`None`] means every property.
pub(crate) fn property_selection(properties: Option<&[String]>) -> Result<String> {
    let properties = match properties {
        None => return Ok("all".into()),
        Some([]) => return Err(ZfsError::invalid(NO_PROPERTY)),
        Some(p) => p,
    };
    for p in properties {
        require(p, "property name")?;
    }
    if properties.iter().any(|p| p == "all") {
        if properties.len() > 1 {
            return Err(ZfsError::invalid(ALL_WITH_OTHERS));
        }
        return Ok("all".into());
    }
    Ok(properties.join(","))
}

/// The value of a `-o field[,field]...` argument, [`None`] for no `-o` at all.
pub(crate) fn column_selection(columns: &[String]) -> Result<Option<String>> {
    if columns.is_empty() {
        return Ok(None);
    }
    for c in columns {
        require(c, "column name")?;
    }
    if columns.iter().any(|c| c == "all") {
        if columns.len() > 1 {
            return Err(ZfsError::invalid(ALL_COLUMNS_WITH_OTHERS));
        }
        return Ok(Some("all".into()));
    }
    Ok(Some(columns.join(",")))
}

/// Comma-joined list argument, [`None`] if empty.
pub(crate) fn list_arg<S: AsRef<str>>(items: &[S]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(","),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeExecutor;
    use crate::executor::Output;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn args_are_flags_then_properties_then_targets() {
        let cmd = ZfsCommand::zfs("clone")
            .target("pool/a@s")
            .property("compression", "lz4")
            .flag("-p")
            .target("pool/b");
        assert_eq!(
            cmd.args(),
            ["clone", "-p", "-o", "compression=lz4", "pool/a@s", "pool/b"]
        );
        assert_eq!(cmd.to_string(), "zfs clone -p -o compression=lz4 pool/a@s pool/b");
    }

    #[test]
    fn flag_if_and_option() {
        let cmd = ZfsCommand::zpool("get")
            .flag_if(true, "-H")
            .flag_if(false, "-p")
            .option("-o", "name,value")
            .target("all");
        assert_eq!(cmd.args(), ["get", "-H", "-o", "name,value", "all"]);
        assert_eq!(cmd.main_command(), MainCommand::Zpool);
    }

    #[test]
    fn depth() {
        assert_eq!(depth_arg(None).unwrap(), None);
        assert_eq!(depth_arg(Some(0)).unwrap().as_deref(), Some("0"));
        assert!(matches!(depth_arg(Some(-1)), Err(ZfsError::InvalidArgument(_))));
    }

    #[test]
    fn property_selections() {
        assert_eq!(property_selection(None).unwrap(), "all");
        assert_eq!(property_selection(Some(&strings(&["all"]))).unwrap(), "all");
        assert_eq!(
            property_selection(Some(&strings(&["mountpoint", "canmount"]))).unwrap(),
            "mountpoint,canmount"
        );
        for bad in [&[][..], &["all", "origin"][..], &["origin", "all"][..], &[""][..]] {
            let bad = strings(bad);
            assert!(
                matches!(property_selection(Some(&bad)), Err(ZfsError::InvalidArgument(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn column_selections() {
        assert_eq!(column_selection(&[]).unwrap(), None);
        assert_eq!(column_selection(&strings(&["all"])).unwrap().as_deref(), Some("all"));
        assert_eq!(
            column_selection(&strings(&["name", "value"])).unwrap().as_deref(),
            Some("name,value")
        );
        assert!(column_selection(&strings(&["all", "name"])).is_err());
    }

    #[test]
    fn run_success_returns_stdout_verbatim() -> anyhow::Result<()> {
        let fake = FakeExecutor::new();
        fake.set_handler(|_| Output::with_stdout("pool/fs\tcompression\ton\tlocal\n"));
        let out = ZfsCommand::zfs("get").run(&Config::default(), fake.as_ref())?;
        assert_eq!(out, "pool/fs\tcompression\ton\tlocal\n");
        Ok(())
    }

    #[test]
    fn run_failure_carries_context() {
        let fake = FakeExecutor::new();
        fake.set_handler(|_| Output::failure(1, "cannot destroy 'pool/fs': dataset is busy\n"));
        let err = ZfsCommand::zfs("destroy")
            .flag("-r")
            .target("pool/fs")
            .run(&Config::default(), fake.as_ref())
            .unwrap_err();

        let info = err.command_failure().expect("command failure");
        assert_eq!(info.command, "zfs");
        assert_eq!(info.subcommand, "destroy");
        assert_eq!(info.targets, ["pool/fs"]);
        assert_eq!(info.args, ["destroy", "-r", "pool/fs"]);
        assert_eq!(info.status, Some(1));
        assert_eq!(info.stderr, "cannot destroy 'pool/fs': dataset is busy\n");
    }

    #[test]
    fn run_uses_configured_binary() -> anyhow::Result<()> {
        let fake = FakeExecutor::new();
        let config = Config {
            zpool: "/sbin/zpool".into(),
            ..Config::default()
        };
        ZfsCommand::zpool("list").run(&config, fake.as_ref())?;
        assert_eq!(fake.programs(), ["/sbin/zpool"]);
        Ok(())
    }

    #[test]
    fn tools_without_subcommand() -> anyhow::Result<()> {
        let cmd = ZfsCommand::tool(MainCommand::Mount).flag("-p");
        assert_eq!(cmd.args(), ["-p"]);
        assert_eq!(cmd.to_string(), "mount -p");

        let fake = FakeExecutor::new();
        let config = Config {
            sysctl: "/sbin/sysctl".into(),
            ..Config::default()
        };
        ZfsCommand::tool(MainCommand::Sysctl)
            .target("vfs.zfs.version.spa")
            .run(&config, fake.as_ref())?;
        assert_eq!(fake.programs(), ["/sbin/sysctl"]);
        assert_eq!(fake.args(), [vec!["vfs.zfs.version.spa"]]);
        Ok(())
    }

    #[test]
    fn assignments_and_lists() {
        let ok = vec![("compression".to_string(), "lz4".to_string())];
        assert!(property_assignments(&ok).is_ok());
        for name in ["", "a=b"] {
            let bad = vec![(name.to_string(), "lz4".to_string())];
            assert!(
                matches!(property_assignments(&bad), Err(ZfsError::InvalidArgument(_))),
                "{name:?}"
            );
        }
        assert!(require_each(&["local", "default"], "source").is_ok());
        assert!(matches!(
            require_each(&["local", ""], "source"),
            Err(ZfsError::InvalidArgument(_))
        ));
    }
}
