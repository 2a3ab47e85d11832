//! Interface to the `zpool` command.
use crate::{
    command::{column_selection, property_selection, require, ZfsCommand},
    config::Config,
    error::{text::PROPERTY_EQUALS, Result, ZfsError},
    executor::{BoxedExecutor, HostExecutor},
};
use std::fmt;

/// `zpool get` options
///
/// `scripting` defaults to true.
#[derive(Debug, Clone)]
pub struct ZpoolGetOptions {
    /// `-H`
    pub scripting: bool,

    /// `-p`
    pub parsable: bool,

    /// Properties to get, [`None`] for all of them.
    pub properties: Option<Vec<String>>,

    /// `-o`
    pub columns: Vec<String>,
}

impl Default for ZpoolGetOptions {
    fn default() -> Self {
        Self {
            scripting: true,
            parsable: false,
            properties: None,
            columns: Vec::new(),
        }
    }
}

/// Wraps the `zpool` command.
#[derive(Clone)]
pub struct Zpool {
    config: Config,
    executor: BoxedExecutor,
}

impl fmt::Debug for Zpool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zpool").field("config", &self.config).finish()
    }
}

impl Zpool {
    pub fn new(config: Config) -> Self {
        Self::with_executor(config, HostExecutor::new().as_executor())
    }

    pub fn with_executor(config: Config, executor: BoxedExecutor) -> Self {
        Self { config, executor }
    }

    fn run(&self, command: ZfsCommand) -> Result<String> {
        command.run(&self.config, self.executor.as_ref())
    }

    /// `zpool get [-Hp] [-o field[,field]...] all | property[,property]... [pool]`
    ///
    /// Without `pool` every imported pool is queried.
    ///
    /// # Errors
    ///
    /// - If `pool` is `Some("")`
    /// - If `properties` or `columns` is an invalid selection, see
    ///   [`crate::zfs::GetOptions`]
    /// - If the command fails
    pub fn get(&self, pool: Option<&str>, opts: &ZpoolGetOptions) -> Result<String> {
        if let Some(pool) = pool {
            require(pool, "pool name")?;
        }
        let selected = property_selection(opts.properties.as_deref())?;
        let columns = column_selection(&opts.columns)?;

        let mut cmd = ZfsCommand::zpool("get")
            .flag_if(opts.scripting, "-H")
            .flag_if(opts.parsable, "-p");
        if let Some(columns) = columns {
            cmd = cmd.option("-o", columns);
        }
        cmd = cmd.target(selected);
        if let Some(pool) = pool {
            cmd = cmd.target(pool);
        }
        self.run(cmd)
    }

    /// `zpool set property=value pool`
    pub fn set(&self, pool: &str, property: &str, value: &str) -> Result<String> {
        require(pool, "pool name")?;
        require(property, "property name")?;
        if property.contains('=') {
            return Err(ZfsError::invalid(PROPERTY_EQUALS));
        }
        self.run(
            ZfsCommand::zpool("set")
                .target(format!("{property}={value}"))
                .target(pool),
        )
    }

    /// Whether any pool is imported.
    ///
    /// Runs `zpool get -H version`, any non-zero exit counts as no pool.
    ///
    /// # Errors
    ///
    /// - If `zpool` couldn't be run at all
    pub fn exists(&self) -> Result<bool> {
        let opts = ZpoolGetOptions {
            properties: Some(vec!["version".into()]),
            ..Default::default()
        };
        match self.get(None, &opts) {
            Ok(_) => Ok(true),
            Err(ZfsError::CommandFailed(info)) => {
                log::debug!("no zfs pool found: {}", info.stderr.trim());
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
