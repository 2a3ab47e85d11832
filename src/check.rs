//! Is the running system booted from a ZFS root dataset?
use crate::{error::Result, system::System};

impl System {
    /// Whether any ZFS pool is imported.
    ///
    /// See [`crate::zpool::Zpool::exists`]
    pub fn zpool_exists(&self) -> Result<bool> {
        self.zpool().exists()
    }

    /// The ZFS dataset mounted at `/`.
    ///
    /// [`None`] if the ZFS module isn't loaded, no pool is imported, or `/`
    /// isn't ZFS. The mount table is only trusted once the first two hold.
    ///
    /// # Errors
    ///
    /// - If the module list, mount table or `zpool` is unavailable
    pub fn root_dataset(&self) -> Result<Option<String>> {
        if !self.zfs_module_loaded()? {
            log::debug!("zfs module is not loaded");
            return Ok(None);
        }
        if !self.zpool_exists()? {
            log::debug!("no zfs pool is imported");
            return Ok(None);
        }
        let root = self.dataset_for_mountpoint("/")?;
        log::debug!("root dataset is {root:?}");
        Ok(root)
    }

    pub fn is_root_on_zfs(&self) -> Result<bool> {
        Ok(self.root_dataset()?.is_some())
    }
}
