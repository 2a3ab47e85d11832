//! Linux `/proc` tables.
//!
//! `/proc/mounts` lines are `source mountpoint fstype options dump pass`,
//! separated by single spaces. Whitespace and backslashes inside a field are
//! written as octal escapes, `\040` for a space.
use super::MountEntry;
use crate::util::unescape_mount_field;

/// Parse `/proc/mounts`, skipping lines with fewer than four fields.
pub fn parse_proc_mounts(table: &str) -> Vec<MountEntry> {
    table
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (Some(source), Some(mountpoint), Some(fstype), Some(options)) => Some(MountEntry {
                    source: unescape_mount_field(source),
                    mountpoint: unescape_mount_field(mountpoint),
                    fstype: fstype.to_owned(),
                    options: options.split(',').map(str::to_owned).collect(),
                }),
                _ => {
                    log::warn!("skipping malformed mount table line {line:?}");
                    None
                }
            }
        })
        .collect()
}

/// Names of the modules listed in `/proc/modules`, the first field of each
/// line.
pub fn parse_proc_modules(modules: &str) -> impl Iterator<Item = &str> {
    modules
        .lines()
        .filter_map(|line| line.split_whitespace().next())
}
