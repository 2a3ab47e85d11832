//! FreeBSD `mount -p` output.
//!
//! Each line is in fstab(5) layout: `source mountpoint fstype options dump
//! pass`. The mountpoint may contain raw whitespace, so the source is taken
//! from the front, the last four fields from the back, and everything between
//! is the mountpoint.
use super::MountEntry;
use crate::util::unescape_mount_field;

/// Parse `mount -p` output, skipping lines with fewer than six fields.
pub fn parse_mount_p(output: &str) -> Vec<MountEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let entry = parse_line(line);
            if entry.is_none() {
                log::warn!("skipping malformed mount -p line {line:?}");
            }
            entry
        })
        .collect()
}

fn parse_line(line: &str) -> Option<MountEntry> {
    let (source, rest) = line.trim().split_once(char::is_whitespace)?;
    let (rest, _pass) = split_last(rest)?;
    let (rest, _dump) = split_last(rest)?;
    let (rest, options) = split_last(rest)?;
    let (mountpoint, fstype) = split_last(rest)?;
    let mountpoint = mountpoint.trim();
    if mountpoint.is_empty() {
        return None;
    }
    Some(MountEntry {
        source: unescape_mount_field(source),
        mountpoint: unescape_mount_field(mountpoint),
        fstype: fstype.to_owned(),
        options: options.split(',').map(str::to_owned).collect(),
    })
}

/// Split off the last whitespace separated field.
fn split_last(s: &str) -> Option<(&str, &str)> {
    s.trim_end().rsplit_once(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_separated() {
        let out = "zroot/ROOT/default\t/\tzfs\trw\t0\t0\ndevfs\t/dev\tdevfs\trw\t0\t0\n";
        let entries = parse_mount_p(out);
        assert_eq!(
            entries,
            [
                MountEntry {
                    source: "zroot/ROOT/default".into(),
                    mountpoint: "/".into(),
                    fstype: "zfs".into(),
                    options: vec!["rw".into()],
                },
                MountEntry {
                    source: "devfs".into(),
                    mountpoint: "/dev".into(),
                    fstype: "devfs".into(),
                    options: vec!["rw".into()],
                },
            ]
        );
    }

    #[test]
    fn whitespace_in_mountpoint() {
        let out = "zroot/media\t/mnt/My  Media\tzfs\trw,noatime\t0\t0\n\
                   zroot/esc /mnt/a\\040b zfs ro 0 0\n";
        let entries = parse_mount_p(out);
        assert_eq!(entries[0].mountpoint, "/mnt/My  Media");
        assert_eq!(entries[0].options, ["rw", "noatime"]);
        assert_eq!(entries[1].mountpoint, "/mnt/a b");
        assert_eq!(entries[1].fstype, "zfs");
    }

    #[test]
    fn short_lines_are_skipped() {
        let out = "\nzroot / zfs rw 0\nzroot/usr /usr zfs rw 0 0\n";
        let entries = parse_mount_p(out);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "zroot/usr");
    }
}
