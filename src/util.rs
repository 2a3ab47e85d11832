//! Utility functions

/// Linux exposes the mount table of the current mount namespace here.
///
/// Kept configurable, see [`crate::config::Config::mounts_path`].
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// Loaded Linux kernel modules. Same reasons as [`PROC_MOUNTS`].
pub const PROC_MODULES: &str = "/proc/modules";

/// Default `zfs` binary, resolved through `PATH`.
pub const ZFS_BIN: &str = "zfs";

/// Default `zpool` binary, resolved through `PATH`.
pub const ZPOOL_BIN: &str = "zpool";

/// Default `mount` binary, only used on FreeBSD.
pub const MOUNT_BIN: &str = "mount";

/// Default `sysctl` binary, only used on FreeBSD.
pub const SYSCTL_BIN: &str = "sysctl";

/// Filesystem type token of ZFS mounts, on every supported platform.
pub const ZFS_FSTYPE: &str = "zfs";

/// Decode the octal escapes the kernel uses for whitespace and backslashes
/// in mount table fields, `\040` for a space and so on.
///
/// Anything that isn't a complete three digit octal escape is kept as is.
pub fn unescape_mount_field(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if let Some(value) = bytes.get(i + 1..i + 4).and_then(octal_byte) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn octal_byte(digits: &[u8]) -> Option<u8> {
    if !digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
        return None;
    }
    let value = digits
        .iter()
        .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
    u8::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_octal_escapes() {
        assert_eq!(unescape_mount_field("/mnt/my\\040data"), "/mnt/my data");
        assert_eq!(unescape_mount_field("/a\\011b\\134c"), "/a\tb\\c");
        assert_eq!(unescape_mount_field("/plain"), "/plain");
    }

    #[test]
    fn keeps_incomplete_escapes() {
        assert_eq!(unescape_mount_field("/odd\\04"), "/odd\\04");
        assert_eq!(unescape_mount_field("/odd\\089"), "/odd\\089");
        assert_eq!(unescape_mount_field("trailing\\"), "trailing\\");
        // Out of byte range
        assert_eq!(unescape_mount_field("\\777"), "\\777");
    }

    #[test]
    fn decodes_multibyte_utf8() {
        // "é" is 0xC3 0xA9
        assert_eq!(unescape_mount_field("/caf\\303\\251"), "/café");
    }
}
