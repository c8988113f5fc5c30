//! Network filesystem detection.

use std::path::Path;

const MOUNTS: &str = "/proc/self/mounts";

/// Filesystem types whose files are fetched over the network.
const NETWORK_FS_TYPES: &[&str] = &[
    "nfs", "nfs4", "cifs", "smb3", "smbfs", "ncpfs", "afs", "9p", "ceph", "glusterfs", "davfs",
    "fuse.sshfs", "fuse.s3fs", "fuse.rclone", "fuse.gvfsd-fuse", "fuse.glusterfs",
];

pub fn is_network_fs_type(fs_type: &str) -> bool {
    NETWORK_FS_TYPES.contains(&fs_type)
}

/// Undo the octal escapes used for spaces and tabs in mount paths.
fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

/// Filesystem type of the longest mount point containing `path`.
pub fn mount_fs_type(mounts: &str, path: &Path) -> Option<String> {
    let mut best: Option<(usize, &str)> = None;
    for line in mounts.lines() {
        let mut fields = line.split_whitespace();
        let (Some(_device), Some(mount_point), Some(fs_type)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let mount_point = unescape_mount_path(mount_point);
        if !path.starts_with(&mount_point) {
            continue;
        }
        let len = mount_point.len();
        if best.is_none_or(|(best_len, _)| len >= best_len) {
            best = Some((len, fs_type));
        }
    }
    best.map(|(_, fs_type)| fs_type.to_string())
}

/// Whether `path` lives on a network filesystem. Unknown counts as local.
pub fn is_on_network_fs(path: &Path) -> bool {
    let Ok(mounts) = std::fs::read_to_string(MOUNTS) else {
        return false;
    };
    mount_fs_type(&mounts, path).is_some_and(|fs_type| is_network_fs_type(&fs_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
sysfs /sys sysfs rw,nosuid 0 0
/dev/sda1 / ext4 rw,relatime 0 0
server:/export /mnt/nfs nfs4 rw,vers=4.2 0 0
//nas/roms /mnt/My\\040Roms cifs rw 0 0
user@host:/home /home/user/remote fuse.sshfs rw 0 0
tmpfs /mnt/nfs/cache tmpfs rw 0 0
";

    #[test]
    fn longest_mount_wins() {
        assert_eq!(mount_fs_type(SAMPLE, Path::new("/home/user/a.nds")).as_deref(), Some("ext4"));
        assert_eq!(mount_fs_type(SAMPLE, Path::new("/mnt/nfs/a.iso")).as_deref(), Some("nfs4"));
        assert_eq!(
            mount_fs_type(SAMPLE, Path::new("/mnt/nfs/cache/a.iso")).as_deref(),
            Some("tmpfs")
        );
    }

    #[test]
    fn mount_point_is_a_path_prefix() {
        assert_eq!(
            mount_fs_type(SAMPLE, Path::new("/mnt/nfsother/a.iso")).as_deref(),
            Some("ext4")
        );
    }

    #[test]
    fn escaped_spaces() {
        assert_eq!(
            mount_fs_type(SAMPLE, Path::new("/mnt/My Roms/game.iso")).as_deref(),
            Some("cifs")
        );
    }

    #[test]
    fn network_types() {
        assert!(is_network_fs_type("nfs4"));
        assert!(is_network_fs_type("cifs"));
        assert!(is_network_fs_type("fuse.sshfs"));
        assert!(!is_network_fs_type("ext4"));
        assert!(!is_network_fs_type("tmpfs"));
    }

    #[test]
    fn no_mounts_means_unknown() {
        assert_eq!(mount_fs_type("", Path::new("/a")), None);
    }
}
