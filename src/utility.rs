//! Dataset and snapshot name helpers.
//!
//! These only look at the name, nothing is executed.

/// Parent of a dataset, `pool/ROOT` for `pool/ROOT/default`.
///
/// [`None`] for a bare pool name or an empty name.
pub fn dataset_parent(dataset: &str) -> Option<&str> {
    dataset
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .filter(|p| !p.is_empty())
}

/// Last component of a dataset, `default` for `pool/ROOT/default`.
///
/// A bare pool name is its own child name. [`None`] for an empty name.
pub fn dataset_child_name(dataset: &str) -> Option<&str> {
    if dataset.is_empty() {
        return None;
    }
    let child = dataset.rsplit('/').next().unwrap_or(dataset);
    Some(child).filter(|c| !c.is_empty())
}

/// Dataset a snapshot belongs to, [`None`] if `snapshot` has no `@`.
pub fn snapshot_parent_dataset(snapshot: &str) -> Option<&str> {
    snapshot
        .split_once('@')
        .map(|(dataset, _)| dataset)
        .filter(|d| !d.is_empty())
}

/// Short name of a snapshot, `s` for `pool/fs@s`.
pub fn snapshot_name(snapshot: &str) -> Option<&str> {
    snapshot
        .split_once('@')
        .map(|(_, name)| name)
        .filter(|n| !n.is_empty())
}
