use lockcheck_schema::{PackageId, PackageMap};
use std::collections::HashMap;

/// Which installed packages go into a new lock file. Packages never
/// mentioned count as unselected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    flags: HashMap<PackageId, bool>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, package: impl Into<PackageId>) {
        self.flags.insert(package.into(), true);
    }

    pub fn deselect(&mut self, package: impl Into<PackageId>) {
        self.flags.insert(package.into(), false);
    }

    pub fn set(&mut self, package: impl Into<PackageId>, selected: bool) {
        self.flags.insert(package.into(), selected);
    }

    pub fn is_selected(&self, package: &str) -> bool {
        self.flags.get(package).copied().unwrap_or(false)
    }

    pub fn selected_count(&self) -> usize {
        self.flags.values().filter(|&&v| v).count()
    }

    /// Select every package in `packages`.
    pub fn all_of(packages: &PackageMap) -> Self {
        packages.ids().map(|id| (id.clone(), true)).collect()
    }
}

impl<P: Into<PackageId>> FromIterator<(P, bool)> for Selection {
    fn from_iter<I: IntoIterator<Item = (P, bool)>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for (package, selected) in iter {
            selection.set(package, selected);
        }
        selection
    }
}

/// Build a requirement set from the selected installed packages.
///
/// Records are copied whole and keep installed document order. A null
/// installed record is skipped even when selected.
pub fn compose_lock(installed: Option<&PackageMap>, selection: &Selection) -> PackageMap {
    let Some(installed) = installed else {
        return PackageMap::new();
    };
    let mut composed = PackageMap::new();
    for (id, record) in installed.iter() {
        if let Some(record) = record.filter(|_| selection.is_selected(id)) {
            composed.insert(id.clone(), Some(record.clone()));
        }
    }
    composed
}
