//! Fuzz target for organization snapshot loading and hierarchy walking.
//!
//! Goal: loading an arbitrary export and walking it should **never panic or hang**. Cycles and
//! dangling parents must surface as errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_org_snapshot
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use scpguard_org::{HierarchyWalker, SnapshotDirectory};
use scpguard_types::NodeId;

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(directory) = SnapshotDirectory::parse(text, 3) else {
        return;
    };

    let walker = HierarchyWalker::new(&directory);
    let ids: Vec<NodeId> = directory
        .snapshot()
        .accounts
        .iter()
        .map(|a| a.id.clone())
        .chain(directory.snapshot().units.iter().map(|u| u.id.clone()))
        .collect();
    for id in &ids {
        let _ = walker.ancestors_of(id);
    }

    if let Ok(root) = walker.root() {
        for node in walker.descendants_of(&root) {
            if node.is_err() {
                break;
            }
        }
    }
});
