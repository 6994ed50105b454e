//! Cheap structural summary of a snapshot, used to skip reconciliation passes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::{Canvas, Clump, Element};

/// Descends from a clump into its first child clump.
pub const DESCEND: char = '>';
/// Closes a clump that had child clumps.
pub const ASCEND: char = '<';

/// How much of the snapshot the fingerprint gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerprintMode {
    /// Clump nesting only. Edits that leave every clump `nodeUUID` in place
    /// (an atom's fill, a clump's position) are invisible to the gate and the
    /// pass is skipped.
    Topology,
    /// Clump nesting plus a hash of the whole snapshot. Any edit renders.
    #[default]
    Content,
}

/// Concatenate the `nodeUUID` of every clump reachable through clump
/// children, e.g. `root>child1>child1a<<`. Atoms and masks do not
/// contribute.
pub fn fingerprint(clump: &Clump) -> String {
    let mut out = String::new();
    write_clump(clump, &mut out);
    out
}

fn write_clump(clump: &Clump, out: &mut String) {
    out.push_str(&clump.node_uuid);
    let mut descended = false;
    for element in &clump.elements {
        if let Element::Clump(child) = element {
            out.push(DESCEND);
            write_clump(child, out);
            descended = true;
        }
    }
    if descended {
        out.push(ASCEND);
    }
}

/// Fingerprint of a whole canvas under `mode`. `None` when there is no content.
pub fn canvas_fingerprint(canvas: &Canvas, mode: FingerprintMode) -> Option<String> {
    let content = canvas.content.as_ref()?;
    let topology = fingerprint(content);
    match mode {
        FingerprintMode::Topology => Some(topology),
        FingerprintMode::Content => {
            let mut hasher = DefaultHasher::new();
            match serde_json::to_vec(canvas) {
                Ok(bytes) => bytes.hash(&mut hasher),
                Err(err) => {
                    // Unhashable snapshots always render.
                    log::warn!("Cannot hash canvas content: {err}");
                    return None;
                }
            }
            Some(format!("{topology}#{:016x}", hasher.finish()))
        }
    }
}
