//! In-memory store of live anchor instances.

use crate::core::RigidTransform;

use super::AnchorRecord;

/// Identity of a live anchor instance. Ids are assigned monotonically by
/// the store and never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// A live anchor: the persisted record plus transient tracking metadata.
#[derive(Debug, Clone)]
pub struct AnchorInstance {
    /// Store-assigned identity.
    pub id: AnchorId,
    /// The persisted part: kind + world pose.
    pub record: AnchorRecord,
    /// Tracking timestamp at placement, seconds. `None` marks an anchor
    /// loaded from disk with no valid re-localization timestamp; such an
    /// anchor is never rewritten by the loop-closure corrector — its world
    /// transform is trusted as-is until the next fresh placement.
    pub creation_timestamp: Option<f64>,
    /// Anchor pose in the device frame at creation time. Frame-invariant
    /// under later world-frame drift, which is what makes correction
    /// possible: it is recomposed with a corrected device pose on loop
    /// closure.
    pub device_from_anchor: RigidTransform,
    /// Presentation flag: the anchor is playing its removal animation.
    /// A removing anchor can no longer be selected.
    pub removing: bool,
}

impl AnchorInstance {
    /// Whether the corrector may rewrite this anchor's world pose.
    #[inline]
    pub fn is_correctable(&self) -> bool {
        self.creation_timestamp.is_some()
    }
}

/// Insertion-ordered collection of live anchors, unique by [`AnchorId`].
///
/// Single-writer by design: only the foreground loop mutates the store
/// (append on placement, in-place rewrite during correction, bulk replace
/// on load). The corrector and the persistence gateway borrow it for the
/// duration of one pass and return control immediately.
#[derive(Debug, Default)]
pub struct AnchorStore {
    anchors: Vec<AnchorInstance>,
    next_id: u64,
}

impl AnchorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Iterate anchors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &AnchorInstance> {
        self.anchors.iter()
    }

    /// Iterate anchors mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AnchorInstance> {
        self.anchors.iter_mut()
    }

    /// Look up an anchor by identity.
    pub fn get(&self, id: AnchorId) -> Option<&AnchorInstance> {
        self.anchors.iter().find(|a| a.id == id)
    }

    /// Look up an anchor mutably by identity.
    pub fn get_mut(&mut self, id: AnchorId) -> Option<&mut AnchorInstance> {
        self.anchors.iter_mut().find(|a| a.id == id)
    }

    /// Append a freshly placed anchor and return its identity.
    pub fn insert_placed(
        &mut self,
        record: AnchorRecord,
        creation_timestamp: f64,
        device_from_anchor: RigidTransform,
    ) -> AnchorId {
        let id = self.allocate_id();
        self.anchors.push(AnchorInstance {
            id,
            record,
            creation_timestamp: Some(creation_timestamp),
            device_from_anchor,
            removing: false,
        });
        id
    }

    /// Remove an anchor by identity. Later anchors keep their order and
    /// ids, so removal mid-iteration over a snapshot of ids is safe.
    pub fn remove(&mut self, id: AnchorId) -> Option<AnchorInstance> {
        let idx = self.anchors.iter().position(|a| a.id == id)?;
        Some(self.anchors.remove(idx))
    }

    /// Replace the whole store with records loaded from disk.
    ///
    /// Loaded anchors get fresh ids, no creation timestamp, and an identity
    /// device-relative transform; their world poses are trusted as-is.
    pub fn replace_all(&mut self, records: Vec<AnchorRecord>) {
        self.anchors.clear();
        for record in records {
            let id = self.allocate_id();
            self.anchors.push(AnchorInstance {
                id,
                record,
                creation_timestamp: None,
                device_from_anchor: RigidTransform::IDENTITY,
                removing: false,
            });
        }
    }

    /// Snapshot of the persisted parts, in insertion order, with
    /// orientations normalized for write.
    pub fn records(&self) -> Vec<AnchorRecord> {
        self.anchors
            .iter()
            .map(|a| AnchorRecord {
                kind: a.record.kind,
                position: a.record.position,
                orientation: a.record.orientation.normalized(),
            })
            .collect()
    }

    /// Discard all anchors (session restart).
    pub fn clear(&mut self) {
        self.anchors.clear();
    }

    fn allocate_id(&mut self) -> AnchorId {
        let id = AnchorId(self.next_id);
        self.next_id += 1;
        id
    }
}
