//! Identity and timestamps shared by aggregate roots

use chrono::{DateTime, Utc};

/// Identity plus creation/modification stamps, embedded in each aggregate root.
///
/// An id equal to `K::default()` marks an instance that has never been assigned
/// a real identity. Such an instance is never identity-equal to anything.
#[derive(Debug, Clone)]
pub struct EntityMeta<K> {
    id: K,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<K: Copy + PartialEq + Default> EntityMeta<K> {
    /// Fresh metadata for a newly created entity
    pub fn new(id: K) -> Self {
        let now = Utc::now();

        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild metadata loaded from storage
    pub fn restore(id: K, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> K {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_transient(&self) -> bool {
        self.id == K::default()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Identity comparison; false whenever either side is transient
    pub fn same_identity(&self, other: &Self) -> bool {
        !self.is_transient() && !other.is_transient() && self.id == other.id
    }
}

/// Capabilities of an aggregate root carrying [`EntityMeta`]
pub trait Entity {
    type Id: Copy + PartialEq + Default;

    fn meta(&self) -> &EntityMeta<Self::Id>;

    fn meta_mut(&mut self) -> &mut EntityMeta<Self::Id>;

    /// Stamp the modification time
    fn touch(&mut self) {
        self.meta_mut().touch();
    }

    /// Same aggregate iff both have a real id and the ids match
    fn same_entity(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.meta().same_identity(other.meta())
    }
}
