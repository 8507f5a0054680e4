//! Component signatures and the table routing lifecycle events to systems.
//!
//! Systems declare, once at startup, the component set they care about. When
//! an entity is spawned, despawned or changed, the engine looks up every
//! system whose required set is contained in the entity's signature.

/// Component kinds an entity may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ComponentKind {
    Transform = 0,
    Sprite = 1,
    Animator = 2,
    StateMatch = 3,
}

/// Bitset of `ComponentKind`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComponentSignature(u32);

impl ComponentSignature {
    pub const EMPTY: ComponentSignature = ComponentSignature(0);

    pub fn with(self, kind: ComponentKind) -> Self {
        Self(self.0 | 1 << kind as u8)
    }

    pub fn has(self, kind: ComponentKind) -> bool {
        self.0 & (1 << kind as u8) != 0
    }

    /// Whether every component in `required` is present in `self`.
    pub fn contains(self, required: ComponentSignature) -> bool {
        self.0 & required.0 == required.0
    }
}

impl From<ComponentKind> for ComponentSignature {
    fn from(kind: ComponentKind) -> Self {
        ComponentSignature::EMPTY.with(kind)
    }
}

/// Engine systems that receive entity lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemKind {
    SpriteBatch,
    Animation,
    StateMatch,
}

/// Registration table: required signature → interested system.
#[derive(Debug, Clone, Default)]
pub struct SystemTable {
    entries: Vec<(ComponentSignature, SystemKind)>,
}

impl SystemTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table used by `EngineContext`.
    pub fn engine_defaults() -> Self {
        let mut table = Self::new();
        table.register(
            ComponentSignature::from(ComponentKind::Transform).with(ComponentKind::Sprite),
            SystemKind::SpriteBatch,
        );
        table.register(ComponentSignature::from(ComponentKind::Animator), SystemKind::Animation);
        table.register(ComponentSignature::from(ComponentKind::StateMatch), SystemKind::StateMatch);
        table
    }

    pub fn register(&mut self, required: ComponentSignature, system: SystemKind) {
        if !self.entries.contains(&(required, system)) {
            self.entries.push((required, system));
        }
    }

    /// Systems interested in an entity with `signature`, in registration order.
    pub fn interested(&self, signature: ComponentSignature) -> impl Iterator<Item = SystemKind> + '_ {
        self.entries
            .iter()
            .filter(move |(required, _)| signature.contains(*required))
            .map(|(_, system)| *system)
    }

    pub fn is_interested(&self, signature: ComponentSignature, system: SystemKind) -> bool {
        self.interested(signature).any(|s| s == system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_contains_subsets() {
        let sig = ComponentSignature::from(ComponentKind::Transform).with(ComponentKind::Sprite);
        assert!(sig.has(ComponentKind::Sprite));
        assert!(!sig.has(ComponentKind::Animator));
        assert!(sig.contains(ComponentKind::Transform.into()));
        assert!(!sig.contains(ComponentSignature::from(ComponentKind::Animator)));
        assert!(sig.contains(ComponentSignature::EMPTY));
    }

    #[test]
    fn table_routes_by_signature() {
        let table = SystemTable::engine_defaults();
        let sprite_only = ComponentSignature::from(ComponentKind::Transform).with(ComponentKind::Sprite);
        let systems: Vec<_> = table.interested(sprite_only).collect();
        assert_eq!(systems, vec![SystemKind::SpriteBatch]);

        let animated = sprite_only.with(ComponentKind::Animator);
        assert!(table.is_interested(animated, SystemKind::Animation));
        assert!(!table.is_interested(animated, SystemKind::StateMatch));
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut table = SystemTable::new();
        table.register(ComponentKind::Sprite.into(), SystemKind::SpriteBatch);
        table.register(ComponentKind::Sprite.into(), SystemKind::SpriteBatch);
        let sig = ComponentSignature::from(ComponentKind::Sprite);
        assert_eq!(table.interested(sig).count(), 1);
    }
}
