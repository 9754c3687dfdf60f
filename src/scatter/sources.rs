// src/scatter/sources.rs
//! Ordered, identity-deduplicated pick list of source objects.

use rand::Rng;

use super::core::ObjectHandle;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceSet {
    items: Vec<ObjectHandle>,
}

impl SourceSet {
    pub fn new() -> Self { Self::default() }

    /// Appends `obj` unless already present. Returns true when inserted.
    pub fn add(&mut self, obj: ObjectHandle) -> bool {
        if self.contains(obj) {
            return false;
        }
        self.items.push(obj);
        true
    }

    /// Adds every new object in order; returns how many were inserted.
    pub fn add_many(&mut self, objs: impl IntoIterator<Item = ObjectHandle>) -> usize {
        objs.into_iter().filter(|&o| self.add(o)).count()
    }

    pub fn remove(&mut self, obj: ObjectHandle) -> bool {
        match self.index_of(obj) {
            Some(i) => {
                self.items.remove(i);
                true
            }
            None => false,
        }
    }

    /// Swaps `old` for `new` in place. If `new` is already listed, `old` is just
    /// dropped so the set stays duplicate-free.
    pub fn replace(&mut self, old: ObjectHandle, new: ObjectHandle) -> bool {
        let Some(i) = self.index_of(old) else { return false };
        if old == new {
            return true;
        }
        if self.contains(new) {
            self.items.remove(i);
        } else {
            self.items[i] = new;
        }
        true
    }

    pub fn clear(&mut self) { self.items.clear(); }

    /// Uniform pick with replacement.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ObjectHandle> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[rng.random_range(0..self.items.len())])
    }

    pub fn contains(&self, obj: ObjectHandle) -> bool { self.items.contains(&obj) }

    pub fn index_of(&self, obj: ObjectHandle) -> Option<usize> {
        self.items.iter().position(|&o| o == obj)
    }

    pub fn get(&self, index: usize) -> Option<ObjectHandle> { self.items.get(index).copied() }

    pub fn iter(&self) -> impl Iterator<Item = ObjectHandle> + '_ { self.items.iter().copied() }

    pub fn as_slice(&self) -> &[ObjectHandle] { &self.items }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Drops entries the host no longer knows about.
    pub fn retain(&mut self, mut keep: impl FnMut(ObjectHandle) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|&o| keep(o));
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const A: ObjectHandle = ObjectHandle(1);
    const B: ObjectHandle = ObjectHandle(2);
    const C: ObjectHandle = ObjectHandle(3);

    #[test]
    fn add_is_identity_deduplicated() {
        let mut set = SourceSet::new();
        assert!(set.add(A));
        assert!(!set.add(A));
        assert_eq!(set.add_many([B, A, C, B]), 2);
        assert_eq!(set.as_slice(), &[A, B, C]);
    }

    #[test]
    fn replace_keeps_order_and_uniqueness() {
        let mut set = SourceSet::new();
        set.add_many([A, B]);
        assert!(set.replace(A, C));
        assert_eq!(set.as_slice(), &[C, B]);
        assert!(set.replace(C, B));
        assert_eq!(set.as_slice(), &[B]);
        assert!(!set.replace(A, C));
    }

    #[test]
    fn remove_and_clear() {
        let mut set = SourceSet::new();
        set.add_many([A, B, C]);
        assert!(set.remove(B));
        assert!(!set.remove(B));
        assert_eq!(set.as_slice(), &[A, C]);
        assert_eq!(set.retain(|o| o != C), 1);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn pick_covers_all_members() {
        let mut set = SourceSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(set.pick(&mut rng), None);
        set.add_many([A, B, C]);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let o = set.pick(&mut rng).unwrap();
            seen[set.index_of(o).unwrap()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }
}
