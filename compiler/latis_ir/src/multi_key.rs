//! Multi-level subscript paths.

use std::fmt;

use smallvec::SmallVec;

use crate::Key;

/// An ordered path of keys, e.g. `$a[1]['x'][]` is `[1][x][Any]`.
///
/// Most paths are one or two levels deep, so they stay inline.
#[derive(Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct MultiKey(SmallVec<[Key; 4]>);

impl MultiKey {
    /// The empty path, addressing the node itself.
    pub fn new() -> Self {
        MultiKey(SmallVec::new())
    }

    /// A path of `depth` wildcard keys.
    pub fn any_key(depth: usize) -> Self {
        MultiKey(std::iter::repeat_n(Key::ANY, depth).collect())
    }

    pub fn push(&mut self, key: Key) {
        self.0.push(key);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Key] {
        &self.0
    }
}

impl From<&[Key]> for MultiKey {
    fn from(keys: &[Key]) -> Self {
        MultiKey(keys.iter().copied().collect())
    }
}

impl FromIterator<Key> for MultiKey {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        MultiKey(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MultiKey {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Renders each key through the process-wide interner, as `[k1][k2]`.
impl fmt::Display for MultiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "[{key}]")?;
        }
        Ok(())
    }
}
