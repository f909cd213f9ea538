//! Signs: short text labels attached to a face of a voxel.

/// Longest sign text kept, in characters. Longer text is truncated.
pub const MAX_SIGN_LENGTH: usize = 64;

/// Number of valid sign faces. Faces `0..4` stand on the four sides of a block,
/// faces `4..8` lie on its top in each of the four orientations.
pub const SIGN_FACES: i32 = 8;

/// A piece of text attached to one face of a voxel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sign {
    /// World X of the voxel the sign is attached to.
    pub x: i32,
    /// World Y of the voxel the sign is attached to.
    pub y: i32,
    /// World Z of the voxel the sign is attached to.
    pub z: i32,
    /// Face index in `0..SIGN_FACES`.
    pub face: i32,
    /// The sign text, at most [`MAX_SIGN_LENGTH`] characters.
    pub text: String,
}

impl Sign {
    /// Creates a sign, truncating the text to [`MAX_SIGN_LENGTH`] characters.
    pub fn new(x: i32, y: i32, z: i32, face: i32, text: &str) -> Self {
        Sign {
            x,
            y,
            z,
            face,
            text: text.chars().take(MAX_SIGN_LENGTH).collect(),
        }
    }

    fn is_at(&self, x: i32, y: i32, z: i32) -> bool {
        self.x == x && self.y == y && self.z == z
    }
}

/// The signs owned by one chunk.
///
/// At most one sign exists per (voxel, face); adding a sign replaces the
/// previous one on that face. Removal does not preserve order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignList {
    signs: Vec<Sign>,
}

impl SignList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sign, replacing any sign on the same voxel face.
    pub fn add(&mut self, sign: Sign) {
        self.remove(sign.x, sign.y, sign.z, sign.face);
        self.signs.push(sign);
    }

    /// Removes the sign on one face of a voxel. Returns the number removed.
    pub fn remove(&mut self, x: i32, y: i32, z: i32, face: i32) -> usize {
        self.remove_where(|sign| sign.is_at(x, y, z) && sign.face == face)
    }

    /// Removes every sign attached to a voxel. Returns the number removed.
    pub fn remove_all(&mut self, x: i32, y: i32, z: i32) -> usize {
        self.remove_where(|sign| sign.is_at(x, y, z))
    }

    /// Number of signs.
    pub fn len(&self) -> usize {
        self.signs.len()
    }

    /// Returns `true` when the list holds no sign.
    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }

    /// Iterates the signs in storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sign> {
        self.signs.iter()
    }

    fn remove_where(&mut self, predicate: impl Fn(&Sign) -> bool) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.signs.len() {
            if predicate(&self.signs[i]) {
                self.signs.swap_remove(i);
                removed += 1;
            } else {
                i += 1;
            }
        }
        removed
    }
}

impl<'a> IntoIterator for &'a SignList {
    type Item = &'a Sign;
    type IntoIter = std::slice::Iter<'a, Sign>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<Sign> for SignList {
    fn extend<T: IntoIterator<Item = Sign>>(&mut self, iter: T) {
        for sign in iter {
            self.add(sign);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_on_the_same_face_replaces() {
        let mut signs = SignList::new();
        signs.add(Sign::new(1, 2, 3, 0, "hello"));
        signs.add(Sign::new(1, 2, 3, 0, "world"));
        signs.add(Sign::new(1, 2, 3, 1, "other face"));
        assert_eq!(signs.len(), 2);
        assert!(signs.iter().any(|s| s.face == 0 && s.text == "world"));
    }

    #[test]
    fn remove_all_clears_every_face() {
        let mut signs = SignList::new();
        for face in 0..4 {
            signs.add(Sign::new(0, 0, 0, face, "x"));
        }
        signs.add(Sign::new(5, 0, 0, 0, "keep"));
        assert_eq!(signs.remove_all(0, 0, 0), 4);
        assert_eq!(signs.len(), 1);
        assert_eq!(signs.remove(0, 0, 0, 2), 0);
    }

    #[test]
    fn long_text_is_truncated() {
        let sign = Sign::new(0, 0, 0, 0, &"a".repeat(100));
        assert_eq!(sign.text.len(), MAX_SIGN_LENGTH);
    }
}
