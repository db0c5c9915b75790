// Authority-owned value mirrored to observers with a monotonically increasing version.

#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub previous: T,
    pub value: T,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Replicated<T> {
    value: T,
    version: u64,
}

impl<T: Clone + PartialEq> Replicated<T> {
    pub fn new(value: T) -> Self {
        Self { value, version: 0 }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Authority-side write. Returns the change so the caller can notify locally and broadcast.
    pub fn set(&mut self, value: T) -> Option<Change<T>> {
        if self.value == value {
            return None;
        }
        let previous = std::mem::replace(&mut self.value, value);
        self.version += 1;
        Some(Change {
            previous,
            value: self.value.clone(),
            version: self.version,
        })
    }

    /// Observer-side write from a received message; stale versions are dropped.
    pub fn apply_remote(&mut self, value: T, version: u64) -> Option<Change<T>> {
        if version <= self.version {
            return None;
        }
        let previous = std::mem::replace(&mut self.value, value);
        self.version = version;
        Some(Change {
            previous,
            value: self.value.clone(),
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_bumps_version_only_on_change() {
        let mut v = Replicated::new(10.0_f32);
        assert!(v.set(10.0).is_none());
        let change = v.set(8.0).expect("value changed");
        assert_eq!(change.previous, 10.0);
        assert_eq!(change.value, 8.0);
        assert_eq!(change.version, 1);
        assert_eq!(v.version(), 1);
    }

    #[test]
    fn remote_updates_ignore_stale_versions() {
        let mut v = Replicated::new(0_u32);
        assert!(v.apply_remote(5, 3).is_some());
        assert!(v.apply_remote(4, 2).is_none());
        assert!(v.apply_remote(4, 3).is_none());
        assert_eq!(*v.get(), 5);
    }
}
