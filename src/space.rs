//! Anatomical spaces and the orientation registry.
//!
//! A space is a marker type identifying one coordinate/reference frame, e.g.
//! a subject's native T1 frame. Images are generic over their space, so adding
//! volumes from different frames is rejected at compile time; the same check
//! is repeated at run time inside every arithmetic operation so that callers
//! reaching the dynamically-tagged API get the identical guarantee.
//!
//! Each space is bound to at most one orientation for the lifetime of the
//! process: the first volume constructed in a space fixes the geometry, and
//! later volumes must agree with it. This is what makes the space tag a
//! semantic guard rather than a shape check — two volumes can be numerically
//! identical in layout and still live in incompatible frames.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, RwLock};

use crate::error::{Error, Result};
use crate::header::ImageHeader;

/// Marker trait for an anatomical space.
///
/// Implementations are unit structs; see [`crate::spaces`] for the predefined
/// set. Custom spaces are one line:
///
/// ```
/// use medspace::space::Space;
///
/// struct Subject3T1;
/// impl Space for Subject3T1 {
///     const NAME: &'static str = "subject3-t1";
/// }
/// ```
pub trait Space: 'static {
    /// Stable name of the space; two spaces are the same frame iff their
    /// names are equal.
    const NAME: &'static str;

    /// Runtime tag for this space.
    fn tag() -> SpaceTag {
        SpaceTag(Cow::Borrowed(Self::NAME))
    }
}

/// Opaque runtime identifier for a space.
///
/// Equality is identity of the tag. It deliberately carries no structural
/// information: shape-compatible volumes with differing tags must not combine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpaceTag(Cow<'static, str>);

impl SpaceTag {
    /// Tag for a space only known at run time.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The space name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Orientation fixed for each space type, keyed by `TypeId`.
static ORIENTATIONS: LazyLock<RwLock<HashMap<TypeId, ImageHeader>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

fn read_registry() -> std::sync::RwLockReadGuard<'static, HashMap<TypeId, ImageHeader>> {
    ORIENTATIONS.read().unwrap_or_else(|e| e.into_inner())
}

fn write_registry() -> std::sync::RwLockWriteGuard<'static, HashMap<TypeId, ImageHeader>> {
    ORIENTATIONS.write().unwrap_or_else(|e| e.into_inner())
}

/// Bind space `S` to `header`, or verify the existing binding.
///
/// Idempotent when the geometry matches what was registered earlier; fails
/// with [`Error::OrientationMismatch`] when it conflicts. The check-then-bind
/// is done under one write lock so two first-initialisers cannot race.
pub fn initialise<S: Space>(header: &ImageHeader) -> Result<()> {
    let key = TypeId::of::<S>();

    // Common case: already bound, read lock only.
    if let Some(existing) = read_registry().get(&key) {
        return if existing.matches(header) {
            Ok(())
        } else {
            Err(Error::OrientationMismatch { space: S::tag() })
        };
    }

    let mut registry = write_registry();
    match registry.get(&key) {
        Some(existing) if existing.matches(header) => Ok(()),
        Some(_) => Err(Error::OrientationMismatch { space: S::tag() }),
        None => {
            let _ = registry.insert(key, header.clone());
            Ok(())
        }
    }
}

/// The orientation bound to space `S`, if any volume has fixed it yet.
pub fn orientation<S: Space>() -> Option<ImageHeader> {
    read_registry().get(&TypeId::of::<S>()).cloned()
}

/// Whether space `S` has been bound to an orientation.
pub fn is_initialised<S: Space>() -> bool {
    read_registry().contains_key(&TypeId::of::<S>())
}

/// Unbind space `S`.
///
/// Test support only: clearing a binding lets volumes with stale geometry mix
/// with later ones. Production code has no reason to call this.
#[doc(hidden)]
pub fn debug_reset<S: Space>() {
    let _ = write_registry().remove(&TypeId::of::<S>());
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: [[f32; 4]; 4] = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    #[test]
    fn initialise_is_idempotent_for_matching_geometry() {
        struct A;
        impl Space for A {
            const NAME: &'static str = "test-a";
        }

        let h = ImageHeader::new(vec![2, 2, 2], IDENTITY).unwrap();
        assert!(!is_initialised::<A>());
        initialise::<A>(&h).unwrap();
        initialise::<A>(&h).unwrap();
        assert!(is_initialised::<A>());
        assert!(orientation::<A>().unwrap().matches(&h));
    }

    #[test]
    fn initialise_rejects_conflicting_geometry() {
        struct B;
        impl Space for B {
            const NAME: &'static str = "test-b";
        }

        let h1 = ImageHeader::new(vec![2, 2, 2], IDENTITY).unwrap();
        let h2 = ImageHeader::new(vec![4, 4, 4], IDENTITY).unwrap();
        initialise::<B>(&h1).unwrap();
        let err = initialise::<B>(&h2).unwrap_err();
        assert!(matches!(err, Error::OrientationMismatch { .. }));
    }

    #[test]
    fn debug_reset_unbinds() {
        struct C;
        impl Space for C {
            const NAME: &'static str = "test-c";
        }

        let h = ImageHeader::new(vec![2, 2, 2], IDENTITY).unwrap();
        initialise::<C>(&h).unwrap();
        debug_reset::<C>();
        assert!(!is_initialised::<C>());
    }

    #[test]
    fn tags_compare_by_name() {
        struct D;
        impl Space for D {
            const NAME: &'static str = "native-t1";
        }

        assert_eq!(D::tag(), SpaceTag::new("native-t1"));
        assert_ne!(D::tag(), SpaceTag::new("native-t2"));
    }
}
