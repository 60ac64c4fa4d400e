/*!
 * Core Types
 * Unit and resource handles shared across the loader machinery
 */

use bytes::Bytes;
use std::io::{Cursor, Read};
use std::sync::Arc;

/// A resolved, loadable binary unit.
///
/// Handles are cheap to clone; two clones of the same resolution share one
/// allocation and compare equal under [`UnitHandle::ptr_eq`]. Whether two
/// resolutions of the same name share a handle is up to the delegate (a
/// caching delegate yields identical handles, a non-caching one need not).
#[derive(Debug, Clone)]
pub struct UnitHandle {
    inner: Arc<UnitInner>,
}

#[derive(Debug)]
struct UnitInner {
    name: String,
    payload: Bytes,
}

impl UnitHandle {
    /// Create a handle for a named unit with its binary payload.
    pub fn new(name: impl Into<String>, payload: Bytes) -> Self {
        Self {
            inner: Arc::new(UnitInner {
                name: name.into(),
                payload,
            }),
        }
    }

    /// The unit's binary name as requested at resolution time.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The unit's raw bytes.
    pub fn payload(&self) -> &Bytes {
        &self.inner.payload
    }

    /// Identity comparison: true when both handles come from the same
    /// resolution (share one allocation), regardless of name equality.
    pub fn ptr_eq(a: &UnitHandle, b: &UnitHandle) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

/// A located resource: a name, where it was found, and its content.
#[derive(Debug, Clone)]
pub struct ResourceRef {
    name: String,
    location: String,
    payload: Bytes,
}

impl ResourceRef {
    /// Create a resource reference with content.
    pub fn new(name: impl Into<String>, location: impl Into<String>, payload: Bytes) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            payload,
        }
    }

    /// The `/`-separated resource path this reference answers to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// An opaque description of where the resource was found.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The resource's raw bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Open the resource content as a reader.
    pub fn open(&self) -> Box<dyn Read + Send> {
        Box::new(Cursor::new(self.payload.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_handle_identity() {
        let a = UnitHandle::new("pkg.Foo", Bytes::from_static(b"\xca\xfe"));
        let b = a.clone();
        let c = UnitHandle::new("pkg.Foo", Bytes::from_static(b"\xca\xfe"));

        assert!(UnitHandle::ptr_eq(&a, &b));
        assert!(!UnitHandle::ptr_eq(&a, &c));
        assert_eq!(a.name(), c.name());
    }

    #[test]
    fn test_resource_ref_open() {
        let resource = ResourceRef::new("pkg/data.bin", "memory:pkg/data.bin", Bytes::from_static(b"hello"));

        let mut buf = Vec::new();
        resource.open().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
        assert_eq!(resource.location(), "memory:pkg/data.bin");
    }
}
