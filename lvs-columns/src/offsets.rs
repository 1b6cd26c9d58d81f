//! Offset chains locating the field a column reads.
//!
//! A chain is applied step by step starting at the row object: each non-zero
//! hop slot adds its displacement to the current address and follows the
//! pointer stored there, then the leaf offset is added to the final address.

use std::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// A location within the monitoring object address space.
pub struct Address(pub u64);

impl Address {
    /// Returns the address displaced by `offset` bytes, or `None` if the
    /// result leaves the address space.
    #[inline]
    pub fn offset(self, offset: i32) -> Option<Address> {
        self.0.checked_add_signed(i64::from(offset)).map(Address)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Read access to the pointers stored within monitoring objects.
pub trait ObjectMemory: Send + Sync {
    /// Loads the address stored at `at`.
    ///
    /// Returns `None` for null pointers and locations holding no pointer.
    fn load_address(&self, at: Address) -> Option<Address>;
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
/// The four displacements navigating from a row object to a column field.
pub struct ColumnOffsets {
    indirect: i32,
    extra: i32,
    extra_extra: i32,
    leaf: i32,
}

impl ColumnOffsets {
    pub const fn new(indirect: i32, extra: i32, extra_extra: i32, leaf: i32) -> Self {
        Self {
            indirect,
            extra,
            extra_extra,
            leaf,
        }
    }

    /// Creates a chain with the three hop slots and no leaf displacement.
    pub const fn hops(indirect: i32, extra: i32, extra_extra: i32) -> Self {
        Self::new(indirect, extra, extra_extra, 0)
    }

    #[inline]
    pub fn indirect(&self) -> i32 {
        self.indirect
    }

    #[inline]
    pub fn extra(&self) -> i32 {
        self.extra
    }

    #[inline]
    pub fn extra_extra(&self) -> i32 {
        self.extra_extra
    }

    #[inline]
    pub fn leaf(&self) -> i32 {
        self.leaf
    }

    /// Returns the slots in application order.
    pub fn as_array(&self) -> [i32; 4] {
        [self.indirect, self.extra, self.extra_extra, self.leaf]
    }

    /// Walks the chain from `root`.
    ///
    /// Returns `None` if a hop hits a null pointer or the address overflows.
    pub fn resolve<M>(&self, memory: &M, root: Address) -> Option<Address>
    where
        M: ObjectMemory + ?Sized,
    {
        let mut current = root;
        for hop in [self.indirect, self.extra, self.extra_extra] {
            if hop == 0 {
                continue;
            }
            current = memory.load_address(current.offset(hop)?)?;
        }
        current.offset(self.leaf)
    }
}

impl From<[i32; 4]> for ColumnOffsets {
    fn from(value: [i32; 4]) -> Self {
        let [indirect, extra, extra_extra, leaf] = value;
        Self::new(indirect, extra, extra_extra, leaf)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Pointers(HashMap<u64, u64>);

    impl ObjectMemory for Pointers {
        fn load_address(&self, at: Address) -> Option<Address> {
            self.0.get(&at.0).copied().filter(|v| *v != 0).map(Address)
        }
    }

    fn memory() -> Pointers {
        Pointers(HashMap::from([
            (0x1008, 0x2000),
            (0x2010, 0x3000),
            (0x3004, 0x4000),
            (0x1010, 0),
        ]))
    }

    #[rstest::rstest]
    #[case(ColumnOffsets::default(), Some(0x1000))]
    #[case(ColumnOffsets::new(0, 0, 0, 24), Some(0x1018))]
    #[case(ColumnOffsets::hops(8, 0, 0), Some(0x2000))]
    #[case(ColumnOffsets::hops(8, 0x10, 0), Some(0x3000))]
    #[case(ColumnOffsets::new(8, 0x10, 4, 12), Some(0x400c))]
    #[case(ColumnOffsets::new(0, 8, 0, -8), Some(0x1ff8))]
    #[case(ColumnOffsets::hops(0x10, 0, 0), None)]
    #[case(ColumnOffsets::hops(0x20, 0, 0), None)]
    fn test_resolve(#[case] offsets: ColumnOffsets, #[case] expected: Option<u64>) {
        let resolved = offsets.resolve(&memory(), Address(0x1000));
        assert_eq!(resolved, expected.map(Address), "Unexpected address for {offsets:?}");
    }

    #[test]
    fn test_resolve_overflow() {
        let offsets = ColumnOffsets::new(0, 0, 0, -1);
        assert_eq!(offsets.resolve(&memory(), Address(0)), None);
    }

    #[test]
    fn test_slots_are_kept_verbatim() {
        let offsets = ColumnOffsets::new(-3, 0, 7, i32::MAX);
        assert_eq!(offsets.as_array(), [-3, 0, 7, i32::MAX]);
        assert_eq!(ColumnOffsets::from(offsets.as_array()), offsets);
    }
}
