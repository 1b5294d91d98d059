//! State hierarchy and the "is in" containment table

use std::borrow::Cow;
use std::fmt::Debug;
use std::hash::Hash;

/// A state identifier that knows its place in the state tree.
///
/// Composite states and leaf states share one namespace; `ALL` lists every
/// state in index order.
pub trait HierarchicalState: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every state, ordered so that `ALL[s.index()] == s`
    const ALL: &'static [Self];

    /// Dense index of the state
    fn index(self) -> usize;

    /// Enclosing composite state, `None` at the root
    fn parent(self) -> Option<Self>;

    /// The state followed by its ancestors, innermost first
    fn ancestors(self) -> Ancestors<Self> {
        Ancestors { next: Some(self) }
    }
}

/// Iterator over a state and its enclosing states
#[derive(Debug, Clone)]
pub struct Ancestors<S> {
    next: Option<S>,
}

impl<S: HierarchicalState> Iterator for Ancestors<S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Bit matrix answering "is state X equal to or inside state Y".
///
/// Row `x` is `stride` bytes wide; bit `y` of the row is set when `y == x` or
/// `y` encloses `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsInTable {
    data: Cow<'static, [u8]>,
    stride: usize,
}

impl IsInTable {
    /// Wrap generated table data
    pub const fn from_static(data: &'static [u8], stride: usize) -> Self {
        Self {
            data: Cow::Borrowed(data),
            stride,
        }
    }

    /// Compute the table from the parent relation of `S`
    pub fn build<S: HierarchicalState>() -> Self {
        let stride = S::ALL.len().div_ceil(8);
        let mut data = vec![0u8; S::ALL.len() * stride];
        for state in S::ALL {
            let row = state.index() * stride;
            for ancestor in state.ancestors() {
                let bit = ancestor.index();
                data[row + bit / 8] |= 1 << (bit % 8);
            }
        }
        Self {
            data: Cow::Owned(data),
            stride,
        }
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw table bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// True if state `queried` is `current` or encloses it.
    ///
    /// Indices outside the table answer false.
    pub fn is_in(&self, current: usize, queried: usize) -> bool {
        if queried >= self.stride * 8 {
            return false;
        }
        self.data
            .get(current * self.stride + queried / 8)
            .is_some_and(|byte| byte & (1 << (queried % 8)) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test state enum
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestState {
        Root,
        Menu,
        Settings,
        Display,
        Volume,
    }

    impl HierarchicalState for TestState {
        const ALL: &'static [Self] = &[
            TestState::Root,
            TestState::Menu,
            TestState::Settings,
            TestState::Display,
            TestState::Volume,
        ];

        fn index(self) -> usize {
            self as usize
        }

        fn parent(self) -> Option<Self> {
            match self {
                TestState::Menu | TestState::Settings => Some(TestState::Root),
                TestState::Display => Some(TestState::Settings),
                _ => None,
            }
        }
    }

    // Ten states so that rows need two bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Wide(u8);

    impl HierarchicalState for Wide {
        const ALL: &'static [Self] = &[
            Wide(0),
            Wide(1),
            Wide(2),
            Wide(3),
            Wide(4),
            Wide(5),
            Wide(6),
            Wide(7),
            Wide(8),
            Wide(9),
        ];

        fn index(self) -> usize {
            self.0 as usize
        }

        fn parent(self) -> Option<Self> {
            // Chain: 9 -> 8 -> ... -> 0
            self.0.checked_sub(1).map(Wide)
        }
    }

    #[test]
    fn test_ancestors_innermost_first() {
        let chain: Vec<_> = TestState::Display.ancestors().collect();
        assert_eq!(
            chain,
            vec![TestState::Display, TestState::Settings, TestState::Root]
        );
    }

    #[test]
    fn test_build_matches_parent_relation() {
        let table = IsInTable::build::<TestState>();
        assert_eq!(table.stride(), 1);
        assert_eq!(table.as_bytes(), &[0x01, 0x03, 0x05, 0x0d, 0x10]);

        assert!(table.is_in(TestState::Display.index(), TestState::Root.index()));
        assert!(table.is_in(TestState::Display.index(), TestState::Settings.index()));
        assert!(!table.is_in(TestState::Display.index(), TestState::Menu.index()));
        assert!(!table.is_in(TestState::Root.index(), TestState::Menu.index()));
        assert!(!table.is_in(TestState::Volume.index(), TestState::Root.index()));
    }

    #[test]
    fn test_reflexive() {
        let table = IsInTable::build::<TestState>();
        for state in TestState::ALL {
            assert!(table.is_in(state.index(), state.index()), "{state:?}");
        }
    }

    #[test]
    fn test_multi_byte_rows() {
        let table = IsInTable::build::<Wide>();
        assert_eq!(table.stride(), 2);
        assert!(table.is_in(9, 0));
        assert!(table.is_in(9, 8));
        assert!(table.is_in(9, 9));
        assert!(!table.is_in(8, 9));
        assert!(!table.is_in(0, 1));
    }

    #[test]
    fn test_static_data_and_out_of_range() {
        static DATA: [u8; 2] = [0x01, 0x03];
        let table = IsInTable::from_static(&DATA, 1);
        assert!(table.is_in(1, 0));
        assert!(!table.is_in(0, 1));
        assert!(!table.is_in(2, 0));
        assert!(!table.is_in(0, 8));
        assert_eq!(table, IsInTable::from_static(&[0x01, 0x03], 1));
    }
}
