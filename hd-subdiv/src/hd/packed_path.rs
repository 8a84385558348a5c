//! Corner paths packed into 32 bits.
//!
//! A path selects a refined vertex relative to a control face: every element
//! but the last picks one of the four child faces, the last element picks a
//! corner of the face reached that way.
//!
//! Layout of the packed `u32`:
//!
//! | Bits            | Content                         |
//! |-----------------|---------------------------------|
//! | `28..32`        | path length                     |
//! | `24..28`        | unused                          |
//! | `22 - 2i..24 - 2i` | element `i` (`0..=3`)        |
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const LENGTH_SHIFT: u32 = 28;
const FIRST_ELEMENT_SHIFT: usize = 22;
const ELEMENT_MASK: u32 = 0x3;

/// A sequence of quad corner selectors packed into a `u32`.
///
/// # Examples
///
/// ```
/// use hd_subdiv::hd::PackedPath;
///
/// let path = PackedPath::new(&[0, 2, 1]).unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.element(1), 2);
/// assert_eq!(path.to_vec(), [0, 2, 1]);
/// assert_eq!(path.to_string(), "[0,2,1]");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, derive_more::Into)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct PackedPath(u32);

impl PackedPath {
    /// The maximum number of elements a path can hold.
    pub const MAX_LEN: usize = 12;

    /// Packs `elements`.
    ///
    /// Fails if an element is not a corner selector (`0..=3`) or if there are
    /// more than [`MAX_LEN`](Self::MAX_LEN) elements.
    pub fn new(elements: &[u8]) -> Result<Self> {
        if Self::MAX_LEN < elements.len() {
            return Err(Error::PathTooLong {
                len: elements.len(),
                max: Self::MAX_LEN,
            });
        }

        elements
            .iter()
            .enumerate()
            .try_fold(
                (elements.len() as u32) << LENGTH_SHIFT,
                |bits, (position, &element)| {
                    if 3 < element {
                        Err(Error::InvalidPathElement { position, element })
                    } else {
                        Ok(bits | (element as u32) << Self::shift(position))
                    }
                },
            )
            .map(PackedPath)
    }

    /// Wraps raw bits, e.g. as read from a file. Nothing is checked.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        PackedPath(bits)
    }

    /// Returns the raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the number of elements as stored in the length field.
    ///
    /// For paths built with [`new()`](Self::new()) this is at most
    /// [`MAX_LEN`](Self::MAX_LEN). Raw bits may claim up to 15.
    #[inline]
    pub const fn len(self) -> usize {
        (self.0 >> LENGTH_SHIFT) as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        0 == self.len()
    }

    /// Returns element `index`.
    ///
    /// # Panics
    ///
    /// If `index` is not less than [`MAX_LEN`](Self::MAX_LEN).
    #[inline]
    pub fn element(self, index: usize) -> u8 {
        assert!(index < Self::MAX_LEN, "path element {} out of range", index);
        ((self.0 >> Self::shift(index)) & ELEMENT_MASK) as u8
    }

    /// Returns the first element, i.e. the corner of the control face whose
    /// tangent frame the edit is expressed in.
    #[inline]
    pub fn first(self) -> Option<u8> {
        (!self.is_empty()).then(|| self.element(0))
    }

    /// Returns the last element, i.e. the corner of the addressed face.
    #[inline]
    pub fn last(self) -> Option<u8> {
        let len = self.len().min(Self::MAX_LEN);
        len.checked_sub(1).map(|index| self.element(index))
    }

    /// Iterates over the elements.
    pub fn iter(self) -> impl ExactSizeIterator<Item = u8> {
        (0..self.len().min(Self::MAX_LEN)).map(move |index| self.element(index))
    }

    /// Unpacks the elements.
    pub fn to_vec(self) -> Vec<u8> {
        self.iter().collect()
    }

    #[inline]
    fn shift(index: usize) -> usize {
        FIRST_ELEMENT_SHIFT - 2 * index
    }
}

impl TryFrom<&[u8]> for PackedPath {
    type Error = Error;

    fn try_from(elements: &[u8]) -> Result<Self> {
        Self::new(elements)
    }
}

impl fmt::Display for PackedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, element) in self.iter().enumerate() {
            if 0 != index {
                write!(f, ",")?;
            }
            write!(f, "{}", element)?;
        }
        write!(f, "]")
    }
}
