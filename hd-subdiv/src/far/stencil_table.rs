//! Table of subdivision stencils.
//!
//! A stencil expresses one refined vertex as a weighted sum of vertices of the
//! previous refinement level. When the previous level's vertices move, the
//! refined vertex is recomputed simply by re-applying the weights.
//!
//! A [`Refinement`](super::Refinement) keeps one `StencilTable` per level so
//! that positions (and any other [`Primvar`]) can be refined level by level
//! and edited in between.
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use ultraviolet::{Vec2, Vec3};

use crate::{Error, Index, Result};

/// A primitive variable that can be interpolated by stencils.
pub trait Primvar: Copy + Send + Sync {
    /// The additive identity.
    fn zero() -> Self;

    /// Adds `weight * src` to `self`.
    fn add_with_weight(&mut self, src: &Self, weight: f32);
}

impl Primvar for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn add_with_weight(&mut self, src: &Self, weight: f32) {
        *self += weight * *src;
    }
}

impl Primvar for Vec2 {
    #[inline]
    fn zero() -> Self {
        Vec2::zero()
    }

    #[inline]
    fn add_with_weight(&mut self, src: &Self, weight: f32) {
        *self += *src * weight;
    }
}

impl Primvar for Vec3 {
    #[inline]
    fn zero() -> Self {
        Vec3::zero()
    }

    #[inline]
    fn add_with_weight(&mut self, src: &Self, weight: f32) {
        *self += *src * weight;
    }
}

/// Gives read access to a single stencil in a [`StencilTable`].
#[derive(Clone, Copy, Debug)]
pub struct Stencil<'a> {
    indices: &'a [Index],
    weights: &'a [f32],
}

impl<'a> Stencil<'a> {
    /// Returns the indices of the source vertices.
    pub fn indices(&self) -> &'a [Index] {
        self.indices
    }

    /// Returns the stencil interpolation weights.
    pub fn weights(&self) -> &'a [f32] {
        self.weights
    }

    /// Evaluates the stencil against `src`.
    #[inline]
    pub fn evaluate<T: Primvar>(&self, src: &[T]) -> T {
        self.indices
            .iter()
            .zip(self.weights)
            .fold(T::zero(), |mut value, (&index, &weight)| {
                value.add_with_weight(&src[usize::from(index)], weight);
                value
            })
    }
}

/// Container for stencil data.
///
/// Stencils are stored back to back in flat buffers; `offsets` and `sizes`
/// locate each one.
#[derive(Clone, Debug, Default)]
pub struct StencilTable {
    control_vertex_count: usize,
    sizes: Vec<u32>,
    offsets: Vec<Index>,
    indices: Vec<Index>,
    weights: Vec<f32>,
}

impl StencilTable {
    /// Creates an empty table for stencils over `control_vertex_count` source
    /// vertices.
    pub(crate) fn new(control_vertex_count: usize) -> Self {
        Self {
            control_vertex_count,
            ..Default::default()
        }
    }

    /// Appends a stencil. Entries with a repeated index are merged.
    pub(crate) fn push(&mut self, entries: &[(u32, f32)]) {
        let offset = self.indices.len();
        for &(index, weight) in entries {
            match self.indices[offset..].iter().position(|i| i.0 == index) {
                Some(position) => self.weights[offset + position] += weight,
                None => {
                    self.indices.push(Index(index));
                    self.weights.push(weight);
                }
            }
        }
        self.offsets.push(Index::from(offset));
        self.sizes.push((self.indices.len() - offset) as u32);
    }

    /// Returns the number of stencils in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Returns the number of source vertices indexed in the table.
    #[inline]
    pub fn control_vertex_count(&self) -> usize {
        self.control_vertex_count
    }

    /// Returns a Stencil at index i in the table.
    #[inline]
    pub fn stencil(&self, i: Index) -> Option<Stencil<'_>> {
        let i = usize::from(i);
        if self.len() <= i {
            None
        } else {
            let start = usize::from(self.offsets[i]);
            let end = start + self.sizes[i] as usize;
            Some(Stencil {
                indices: &self.indices[start..end],
                weights: &self.weights[start..end],
            })
        }
    }

    /// Returns the number of source vertices of each stencil in the table.
    #[inline]
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the offset to a given stencil.
    #[inline]
    pub fn offsets(&self) -> &[Index] {
        &self.offsets
    }

    /// Returns the indices of the source vertices.
    #[inline]
    pub fn control_indices(&self) -> &[Index] {
        &self.indices
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Evaluates every stencil against `src`, writing one value per stencil
    /// into `dst`.
    pub fn update_values<T: Primvar>(&self, src: &[T], dst: &mut [T]) -> Result<()> {
        if src.len() != self.control_vertex_count {
            return Err(Error::InvalidBufferSize {
                expected: self.control_vertex_count,
                actual: src.len(),
            });
        }
        if dst.len() != self.len() {
            return Err(Error::InvalidBufferSize {
                expected: self.len(),
                actual: dst.len(),
            });
        }

        let evaluate = |(i, value): (usize, &mut T)| {
            let start = usize::from(self.offsets[i]);
            let end = start + self.sizes[i] as usize;
            *value = Stencil {
                indices: &self.indices[start..end],
                weights: &self.weights[start..end],
            }
            .evaluate(src);
        };

        #[cfg(feature = "rayon")]
        dst.par_iter_mut().enumerate().for_each(evaluate);
        #[cfg(not(feature = "rayon"))]
        dst.iter_mut().enumerate().for_each(evaluate);

        Ok(())
    }
}
