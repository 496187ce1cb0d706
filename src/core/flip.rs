//! Mirror operations on `(channel, height, width)` tensors.

use ndarray::{s, Array3, ArrayBase, Data, Ix3};

/// Reverse the height axis (top row becomes bottom row).
pub fn flip_vertical<A, S>(tensor: &ArrayBase<S, Ix3>) -> Array3<A>
where
    A: Clone,
    S: Data<Elem = A>,
{
    tensor.slice(s![.., ..;-1, ..]).to_owned()
}

/// Reverse the width axis (left column becomes right column).
pub fn flip_horizontal<A, S>(tensor: &ArrayBase<S, Ix3>) -> Array3<A>
where
    A: Clone,
    S: Data<Elem = A>,
{
    tensor.slice(s![.., .., ..;-1]).to_owned()
}

/// A flip usable as a dataset image transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    Vertical,
    Horizontal,
}

impl Flip {
    pub fn apply<A, S>(&self, tensor: &ArrayBase<S, Ix3>) -> Array3<A>
    where
        A: Clone,
        S: Data<Elem = A>,
    {
        match self {
            Flip::Vertical => flip_vertical(tensor),
            Flip::Horizontal => flip_horizontal(tensor),
        }
    }
}
