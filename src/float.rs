use std::fmt::{Debug, Display};

use num_traits::{Float as NumFloat, FloatConst, FromPrimitive};

/// Marker trait for the scalar element type all derivative computations run on.
///
/// Bundles the numeric and utility traits needed throughout multidiff. The
/// compiler tables themselves are element-agnostic; this trait is the only
/// capability the runtime loops require, so a single generic implementation
/// serves `f32`, `f64` and any future field element exposing the same surface.
pub trait Float:
    NumFloat + FloatConst + FromPrimitive + Copy + Send + Sync + Default + Debug + Display + 'static
{
}

impl Float for f32 {}
impl Float for f64 {}
