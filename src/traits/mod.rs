//! `std::ops` implementations for the public numeric types.

mod gradient_ops;
mod std_ops;
