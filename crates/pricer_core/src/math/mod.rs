//! Numerical building blocks: interpolation, quadrature and solvers.

pub mod interpolators;
pub mod quadrature;
pub mod solvers;
