use std::sync::Arc;

/// Type alias for a registered scalar function.
///
/// This represents a function that:
/// - Takes its arguments in call order as a slice (length equals the arity)
/// - Returns a single f64 result
/// - Is both Send and Sync so compiled programs can be shared across threads
pub type ScalarKernel = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Type alias for a vector function that produces a scalar.
///
/// This represents a function that:
/// - Takes the scalar-position arguments in call order
/// - Takes the vector-position arguments in call order
/// - Returns a single f64 result
pub type VectorToScalarKernel = Arc<dyn Fn(&[f64], &[&[f64]]) -> f64 + Send + Sync>;

/// Type alias for a vector function that produces a vector.
///
/// This represents a function that:
/// - Takes the scalar-position arguments in call order
/// - Takes the vector-position arguments in call order
/// - Appends its result to the provided (already cleared) output buffer
pub type VectorToVectorKernel = Arc<dyn Fn(&[f64], &[&[f64]], &mut Vec<f64>) + Send + Sync>;
