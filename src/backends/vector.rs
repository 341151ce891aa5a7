/// Contiguous `f64` storage that can be passed as formula arguments.
///
/// [`Formula::eval`](crate::Formula::eval) accepts any implementor for the
/// scalar argument list and for each vector argument, so callers can keep their
/// data in whatever container they already use.
///
/// # Examples
///
/// ```rust
/// use formula_vm::prelude::Vector;
///
/// let v = vec![1.0, 2.0, 3.0];
/// assert_eq!(Vector::len(&v), 3);
/// assert_eq!(Vector::as_slice(&v)[1], 2.0);
///
/// let a = [4.0, 5.0];
/// assert!(!Vector::is_empty(&a));
/// ```
pub trait Vector {
    /// The elements as a slice.
    fn as_slice(&self) -> &[f64];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Vector for Vec<f64> {
    fn as_slice(&self) -> &[f64] {
        self
    }
}

impl Vector for [f64] {
    fn as_slice(&self) -> &[f64] {
        self
    }
}

impl<const N: usize> Vector for [f64; N] {
    fn as_slice(&self) -> &[f64] {
        self
    }

    fn len(&self) -> usize {
        N
    }
}

/// Standard-layout `ndarray` vectors.
///
/// # Panics
/// `as_slice` panics for arrays that are not contiguous in memory (for
/// example strided views turned into owned arrays with a custom layout).
///
/// ```rust
/// use formula_vm::prelude::Vector;
/// use ndarray::Array1;
///
/// let v = Array1::from(vec![1.0, 2.0]);
/// assert_eq!(Vector::as_slice(&v), &[1.0, 2.0]);
/// ```
#[cfg(feature = "ndarray")]
impl Vector for ndarray::Array1<f64> {
    fn as_slice(&self) -> &[f64] {
        self.as_slice()
            .expect("ndarray vector must be contiguous in standard layout")
    }

    fn len(&self) -> usize {
        self.len()
    }
}

/// ```rust
/// use formula_vm::prelude::Vector;
/// use nalgebra::DVector;
///
/// let v = DVector::from_vec(vec![3.0, 4.0]);
/// assert_eq!(Vector::len(&v), 2);
/// ```
#[cfg(feature = "nalgebra")]
impl Vector for nalgebra::DVector<f64> {
    fn as_slice(&self) -> &[f64] {
        self.as_slice()
    }

    fn len(&self) -> usize {
        self.len()
    }
}
