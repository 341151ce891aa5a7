//! Registry of named functions and constants a formula may reference.
//!
//! The registry is the pluggable collaborator of the compiler: the classifier
//! resolves names against it, the code generator checks arities and argument
//! kinds, and the virtual machine calls the registered kernels by index.
//!
//! Names are case-insensitive and share one namespace. A name must start with a
//! letter, contain only letters and digits, and must not collide with the
//! keywords `IF`, `AND`, `OR`, `NOT` or the argument syntax `X<digits>`.
//!
//! Registered functions must be pure: the optimizer evaluates constant calls at
//! compile time and hoists repeated calls.
//!
//! # Example
//!
//! ```
//! use formula_vm::registry::{ArgKind, Registry};
//!
//! let mut registry = Registry::new();
//! registry.register_function("twice", "Doubles its argument", 1, |a| a[0] * 2.0).unwrap();
//! registry
//!     .register_vector_function("total", "Sum of elements", &[ArgKind::Vector], |_, v| {
//!         v[0].iter().sum()
//!     })
//!     .unwrap();
//! assert_eq!(registry.function_names(), vec!["TWICE", "TOTAL"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::RegistryError;
use crate::types::{ScalarKernel, VectorToScalarKernel, VectorToVectorKernel};

mod standard;

/// Whether a vector function argument (or result) is a scalar or a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Scalar,
    Vector,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Scalar => write!(f, "scalar"),
            ArgKind::Vector => write!(f, "vector"),
        }
    }
}

/// A named function of fixed arity over scalars.
#[derive(Clone)]
pub struct ScalarFunction {
    name: String,
    description: String,
    arity: usize,
    kernel: ScalarKernel,
}

impl ScalarFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Calls the function; `args` must hold exactly `arity` values.
    #[inline]
    pub fn compute(&self, args: &[f64]) -> f64 {
        (self.kernel)(args)
    }
}

impl fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Kernel of a vector function, tagged by the kind of value it returns.
#[derive(Clone)]
pub enum VectorKernel {
    Scalar(VectorToScalarKernel),
    Vector(VectorToVectorKernel),
}

/// A named function whose argument positions are each declared scalar or vector.
///
/// The kernel receives the scalar-position arguments and the vector-position
/// arguments as two separate slices, each in call order.
#[derive(Clone)]
pub struct VectorFunction {
    name: String,
    description: String,
    args: Vec<ArgKind>,
    scalar_arity: usize,
    vector_arity: usize,
    kernel: VectorKernel,
}

impl VectorFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared kind of every argument position.
    pub fn args(&self) -> &[ArgKind] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Number of scalar-position arguments.
    pub fn scalar_arity(&self) -> usize {
        self.scalar_arity
    }

    /// Number of vector-position arguments.
    pub fn vector_arity(&self) -> usize {
        self.vector_arity
    }

    /// Kind of the value the function produces.
    pub fn output(&self) -> ArgKind {
        match self.kernel {
            VectorKernel::Scalar(_) => ArgKind::Scalar,
            VectorKernel::Vector(_) => ArgKind::Vector,
        }
    }

    pub fn kernel(&self) -> &VectorKernel {
        &self.kernel
    }
}

impl fmt::Debug for VectorFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorFunction")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("output", &self.output())
            .finish()
    }
}

/// Value of a predefined constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

/// A named predefined constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    name: String,
    description: String,
    value: ConstantValue,
}

impl Constant {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value(&self) -> &ConstantValue {
        &self.value
    }
}

/// What a registered name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Function(u32),
    VectorFunction(u32),
    Constant(u32),
}

/// Collection of scalar functions, vector functions and constants.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    functions: Vec<ScalarFunction>,
    vector_functions: Vec<VectorFunction>,
    constants: Vec<Constant>,
    names: HashMap<String, Entry>,
}

const KEYWORDS: [&str; 4] = ["IF", "AND", "OR", "NOT"];

/// Returns true for `X` followed by one or more decimal digits (any case).
pub(crate) fn is_argument_name(upper: &str) -> bool {
    upper
        .strip_prefix('X')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in functions and constants.
    ///
    /// See the crate documentation for the full list.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        standard::install(&mut registry);
        registry
    }

    /// Registers a scalar function of `arity` arguments.
    ///
    /// # Errors
    /// Returns `RegistryError` if the name is invalid, reserved or taken, or if
    /// `arity` is zero.
    pub fn register_function<F>(
        &mut self,
        name: &str,
        description: &str,
        arity: usize,
        kernel: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        let key = self.claim(name)?;
        if arity == 0 {
            return Err(RegistryError::ZeroArity(key));
        }
        let index = self.functions.len() as u32;
        self.functions.push(ScalarFunction {
            name: key.clone(),
            description: description.to_string(),
            arity,
            kernel: Arc::new(kernel),
        });
        self.names.insert(key, Entry::Function(index));
        Ok(())
    }

    /// Registers a vector function that returns a scalar.
    ///
    /// # Errors
    /// Same as [`register_function`](Self::register_function).
    pub fn register_vector_function<F>(
        &mut self,
        name: &str,
        description: &str,
        args: &[ArgKind],
        kernel: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&[f64], &[&[f64]]) -> f64 + Send + Sync + 'static,
    {
        self.insert_vector_function(name, description, args, VectorKernel::Scalar(Arc::new(kernel)))
    }

    /// Registers a vector function that returns a vector.
    ///
    /// The kernel writes its result into the output buffer, which is cleared
    /// before every call.
    ///
    /// # Errors
    /// Same as [`register_function`](Self::register_function).
    pub fn register_vector_valued_function<F>(
        &mut self,
        name: &str,
        description: &str,
        args: &[ArgKind],
        kernel: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&[f64], &[&[f64]], &mut Vec<f64>) + Send + Sync + 'static,
    {
        self.insert_vector_function(name, description, args, VectorKernel::Vector(Arc::new(kernel)))
    }

    fn insert_vector_function(
        &mut self,
        name: &str,
        description: &str,
        args: &[ArgKind],
        kernel: VectorKernel,
    ) -> Result<(), RegistryError> {
        let key = self.claim(name)?;
        if args.is_empty() {
            return Err(RegistryError::ZeroArity(key));
        }
        let vector_arity = args.iter().filter(|&&kind| kind == ArgKind::Vector).count();
        let index = self.vector_functions.len() as u32;
        self.vector_functions.push(VectorFunction {
            name: key.clone(),
            description: description.to_string(),
            args: args.to_vec(),
            scalar_arity: args.len() - vector_arity,
            vector_arity,
            kernel,
        });
        self.names.insert(key, Entry::VectorFunction(index));
        Ok(())
    }

    /// Registers a named scalar constant.
    ///
    /// # Errors
    /// Returns `RegistryError` if the name is invalid, reserved or taken.
    pub fn register_constant(
        &mut self,
        name: &str,
        description: &str,
        value: f64,
    ) -> Result<(), RegistryError> {
        self.insert_constant(name, description, ConstantValue::Scalar(value))
    }

    /// Registers a named vector constant, usable wherever a vector is legal.
    ///
    /// # Errors
    /// Returns `RegistryError` if the name is invalid, reserved or taken.
    pub fn register_vector_constant(
        &mut self,
        name: &str,
        description: &str,
        values: Vec<f64>,
    ) -> Result<(), RegistryError> {
        self.insert_constant(name, description, ConstantValue::Vector(values))
    }

    fn insert_constant(
        &mut self,
        name: &str,
        description: &str,
        value: ConstantValue,
    ) -> Result<(), RegistryError> {
        let key = self.claim(name)?;
        let index = self.constants.len() as u32;
        self.constants.push(Constant {
            name: key.clone(),
            description: description.to_string(),
            value,
        });
        self.names.insert(key, Entry::Constant(index));
        Ok(())
    }

    /// Validates a new name and returns its normalized (upper-case) form.
    fn claim(&self, name: &str) -> Result<String, RegistryError> {
        let key = name.to_uppercase();
        let mut chars = key.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if KEYWORDS.contains(&key.as_str()) || is_argument_name(&key) {
            return Err(RegistryError::ReservedName(key));
        }
        if self.names.contains_key(&key) {
            return Err(RegistryError::DuplicateName(key));
        }
        Ok(key)
    }

    /// Resolves a name, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<Entry> {
        self.names.get(&name.to_uppercase()).copied()
    }

    pub fn function(&self, index: u32) -> &ScalarFunction {
        &self.functions[index as usize]
    }

    pub fn vector_function(&self, index: u32) -> &VectorFunction {
        &self.vector_functions[index as usize]
    }

    pub fn constant(&self, index: u32) -> &Constant {
        &self.constants[index as usize]
    }

    pub fn functions(&self) -> &[ScalarFunction] {
        &self.functions
    }

    pub fn vector_functions(&self) -> &[VectorFunction] {
        &self.vector_functions
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Names of all scalar and vector functions, in registration order.
    pub fn function_names(&self) -> Vec<&str> {
        self.functions
            .iter()
            .map(ScalarFunction::name)
            .chain(self.vector_functions.iter().map(VectorFunction::name))
            .collect()
    }

    /// Name and description of all scalar and vector functions.
    pub fn function_descriptions(&self) -> Vec<(&str, &str)> {
        self.functions
            .iter()
            .map(|f| (f.name(), f.description()))
            .chain(
                self.vector_functions
                    .iter()
                    .map(|f| (f.name(), f.description())),
            )
            .collect()
    }

    /// Names of all constants, in registration order.
    pub fn constant_names(&self) -> Vec<&str> {
        self.constants.iter().map(Constant::name).collect()
    }

    /// Name and description of all constants.
    pub fn constant_descriptions(&self) -> Vec<(&str, &str)> {
        self.constants
            .iter()
            .map(|c| (c.name(), c.description()))
            .collect()
    }
}
