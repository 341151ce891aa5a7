//! Built-in functions and constants installed by [`Registry::standard`].

use super::{ArgKind, Registry};

type Unary = (&'static str, &'static str, fn(f64) -> f64);
type Binary = (&'static str, &'static str, fn(f64, f64) -> f64);

const UNARY: [Unary; 19] = [
    ("ABS", "Absolute value", f64::abs),
    ("SQRT", "Square root", f64::sqrt),
    ("EXP", "Exponential function e^x", f64::exp),
    ("LN", "Natural logarithm", f64::ln),
    ("LOG", "Base-10 logarithm", f64::log10),
    ("SIN", "Sine (radians)", f64::sin),
    ("COS", "Cosine (radians)", f64::cos),
    ("TAN", "Tangent (radians)", f64::tan),
    ("ASIN", "Arc sine", f64::asin),
    ("ACOS", "Arc cosine", f64::acos),
    ("ATAN", "Arc tangent", f64::atan),
    ("SINH", "Hyperbolic sine", f64::sinh),
    ("COSH", "Hyperbolic cosine", f64::cosh),
    ("TANH", "Hyperbolic tangent", f64::tanh),
    ("FLOOR", "Largest integer not above x", f64::floor),
    ("CEIL", "Smallest integer not below x", f64::ceil),
    ("ROUND", "Nearest integer, halves away from zero", f64::round),
    ("TRUNC", "Integer part", f64::trunc),
    ("SIGN", "-1, 0 or 1 by the sign of x", sign),
];

const BINARY: [Binary; 6] = [
    ("MIN", "Smaller of two values", f64::min),
    ("MAX", "Larger of two values", f64::max),
    ("POW", "x raised to the power y", f64::powf),
    ("ATAN2", "Four-quadrant arc tangent of y/x", f64::atan2),
    ("HYPOT", "Euclidean length sqrt(x^2 + y^2)", f64::hypot),
    ("MOD", "Remainder of x / y with the sign of x", modulo),
];

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

fn modulo(x: f64, y: f64) -> f64 {
    x % y
}

/// Installs the built-ins. Every name is valid and distinct, so registration
/// cannot fail; a failure here would be a bug in the tables above.
pub(super) fn install(registry: &mut Registry) {
    let mut results = Vec::new();

    for (name, description, f) in UNARY {
        results.push(registry.register_function(name, description, 1, move |a| f(a[0])));
    }
    for (name, description, f) in BINARY {
        results.push(registry.register_function(name, description, 2, move |a| f(a[0], a[1])));
    }

    use ArgKind::{Scalar, Vector};
    results.push(registry.register_vector_function(
        "VSUM",
        "Sum of all elements",
        &[Vector],
        |_, v| v[0].iter().sum(),
    ));
    results.push(registry.register_vector_function(
        "VMEAN",
        "Arithmetic mean of all elements",
        &[Vector],
        |_, v| v[0].iter().sum::<f64>() / v[0].len() as f64,
    ));
    results.push(registry.register_vector_function(
        "VMIN",
        "Smallest element",
        &[Vector],
        |_, v| v[0].iter().copied().fold(f64::NAN, f64::min),
    ));
    results.push(registry.register_vector_function(
        "VMAX",
        "Largest element",
        &[Vector],
        |_, v| v[0].iter().copied().fold(f64::NAN, f64::max),
    ));
    results.push(registry.register_vector_function(
        "VLEN",
        "Number of elements",
        &[Vector],
        |_, v| v[0].len() as f64,
    ));
    results.push(registry.register_vector_function(
        "VNORM",
        "Euclidean norm",
        &[Vector],
        |_, v| v[0].iter().map(|x| x * x).sum::<f64>().sqrt(),
    ));
    results.push(registry.register_vector_function(
        "VDOT",
        "Dot product over the shorter length",
        &[Vector, Vector],
        |_, v| v[0].iter().zip(v[1]).map(|(a, b)| a * b).sum(),
    ));
    results.push(registry.register_vector_function(
        "VGET",
        "Element at a zero-based index, NaN when out of range",
        &[Vector, Scalar],
        |s, v| {
            let index = s[0];
            if index >= 0.0 && index.fract() == 0.0 {
                v[0].get(index as usize).copied().unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        },
    ));
    results.push(registry.register_vector_valued_function(
        "VSCALE",
        "Every element multiplied by a factor",
        &[Vector, Scalar],
        |s, v, out| out.extend(v[0].iter().map(|x| x * s[0])),
    ));
    results.push(registry.register_vector_valued_function(
        "VADD",
        "Element-wise sum over the shorter length",
        &[Vector, Vector],
        |_, v, out| out.extend(v[0].iter().zip(v[1]).map(|(a, b)| a + b)),
    ));

    results.push(registry.register_constant("PI", "Ratio of circumference to diameter", std::f64::consts::PI));
    results.push(registry.register_constant("E", "Euler's number", std::f64::consts::E));

    for result in results {
        result.expect("built-in names are valid and registered once");
    }
}
