use crate::runtime::data_structures::value::Value;
use std::f64::consts::{E, PI};

/// Standard gravity in m/s².
pub const GRAVITY: f64 = 9.81;

/// The names of the constant functions.
pub const CONSTANT_NAMES: [&str; 5] = ["gravity", "pi", "e", "inf", "nan"];

/// The value a constant function pushes.  Constants are resolved before the function table, so
/// the table never needs entries for them.
pub fn constant_value(name: &str) -> Option<Value> {
    let value = match name {
        "gravity" => GRAVITY,
        "pi" => PI,
        "e" => E,
        "inf" => f64::INFINITY,
        "nan" => f64::NAN,
        _ => return None,
    };

    Some(Value::Real(value))
}
