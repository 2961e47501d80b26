use std::str::FromStr;

use crate::prelude::*;

pub fn positive_f64(value: &str) -> Result<f64> {
    match f64::from_str(value)? {
        value if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(anyhow!("expected a positive number")),
    }
}
