use crate::error::TransformError;
use crate::structs::{Table, Value};
use log::debug;

/// Column the transformer normalizes.
pub const PRICE_COLUMN: &str = "price";

/// Result of [`transform`]: the table plus whether rounding took place.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub table: Table,
    pub price_rounded: bool,
}

/// Rounds the `price` column to 2 decimals if the table has one.
///
/// Takes ownership of the extracted table and hands it back inside
/// [`Transformed`]. Float prices are rounded with [`round_to_cents`]; integer
/// and empty cells are left as they are. Without a `price` column the table
/// passes through untouched and `price_rounded` is false.
///
/// # Errors
///
/// Returns `TransformError::NonNumericPrice` if a price cell holds text.
pub fn transform(mut table: Table) -> Result<Transformed, TransformError> {
    let Some(idx) = table.column_index(PRICE_COLUMN) else {
        debug!("No {} column, skipping rounding", PRICE_COLUMN);
        return Ok(Transformed {
            table,
            price_rounded: false,
        });
    };

    if let Some((row, value)) = table
        .rows()
        .iter()
        .enumerate()
        .find_map(|(i, r)| match &r[idx] {
            Value::Str(s) => Some((i, s.clone())),
            _ => None,
        })
    {
        return Err(TransformError::NonNumericPrice { row, value });
    }

    for cell in table.column_mut(idx) {
        if let Value::Float(v) = cell {
            *v = round_to_cents(*v);
        }
    }
    debug!("Rounded {} prices", table.len());

    Ok(Transformed {
        table,
        price_rounded: true,
    })
}

/// Rounds to 2 decimals, ties to even on the value scaled by 100.
///
/// Non-finite values come back unchanged. The result is not guaranteed to be
/// bit-exact with other numeric libraries, but applying it twice gives the
/// same value as applying it once.
pub fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scaled = value * 100.0;
    // Beyond 2^52 every f64 is already an integer when scaled.
    if scaled.abs() >= 4_503_599_627_370_496.0 {
        return value;
    }
    scaled.round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_table(prices: Vec<Value>) -> Table {
        let mut table = Table::new(vec!["car_model".into(), PRICE_COLUMN.into()]);
        for (i, price) in prices.into_iter().enumerate() {
            table.push_row(vec![Value::Str(format!("car{i}")), price]);
        }
        table
    }

    #[test]
    fn rounds_prices_to_cents() {
        let table = price_table(vec![
            Value::Float(19999.999),
            Value::Float(4253.731343283582),
            Value::Int(5000),
            Value::Null,
        ]);

        let out = transform(table).unwrap();
        assert!(out.price_rounded);
        assert_eq!(out.table.get(0, PRICE_COLUMN), Some(&Value::Float(20000.0)));
        assert_eq!(out.table.get(0, PRICE_COLUMN).unwrap().to_string(), "20000.0");
        assert_eq!(out.table.get(1, PRICE_COLUMN), Some(&Value::Float(4253.73)));
        assert_eq!(out.table.get(2, PRICE_COLUMN), Some(&Value::Int(5000)));
        assert_eq!(out.table.get(3, PRICE_COLUMN), Some(&Value::Null));
    }

    #[test]
    fn rounding_is_idempotent() {
        let table = price_table(vec![
            Value::Float(15000.005),
            Value::Float(0.125),
            Value::Float(-7089.552238805971),
            Value::Float(1e300),
        ]);

        let once = transform(table).unwrap();
        let twice = transform(once.table.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn half_cent_rounding_is_stable() {
        let first = round_to_cents(15000.005);
        for _ in 0..10 {
            assert_eq!(round_to_cents(15000.005), first);
        }
        assert_eq!(round_to_cents(0.125), 0.12);
        assert_eq!(round_to_cents(0.375), 0.38);
        assert!(round_to_cents(f64::NAN).is_nan());
    }

    #[test]
    fn table_without_price_passes_through() {
        let mut table = Table::new(vec!["car_model".into(), "fuel".into()]);
        table.push_row(vec![Value::from("ritz"), Value::from("Petrol")]);
        let before = table.clone();

        let out = transform(table).unwrap();
        assert!(!out.price_rounded);
        assert_eq!(out.table, before);
    }

    #[test]
    fn text_price_is_an_error() {
        let table = price_table(vec![Value::Float(1.0), Value::from("cheap")]);
        let err = transform(table).unwrap_err();
        assert!(matches!(
            err,
            TransformError::NonNumericPrice { row: 1, ref value } if value == "cheap"
        ));
    }
}
