use std::str::FromStr;

/// Parses a text column into a domain enum
pub fn parse_column<T: FromStr>(column: &str, value: &str) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value for column {}: {}", column, e))
}
