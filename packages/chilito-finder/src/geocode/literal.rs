//! Coordinates given directly as "lat,lng" text.

use async_trait::async_trait;

use crate::error::{StrategyError, StrategyResult};
use crate::traits::strategy::Strategy;
use crate::types::geo::Coordinates;

/// Parses device-coordinate text without touching the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateLiteral;

#[async_trait]
impl Strategy<str, Coordinates> for CoordinateLiteral {
    fn name(&self) -> &str {
        "coordinate_literal"
    }

    async fn attempt(&self, input: &str) -> StrategyResult<Coordinates> {
        Coordinates::parse(input)
            .ok_or_else(|| StrategyError::NoResult("not a lat,lng pair".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_literal() {
        let coords = CoordinateLiteral.attempt("39.1,-89.6").await.unwrap();
        assert_eq!(coords, Coordinates::new(39.1, -89.6).unwrap());

        let err = CoordinateLiteral.attempt("123 Main St").await.unwrap_err();
        assert!(matches!(err, StrategyError::NoResult(_)));
    }
}
