//! Immutable values exchanged between cells and the arbiter.

use crate::bacterium::Bacterium;
use crate::genome::Genome;
use crate::grid::{CellAddress, Direction};
use crate::metabolism::{MetabolysisResult, Nutrient};
use serde::Serialize;

/// Cell → arbiter traffic.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellMessage {
    Query(QueryMessage),
    RestStatus(RestStatus),
    FeedStatus(FeedStatus),
}

/// Request for a free neighboring slot to place a child in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QueryMessage {
    pub address: CellAddress,
}

/// Report sent after every rest cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RestStatus {
    pub address: CellAddress,
    pub lifespan: i32,
    pub maximum_lifespan: i32,
    pub free_energy: f64,
}

impl RestStatus {
    pub fn of(address: CellAddress, bacterium: &Bacterium) -> Self {
        Self {
            address,
            lifespan: bacterium.lifespan(),
            maximum_lifespan: bacterium.maximum_lifespan(),
            free_energy: bacterium.free_energy(),
        }
    }

    pub fn reports_death(&self) -> bool {
        self.lifespan <= 0 || self.free_energy <= 0.0
    }

    pub fn lifespan_ratio(&self) -> f64 {
        if self.maximum_lifespan == 0 {
            0.0
        } else {
            f64::from(self.lifespan) / f64::from(self.maximum_lifespan)
        }
    }
}

/// Report sent after every feeding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FeedStatus {
    pub address: CellAddress,
    /// `None` when the bacterium has no enzymes.
    pub result: Option<MetabolysisResult>,
    /// Nutrient of the cell the bacterium's parent lived in.
    pub parent_nutrient: Nutrient,
}

/// Child genome travelling to a neighbor cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChildMessage {
    pub destination: CellAddress,
    pub genome: Genome,
    /// Nutrient of the cell the child was conceived in.
    pub origin_nutrient: Nutrient,
}

/// Arbiter → cell answer to a [`QueryMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QueryResponse {
    pub address: CellAddress,
    /// Reserved neighbor, or `None` when every neighbor is occupied.
    pub direction: Option<Direction>,
}

impl QueryResponse {
    pub fn granted(&self) -> Option<Direction> {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_status_flags_exhausted_bacteria() {
        let address = CellAddress::new(0, 0);
        let alive = RestStatus {
            address,
            lifespan: 3,
            maximum_lifespan: 6,
            free_energy: 1.0,
        };
        assert!(!alive.reports_death());
        assert_eq!(alive.lifespan_ratio(), 0.5);

        let starved = RestStatus {
            free_energy: 0.0,
            ..alive
        };
        assert!(starved.reports_death());

        let aged = RestStatus {
            lifespan: 0,
            ..alive
        };
        assert!(aged.reports_death());
    }

    #[test]
    fn zero_maximum_lifespan_has_zero_ratio() {
        let status = RestStatus {
            address: CellAddress::new(1, 1),
            lifespan: -1,
            maximum_lifespan: 0,
            free_energy: 10.0,
        };
        assert_eq!(status.lifespan_ratio(), 0.0);
    }

    #[test]
    fn cell_messages_serialize_with_kind_tag() {
        let msg = CellMessage::Query(QueryMessage {
            address: CellAddress::new(2, 3),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "query");
        assert_eq!(json["address"]["column"], 3);
    }
}
