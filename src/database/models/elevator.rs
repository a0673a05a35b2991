use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ApiError;

/// Owned by exactly one building, transitively one customer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Elevator {
    pub id: Uuid,
    pub building_id: Uuid,
    pub serial_number: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub floors: Option<i32>,
    pub capacity_kg: Option<i32>,
    pub state: String,
    pub installed_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevatorState {
    Normal,
    Fault,
    InMaintenance,
    WaitingMaintenance,
    WaitingQuotation,
}

impl ElevatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElevatorState::Normal => "normal",
            ElevatorState::Fault => "fault",
            ElevatorState::InMaintenance => "in_maintenance",
            ElevatorState::WaitingMaintenance => "waiting_maintenance",
            ElevatorState::WaitingQuotation => "waiting_quotation",
        }
    }
}

impl fmt::Display for ElevatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElevatorState {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(ElevatorState::Normal),
            "fault" => Ok(ElevatorState::Fault),
            "in_maintenance" => Ok(ElevatorState::InMaintenance),
            "waiting_maintenance" => Ok(ElevatorState::WaitingMaintenance),
            "waiting_quotation" => Ok(ElevatorState::WaitingQuotation),
            other => Err(ApiError::invalid_field(
                "state",
                format!("unknown elevator state '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_parses_all_variants() {
        for s in ["normal", "fault", "in_maintenance", "waiting_maintenance", "waiting_quotation"] {
            assert_eq!(s.parse::<ElevatorState>().unwrap().as_str(), s);
        }
        assert!("broken".parse::<ElevatorState>().is_err());
    }
}
