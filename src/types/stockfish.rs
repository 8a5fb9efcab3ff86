use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockfishTestResponse {
    /// White and black scores separated by a space, e.g. `"35 -35"`.
    pub result: String,
}
