//! The two cost-basis methods (§4.3). FIFO consumes lots oldest-first;
//! average computes a weighted mean over all held lots and depletes
//! proportionally.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasisMethod {
    Fifo,
    Average,
}

impl Default for CostBasisMethod {
    fn default() -> Self {
        CostBasisMethod::Fifo
    }
}
