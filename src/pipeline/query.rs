//! Windowed reads over a ranged store

use serde::{Deserialize, Serialize};

use crate::models::Record;
use crate::store::{RangedStore, Result};

pub const DEFAULT_START: u64 = 0;
pub const DEFAULT_END: u64 = 10;

/// Query parameters for `GET /` on the ranged variant
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_start")]
    pub start: u64,

    #[serde(default = "default_end")]
    pub end: u64,
}

fn default_start() -> u64 {
    DEFAULT_START
}

fn default_end() -> u64 {
    DEFAULT_END
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            end: DEFAULT_END,
        }
    }
}

/// One window of the ranged store plus its bookkeeping numbers.
///
/// `number_of_selected_logs` and `remaining` use the raw arithmetic
/// `min(end, count) - start` and `count - end`, so both go negative when the
/// window runs past the list. Inputs above `i64::MAX` count as `i64::MAX` in
/// that arithmetic; `start` and `end` are echoed back unchanged.
#[derive(Debug, Serialize)]
pub struct LogPage {
    pub number_of_logs: u64,
    pub start: u64,
    pub end: u64,
    pub number_of_selected_logs: i64,
    pub remaining: i64,
    pub logs: Vec<Record>,
}

pub async fn paginate(store: &dyn RangedStore, params: PageParams) -> Result<LogPage> {
    let PageParams { start, end } = params;
    let count = store.length().await?;
    let logs = store.range(start, end).await?;

    Ok(LogPage {
        number_of_logs: count,
        start,
        end,
        number_of_selected_logs: signed(end.min(count)) - signed(start),
        remaining: signed(count) - signed(end),
        logs,
    })
}

/// Operands stay within `0..=i64::MAX`, so their difference cannot overflow
fn signed(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
