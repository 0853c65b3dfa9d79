use crate::domains::activity::types::{ActivityStats, LoadOutcome};
use crate::domains::condominium::service::Resolution;
use serde::Serialize;

/// One header counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderChip {
    pub label: &'static str,
    pub value: usize,
}

/// Everything the schedule header shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub condominium_id: Option<String>,
    pub condominium_name: String,
    pub logo_url: Option<String>,
    pub stats: ActivityStats,
    pub chips: Vec<HeaderChip>,
    pub loading: bool,
}

impl ScheduleSummary {
    /// Total and Pendentes always; Funcionando only when something is in progress
    pub fn chips_for(stats: &ActivityStats) -> Vec<HeaderChip> {
        let mut chips = vec![HeaderChip {
            label: "Total",
            value: stats.total,
        }];
        if stats.in_progress > 0 {
            chips.push(HeaderChip {
                label: "Funcionando",
                value: stats.in_progress,
            });
        }
        chips.push(HeaderChip {
            label: "Pendentes",
            value: stats.pending,
        });
        chips
    }
}

/// Result of opening the schedule for a route
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOpened {
    pub resolution: Resolution,
    /// `None` when no load was attempted (redirect or aborted resolution)
    pub load: Option<LoadOutcome>,
}
