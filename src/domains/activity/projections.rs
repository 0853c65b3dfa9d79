// src/domains/activity/projections.rs
//
// Read-only views over a snapshot. Nothing here mutates an activity; edit
// affordances hand an `ActivityDraft` back to the caller for the save path.

use crate::domains::activity::types::{Activity, ActivityDraft, QuickAction, UiStatus};
use chrono::{Datelike, NaiveDate};
use log::warn;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub const KANBAN_EMPTY_TEXT: &str = "Não há atividades para mostrar";

/// `dd/mm/yyyy`, as shown in rows and cards
pub fn display_date(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

// --- List ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRow<'a> {
    pub activity: &'a Activity,
    pub status_label: Option<&'static str>,
    pub expected_date: Option<String>,
    pub budget: Option<Decimal>,
}

impl ListRow<'_> {
    /// Edit affordance: prefilled dialog payload for this row
    pub fn edit_draft(&self) -> ActivityDraft {
        ActivityDraft::from(self.activity)
    }
}

/// Every activity, input order, unfiltered
pub fn list(activities: &[Activity]) -> Vec<ListRow<'_>> {
    activities
        .iter()
        .map(|activity| ListRow {
            activity,
            status_label: activity.ui_status().map(|s| s.label()),
            expected_date: activity.expected_date.as_ref().map(display_date),
            budget: activity.effective_budget(),
        })
        .collect()
}

// --- Kanban ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanCard<'a> {
    pub activity: &'a Activity,
    pub expected_date: Option<String>,
    pub quick_action: Option<QuickAction>,
    pub quick_action_label: Option<&'static str>,
}

impl KanbanCard<'_> {
    pub fn edit_draft(&self) -> ActivityDraft {
        ActivityDraft::from(self.activity)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanColumn<'a> {
    pub id: &'static str,
    pub title: &'static str,
    pub color: &'static str,
    pub status: UiStatus,
    pub cards: Vec<KanbanCard<'a>>,
    /// Set when the column has no cards
    pub empty_text: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanBoard<'a> {
    pub columns: Vec<KanbanColumn<'a>>,
    /// Activities whose status matched no column
    #[serde(skip)]
    pub excluded: Vec<&'a Activity>,
    pub excluded_count: usize,
}

impl<'a> KanbanBoard<'a> {
    pub fn column(&self, status: UiStatus) -> Option<&KanbanColumn<'a>> {
        self.columns.iter().find(|c| c.status == status)
    }
}

/// Four fixed columns in `UiStatus::ALL` order, classified with `Activity::ui_status`.
pub fn kanban(activities: &[Activity]) -> KanbanBoard<'_> {
    kanban_by(activities, Activity::ui_status)
}

/// Stable partition by `status_of`. Activities mapping to `None` land in no column.
pub fn kanban_by<F>(activities: &[Activity], status_of: F) -> KanbanBoard<'_>
where
    F: Fn(&Activity) -> Option<UiStatus>,
{
    let mut columns: Vec<KanbanColumn<'_>> = UiStatus::ALL
        .iter()
        .map(|status| KanbanColumn {
            id: status.column_id(),
            title: status.label(),
            color: status.color(),
            status: *status,
            cards: Vec::new(),
            empty_text: None,
        })
        .collect();
    let mut excluded = Vec::new();

    for activity in activities {
        let slot = status_of(activity).and_then(|s| UiStatus::ALL.iter().position(|c| *c == s));
        match slot {
            Some(index) => {
                let column = &mut columns[index];
                let quick_action = column.status.next_action();
                column.cards.push(KanbanCard {
                    activity,
                    expected_date: activity.expected_date.as_ref().map(display_date),
                    quick_action,
                    quick_action_label: quick_action.map(|a| a.label()),
                });
            }
            None => {
                warn!(
                    "Activity {} has unrecognized status {}; not shown on the board",
                    activity.id, activity.status
                );
                excluded.push(activity);
            }
        }
    }

    for column in columns.iter_mut().filter(|c| c.cards.is_empty()) {
        column.empty_text = Some(KANBAN_EMPTY_TEXT);
    }

    KanbanBoard {
        excluded_count: excluded.len(),
        columns,
        excluded,
    }
}

// --- Calendar ---

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView<'a> {
    /// Ascending by date; input order within a day
    pub days: BTreeMap<NaiveDate, Vec<&'a Activity>>,
    /// Activities without an expected date (still shown by list and kanban)
    pub undated: usize,
}

impl<'a> CalendarView<'a> {
    pub fn day(&self, date: NaiveDate) -> &[&'a Activity] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Days of one month that have activities, ascending
    pub fn for_month(&self, year: i32, month: u32) -> Vec<(NaiveDate, &[&'a Activity])> {
        self.days
            .iter()
            .filter(|(date, _)| date.year() == year && date.month() == month)
            .map(|(date, items)| (*date, items.as_slice()))
            .collect()
    }

    pub fn dated_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

pub fn calendar(activities: &[Activity]) -> CalendarView<'_> {
    let mut view = CalendarView::default();
    for activity in activities {
        match activity.expected_date {
            Some(date) => view.days.entry(date).or_default().push(activity),
            None => view.undated += 1,
        }
    }
    view
}
