//! Dashboard view model.

use serde::Serialize;

use crate::middleware::auth::CurrentUser;
use crate::models::statistics::{DashboardStatistics, StatField};
use crate::services::stats::PanelState;

const DASHBOARD_TITLE: &str = "Growth Hub Dashboard";

/// `round(completions / total * 100)` as `"N%"`, or `"0%"` with no users.
pub fn completion_rate(stats: &DashboardStatistics) -> String {
    if stats.total_users == 0 {
        return "0%".to_string();
    }
    let percent =
        (stats.profile_completions as f64 / stats.total_users as f64 * 100.0).round() as u64;
    format!("{percent}%")
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCard {
    pub field: StatField,
    pub label: &'static str,
    pub value: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Overview,
    Workflows,
    Chatbot,
    Forms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelStatus {
    /// Fixed sample content.
    Static,
    ComingSoon,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelItem {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub tab: Tab,
    pub title: &'static str,
    pub description: &'static str,
    pub status: PanelStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PanelItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub name: &'static str,
    pub label: &'static str,
    pub method: &'static str,
    pub href: &'static str,
    pub implemented: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub title: &'static str,
    pub greeting: String,
    pub user_email: String,
    pub loading: bool,
    pub statistics: DashboardStatistics,
    pub completion_rate: String,
    pub cards: Vec<StatCard>,
    pub panels: Vec<Panel>,
    pub actions: Vec<Action>,
}

impl DashboardView {
    pub fn build(user: &CurrentUser, panel: &PanelState) -> Self {
        let stats = panel.statistics;
        let rate = completion_rate(&stats);

        let cards = StatField::ALL
            .into_iter()
            .map(|field| StatCard {
                field,
                label: field.label(),
                value: stats.get(field),
                caption: (field == StatField::ProfileCompletions)
                    .then(|| format!("{rate} completion rate")),
            })
            .collect();

        Self {
            title: DASHBOARD_TITLE,
            greeting: format!("Welcome back, {}", user.email),
            user_email: user.email.clone(),
            loading: panel.loading,
            statistics: stats,
            completion_rate: rate,
            cards,
            panels: placeholder_panels(),
            actions: vec![
                Action {
                    name: "export_report",
                    label: "Export Report",
                    method: "POST",
                    href: "/api/v1/dashboard/export",
                    implemented: false,
                },
                Action {
                    name: "sign_out",
                    label: "Sign Out",
                    method: "POST",
                    href: "/logout",
                    implemented: true,
                },
            ],
        }
    }
}

/// Fixed sample panels. The workflow, chatbot and forms tabs are not built yet
/// and render as `coming_soon`.
fn placeholder_panels() -> Vec<Panel> {
    vec![
        Panel {
            tab: Tab::Overview,
            title: "Lead Nurturing Performance",
            description: "Omnichannel workflow effectiveness",
            status: PanelStatus::Static,
            items: vec![
                PanelItem { label: "Email Open Rate", value: "85%" },
                PanelItem { label: "SMS Response Rate", value: "72%" },
                PanelItem { label: "WhatsApp Engagement", value: "91%" },
            ],
        },
        Panel {
            tab: Tab::Overview,
            title: "Recent Activity",
            description: "Latest system events",
            status: PanelStatus::Static,
            items: vec![
                PanelItem { label: "5 new form submissions", value: "2 minutes ago" },
                PanelItem { label: "Workflow batch completed", value: "15 minutes ago" },
                PanelItem { label: "3 chatbot conversations", value: "1 hour ago" },
            ],
        },
        Panel {
            tab: Tab::Workflows,
            title: "Omnichannel Lead Nurturing",
            description: "Manage and monitor your automated nurturing workflows",
            status: PanelStatus::ComingSoon,
            items: Vec::new(),
        },
        Panel {
            tab: Tab::Chatbot,
            title: "SwiftSell Chatbot Integration",
            description: "Lead qualification and webinar registration chatbot",
            status: PanelStatus::ComingSoon,
            items: Vec::new(),
        },
        Panel {
            tab: Tab::Forms,
            title: "Form Submission Handler",
            description: "Manage form submissions and automation triggers",
            status: PanelStatus::ComingSoon,
            items: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::user::UserRole;

    fn stats(total_users: u64, profile_completions: u64) -> DashboardStatistics {
        DashboardStatistics {
            total_users,
            profile_completions,
            ..DashboardStatistics::default()
        }
    }

    #[test]
    fn no_users_means_zero_percent() {
        assert_eq!(completion_rate(&stats(0, 0)), "0%");
        assert_eq!(completion_rate(&stats(0, 7)), "0%");
    }

    #[test]
    fn rate_is_rounded() {
        assert_eq!(completion_rate(&stats(10, 3)), "30%");
        assert_eq!(completion_rate(&stats(100, 40)), "40%");
        assert_eq!(completion_rate(&stats(3, 1)), "33%");
        assert_eq!(completion_rate(&stats(3, 2)), "67%");
        assert_eq!(completion_rate(&stats(8, 1)), "13%");
        assert_eq!(completion_rate(&stats(4, 4)), "100%");
    }

    #[test]
    fn inconsistent_backend_can_exceed_hundred() {
        assert_eq!(completion_rate(&stats(2, 3)), "150%");
    }

    #[test]
    fn view_carries_cards_in_order() {
        let user = CurrentUser {
            id: Uuid::nil(),
            email: "ops@growthhub.test".to_string(),
            role: UserRole::Marketer,
            session_id: Uuid::nil(),
        };
        let panel = PanelState {
            statistics: DashboardStatistics {
                total_users: 100,
                profile_completions: 40,
                chatbot_leads: 25,
                form_submissions: 10,
                active_workflows: 5,
            },
            loading: false,
        };

        let view = DashboardView::build(&user, &panel);
        assert_eq!(view.greeting, "Welcome back, ops@growthhub.test");
        assert_eq!(view.completion_rate, "40%");
        let values: Vec<u64> = view.cards.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![100, 40, 25, 10, 5]);
        assert_eq!(
            view.cards[1].caption.as_deref(),
            Some("40% completion rate")
        );
        assert!(view.cards[0].caption.is_none());

        let coming_soon = view
            .panels
            .iter()
            .filter(|p| p.status == PanelStatus::ComingSoon)
            .count();
        assert_eq!(coming_soon, 3);
        assert!(view.actions.iter().any(|a| a.name == "export_report" && !a.implemented));
    }
}
