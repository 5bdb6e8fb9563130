//! Dashboard statistics record.

use serde::Serialize;

/// Aggregate counts shown on the dashboard's stat cards.
///
/// Recomputed in full on every fetch. `profile_completions <= total_users` is
/// expected from the backend but not enforced here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    pub total_users: u64,
    pub profile_completions: u64,
    pub chatbot_leads: u64,
    pub form_submissions: u64,
    pub active_workflows: u64,
}

impl DashboardStatistics {
    pub fn get(&self, field: StatField) -> u64 {
        match field {
            StatField::TotalUsers => self.total_users,
            StatField::ProfileCompletions => self.profile_completions,
            StatField::ChatbotLeads => self.chatbot_leads,
            StatField::FormSubmissions => self.form_submissions,
            StatField::ActiveWorkflows => self.active_workflows,
        }
    }
}

/// One field of [`DashboardStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatField {
    TotalUsers,
    ProfileCompletions,
    ChatbotLeads,
    FormSubmissions,
    ActiveWorkflows,
}

impl StatField {
    /// Card order on the dashboard.
    pub const ALL: [StatField; 5] = [
        StatField::TotalUsers,
        StatField::ProfileCompletions,
        StatField::ChatbotLeads,
        StatField::FormSubmissions,
        StatField::ActiveWorkflows,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatField::TotalUsers => "Total Users",
            StatField::ProfileCompletions => "Profile Completions",
            StatField::ChatbotLeads => "Chatbot Leads",
            StatField::FormSubmissions => "Form Submissions",
            StatField::ActiveWorkflows => "Active Workflows",
        }
    }
}
