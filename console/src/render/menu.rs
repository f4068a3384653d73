//! Campaign action menu

use colored::Colorize;

use crate::authn::permissions::{Capability, Permissions};
use crate::models::campaign::{Campaign, CampaignAction};

/// Actions to offer for a campaign: what its status allows, and nothing
/// at all without the permission to manage campaigns.
pub fn offered_actions(campaign: &Campaign, permissions: &Permissions) -> Vec<CampaignAction> {
    if !permissions.can(Capability::ManageCampaigns) {
        return Vec::new();
    }
    campaign.status.offered_actions().to_vec()
}

/// One line per offered action, as the watch session accepts them
pub fn render_action_menu(campaign: &Campaign, permissions: &Permissions) -> String {
    let actions = offered_actions(campaign, permissions);
    if actions.is_empty() {
        return format!("Campaign {}: no actions available", campaign.id)
            .dimmed()
            .to_string();
    }

    let mut lines = vec![format!("Campaign {} ({})", campaign.id, campaign.status)];
    for action in actions {
        lines.push(format!(
            "  {:<7} {} {}",
            action.label(),
            action.as_str().bold(),
            campaign.id
        ));
    }
    lines.join("\n")
}
