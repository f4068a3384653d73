//! Action dispatcher
//!
//! Issues state transitions and entity mutations. Campaign actions and lead
//! toggles are applied to the displayed page before the request goes out and
//! reverted if the backend does not acknowledge them.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::authn::permissions::{Capability, Permissions};
use crate::errors::ConsoleError;
use crate::http::client::RawBody;
use crate::http::response::ActionAck;
use crate::models::call::Call;
use crate::models::campaign::{Campaign, CampaignAction};
use crate::models::entity::id_from_value;
use crate::models::lead::Lead;
use crate::notify::Notifier;
use crate::sync::controller::ListController;

/// Mutating backend operations
#[async_trait]
pub trait ActionBackend: Send + Sync {
    async fn campaign_action(
        &self,
        campaign_id: &str,
        action: CampaignAction,
    ) -> Result<ActionAck, ConsoleError>;

    async fn set_call_lead(&self, call_id: &str, is_lead: bool) -> Result<ActionAck, ConsoleError>;

    async fn delete_lead(&self, lead_id: &str) -> Result<ActionAck, ConsoleError>;

    async fn assign_voice_account(
        &self,
        owner_user_id: &str,
        account: &str,
    ) -> Result<ActionAck, ConsoleError>;

    async fn export_leads(&self, filters: &[(String, String)]) -> Result<RawBody, ConsoleError>;
}

pub struct ActionDispatcher {
    backend: Arc<dyn ActionBackend>,
    permissions: Permissions,
    notifier: Notifier,
}

impl ActionDispatcher {
    pub fn new(backend: Arc<dyn ActionBackend>, permissions: Permissions, notifier: Notifier) -> Self {
        Self {
            backend,
            permissions,
            notifier,
        }
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn backend(&self) -> &Arc<dyn ActionBackend> {
        &self.backend
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    fn require(&self, capability: Capability) -> Result<(), ConsoleError> {
        self.permissions.require(capability).inspect_err(|e| {
            self.notifier.error(e.user_message());
        })
    }

    fn fail<T>(&self, error: ConsoleError) -> Result<T, ConsoleError> {
        self.notifier.error(error.user_message());
        Err(error)
    }

    /// Pause, resume or cancel a campaign.
    ///
    /// When `view` displays the campaign its status is switched to the
    /// action's target at once, restored on failure, and the view is
    /// refreshed after success.
    pub async fn campaign_action(
        &self,
        view: Option<&ListController<Campaign>>,
        campaign_id: &str,
        action: CampaignAction,
    ) -> Result<ActionAck, ConsoleError> {
        self.require(Capability::ManageCampaigns)?;

        let previous = match view {
            Some(view) => {
                view.update_item(campaign_id, |c| c.status = action.target_status())
                    .await
            }
            None => None,
        };

        info!("Requesting {} of campaign {}", action, campaign_id);
        let ack = match self.backend.campaign_action(campaign_id, action).await {
            Ok(ack) => ack,
            Err(e) => {
                warn!("{} of campaign {} failed: {}", action, campaign_id, e);
                if let (Some(view), Some(previous)) = (view, previous) {
                    view.update_item(campaign_id, |c| c.status = previous.status)
                        .await;
                }
                return self.fail(e);
            }
        };

        if let Some(view) = view {
            if let Some(record) = authoritative_record(&ack, campaign_id) {
                view.apply_event(campaign_id, record).await;
            }
        }

        let message = ack
            .message
            .clone()
            .unwrap_or_else(|| format!("{} request sent for campaign {}", action.label(), campaign_id));
        self.notifier.success(message);

        if let Some(view) = view {
            // Refresh failures raise their own notice
            let _ = view.refresh().await;
        }

        Ok(ack)
    }

    /// Flip the lead flag of a call. Returns the new flag.
    pub async fn toggle_lead(
        &self,
        view: &ListController<Call>,
        call_id: &str,
    ) -> Result<bool, ConsoleError> {
        self.require(Capability::ManageCalls)?;

        let Some(previous) = view.update_item(call_id, |c| c.is_lead = !c.is_lead).await else {
            return self.fail(ConsoleError::NotFound(format!("Call {} is not displayed", call_id)));
        };
        let is_lead = !previous.is_lead;

        match self.backend.set_call_lead(call_id, is_lead).await {
            Ok(ack) => {
                if let Some(record) = authoritative_record(&ack, call_id) {
                    view.apply_event(call_id, record).await;
                }
                self.notifier.success(if is_lead {
                    "Call marked as lead"
                } else {
                    "Call unmarked as lead"
                });
                Ok(is_lead)
            }
            Err(e) => {
                view.update_item(call_id, |c| c.is_lead = previous.is_lead)
                    .await;
                self.fail(e)
            }
        }
    }

    /// Set the lead flag of a call that is not on screen
    pub async fn set_call_lead(&self, call_id: &str, is_lead: bool) -> Result<ActionAck, ConsoleError> {
        self.require(Capability::ManageCalls)?;
        match self.backend.set_call_lead(call_id, is_lead).await {
            Ok(ack) => {
                self.notifier.success(format!("Lead flag of call {} set to {}", call_id, is_lead));
                Ok(ack)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Delete a lead, removing it from `view` once acknowledged
    pub async fn delete_lead(
        &self,
        view: Option<&ListController<Lead>>,
        lead_id: &str,
    ) -> Result<ActionAck, ConsoleError> {
        self.require(Capability::ManageLeads)?;

        let ack = match self.backend.delete_lead(lead_id).await {
            Ok(ack) => ack,
            Err(e) => return self.fail(e),
        };

        self.notifier.success(
            ack.message
                .clone()
                .unwrap_or_else(|| "Lead deleted successfully".to_string()),
        );

        if let Some(view) = view {
            view.remove_item(lead_id).await;
            let _ = view.refresh().await;
        }

        Ok(ack)
    }

    /// Assign a voice account to every bot of one owner. Returns how many
    /// bots were updated when the backend says so.
    pub async fn assign_voice_account(
        &self,
        owner_user_id: &str,
        account: &str,
    ) -> Result<Option<u64>, ConsoleError> {
        self.require(Capability::AssignVoiceAccount)?;

        let account = account.trim();
        if account.is_empty() {
            return self.fail(ConsoleError::ValidationError(
                "Voice account must not be empty".to_string(),
            ));
        }

        let ack = match self.backend.assign_voice_account(owner_user_id, account).await {
            Ok(ack) => ack,
            Err(e) => return self.fail(e),
        };

        let updated = ack.data.as_ref().and_then(updated_count);
        let message = match updated {
            Some(n) => format!("Voice account {} assigned to {} bots", account, n),
            None => ack
                .message
                .clone()
                .unwrap_or_else(|| format!("Voice account {} assigned", account)),
        };
        debug!("Voice account assignment for owner {}: {:?}", owner_user_id, updated);
        self.notifier.success(message);

        Ok(updated)
    }
}

/// The acknowledged record when it belongs to `id`
fn authoritative_record<'a>(
    ack: &'a ActionAck,
    id: &str,
) -> Option<&'a serde_json::Map<String, Value>> {
    let record = ack.data.as_ref()?.as_object()?;
    let same_id = id_from_value(record.get("id")?)? == id;
    same_id.then_some(record)
}

fn updated_count(data: &Value) -> Option<u64> {
    match data {
        Value::Number(n) => n.as_u64(),
        Value::Object(o) => ["updated", "updated_count", "count"]
            .iter()
            .find_map(|key| o.get(*key).and_then(Value::as_u64)),
        _ => None,
    }
}
