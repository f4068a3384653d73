//! Capability set of the current session
//!
//! Built once per session and passed explicitly to whatever renders or
//! dispatches, instead of each view re-deriving it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::authn::session_token::SessionToken;
use crate::errors::ConsoleError;
use crate::models::entity::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    ViewCampaigns,
    ManageCampaigns,
    ViewLeads,
    ManageLeads,
    ExportLeads,
    ViewCalls,
    ManageCalls,
    ViewBots,
    ManageBots,
    AssignVoiceAccount,
    ViewConsumers,
    ImpersonateUsers,
}

impl Capability {
    pub const ALL: [Capability; 12] = [
        Capability::ViewCampaigns,
        Capability::ManageCampaigns,
        Capability::ViewLeads,
        Capability::ManageLeads,
        Capability::ExportLeads,
        Capability::ViewCalls,
        Capability::ManageCalls,
        Capability::ViewBots,
        Capability::ManageBots,
        Capability::AssignVoiceAccount,
        Capability::ViewConsumers,
        Capability::ImpersonateUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewCampaigns => "campaigns:view",
            Capability::ManageCampaigns => "campaigns:manage",
            Capability::ViewLeads => "leads:view",
            Capability::ManageLeads => "leads:manage",
            Capability::ExportLeads => "leads:export",
            Capability::ViewCalls => "calls:view",
            Capability::ManageCalls => "calls:manage",
            Capability::ViewBots => "bots:view",
            Capability::ManageBots => "bots:manage",
            Capability::AssignVoiceAccount => "bots:assign",
            Capability::ViewConsumers => "consumers:view",
            Capability::ImpersonateUsers => "users:impersonate",
        }
    }

    /// Capability needed to list a collection
    pub fn view(kind: EntityKind) -> Capability {
        match kind {
            EntityKind::Campaign => Capability::ViewCampaigns,
            EntityKind::Lead => Capability::ViewLeads,
            EntityKind::Call => Capability::ViewCalls,
            EntityKind::Bot => Capability::ViewBots,
            EntityKind::Consumer => Capability::ViewConsumers,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown capability: {}", s))
    }
}

/// Granted capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    granted: BTreeSet<Capability>,
}

impl Permissions {
    /// No capabilities at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Every capability
    pub fn all() -> Self {
        Self {
            granted: Capability::ALL.into_iter().collect(),
        }
    }

    /// Baseline grants of a role
    pub fn for_role(role: &str) -> Self {
        use Capability::*;

        let granted: &[Capability] = match role.trim().to_lowercase().as_str() {
            "admin" | "superadmin" => &Capability::ALL,
            "reseller" => &[
                ViewCampaigns,
                ManageCampaigns,
                ViewLeads,
                ManageLeads,
                ExportLeads,
                ViewCalls,
                ManageCalls,
                ViewBots,
                ManageBots,
                ViewConsumers,
                ImpersonateUsers,
            ],
            "consumer" | "user" => &[
                ViewCampaigns,
                ManageCampaigns,
                ViewLeads,
                ExportLeads,
                ViewCalls,
                ManageCalls,
                ViewBots,
            ],
            _ => &[],
        };
        Self {
            granted: granted.iter().copied().collect(),
        }
    }

    /// Role grants plus the explicit grants carried by the token
    pub fn from_token(token: &SessionToken) -> Self {
        let mut permissions = token.role().map(Self::for_role).unwrap_or_default();
        permissions.extend_from_strings(&token.claims.permissions);
        permissions
    }

    /// Add `resource:verb` grants, ignoring unknown strings
    pub fn extend_from_strings<S: AsRef<str>>(&mut self, grants: &[S]) {
        for grant in grants {
            match grant.as_ref().parse::<Capability>() {
                Ok(capability) => {
                    self.granted.insert(capability);
                }
                Err(e) => tracing::debug!("Ignoring grant: {}", e),
            }
        }
    }

    pub fn grant(mut self, capability: Capability) -> Self {
        self.granted.insert(capability);
        self
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }

    /// Fail with [`ConsoleError::Forbidden`] unless granted
    pub fn require(&self, capability: Capability) -> Result<(), ConsoleError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ConsoleError::Forbidden(capability))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.granted.iter().copied()
    }
}
