//! Handler commands and queries
//!
//! Plain data carried from the boundary into the service layer. Each holds
//! the list key, any payload, and the preconditions already assembled into a
//! condition collection.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::aggregate::VersionTag;
use crate::conditional::ConditionCollection;

/// Query for reading a list, its members or its history
#[derive(Debug, Clone)]
pub struct GetListQuery {
    pub resource_owner: String,
    pub identifier: String,
    pub conditions: ConditionCollection<VersionTag>,
}

impl GetListQuery {
    pub fn new(resource_owner: String, identifier: String) -> Self {
        Self {
            resource_owner,
            identifier,
            conditions: ConditionCollection::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionCollection<VersionTag>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Command to create a list or update its metadata
#[derive(Debug, Clone)]
pub struct UpsertListCommand {
    pub resource_owner: String,
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub conditions: ConditionCollection<VersionTag>,
}

impl UpsertListCommand {
    pub fn new(
        resource_owner: String,
        identifier: String,
        name: String,
        description: String,
    ) -> Self {
        Self {
            resource_owner,
            identifier,
            name,
            description,
            conditions: ConditionCollection::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionCollection<VersionTag>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Command to delete a list
#[derive(Debug, Clone)]
pub struct DeleteListCommand {
    pub resource_owner: String,
    pub identifier: String,
    pub conditions: ConditionCollection<VersionTag>,
}

impl DeleteListCommand {
    pub fn new(resource_owner: String, identifier: String) -> Self {
        Self {
            resource_owner,
            identifier,
            conditions: ConditionCollection::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionCollection<VersionTag>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Command to add a resource connection with its initial actions
#[derive(Debug, Clone)]
pub struct AddConnectionCommand {
    pub resource_owner: String,
    pub identifier: String,
    pub resource_identifier: String,
    pub actions: BTreeSet<String>,
    pub conditions: ConditionCollection<VersionTag>,
}

impl AddConnectionCommand {
    pub fn new(
        resource_owner: String,
        identifier: String,
        resource_identifier: String,
        actions: BTreeSet<String>,
    ) -> Self {
        Self {
            resource_owner,
            identifier,
            resource_identifier,
            actions,
            conditions: ConditionCollection::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionCollection<VersionTag>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Command to add or remove actions on an existing connection
#[derive(Debug, Clone)]
pub struct ConnectionActionsCommand {
    pub resource_owner: String,
    pub identifier: String,
    pub resource_identifier: String,
    pub actions: BTreeSet<String>,
    pub conditions: ConditionCollection<VersionTag>,
}

impl ConnectionActionsCommand {
    pub fn new(
        resource_owner: String,
        identifier: String,
        resource_identifier: String,
        actions: BTreeSet<String>,
    ) -> Self {
        Self {
            resource_owner,
            identifier,
            resource_identifier,
            actions,
            conditions: ConditionCollection::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionCollection<VersionTag>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Command to remove a resource connection entirely
#[derive(Debug, Clone)]
pub struct RemoveConnectionCommand {
    pub resource_owner: String,
    pub identifier: String,
    pub resource_identifier: String,
    pub conditions: ConditionCollection<VersionTag>,
}

impl RemoveConnectionCommand {
    pub fn new(resource_owner: String, identifier: String, resource_identifier: String) -> Self {
        Self {
            resource_owner,
            identifier,
            resource_identifier,
            conditions: ConditionCollection::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionCollection<VersionTag>) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Command to add or remove member parties
#[derive(Debug, Clone)]
pub struct MembersCommand {
    pub resource_owner: String,
    pub identifier: String,
    pub party_ids: BTreeSet<Uuid>,
    pub conditions: ConditionCollection<VersionTag>,
}

impl MembersCommand {
    pub fn new(resource_owner: String, identifier: String, party_ids: BTreeSet<Uuid>) -> Self {
        Self {
            resource_owner,
            identifier,
            party_ids,
            conditions: ConditionCollection::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionCollection<VersionTag>) -> Self {
        self.conditions = conditions;
        self
    }
}
