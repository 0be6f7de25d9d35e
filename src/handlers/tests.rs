//! Unit tests for handler commands
//!
//! Flows that touch the repository are covered by the aggregate and
//! conditional tests plus the database-backed deployment; these tests pin
//! down command assembly and the condition wiring the handlers rely on.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use crate::aggregate::VersionTag;
    use crate::conditional::{ConditionCollection, ConditionOutcome, VersionCondition};
    use crate::handlers::{
        AddConnectionCommand, DeleteListCommand, GetListQuery, MembersCommand, UpsertListCommand,
    };

    #[test]
    fn test_get_query_defaults_to_no_conditions() {
        let query = GetListQuery::new("skd".to_string(), "banks".to_string());

        assert_eq!(query.resource_owner, "skd");
        assert_eq!(query.identifier, "banks");
        assert!(query.conditions.is_empty());
    }

    #[test]
    fn test_upsert_command_with_conditions() {
        let conditions: ConditionCollection<VersionTag> =
            [VersionCondition::NotExists { is_read: false }].into_iter().collect();

        let command = UpsertListCommand::new(
            "skd".to_string(),
            "banks".to_string(),
            "Approved banks".to_string(),
            "desc".to_string(),
        )
        .with_conditions(conditions.clone());

        assert_eq!(command.conditions, conditions);
        assert_eq!(command.name, "Approved banks");
    }

    #[test]
    fn test_create_only_precondition_allows_creation() {
        // If-None-Match: * — creation allowed, update rejected
        let conditions: ConditionCollection<VersionTag> =
            [VersionCondition::NotExists { is_read: false }].into_iter().collect();

        assert_eq!(conditions.validate_absent(), ConditionOutcome::Succeeded);
    }

    #[test]
    fn test_update_only_precondition_blocks_creation() {
        // If-Match: "3" — update of an existing version only
        let conditions: ConditionCollection<VersionTag> =
            [VersionCondition::IsMatch(VersionTag::new(3))].into_iter().collect();

        assert_eq!(conditions.validate_absent(), ConditionOutcome::Failed);
    }

    #[test]
    fn test_members_command() {
        let party_ids = BTreeSet::from([Uuid::new_v4(), Uuid::new_v4()]);
        let command =
            MembersCommand::new("skd".to_string(), "banks".to_string(), party_ids.clone());

        assert_eq!(command.party_ids, party_ids);
        assert!(command.conditions.is_empty());
    }

    #[test]
    fn test_connection_command() {
        let actions = BTreeSet::from(["read".to_string()]);
        let command = AddConnectionCommand::new(
            "skd".to_string(),
            "banks".to_string(),
            "tax-api".to_string(),
            actions.clone(),
        );

        assert_eq!(command.resource_identifier, "tax-api");
        assert_eq!(command.actions, actions);
    }

    #[test]
    fn test_delete_command_with_conditions() {
        let conditions: ConditionCollection<VersionTag> =
            [VersionCondition::IsMatch(VersionTag::new(2))].into_iter().collect();
        let command = DeleteListCommand::new("skd".to_string(), "banks".to_string())
            .with_conditions(conditions);

        assert_eq!(command.conditions.len(), 1);
    }
}
