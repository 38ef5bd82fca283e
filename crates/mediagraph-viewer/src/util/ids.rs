/// Node ids encode the entity type and the backend row id: `image_42`,
/// `text_7`, `concept_cat`. The backend keys its detail endpoints by the
/// bare row id.
pub fn entity_id(node_id: &str) -> Option<&str> {
    node_id
        .split_once('_')
        .map(|(_, rest)| rest)
        .filter(|rest| !rest.is_empty())
}
