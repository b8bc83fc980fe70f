use serde_json::{Map, Value};

use crate::decision::coerce_id;

const GROUP_ID_KEYS: &[&str] = &["cluster_id", "group_id", "id"];
const REPRESENTATIVE_KEYS: &[&str] = &["main", "representative", "representative_id", "rep"];
const MEMBER_KEYS: &[&str] = &["members", "member_ids", "ids"];

/// A model's claim that some candidates are near-duplicates.
///
/// Ids are raw integers here; they are checked against the accepted set only
/// when the proposal is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupProposal {
    pub group_id: Option<i64>,
    pub representative: Option<i64>,
    pub members: Vec<i64>,
}

impl GroupProposal {
    #[must_use]
    pub const fn new(representative: i64, members: Vec<i64>) -> Self {
        Self {
            group_id: None,
            representative: Some(representative),
            members,
        }
    }

    /// Read one proposal object.
    ///
    /// The whole proposal is rejected if it is not an object, has no member
    /// list, has any member that does not coerce to an integer, or declares a
    /// representative that does not coerce. A missing representative is
    /// allowed and resolves to the first member.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let members = first_field(map, MEMBER_KEYS)?
            .as_array()?
            .iter()
            .map(coerce_id)
            .collect::<Option<Vec<_>>>()?;

        let representative = match first_field(map, REPRESENTATIVE_KEYS) {
            Some(raw) => Some(coerce_id(raw)?),
            None => None,
        };

        Some(Self {
            group_id: first_field(map, GROUP_ID_KEYS).and_then(coerce_id),
            representative,
            members,
        })
    }
}

/// Every well-formed proposal in `items`, in response order.
#[must_use]
pub fn parse_proposals(items: &[Value]) -> Vec<GroupProposal> {
    items.iter().filter_map(GroupProposal::from_value).collect()
}

fn first_field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}
