//! Tag data model

use serde::{Deserialize, Serialize};

/// User-defined label, unique by case-sensitive name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tag_id: i64,
    pub tag_name: String,
}

/// Tag with the number of assets carrying it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub asset_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_with_count_flattens() {
        let tagged = TagWithCount {
            tag: Tag {
                tag_id: 3,
                tag_name: "props".to_string(),
            },
            asset_count: 12,
        };
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["tagId"], 3);
        assert_eq!(json["tagName"], "props");
        assert_eq!(json["assetCount"], 12);
    }
}
