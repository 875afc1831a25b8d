use super::dates::{null_as_default, RawEnum};
use serde::{Deserialize, Deserializer, Serialize};

/// Crop names in the backend's enumeration order, used when a crop type
/// arrives as its ordinal.
pub const CROP_TYPES: &[&str] = &[
    "Wheat",
    "Corn",
    "Sunflower",
    "Soybean",
    "Barley",
    "Rapeseed",
    "SugarBeet",
    "Potato",
    "Vegetables",
    "Orchard",
    "Vineyard",
    "Other",
];

/// A farm field as listed by the backend's field endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "optional_crop_type")]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
}

fn optional_crop_type<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawEnum>::deserialize(deserializer)?
        .map(|raw| raw.into_label(CROP_TYPES))
        .filter(|label| !label.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_type_normalised_from_ordinal_or_name() {
        let fields: Vec<FieldSummary> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Північне", "cropType": 2, "area": 12.5},
                {"id": 2, "name": "Південне", "cropType": "Sunflower"},
                {"id": 3, "name": null, "cropType": null},
                {"id": 4, "name": "Біля ставу", "cropType": "  "}
            ]"#,
        )
        .unwrap();

        assert_eq!(fields[0].crop_type.as_deref(), Some("Sunflower"));
        assert_eq!(fields[1].crop_type.as_deref(), Some("Sunflower"));
        assert_eq!(fields[2].name, "");
        assert_eq!(fields[2].crop_type, None);
        assert_eq!(fields[3].crop_type, None);
        assert_eq!(fields[0].area, Some(12.5));
    }
}
