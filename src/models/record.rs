//! Vessel record data structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Records of one query, keyed by identifier.
pub type RecordMap = BTreeMap<String, Record>;

/// One vessel parsed from the register book result table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Flag state, taken from the flag image title
    pub flag: String,

    /// Primary (native script) vessel name
    #[serde(rename = "main_name")]
    pub primary_name: String,

    /// Secondary (Latin) vessel name
    pub secondary_name: String,

    /// Port of registry
    pub home_port: String,

    /// Radio call sign
    pub call_sign: String,

    /// Register number assigned by the society
    #[serde(rename = "reg_number")]
    pub registry_number: String,

    /// IMO number, the natural key of a vessel
    #[serde(rename = "imo_number")]
    pub identifier: String,
}

impl Record {
    /// Column header in export order.
    pub const COLUMNS: [&'static str; 7] = [
        "flag",
        "main_name",
        "secondary_name",
        "home_port",
        "call_sign",
        "reg_number",
        "imo_number",
    ];

    /// Field values in the same order as [`Record::COLUMNS`].
    pub fn values(&self) -> [&str; 7] {
        [
            &self.flag,
            &self.primary_name,
            &self.secondary_name,
            &self.home_port,
            &self.call_sign,
            &self.registry_number,
            &self.identifier,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        Record {
            flag: "Россия".to_string(),
            primary_name: "АКАДЕМИК".to_string(),
            secondary_name: "AKADEMIK".to_string(),
            home_port: "Мурманск".to_string(),
            call_sign: "UBCD".to_string(),
            registry_number: "123456".to_string(),
            identifier: "9876543".to_string(),
        }
    }

    #[test]
    fn test_values_follow_column_order() {
        let record = sample_record();
        let values = record.values();
        assert_eq!(values[0], "Россия");
        assert_eq!(values[5], "123456");
        assert_eq!(values[6], "9876543");
    }

    #[test]
    fn test_column_header_order() {
        assert_eq!(
            Record::COLUMNS,
            [
                "flag",
                "main_name",
                "secondary_name",
                "home_port",
                "call_sign",
                "reg_number",
                "imo_number",
            ]
        );
    }

    #[test]
    fn test_serialized_key_order_matches_columns() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        let positions: Vec<usize> = Record::COLUMNS
            .iter()
            .map(|column| json.find(&format!("\"{column}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{json}");
    }

    #[test]
    fn test_serialized_names_match_columns() {
        let json = serde_json::to_value(sample_record()).unwrap();
        let object = json.as_object().unwrap();
        for column in Record::COLUMNS {
            assert!(object.contains_key(column), "missing {column}");
        }
    }
}
