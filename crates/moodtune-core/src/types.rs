use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Face attribute an analyzer can be asked to estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Emotion,
    Age,
    Gender,
    Race,
}

impl Action {
    /// Every attribute, in the order they are requested from the analyzer.
    pub const ALL: [Action; 4] = [Action::Emotion, Action::Age, Action::Gender, Action::Race];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Emotion => "emotion",
            Action::Age => "age",
            Action::Gender => "gender",
            Action::Race => "race",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label → percentage scores, kept in the order the analyzer produced them.
///
/// Serialized as a plain JSON object. Deserialization preserves document order,
/// so reports list labels exactly as they appear in the source record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scores(Vec<(String, f64)>);

impl Scores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the score for `label`, replacing an existing entry in place.
    pub fn insert(&mut self, label: impl Into<String>, value: f64) {
        let label = label.into();
        match self.0.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.0.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label with the highest score. Ties resolve to the earliest label.
    pub fn dominant(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (label, value) in self.iter() {
            if best.map_or(true, |(_, top)| value > top) {
                best = Some((label, value));
            }
        }
        best.map(|(label, _)| label)
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for Scores {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        let mut scores = Scores::new();
        for (label, value) in iter {
            scores.insert(label, value);
        }
        scores
    }
}

impl Serialize for Scores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Scores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoresVisitor;

        impl<'de> Visitor<'de> for ScoresVisitor {
            type Value = Scores;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of labels to numeric scores")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Scores, A::Error> {
                let mut scores = Scores::new();
                while let Some((label, value)) = access.next_entry::<String, f64>()? {
                    scores.insert(label, value);
                }
                Ok(scores)
            }
        }

        deserializer.deserialize_map(ScoresVisitor)
    }
}

/// Gender as reported by an analyzer: either the dominant label, or the full
/// label → percentage distribution emitted by some analysis tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Gender {
    Label(String),
    Scores(Scores),
}

/// Face location inside the analyzed image, in source pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default)]
    pub left_eye: Option<(u32, u32)>,
    #[serde(default)]
    pub right_eye: Option<(u32, u32)>,
}

/// Attributes estimated for a single face.
///
/// Every field is optional: analyzers only fill in what was requested, and
/// records read back from JSON may be partial. Keys this type does not know
/// about are kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Scores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<FaceRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<Scores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_race: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnalysisRecord {
    /// Gender label to show to a user.
    ///
    /// For a score distribution this is `dominant_gender` when present,
    /// otherwise the highest-scoring label.
    pub fn gender_label(&self) -> Option<&str> {
        match self.gender.as_ref()? {
            Gender::Label(label) => Some(label),
            Gender::Scores(scores) => self.dominant_gender.as_deref().or_else(|| scores.dominant()),
        }
    }
}

/// Raw analyzer result: one record, or one record per detected face.
///
/// `Many` is listed first so a JSON array is never mistaken for a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutput {
    Many(Vec<AnalysisRecord>),
    Single(AnalysisRecord),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scores_preserve_document_order() {
        let scores: Scores =
            serde_json::from_str(r#"{"sad": 1.0, "angry": 2.0, "happy": 97.0}"#).unwrap();
        let labels: Vec<&str> = scores.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["sad", "angry", "happy"]);

        let text = serde_json::to_string(&scores).unwrap();
        assert_eq!(text, r#"{"sad":1.0,"angry":2.0,"happy":97.0}"#);
    }

    #[test]
    fn test_scores_accept_integer_values() {
        let scores: Scores = serde_json::from_str(r#"{"white": 100}"#).unwrap();
        assert_eq!(scores.get("white"), Some(100.0));
    }

    #[test]
    fn test_scores_insert_replaces_in_place() {
        let mut scores: Scores = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        scores.insert("a", 5.0);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.iter().next(), Some(("a", 5.0)));
    }

    #[test]
    fn test_scores_dominant() {
        let scores: Scores = [("fear", 10.0), ("happy", 80.0), ("sad", 10.0)].into_iter().collect();
        assert_eq!(scores.dominant(), Some("happy"));
        assert_eq!(Scores::new().dominant(), None);

        let tied: Scores = [("x", 50.0), ("y", 50.0)].into_iter().collect();
        assert_eq!(tied.dominant(), Some("x"));
    }

    #[test]
    fn test_partial_record_roundtrips_exactly() {
        let value = json!({"age": 25, "gender": "Man"});
        let record: AnalysisRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.age, Some(25.into()));
        assert_eq!(record.gender_label(), Some("Man"));
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let record: AnalysisRecord =
            serde_json::from_value(json!({"dominant_emotion": "sad", "sad": 0.9})).unwrap();
        assert_eq!(record.dominant_emotion.as_deref(), Some("sad"));
        assert_eq!(record.extra.get("sad"), Some(&json!(0.9)));
    }

    #[test]
    fn test_gender_distribution() {
        let record: AnalysisRecord = serde_json::from_value(json!({
            "gender": {"Woman": 3.5, "Man": 96.5},
        }))
        .unwrap();
        assert!(matches!(record.gender, Some(Gender::Scores(_))));
        assert_eq!(record.gender_label(), Some("Man"));

        let record: AnalysisRecord = serde_json::from_value(json!({
            "gender": {"Woman": 3.5, "Man": 96.5},
            "dominant_gender": "Woman",
        }))
        .unwrap();
        assert_eq!(record.gender_label(), Some("Woman"));
    }

    #[test]
    fn test_output_shapes() {
        let many: AnalysisOutput = serde_json::from_value(json!([{"age": 25}])).unwrap();
        assert!(matches!(many, AnalysisOutput::Many(ref v) if v.len() == 1));

        let single: AnalysisOutput = serde_json::from_value(json!({"age": 30})).unwrap();
        assert!(matches!(single, AnalysisOutput::Single(_)));
    }

    #[test]
    fn test_region_eyes_serialize_as_pairs() {
        let region = FaceRegion { x: 1, y: 2, w: 30, h: 40, left_eye: Some((10, 12)), right_eye: None };
        assert_eq!(
            serde_json::to_value(&region).unwrap(),
            json!({"x": 1, "y": 2, "w": 30, "h": 40, "left_eye": [10, 12], "right_eye": null})
        );
    }

    #[test]
    fn test_action_names() {
        let names: Vec<String> = Action::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["emotion", "age", "gender", "race"]);
    }
}
