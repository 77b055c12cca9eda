use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A recommended course surfaced by the assistant during a turn.
///
/// The course record itself is opaque to the client core; only the derived
/// `id` matters here, as the dedup key for the artifact rail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub course: Value,
}

impl Artifact {
    pub fn from_course(course: Value) -> Self {
        Self {
            id: derive_artifact_id(&course),
            course,
        }
    }
}

/// Ordered-fallback id derivation: the course's own id, then the two
/// alternate spellings seen from different backends, then a local uuid.
/// The order is load-bearing — dedup across tool results and
/// `message_end` artifacts only works if every path derives the same id.
pub fn derive_artifact_id(course: &Value) -> String {
    for key in ["id", "course_id", "courseId"] {
        match course.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    uuid::Uuid::new_v4().to_string()
}

/// Display-oriented view over an opaque course record.
/// Every field is optional; the panels render what is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseView {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cost: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub course_type: Option<String>,
}

impl CourseView {
    pub fn from_value(course: &Value) -> Self {
        serde_json::from_value(course.clone()).unwrap_or_default()
    }

    /// Cost as a number, tolerating strings like "£45" or "45.00"
    pub fn cost_value(&self) -> Option<f64> {
        match &self.cost {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => {
                let numeric: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                numeric.parse().ok()
            }
            _ => None,
        }
    }

    pub fn rating_value(&self) -> f64 {
        match &self.rating {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// Authenticated user profile, as returned by the auth endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UserProfile {
    /// Profile context forwarded with chat requests — name and bio only
    pub fn chat_context(&self) -> Option<Value> {
        let mut map = serde_json::Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(bio) = &self.bio {
            map.insert("bio".to_string(), Value::String(bio.clone()));
        }
        if map.is_empty() {
            None
        } else {
            Some(Value::Object(map))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}
