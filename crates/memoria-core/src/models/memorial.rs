use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memorial {
    pub id: i64,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(rename = "birthDate", default)]
    pub birth_date: Option<String>,
    #[serde(rename = "deathDate", default)]
    pub death_date: Option<String>,
    #[serde(rename = "isPublished", default)]
    pub is_published: bool,
    #[serde(rename = "candleCount", default)]
    pub candle_count: u32,
}

impl Memorial {
    /// "1931 - 2024" style life span, or whatever part is known.
    pub fn life_span(&self) -> String {
        let year = |d: &Option<String>| d.as_deref().and_then(|s| s.get(..4)).map(str::to_string);
        match (year(&self.birth_date), year(&self.death_date)) {
            (Some(b), Some(d)) => format!("{} - {}", b, d),
            (Some(b), None) => format!("b. {}", b),
            (None, Some(d)) => format!("d. {}", d),
            (None, None) => String::new(),
        }
    }
}

/// A service, viewing or gathering attached to a memorial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorialEvent {
    pub id: i64,
    #[serde(rename = "memorialId", default)]
    pub memorial_id: Option<i64>,
    pub title: String,
    #[serde(rename = "startsAt", default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "isLivestreamed", default)]
    pub is_livestreamed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memorial(birth: Option<&str>, death: Option<&str>) -> Memorial {
        Memorial {
            id: 1,
            full_name: "Ada Byron".to_string(),
            slug: None,
            birth_date: birth.map(str::to_string),
            death_date: death.map(str::to_string),
            is_published: true,
            candle_count: 0,
        }
    }

    #[test]
    fn test_life_span() {
        assert_eq!(memorial(Some("1815-12-10"), Some("1852-11-27")).life_span(), "1815 - 1852");
        assert_eq!(memorial(Some("1815-12-10"), None).life_span(), "b. 1815");
        assert_eq!(memorial(None, Some("1852")).life_span(), "d. 1852");
        assert_eq!(memorial(None, None).life_span(), "");
    }

    #[test]
    fn test_event_deserializes_with_missing_optionals() {
        let event: MemorialEvent = serde_json::from_str(r#"{"id": 9, "title": "Viewing"}"#).unwrap();
        assert_eq!(event.id, 9);
        assert!(event.memorial_id.is_none());
        assert!(!event.is_livestreamed);
    }
}
