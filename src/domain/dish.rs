//! The `Dish` entity and the payloads used to create and modify it.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Maximum length of `name`, in characters.
pub const NAME_MAX_LEN: usize = 255;

/// Maximum length of `description`, in characters.
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// A persisted dish.
///
/// `id` and `created_at` never change after insertion; `updated_at` is refreshed on every
/// successful mutation and is always `>= created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewDish {
    /// Dish name, unique across all dishes (1-255 characters).
    pub name: String,
    /// Optional free-form description (up to 500 characters).
    #[serde(default)]
    pub description: Option<String>,
}

impl NewDish {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

/// Partial update for a dish.
///
/// Only `name` and `description` are mutable. For `description` the JSON value `null` clears
/// the stored value, while an absent key leaves it untouched. `name` cannot be cleared, so
/// `null` and absent both mean "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DishPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

impl DishPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }

    pub fn describe(description: Option<String>) -> Self {
        Self {
            name: None,
            description: Some(description),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(Some(description)) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Applies the patch to an in-memory copy of a dish (timestamps are left alone).
    pub fn apply_to(&self, dish: &mut Dish) {
        if let Some(name) = &self.name {
            dish.name = name.clone();
        }
        if let Some(description) = &self.description {
            dish.description = description.clone();
        }
    }
}

/// Maps a present JSON key to `Some(value)`, so `null` becomes `Some(None)`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }
    let len = name.chars().count();
    if len > NAME_MAX_LEN {
        return Err(format!(
            "name must be at most {} characters (got {})",
            NAME_MAX_LEN, len
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), String> {
    let len = description.chars().count();
    if len > DESCRIPTION_MAX_LEN {
        return Err(format!(
            "description must be at most {} characters (got {})",
            DESCRIPTION_MAX_LEN, len
        ));
    }
    Ok(())
}

/// Current time at the precision the database stores (microseconds).
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Timestamp for a mutation of a row last touched at `previous`: never earlier than
/// `previous + 1µs`.
pub fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_micros();
    let floor = previous + Duration::microseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dish_rejects_blank_and_long_names() {
        assert!(NewDish::new("Pizza", None).validate().is_ok());
        assert!(NewDish::new("   ", None).validate().is_err());
        assert!(NewDish::new("x".repeat(NAME_MAX_LEN), None).validate().is_ok());
        assert!(NewDish::new("x".repeat(NAME_MAX_LEN + 1), None)
            .validate()
            .is_err());
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        let name = "é".repeat(NAME_MAX_LEN);
        assert!(name.len() > NAME_MAX_LEN);
        assert!(NewDish::new(name, None).validate().is_ok());

        let description = "汤".repeat(DESCRIPTION_MAX_LEN);
        assert!(NewDish::new("Soup", Some(description)).validate().is_ok());
        let description = "汤".repeat(DESCRIPTION_MAX_LEN + 1);
        assert!(NewDish::new("Soup", Some(description)).validate().is_err());
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let absent: DishPatch = serde_json::from_str(r#"{"name":"Pasta"}"#).unwrap();
        assert_eq!(absent.name.as_deref(), Some("Pasta"));
        assert_eq!(absent.description, None);

        let cleared: DishPatch = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: DishPatch = serde_json::from_str(r#"{"description":"al dente"}"#).unwrap();
        assert_eq!(set.description, Some(Some("al dente".to_string())));

        let null_name: DishPatch = serde_json::from_str(r#"{"name":null}"#).unwrap();
        assert!(null_name.is_empty());
    }

    #[test]
    fn patch_ignores_unknown_keys() {
        let patch: DishPatch = serde_json::from_str(r#"{"id":99,"created_at":"x"}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let now = now_micros();
        let mut dish = Dish {
            id: 1,
            name: "Pizza".to_string(),
            description: Some("cheesy".to_string()),
            created_at: now,
            updated_at: now,
        };

        DishPatch::default().apply_to(&mut dish);
        assert_eq!(dish.name, "Pizza");
        assert_eq!(dish.description.as_deref(), Some("cheesy"));

        DishPatch::describe(None).apply_to(&mut dish);
        assert_eq!(dish.description, None);

        DishPatch::rename("Calzone").apply_to(&mut dish);
        assert_eq!(dish.name, "Calzone");
    }

    #[test]
    fn next_updated_at_strictly_advances() {
        let future = Utc::now() + Duration::seconds(60);
        let next = next_updated_at(future);
        assert!(next > future);
        assert!(next_updated_at(now_micros()) > Utc::now() - Duration::seconds(1));
    }
}
